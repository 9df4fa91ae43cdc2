use crate::templates::AI_PROMPT;

pub fn run() {
    println!("Copy the prompt below and give it to an AI assistant together with the PDF:\n");
    println!("{}", AI_PROMPT);
}

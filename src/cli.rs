use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdfmarks")]
#[command(about = "Apply bookmark files to PDFs, view outlines and extract pages")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Display PDF metadata
    Info {
        /// PDF file to inspect
        path: PathBuf,
    },

    /// Apply a bookmark TXT file as the PDF outline
    Apply {
        /// PDF file to update
        path: PathBuf,

        /// Bookmark file (level|title|page, "title (page)" or indented lines)
        bookmarks: PathBuf,

        /// Document page on which bookmark page 1 lands; 1 means no shift
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        offset: i64,

        /// Apply the remaining bookmarks without asking when some point
        /// outside the document
        #[arg(short, long)]
        yes: bool,

        /// Where to save if the original file cannot be replaced
        #[arg(long)]
        fallback_output: Option<PathBuf>,
    },

    /// Extract page ranges to a new PDF
    Extract {
        /// PDF file to extract from
        path: PathBuf,

        /// Page ranges (e.g., "1-5,8,10-12")
        pages: String,

        /// Output file [default: <name>_<pages>.pdf next to the input]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the existing bookmarks
    #[command(alias = "toc")]
    View {
        /// PDF file to inspect
        path: PathBuf,

        /// Also write the bookmarks as an editable bookmark file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a prompt for generating a bookmark file with an AI assistant
    Prompt,

    /// Print or write a bookmark file template
    Template {
        /// Write the template here instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run as MCP server
    Mcp,
}

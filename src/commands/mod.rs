pub mod apply;
pub mod extract;
pub mod info;
pub mod prompt;
pub mod template;
pub mod view;

pub mod prompt;
pub mod template;

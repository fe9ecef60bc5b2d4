// CLI module
// Public interface for the terminal chat front-end

mod commands;
mod repl;

pub use commands::{format_help, Command};
pub use repl::ChatRepl;

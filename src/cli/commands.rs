// Slash command handling for the chat front-end

use crate::debate::{Lens, QuickAction, Template};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    /// Forget the conversation and prompt for a new setup
    Reset,
    Quick(QuickAction),
}

impl Command {
    /// Parse a slash command; `None` for plain text or unknown commands
    pub fn parse(input: &str) -> Option<Self> {
        let name = input.trim().strip_prefix('/')?;
        match name {
            "help" => Some(Command::Help),
            "quit" | "exit" => Some(Command::Quit),
            "reset" | "new" => Some(Command::Reset),
            other => QuickAction::from_tag(other).map(Command::Quick),
        }
    }
}

/// Whether the input looks like a command at all
pub fn is_command(input: &str) -> bool {
    input.trim_start().starts_with('/')
}

pub fn format_help() -> String {
    let mut output = String::from("Commands:\n");
    for action in QuickAction::ALL {
        output.push_str(&format!("  /{:<16}- {}\n", action.tag(), action.label()));
    }
    output.push_str("  /reset           - Start a new debate\n");
    output.push_str("  /help            - Show this help message\n");
    output.push_str("  /quit            - Exit\n");
    output.push_str("\nPress Ctrl-C while a reply is streaming to cancel it.");
    output
}

/// One line per lens, for the setup prompt
pub fn format_lenses() -> String {
    Lens::ALL
        .iter()
        .map(|lens| format!("  {:<11} {}", lens.tag(), lens.display_name()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line per template, for the setup prompt
pub fn format_templates() -> String {
    Template::ALL
        .iter()
        .map(|template| format!("  {:<9} {}", template.tag(), template.label()))
        .collect::<Vec<_>>()
        .join("\n")
}

// Terminal chat front-end for the conversation client

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{self, IsTerminal, Write};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::commands::{format_help, format_lenses, format_templates, is_command, Command};
use crate::client::{ClientError, ConversationClient};
use crate::debate::{DebateSetup, Lens, QuickAction, Template, Turn};

/// What the next exchange with the gateway should be
enum Pending {
    Start(DebateSetup),
    Submit(String),
    Quick(QuickAction),
}

/// Writes only the not-yet-printed tail of the accumulated reply
#[derive(Default)]
struct PartialPrinter {
    printed: usize,
}

impl PartialPrinter {
    fn print(&mut self, accumulated: &str) {
        if let Some(tail) = accumulated.get(self.printed..) {
            print!("{}", tail);
            let _ = io::stdout().flush();
            self.printed = accumulated.len();
        }
    }
}

pub struct ChatRepl {
    client: ConversationClient,
    editor: DefaultEditor,
    is_interactive: bool,
}

impl ChatRepl {
    pub fn new(client: ConversationClient) -> Result<Self> {
        Ok(Self {
            client,
            editor: DefaultEditor::new()?,
            is_interactive: io::stdout().is_terminal(),
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        if self.is_interactive {
            println!("Adversary v{} - an opponent for your decisions", env!("CARGO_PKG_VERSION"));
            println!("Type /help for commands.");
        }

        loop {
            if self.client.setup().is_none() {
                match self.prompt_setup()? {
                    Some(setup) => self.respond(Pending::Start(setup)).await,
                    None => break,
                }
                continue;
            }

            let input = match self.read_line("> ")? {
                Some(input) => input,
                None => break,
            };
            if input.is_empty() {
                continue;
            }

            match Command::parse(&input) {
                Some(Command::Quit) => break,
                Some(Command::Help) => println!("{}", format_help()),
                Some(Command::Reset) => {
                    self.client.reset();
                    println!("Conversation cleared.");
                }
                Some(Command::Quick(action)) => self.respond(Pending::Quick(action)).await,
                None if is_command(&input) => {
                    eprintln!("Unknown command: {} (try /help)", input);
                }
                None => self.respond(Pending::Submit(input)).await,
            }
        }

        if self.is_interactive {
            println!("Goodbye!");
        }
        Ok(())
    }

    /// Run one exchange, streaming the reply to stdout
    async fn respond(&mut self, pending: Pending) {
        let cancel = CancellationToken::new();
        let watcher = cancel_on_ctrl_c(cancel.clone());
        let mut printer = PartialPrinter::default();
        let on_partial = |text: &str| printer.print(text);

        if self.is_interactive {
            println!();
        }
        let result = match pending {
            Pending::Start(setup) => self.client.start(setup, &cancel, on_partial).await,
            Pending::Submit(text) => {
                self.client
                    .submit(Turn::user(text), &cancel, on_partial)
                    .await
            }
            Pending::Quick(action) => {
                println!("[{}]", action.label());
                self.client.quick_action(action, &cancel, on_partial).await
            }
        };
        watcher.abort();

        if printer.printed > 0 {
            println!();
        }
        match result {
            Ok(_) => {
                if self.is_interactive {
                    println!();
                }
            }
            Err(ClientError::Cancelled) => eprintln!("[cancelled]"),
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    /// Ask for a new debate setup; `None` when input ends
    fn prompt_setup(&mut self) -> Result<Option<DebateSetup>> {
        let Some(topic) = self.read_required("Topic: ")? else {
            return Ok(None);
        };
        let Some(position) = self.read_required("Your position: ")? else {
            return Ok(None);
        };
        let Some(context) = self.read_line("Context (optional): ")? else {
            return Ok(None);
        };

        if self.is_interactive {
            println!("Templates:\n{}", format_templates());
        }
        let Some(template) = self.read_line("Template [general]: ")? else {
            return Ok(None);
        };

        if self.is_interactive {
            println!("Lenses:\n{}", format_lenses());
        }
        let Some(lens) = self.read_line("Lens [investor]: ")? else {
            return Ok(None);
        };

        let setup = DebateSetup::new(topic, position)
            .with_context(context)
            .with_template(Template::from_tag(&template).tag())
            .with_lens(Lens::from_tag(&lens).tag());
        Ok(Some(setup))
    }

    /// Re-prompt until the answer is non-blank
    fn read_required(&mut self, prompt: &str) -> Result<Option<String>> {
        loop {
            match self.read_line(prompt)? {
                Some(line) if line.is_empty() => eprintln!("This field is required."),
                other => return Ok(other),
            }
        }
    }

    /// Trimmed line, `None` on end of input; Ctrl-C yields an empty line
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                let line = line.trim().to_string();
                if !line.is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn cancel_on_ctrl_c(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    })
}

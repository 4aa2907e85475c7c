//! REPL command parsing.

use summarist_core::payment::BillingCycle;
use summarist_core::BookStatus;

/// One line of user input, parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login(Option<String>),
    Register(Option<String>),
    Guest,
    Google,
    Logout,
    WhoAmI,
    Search(String),
    Book(String),
    Open(String),
    Shelf(Option<BookStatus>),
    Upgrade(BillingCycle),
    Play,
    Forward,
    Back,
    Seek(f64),
    Volume(f64),
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  login [email]              sign in with email and password
  register [email]           create an account (free plan)
  guest                      continue as guest
  google                     sign in with a demo Google account
  logout                     sign out
  whoami                     show the current session
  search <text>              search by title or author
  book <id>                  show a book
  open <id>                  read/listen (premium books need a plan)
  shelf [selected|recommended|suggested]
  upgrade [yearly|monthly]   start the premium checkout
  play | fwd | back          player transport
  seek <seconds>             jump to a position
  volume <0.0-1.0>           set the volume
  help | quit";

impl Command {
    /// `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let arg = (!rest.is_empty()).then(|| rest.to_string());

        let command = match word.to_lowercase().as_str() {
            "login" => Command::Login(arg),
            "register" => Command::Register(arg),
            "guest" => Command::Guest,
            "google" => Command::Google,
            "logout" => Command::Logout,
            "whoami" => Command::WhoAmI,
            "search" => Command::Search(rest.to_string()),
            "book" => Command::Book(required(arg, "book <id>")?),
            "open" => Command::Open(required(arg, "open <id>")?),
            "shelf" => Command::Shelf(arg.map(|a| a.parse()).transpose()?),
            "upgrade" => Command::Upgrade(arg.map(|a| a.parse()).transpose()?.unwrap_or_default()),
            "play" | "pause" => Command::Play,
            "fwd" => Command::Forward,
            "back" => Command::Back,
            "seek" => Command::Seek(number(arg, "seek <seconds>")?),
            "volume" => Command::Volume(number(arg, "volume <0.0-1.0>")?),
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("Unknown command '{}'. Type 'help'.", other)),
        };
        Ok(Some(command))
    }
}

fn required(arg: Option<String>, usage: &str) -> Result<String, String> {
    arg.ok_or_else(|| format!("Usage: {}", usage))
}

fn number(arg: Option<String>, usage: &str) -> Result<f64, String> {
    required(arg, usage)?
        .parse()
        .map_err(|_| format!("Usage: {}", usage))
}

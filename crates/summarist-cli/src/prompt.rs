//! Line input for the REPL.

use std::io::{self, Write};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

pub struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `label` and read one line. `None` at end of input.
    pub async fn line(&mut self, label: &str) -> Result<Option<String>> {
        print!("{}", label);
        io::stdout().flush()?;
        Ok(self.lines.next_line().await?)
    }

    /// Like `line`, but end of input becomes an empty answer.
    pub async fn ask(&mut self, label: &str) -> Result<String> {
        Ok(self.line(label).await?.unwrap_or_default().trim().to_string())
    }

    /// Read a password without echoing it.
    pub async fn password(&self, label: &str) -> Result<String> {
        let label = label.to_string();
        tokio::task::spawn_blocking(move || rpassword::prompt_password(label))
            .await
            .context("Password prompt task failed")?
            .context("Failed to read password")
    }
}

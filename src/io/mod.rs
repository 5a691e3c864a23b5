//! Interactive console access.
//!
//! The workflows need exactly two console operations: ask a question and
//! write a line. [`InteractivePrompt`] is that seam; [`ConsoleIo`] is the
//! terminal implementation used by the CLI.

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{BufRead, Write};

/// Console operations consumed by the workflows.
pub trait InteractivePrompt {
    /// Ask `question` and return the answer. An empty answer yields `default`.
    ///
    /// Blocks until a line is available.
    fn ask(&mut self, question: &str, default: &str) -> Result<String>;

    /// Write a line of output.
    fn write(&mut self, message: &str);
}

/// Line-oriented console over any reader/writer pair.
///
/// End of input answers every question with its default, so a
/// non-interactive run behaves like a user pressing enter.
pub struct ConsoleIo<R, W> {
    input: R,
    output: W,
    colored: bool,
}

impl ConsoleIo<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Console bound to the process's stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout()).with_color(true)
    }
}

impl<R: BufRead, W: Write> ConsoleIo<R, W> {
    /// Console over `input` and `output`, without colors.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            colored: false,
        }
    }

    /// Enable or disable colored questions.
    #[must_use]
    pub fn with_color(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Give back the writer.
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> InteractivePrompt for ConsoleIo<R, W> {
    fn ask(&mut self, question: &str, default: &str) -> Result<String> {
        let rendered = if self.colored { question.green().to_string() } else { question.to_string() };
        write!(self.output, "{rendered} ").context("Failed to write question")?;
        self.output.flush().context("Failed to flush console output")?;

        let mut answer = String::new();
        let read = self.input.read_line(&mut answer).context("Failed to read answer")?;
        if read == 0 {
            writeln!(self.output).context("Failed to write to console")?;
            return Ok(default.to_string());
        }

        let answer = answer.trim();
        Ok(if answer.is_empty() { default.to_string() } else { answer.to_string() })
    }

    fn write(&mut self, message: &str) {
        if let Err(e) = writeln!(self.output, "{message}") {
            tracing::warn!("Failed to write to console: {e}");
        }
    }
}

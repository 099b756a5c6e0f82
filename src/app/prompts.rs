//! Interactive line prompts with defaults.

use std::io::{self, BufRead, Write};

/// Reads answers line by line, writing each question before reading.
///
/// End of input counts as an empty answer, so every prompt with a default
/// still resolves when stdin is closed.
pub(crate) struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    pub(crate) fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub(crate) fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `question` and returns the trimmed answer.
    pub(crate) fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    /// Asks with a shown default; an empty answer yields the default.
    pub(crate) fn ask_with_default(&mut self, question: &str, default: &str) -> io::Result<String> {
        let answer = self.ask(&format!("{question} [default {default}]: "))?;
        if answer.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(answer)
        }
    }

    /// Asks for a positive count.
    pub(crate) fn ask_count(&mut self, question: &str, default: usize) -> io::Result<usize> {
        let answer = self.ask(&format!("{question} [default {default}]: "))?;
        Ok(parse_count(&answer, default))
    }

    /// Writes one line without reading.
    pub(crate) fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{line}")
    }
}

/// Non-numeric input falls back to `default`; numbers are clamped to at least 1.
pub(crate) fn parse_count(input: &str, default: usize) -> usize {
    input
        .trim()
        .parse::<usize>()
        .map_or(default, |value| value.max(1))
}

// src/daemon/prompt.rs

//! Console input and the interactive prompt entered when the user presses
//! enter while the daemon waits for changes.

use std::future::Future;
use std::io::{self, Write};
use std::pin::Pin;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// A cancellable source of console lines.
///
/// `read_line` must be cancel safe: the wait loop drops the future when
/// the settle timer wins, and no input may be lost by that.
pub trait ConsoleInput: Send {
    /// Next line without its terminator; `None` at end of input.
    fn read_line(&mut self) -> Pin<Box<dyn Future<Output = io::Result<Option<String>>> + Send + '_>>;
}

/// Line reader over the process's standard input.
pub struct StdinInput {
    lines: Lines<BufReader<Stdin>>,
}

impl std::fmt::Debug for StdinInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdinInput").finish()
    }
}

impl StdinInput {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleInput for StdinInput {
    fn read_line(&mut self) -> Pin<Box<dyn Future<Output = io::Result<Option<String>>> + Send + '_>> {
        // `Lines::next_line` is cancel safe.
        Box::pin(self.lines.next_line())
    }
}

/// What the user decided at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    Rerun,
    Quit,
}

/// The interactive prompt collaborator. Only its two outcomes matter to the
/// wait loop.
pub trait Prompt: Send {
    fn run<'a>(
        &'a mut self,
        input: &'a mut dyn ConsoleInput,
    ) -> Pin<Box<dyn Future<Output = io::Result<PromptOutcome>> + Send + 'a>>;
}

/// Minimal prompt: one line, `q`/`quit`/`x`/`exit` (or end of input) quits,
/// anything else reruns.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinePrompt;

impl Prompt for LinePrompt {
    fn run<'a>(
        &'a mut self,
        input: &'a mut dyn ConsoleInput,
    ) -> Pin<Box<dyn Future<Output = io::Result<PromptOutcome>> + Send + 'a>> {
        Box::pin(async move {
            print!("[docwatch] paused; enter to rebuild, q to quit> ");
            io::stdout().flush()?;

            let outcome = match input.read_line().await? {
                Some(line) => parse_answer(&line),
                None => PromptOutcome::Quit,
            };
            Ok(outcome)
        })
    }
}

fn parse_answer(line: &str) -> PromptOutcome {
    match line.trim().to_lowercase().as_str() {
        "q" | "quit" | "x" | "exit" => PromptOutcome::Quit,
        _ => PromptOutcome::Rerun,
    }
}

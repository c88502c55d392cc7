//! Fake collaborators for daemon tests.

use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use docwatch::daemon::{ConsoleInput, Prompt, PromptOutcome};
use docwatch::errors::{DocwatchError, Result};
use docwatch::exec::{BuildBackend, BuildOutcome};
use docwatch::watch::NotifyCapability;

/// Console input fed from the test through a channel.
///
/// `read_line` stays pending until the test sends something, like a user
/// who never touches the keyboard. Sending `None` means end of input.
pub struct ScriptedInput {
    rx: mpsc::UnboundedReceiver<Option<String>>,
}

impl ScriptedInput {
    pub fn new() -> (Self, mpsc::UnboundedSender<Option<String>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, tx)
    }
}

impl ConsoleInput for ScriptedInput {
    fn read_line(&mut self) -> Pin<Box<dyn Future<Output = io::Result<Option<String>>> + Send + '_>> {
        Box::pin(async move {
            match self.rx.recv().await {
                Some(line) => Ok(line),
                // Test dropped its sender: behave like an idle console.
                None => std::future::pending().await,
            }
        })
    }
}

/// A prompt that answers with pre-recorded outcomes and counts how often it
/// was entered. Answers `Quit` once the script runs out.
#[derive(Clone, Default)]
pub struct ScriptedPrompt {
    answers: Arc<Mutex<VecDeque<PromptOutcome>>>,
    entered: Arc<Mutex<usize>>,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = PromptOutcome>) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers.into_iter().collect())),
            entered: Arc::new(Mutex::new(0)),
        }
    }

    pub fn times_entered(&self) -> usize {
        *self.entered.lock().unwrap()
    }
}

impl Prompt for ScriptedPrompt {
    fn run<'a>(
        &'a mut self,
        _input: &'a mut dyn ConsoleInput,
    ) -> Pin<Box<dyn Future<Output = io::Result<PromptOutcome>> + Send + 'a>> {
        *self.entered.lock().unwrap() += 1;
        let answer = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PromptOutcome::Quit);
        Box::pin(async move { Ok(answer) })
    }
}

/// A build that counts invocations and, optionally, writes an output file
/// into the working directory the way a real document build would.
#[derive(Clone)]
pub struct CountingBuild {
    builds: Arc<Mutex<usize>>,
    output: Option<PathBuf>,
    notify_tx: Option<mpsc::UnboundedSender<usize>>,
}

impl CountingBuild {
    pub fn new() -> Self {
        Self {
            builds: Arc::new(Mutex::new(0)),
            output: None,
            notify_tx: None,
        }
    }

    /// Write (and rewrite) `path` on every build.
    pub fn writing(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Report each finished build's number on the returned channel.
    pub fn reporting(mut self) -> (Self, mpsc::UnboundedReceiver<usize>) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.notify_tx = Some(tx);
        (self, rx)
    }

    pub fn count(&self) -> usize {
        *self.builds.lock().unwrap()
    }
}

impl Default for CountingBuild {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildBackend for CountingBuild {
    fn build(&mut self) -> Pin<Box<dyn Future<Output = Result<BuildOutcome>> + Send + '_>> {
        Box::pin(async move {
            let n = {
                let mut guard = self.builds.lock().unwrap();
                *guard += 1;
                *guard
            };
            if let Some(path) = &self.output {
                std::fs::write(path, format!("build {n}"))?;
            }
            if let Some(tx) = &self.notify_tx {
                let _ = tx.send(n);
            }
            Ok(BuildOutcome::Success)
        })
    }
}

/// A platform without filesystem notification.
pub struct NoNotify;

impl NotifyCapability for NoNotify {
    fn ensure_available(&self) -> Result<()> {
        Err(DocwatchError::MissingCapability(
            "no filesystem notification in this test".to_string(),
        ))
    }
}

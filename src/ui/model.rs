//! Progress display state machine
//!
//! All display state lives in [`ProgressModel`] and changes only through
//! [`ProgressModel::update`]. Handlers never block: anything asynchronous is
//! requested by returning a [`Command`] that the runtime performs, feeding
//! the outcome back as another [`Message`].

use std::sync::Arc;

use crate::app::error::RunError;
use crate::pipeline::{RepositoryResult, RunConfig};
use crate::report::Aggregator;
use crate::scanner::RepositoryRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Scanning,
    Processing,
    Complete,
    Cancelled,
}

impl Phase {
    /// Terminal phases ignore every further message
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Complete | Phase::Cancelled)
    }
}

#[derive(Debug)]
pub enum Message {
    Start,
    Tick,
    /// Working copies discovered so far
    ScanProgress(usize),
    RepositoriesFound(Vec<RepositoryRef>),
    RepoProcessed(RepositoryResult),
    /// Processing ended early, with the run-level error if there was one
    ProcessingDone(Option<RunError>),
    Quit,
}

/// Work the runtime performs on behalf of the model
#[derive(Debug, PartialEq)]
pub enum Command {
    None,
    Scan,
    Dispatch(Vec<RepositoryRef>),
    /// Deliver the next completed result, whichever finishes first
    NextResult,
    Exit,
}

pub struct ProgressModel {
    config: Arc<RunConfig>,
    root: String,
    phase: Phase,
    spinner_frame: usize,
    discovered: usize,
    total: usize,
    processed: usize,
    aggregator: Aggregator,
    error: Option<RunError>,
}

impl ProgressModel {
    pub fn new(config: Arc<RunConfig>, root: impl Into<String>) -> Self {
        Self {
            config,
            root: root.into(),
            phase: Phase::Initializing,
            spinner_frame: 0,
            discovered: 0,
            total: 0,
            processed: 0,
            aggregator: Aggregator::new(),
            error: None,
        }
    }

    pub fn update(&mut self, message: Message) -> Command {
        if self.phase.is_terminal() {
            return Command::None;
        }

        match message {
            Message::Start => {
                if self.phase != Phase::Initializing {
                    return Command::None;
                }
                self.phase = Phase::Scanning;
                Command::Scan
            }
            Message::Tick => {
                self.spinner_frame = self.spinner_frame.wrapping_add(1);
                Command::None
            }
            Message::ScanProgress(found) => {
                if self.phase == Phase::Scanning {
                    self.discovered = found;
                }
                Command::None
            }
            Message::RepositoriesFound(repositories) => {
                if self.phase != Phase::Scanning {
                    return Command::None;
                }
                self.discovered = repositories.len();
                self.total = repositories.len();
                if repositories.is_empty() {
                    self.phase = Phase::Complete;
                    return Command::Exit;
                }
                self.phase = Phase::Processing;
                Command::Dispatch(repositories)
            }
            Message::RepoProcessed(result) => {
                if self.phase != Phase::Processing {
                    return Command::None;
                }
                self.aggregator.record(result);
                self.processed += 1;
                if self.processed >= self.total {
                    self.phase = Phase::Complete;
                    Command::Exit
                } else {
                    Command::NextResult
                }
            }
            Message::ProcessingDone(error) => {
                self.phase = Phase::Complete;
                self.error = error;
                Command::Exit
            }
            Message::Quit => {
                self.phase = Phase::Cancelled;
                Command::Exit
            }
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn spinner_frame(&self) -> usize {
        self.spinner_frame
    }

    pub fn discovered(&self) -> usize {
        self.discovered
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn error(&self) -> Option<&RunError> {
        self.error.as_ref()
    }

    /// Most recent results, newest first
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &RepositoryResult> {
        self.aggregator.results().iter().rev().take(count)
    }

    pub fn into_parts(self) -> (Aggregator, Option<RunError>) {
        (self.aggregator, self.error)
    }
}

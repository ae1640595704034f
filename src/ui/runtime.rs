//! Interactive event loop
//!
//! Drives a [`ProgressModel`]: performs each [`Command`] it returns, turns
//! ticks, key presses, shutdown signals, discovery and pipeline events into
//! [`Message`]s, and redraws the frame in place after every update.

use std::io::{self, IsTerminal, Stdout, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle as ThreadHandle;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::{cursor, terminal, QueueableCommand};
use futures::future::OptionFuture;
use tokio::sync::mpsc;

use crate::app::error::RunError;
use crate::core::shutdown::{CancelReason, ShutdownSignal};
use crate::pipeline::{ItemProcessor, Pipeline, PipelineEvent, PipelineOutcome, RunConfig};
use crate::report::{AggregateReport, Aggregator};
use crate::scanner::{discover_async, ScanOptions, ScanProgress};
use crate::ui::model::{Command, Message, Phase, ProgressModel};
use crate::ui::render::render;
use crate::vcs::VcsClient;

const TICK_INTERVAL: Duration = Duration::from_millis(100);
const KEY_POLL_INTERVAL: Duration = Duration::from_millis(100);
const SCAN_PROGRESS_BUFFER: usize = 16;

/// How an interactive run ended
#[derive(Debug)]
pub struct InteractiveOutcome {
    /// Present once dispatch started
    pub report: Option<AggregateReport>,
    pub error: Option<RunError>,
    /// The user quit before the run finished
    pub quit: bool,
}

/// Redraws a block of lines in place
struct Screen {
    out: Stdout,
    drawn: usize,
    width: usize,
}

impl Screen {
    fn new() -> Self {
        let width = terminal::size().map(|(cols, _)| cols as usize).unwrap_or(80);
        Self {
            out: io::stdout(),
            drawn: 0,
            width,
        }
    }

    fn draw(&mut self, lines: &[String]) -> io::Result<()> {
        self.out.queue(cursor::MoveToColumn(0))?;
        if self.drawn > 0 {
            self.out.queue(cursor::MoveUp(self.drawn as u16))?;
        }
        self.out
            .queue(terminal::Clear(terminal::ClearType::FromCursorDown))?;
        for line in lines {
            // Raw mode needs an explicit carriage return
            write!(self.out, "{}\r\n", line)?;
        }
        self.drawn = lines.len();
        self.out.flush()
    }
}

/// Reads q / Esc / Ctrl+C in raw mode on a dedicated thread
struct KeyReader {
    stop: Arc<AtomicBool>,
    thread: Option<ThreadHandle<()>>,
    raw_mode: bool,
}

impl KeyReader {
    fn spawn(quit_tx: mpsc::UnboundedSender<()>) -> Self {
        if !io::stdin().is_terminal() {
            return Self {
                stop: Arc::new(AtomicBool::new(true)),
                thread: None,
                raw_mode: false,
            };
        }
        let raw_mode = match terminal::enable_raw_mode() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Could not enable raw mode, key input disabled: {}", e);
                false
            }
        };

        let stop = Arc::new(AtomicBool::new(false));
        let thread = raw_mode.then(|| {
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                while !stop.load(Ordering::Acquire) {
                    match event::poll(KEY_POLL_INTERVAL) {
                        Ok(false) => continue,
                        Ok(true) => {}
                        Err(_) => break,
                    }
                    let Ok(Event::Key(key)) = event::read() else {
                        continue;
                    };
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    let quit = matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
                        || (key.code == KeyCode::Char('c')
                            && key.modifiers.contains(KeyModifiers::CONTROL));
                    if quit && quit_tx.send(()).is_err() {
                        break;
                    }
                }
            })
        });

        Self {
            stop,
            thread,
            raw_mode,
        }
    }
}

impl Drop for KeyReader {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        if self.raw_mode {
            let _ = terminal::disable_raw_mode();
        }
    }
}

async fn next_event(events: &mut Option<mpsc::Receiver<PipelineEvent>>) -> Option<PipelineEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Run discovery and processing under the live progress display
pub async fn run_interactive<V: VcsClient>(
    root: PathBuf,
    config: Arc<RunConfig>,
    client: Arc<V>,
    signal: ShutdownSignal,
    colors: bool,
) -> InteractiveOutcome {
    let mut model = ProgressModel::new(Arc::clone(&config), root.display().to_string());
    let processor = ItemProcessor::new(Arc::clone(&config), client);

    let (quit_tx, mut quit_rx) = mpsc::unbounded_channel();
    let key_reader = KeyReader::spawn(quit_tx);
    let mut screen = Screen::new();
    let mut ticker = tokio::time::interval(TICK_INTERVAL);

    let (progress_tx, mut progress_rx) = mpsc::channel::<ScanProgress>(SCAN_PROGRESS_BUFFER);
    let mut progress_tx = Some(progress_tx);
    let mut scan = None;
    let mut events = None;
    let mut pipeline_task = None;
    let mut outcome = None;
    let mut awaiting_result = false;
    let mut cancel_seen = false;

    let mut command = model.update(Message::Start);
    loop {
        match command {
            Command::None => {}
            Command::Scan => {
                let options = ScanOptions {
                    recursive: config.recursive,
                    exclude: config.exclude.clone(),
                };
                scan = Some(tokio::spawn(discover_async(
                    root.clone(),
                    options,
                    signal.clone(),
                    progress_tx.take(),
                )));
            }
            Command::Dispatch(repositories) => {
                let handle = Pipeline::spawn(repositories, processor.clone(), signal.clone());
                events = Some(handle.events);
                pipeline_task = Some(handle.task);
                awaiting_result = true;
            }
            Command::NextResult => awaiting_result = true,
            Command::Exit => break,
        }

        if let Err(e) = screen.draw(&render(&model, colors, screen.width)) {
            log::debug!("Redraw failed: {}", e);
        }

        let scanning = scan.is_some();
        let message = tokio::select! {
            _ = ticker.tick() => Message::Tick,
            Some(()) = quit_rx.recv() => Message::Quit,
            reason = signal.cancelled(), if !cancel_seen => {
                cancel_seen = true;
                match reason {
                    CancelReason::Interrupted => Message::Quit,
                    // The pipeline winds down by itself and reports every item
                    CancelReason::TimedOut => Message::Tick,
                }
            }
            Some(progress) = progress_rx.recv() => Message::ScanProgress(progress.found),
            Some(joined) = OptionFuture::from(scan.as_mut()), if scanning => {
                scan = None;
                match joined {
                    Ok(Ok(repositories)) => Message::RepositoriesFound(repositories),
                    Ok(Err(e)) => Message::ProcessingDone(Some(RunError::from(e))),
                    Err(e) => Message::ProcessingDone(Some(RunError::Runtime(format!(
                        "Scan task failed: {}",
                        e
                    )))),
                }
            }
            event = next_event(&mut events), if awaiting_result => {
                awaiting_result = false;
                match event {
                    Some(PipelineEvent::Completed(result)) => Message::RepoProcessed(result),
                    Some(PipelineEvent::Done(done)) => {
                        outcome = Some(done);
                        Message::ProcessingDone(None)
                    }
                    None => Message::ProcessingDone(Some(RunError::Runtime(
                        "Pipeline stopped without reporting every repository".to_string(),
                    ))),
                }
            }
        };
        command = model.update(message);
    }

    let quit = model.phase() == Phase::Cancelled;
    if quit {
        signal.trigger(CancelReason::Interrupted);
    }
    if let Err(e) = screen.draw(&render(&model, colors, screen.width)) {
        log::debug!("Redraw failed: {}", e);
    }
    drop(key_reader);

    if let Some(scan) = scan {
        // Discovery observes the signal and returns promptly
        let _ = scan.await;
    }

    let dispatched = events.is_some();
    let (mut aggregator, error) = model.into_parts();
    if let Some(mut rx) = events {
        outcome = outcome.or(drain(&mut aggregator, &mut rx).await);
    }
    if let Some(task) = pipeline_task {
        match task.await {
            Ok(done) => outcome = outcome.or(Some(done)),
            Err(e) => log::error!("Pipeline task failed: {}", e),
        }
    }
    if let Some(done) = outcome {
        aggregator.finish(done);
    }

    InteractiveOutcome {
        report: dispatched.then(|| aggregator.into_report()),
        error,
        quit,
    }
}

/// Record whatever the pipeline still reports after the display stopped
async fn drain(
    aggregator: &mut Aggregator,
    events: &mut mpsc::Receiver<PipelineEvent>,
) -> Option<PipelineOutcome> {
    while let Some(event) = events.recv().await {
        match event {
            PipelineEvent::Completed(result) => {
                aggregator.record(result);
            }
            PipelineEvent::Done(done) => return Some(done),
        }
    }
    None
}

use crate::catalog::{PROMPT, UNKNOWN_HINT, quick_command};
use crate::commands::{CommandBook, CommandResult, Resolution, ResultKind};
use crate::config::ConsoleTiming;
use crate::history::{History, HistoryDirection, Recall};
use crate::overlay::{EasterEgg, Overlay};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::sleep;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineKind {
    Command,
    System,
    Result,
    AiResponse,
    Loading,
    Error,
    Blank,
}

impl LineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LineKind::Command => "command",
            LineKind::System => "system",
            LineKind::Result => "result",
            LineKind::AiResponse => "ai-response",
            LineKind::Loading => "loading",
            LineKind::Error => "error",
            LineKind::Blank => "blank",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutputLine {
    pub id: u64,
    pub kind: LineKind,
    pub text: String,
}

#[derive(Debug, Default)]
struct OutputLog {
    lines: Vec<OutputLine>,
    next_id: u64,
}

impl OutputLog {
    fn push(&mut self, kind: LineKind, text: impl Into<String>) -> u64 {
        self.next_id += 1;
        self.lines.push(OutputLine {
            id: self.next_id,
            kind,
            text: text.into(),
        });
        self.next_id
    }

    fn push_blank(&mut self) {
        self.push(LineKind::Blank, String::new());
    }

    fn remove(&mut self, id: u64) {
        self.lines.retain(|line| line.id != id);
    }

    fn clear(&mut self) {
        self.lines.clear();
    }
}

#[derive(Debug, Default)]
struct ConsoleState {
    input: String,
    history: History,
    log: OutputLog,
    overlay: Option<Overlay>,
}

/// Serializable view of a console at one point in time.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleSnapshot {
    pub input: String,
    pub lines: Vec<OutputLine>,
    pub history_length: usize,
    pub history_cursor: usize,
    pub overlay: Option<Overlay>,
}

impl ConsoleSnapshot {
    pub fn count(&self, kind: LineKind) -> usize {
        self.lines.iter().filter(|line| line.kind == kind).count()
    }

    pub fn texts(&self, kind: LineKind) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|line| line.kind == kind)
            .map(|line| line.text.as_str())
            .collect()
    }
}

/// How a submission was handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    Ignored,
    Cleared,
    Static,
    Pattern { rule: &'static str },
    EasterEgg(EasterEgg),
    Unknown,
}

impl Dispatch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dispatch::Ignored => "ignored",
            Dispatch::Cleared => "cleared",
            Dispatch::Static => "static",
            Dispatch::Pattern { rule } => *rule,
            Dispatch::EasterEgg(_) => "easter-egg",
            Dispatch::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConsoleKey {
    Enter,
    ArrowUp,
    ArrowDown,
    Escape,
}

/// Input coming from the page hosting the console.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ConsoleEvent {
    Input { value: String },
    Key { key: ConsoleKey },
    QuickCommand { id: String },
    Run,
    OverlayBackdrop,
}

/// Result of handling an event: either the state was updated in place, or
/// a submission took its turn and is waiting to be finished.
#[derive(Debug)]
pub enum EventOutcome {
    Updated,
    Queued(Submission),
}

#[derive(Debug, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("Unknown quick command \"{0}\"")]
    UnknownQuickCommand(String),
}

/// A submission that holds the console's dispatch turn. Its history entry
/// and echo line are already in place; [`Submission::finish`] plays the
/// response and releases the turn.
#[derive(Debug)]
pub struct Submission {
    console: Arc<Console>,
    text: String,
    resolution: Resolution,
    _turn: OwnedMutexGuard<()>,
}

impl Submission {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub async fn finish(self) -> Dispatch {
        let Submission {
            console,
            text,
            resolution,
            _turn,
        } = self;
        console.play(&text, resolution).await
    }
}

/// Scripted console: input field, output log, command history and the
/// easter-egg overlay.
///
/// Submissions are serialized through `gate` in the order they reach it, so
/// a command's loading line is always removed before the next command
/// echoes. `state` is only held for short, non-suspending sections.
#[derive(Debug)]
pub struct Console {
    book: Arc<CommandBook>,
    timing: ConsoleTiming,
    state: Mutex<ConsoleState>,
    gate: Arc<Mutex<()>>,
}

impl Console {
    pub fn new(book: Arc<CommandBook>, timing: ConsoleTiming) -> Self {
        Self::with_banner(book, timing, Vec::new())
    }

    /// Console whose log starts with the given system lines and a blank line.
    pub fn with_banner(book: Arc<CommandBook>, timing: ConsoleTiming, banner: Vec<String>) -> Self {
        let mut state = ConsoleState::default();
        if !banner.is_empty() {
            for line in banner {
                state.log.push(LineKind::System, line);
            }
            state.log.push_blank();
        }
        Self {
            book,
            timing,
            state: Mutex::new(state),
            gate: Arc::new(Mutex::new(())),
        }
    }

    pub async fn snapshot(&self) -> ConsoleSnapshot {
        let state = self.state.lock().await;
        ConsoleSnapshot {
            input: state.input.clone(),
            lines: state.log.lines.clone(),
            history_length: state.history.len(),
            history_cursor: state.history.cursor(),
            overlay: state.overlay.clone(),
        }
    }

    pub async fn has_history(&self) -> bool {
        !self.state.lock().await.history.is_empty()
    }

    pub async fn set_input(&self, value: &str) {
        self.state.lock().await.input = value.to_string();
    }

    pub async fn push_input_char(&self, value: char) {
        self.state.lock().await.input.push(value);
    }

    pub async fn navigate(&self, direction: HistoryDirection) {
        let mut state = self.state.lock().await;
        match state.history.step(direction) {
            Recall::Entry(entry) => state.input = entry,
            Recall::Blank => state.input.clear(),
            Recall::Unchanged => {}
        }
    }

    pub async fn dismiss_overlay(&self) -> bool {
        self.state.lock().await.overlay.take().is_some()
    }

    /// Applies a page event. Submitting events clear the input field and
    /// wait for the dispatch turn; once they return, the echo is in the log
    /// and the caller finishes the submission inline or on a task.
    pub async fn handle_event(self: &Arc<Self>, event: ConsoleEvent) -> Result<EventOutcome, EventError> {
        let line = match event {
            ConsoleEvent::Input { value } => {
                self.set_input(&value).await;
                return Ok(EventOutcome::Updated);
            }
            ConsoleEvent::Key { key: ConsoleKey::ArrowUp } => {
                self.navigate(HistoryDirection::Previous).await;
                return Ok(EventOutcome::Updated);
            }
            ConsoleEvent::Key { key: ConsoleKey::ArrowDown } => {
                self.navigate(HistoryDirection::Next).await;
                return Ok(EventOutcome::Updated);
            }
            ConsoleEvent::Key { key: ConsoleKey::Escape } | ConsoleEvent::OverlayBackdrop => {
                self.dismiss_overlay().await;
                return Ok(EventOutcome::Updated);
            }
            ConsoleEvent::Key { key: ConsoleKey::Enter } | ConsoleEvent::Run => {
                std::mem::take(&mut self.state.lock().await.input)
            }
            ConsoleEvent::QuickCommand { id } => {
                let quick = quick_command(&id).ok_or(EventError::UnknownQuickCommand(id))?;
                self.state.lock().await.input.clear();
                quick.command.to_string()
            }
        };
        Ok(match self.enqueue(&line).await {
            Some(submission) => EventOutcome::Queued(submission),
            None => EventOutcome::Updated,
        })
    }

    /// Takes the next dispatch turn for `raw` and echoes it. Blank lines are
    /// ignored and return `None`.
    pub async fn enqueue(self: &Arc<Self>, raw: &str) -> Option<Submission> {
        self.reserve(raw, false).await
    }

    pub async fn submit(self: &Arc<Self>, raw: &str) -> Dispatch {
        match self.enqueue(raw).await {
            Some(submission) => submission.finish().await,
            None => Dispatch::Ignored,
        }
    }

    /// Submits only while nothing has been submitted yet. The check runs
    /// after the turn is taken, so a queued user command always wins.
    pub async fn submit_if_pristine(self: &Arc<Self>, raw: &str) -> Option<Dispatch> {
        let submission = self.reserve(raw, true).await?;
        Some(submission.finish().await)
    }

    async fn reserve(self: &Arc<Self>, raw: &str, pristine_only: bool) -> Option<Submission> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        let turn = self.gate.clone().lock_owned().await;
        {
            let mut state = self.state.lock().await;
            if pristine_only {
                if !state.history.is_empty() {
                    return None;
                }
                state.input.clear();
            }
            state.history.push(text.to_string());
            state.log.push(LineKind::Command, format!("{PROMPT} {text}"));
        }
        Some(Submission {
            console: self.clone(),
            text: text.to_string(),
            resolution: self.book.resolve(text),
            _turn: turn,
        })
    }

    async fn play(&self, text: &str, resolution: Resolution) -> Dispatch {
        match resolution {
            Resolution::Clear => {
                self.state.lock().await.log.clear();
                Dispatch::Cleared
            }
            Resolution::System(lines) => {
                sleep(self.timing.static_delay).await;
                let mut state = self.state.lock().await;
                for line in lines {
                    state.log.push(LineKind::System, line);
                }
                state.log.push_blank();
                Dispatch::Static
            }
            Resolution::Pattern { rule, result } => self.play_result(rule, result).await,
            Resolution::Unknown => {
                sleep(self.timing.unknown_delay).await;
                let mut state = self.state.lock().await;
                state
                    .log
                    .push(LineKind::Error, format!("Nieznane polecenie: {text}"));
                state.log.push(LineKind::System, UNKNOWN_HINT);
                state.log.push_blank();
                Dispatch::Unknown
            }
        }
    }

    async fn play_result(&self, rule: &'static str, result: CommandResult) -> Dispatch {
        let loading_id = self
            .state
            .lock()
            .await
            .log
            .push(LineKind::Loading, result.loading_text.clone());

        sleep(self.loading_delay()).await;

        let mut state = self.state.lock().await;
        state.log.remove(loading_id);
        let line_kind = match result.kind {
            ResultKind::EasterEgg(egg) => {
                state.overlay = Some(Overlay::for_egg(egg));
                state
                    .log
                    .push(LineKind::System, format!("🐱 Otwieram galerię: {}", egg.label()));
                state.log.push_blank();
                return Dispatch::EasterEgg(egg);
            }
            ResultKind::Ai => LineKind::AiResponse,
            ResultKind::Result => LineKind::Result,
        };
        for line in result.response_lines {
            state.log.push(line_kind, line);
        }
        state.log.push_blank();
        Dispatch::Pattern { rule }
    }

    fn loading_delay(&self) -> Duration {
        let min = self.timing.loading_min.as_millis() as u64;
        let max = self.timing.loading_max.as_millis() as u64;
        if max <= min {
            return self.timing.loading_min;
        }
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}

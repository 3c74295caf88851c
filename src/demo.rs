use crate::catalog::DEMO_COMMAND;
use crate::config::DemoSettings;
use crate::console::{Console, Dispatch};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DemoOutcome {
    /// The visitor had already submitted something before typing started.
    Skipped,
    /// The visitor submitted something while the demo was typing.
    Interrupted,
    Completed(Dispatch),
}

impl DemoOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemoOutcome::Skipped => "skipped",
            DemoOutcome::Interrupted => "interrupted",
            DemoOutcome::Completed(_) => "completed",
        }
    }
}

/// Types a canned command into an untouched console and submits it.
#[derive(Clone, Debug)]
pub struct DemoPlayer {
    command: String,
    settings: DemoSettings,
}

impl DemoPlayer {
    pub fn new(settings: DemoSettings) -> Self {
        Self {
            command: DEMO_COMMAND.to_string(),
            settings,
        }
    }

    pub async fn run(&self, console: Arc<Console>) -> DemoOutcome {
        sleep(self.settings.start_delay).await;
        if console.has_history().await {
            return DemoOutcome::Skipped;
        }

        console.set_input("").await;
        for character in self.command.chars() {
            sleep(self.keystroke_delay()).await;
            if console.has_history().await {
                return DemoOutcome::Interrupted;
            }
            console.push_input_char(character).await;
        }

        match console.submit_if_pristine(&self.command).await {
            Some(dispatch) => DemoOutcome::Completed(dispatch),
            None => DemoOutcome::Interrupted,
        }
    }

    fn keystroke_delay(&self) -> Duration {
        let min = self.settings.typing_min.as_millis() as u64;
        let max = self.settings.typing_max.as_millis() as u64;
        if max <= min {
            return self.settings.typing_min;
        }
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::standard_book;
    use crate::config::ConsoleTiming;
    use crate::console::LineKind;
    use pretty_assertions::assert_eq;

    fn console() -> Arc<Console> {
        Arc::new(Console::new(
            Arc::new(standard_book().unwrap()),
            ConsoleTiming::instant(),
        ))
    }

    fn quick_settings() -> DemoSettings {
        DemoSettings {
            enabled: true,
            start_delay: Duration::from_millis(500),
            typing_min: Duration::from_millis(10),
            typing_max: Duration::from_millis(20),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn types_and_submits_on_untouched_console() {
        let console = console();
        let outcome = DemoPlayer::new(quick_settings()).run(console.clone()).await;
        assert_eq!(
            outcome,
            DemoOutcome::Completed(Dispatch::Pattern { rule: "search" })
        );
        let snapshot = console.snapshot().await;
        assert_eq!(snapshot.input, "");
        assert_eq!(snapshot.history_length, 1);
        assert_eq!(snapshot.lines[0].kind, LineKind::Command);
        assert!(snapshot.lines[0].text.ends_with(DEMO_COMMAND));
    }

    #[tokio::test(start_paused = true)]
    async fn skips_when_visitor_already_submitted() {
        let console = console();
        console.submit("help").await;
        let outcome = DemoPlayer::new(quick_settings()).run(console.clone()).await;
        assert_eq!(outcome, DemoOutcome::Skipped);
        assert_eq!(console.snapshot().await.history_length, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_typing_when_visitor_submits_midway() {
        let console = console();
        let demo = tokio::spawn({
            let console = console.clone();
            async move { DemoPlayer::new(quick_settings()).run(console).await }
        });

        sleep(Duration::from_millis(600)).await;
        let partial = console.snapshot().await.input;
        assert!(!partial.is_empty());
        assert!(DEMO_COMMAND.starts_with(&partial));

        console.submit("kontakt").await;
        assert_eq!(demo.await.unwrap(), DemoOutcome::Interrupted);
        let snapshot = console.snapshot().await;
        assert_eq!(snapshot.history_length, 1);
        assert_eq!(snapshot.count(LineKind::Command), 1);
    }
}

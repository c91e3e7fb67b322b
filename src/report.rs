use std::sync::Mutex;
use std::time::Instant;

use colored::Colorize;
use directive_engine::{ProgressObserver, StepKind};

/// Progress observer that prints one colored status line per notification.
///
/// Steps arrive strictly sequentially, so a single start-time slot is
/// enough to attach durations to terminal lines.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    started: Mutex<Option<Instant>>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_started(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        match self.started.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn elapsed_suffix(&self) -> String {
        match self.lock_started().take() {
            Some(at) => format!(" ({}ms)", at.elapsed().as_millis()),
            None => String::new(),
        }
    }

    fn prefix() -> colored::ColoredString {
        "quill".blue().bold()
    }

    fn start_verb(kind: StepKind) -> &'static str {
        match kind {
            StepKind::Analyze => "Analyzing",
            StepKind::EnsureDirectory => "Preparing directory",
            StepKind::CreateFile => "Creating",
            StepKind::UpdateFile => "Updating",
            StepKind::Verify => "Verifying",
            StepKind::RunCommand => "Running",
        }
    }

    fn complete_verb(kind: StepKind) -> &'static str {
        match kind {
            StepKind::Analyze => "Analyzed",
            StepKind::EnsureDirectory => "Directory ready",
            StepKind::CreateFile => "Created",
            StepKind::UpdateFile => "Updated",
            StepKind::Verify => "Verified",
            StepKind::RunCommand => "Finished",
        }
    }
}

impl ProgressObserver for ConsoleReporter {
    fn start(&self, kind: StepKind, detail: &str) {
        *self.lock_started() = Some(Instant::now());
        println!(
            "{} {} {}",
            Self::prefix(),
            Self::start_verb(kind).cyan(),
            detail
        );
    }

    fn complete(&self, kind: StepKind, detail: &str) {
        let suffix = self.elapsed_suffix();
        println!(
            "{} {} {}{}",
            Self::prefix(),
            format!("✓ {}", Self::complete_verb(kind)).green(),
            detail,
            suffix.dimmed()
        );
    }

    fn fail(&self, kind: StepKind, detail: &str) {
        let _ = self.elapsed_suffix();
        println!(
            "{} {} {}",
            Self::prefix(),
            format!("✗ {} failed", Self::start_verb(kind)).red(),
            detail
        );
    }
}

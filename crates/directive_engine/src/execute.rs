//! Plan execution: the sole owner of side effects.
//!
//! A plan runs in a fixed phase order: ensure the working directory, ensure
//! parent directories, write files, run commands. Everything is sequential;
//! the engine never issues the next filesystem or process call before the
//! previous one resolves. A failed item is recorded and execution moves on;
//! only the working-directory precondition aborts the turn.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use wait_timeout::ChildExt;

use crate::error::EngineError;
use crate::progress::{ProgressObserver, StepKind};
use crate::types::{ExecutionOutcome, ExecutionPlan, PlanItem, TurnReport};

const DEFAULT_COMMAND_TIMEOUT_SEC: u64 = 120;
const COMMAND_MAX_OUTPUT_BYTES: usize = 100 * 1024;

/// Applies an [`ExecutionPlan`] and reports one outcome per item.
pub struct ExecutionEngine<'a> {
    observer: &'a dyn ProgressObserver,
    command_timeout: Duration,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> ExecutionEngine<'a> {
    pub fn new(observer: &'a dyn ProgressObserver) -> Self {
        Self {
            observer,
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SEC),
            cancel: None,
        }
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Installs a cooperative cancellation flag.
    ///
    /// Checked between items only: an in-flight write or child process is
    /// allowed to finish, but no new item starts once the flag is set.
    pub fn with_cancel_signal(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Runs the plan to completion (or cancellation).
    ///
    /// Returns `Err` only for the working-directory precondition; every
    /// other failure is a `Failed` outcome inside the report.
    pub fn execute(&self, plan: &ExecutionPlan) -> Result<TurnReport, EngineError> {
        self.ensure_working_dir(&plan.working_dir)?;

        let mut report = TurnReport::default();

        for directory in &plan.directories {
            if self.cancelled() {
                return Ok(report);
            }
            self.ensure_directory(plan, directory);
        }

        for item in &plan.files {
            if self.cancelled() {
                return Ok(report);
            }
            report.outcomes.push(self.apply_file(plan, item));
        }

        for command in &plan.commands {
            if self.cancelled() {
                return Ok(report);
            }
            report.outcomes.push(self.run_command(plan, command));
        }

        Ok(report)
    }

    fn ensure_working_dir(&self, working_dir: &Path) -> Result<(), EngineError> {
        let label = working_dir.display().to_string();
        self.observer.start(StepKind::EnsureDirectory, &label);

        if let Err(error) = fs::create_dir_all(working_dir) {
            let error = EngineError::precondition(working_dir, error.to_string());
            self.observer
                .fail(StepKind::EnsureDirectory, &error.to_string());
            return Err(error);
        }

        self.observer.complete(StepKind::EnsureDirectory, &label);
        Ok(())
    }

    fn ensure_directory(&self, plan: &ExecutionPlan, directory: &Path) {
        let label = display_path(plan, directory);
        self.observer.start(StepKind::EnsureDirectory, &label);

        match fs::create_dir_all(directory) {
            Ok(()) => self.observer.complete(StepKind::EnsureDirectory, &label),
            Err(error) => {
                // Dependent file items will fail individually; keep going.
                debug!("directory ensure failed for {label}: {error}");
                self.observer
                    .fail(StepKind::EnsureDirectory, &format!("{label}: {error}"));
            }
        }
    }

    fn apply_file(&self, plan: &ExecutionPlan, item: &PlanItem) -> ExecutionOutcome {
        let kind = if item.existed_before {
            StepKind::UpdateFile
        } else {
            StepKind::CreateFile
        };
        let label = display_path(plan, &item.resolved_path);

        self.observer.start(kind, &label);
        if let Err(error) = fs::write(&item.resolved_path, &item.directive.content) {
            let message = format!("write failed: {error}");
            self.observer.fail(kind, &format!("{label}: {message}"));
            return ExecutionOutcome::failed(label, message);
        }
        self.observer.complete(kind, &label);

        // Distinguishes "wrote bytes" from "usable file": the path must read
        // back non-empty even though the write syscall reported success.
        self.observer.start(StepKind::Verify, &label);
        match fs::read(&item.resolved_path) {
            Ok(bytes) if !bytes.is_empty() => {
                self.observer.complete(StepKind::Verify, &label);
                ExecutionOutcome::succeeded(label)
            }
            Ok(_) => {
                let message = "verification failed: file is empty".to_string();
                self.observer
                    .fail(StepKind::Verify, &format!("{label}: {message}"));
                ExecutionOutcome::failed(label, message)
            }
            Err(error) => {
                let message = format!("verification failed: {error}");
                self.observer
                    .fail(StepKind::Verify, &format!("{label}: {message}"));
                ExecutionOutcome::failed(label, message)
            }
        }
    }

    fn run_command(&self, plan: &ExecutionPlan, command: &str) -> ExecutionOutcome {
        self.observer.start(StepKind::RunCommand, command);

        let mut builder = Command::new("bash");
        builder
            .arg("-lc")
            .arg(command)
            .current_dir(&plan.working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match builder.spawn() {
            Ok(child) => child,
            Err(error) => {
                let message = format!("failed to launch: {error}");
                self.observer
                    .fail(StepKind::RunCommand, &format!("{command}: {message}"));
                return ExecutionOutcome::failed(command, message);
            }
        };

        let timeout_sec = self.command_timeout.as_secs();
        let status = match child.wait_timeout(self.command_timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                let message = format!("timed out after {timeout_sec}s");
                self.observer
                    .fail(StepKind::RunCommand, &format!("{command}: {message}"));
                return ExecutionOutcome::failed(command, message);
            }
            Err(error) => {
                let _ = child.kill();
                let message = format!("failed waiting for command: {error}");
                self.observer
                    .fail(StepKind::RunCommand, &format!("{command}: {message}"));
                return ExecutionOutcome::failed(command, message);
            }
        };

        let stdout = read_pipe_bytes(child.stdout.take());
        let stderr = read_pipe_bytes(child.stderr.take());

        if status.success() {
            self.observer.complete(StepKind::RunCommand, command);
            return ExecutionOutcome::succeeded(command);
        }

        let captured = if stderr.is_empty() { stdout } else { stderr };
        let message = format!(
            "{}: {}",
            format_exit_status(status),
            truncate_to_byte_limit(
                String::from_utf8_lossy(&captured).trim().to_string(),
                COMMAND_MAX_OUTPUT_BYTES,
            )
        );
        self.observer
            .fail(StepKind::RunCommand, &format!("{command}: {message}"));
        ExecutionOutcome::failed(command, message)
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|cancel| cancel.load(Ordering::SeqCst))
    }
}

fn display_path(plan: &ExecutionPlan, path: &Path) -> String {
    path.strip_prefix(&plan.working_dir)
        .map(|relative| relative.display().to_string())
        .unwrap_or_else(|_| path.display().to_string())
}

fn read_pipe_bytes(pipe: Option<impl Read>) -> Vec<u8> {
    let Some(mut pipe) = pipe else {
        return Vec::new();
    };

    let mut bytes = Vec::new();
    let _ = pipe.read_to_end(&mut bytes);
    bytes
}

fn truncate_to_byte_limit(content: String, max_bytes: usize) -> String {
    if content.len() <= max_bytes {
        return content;
    }

    let mut cutoff = max_bytes.min(content.len());
    while cutoff > 0 && !content.is_char_boundary(cutoff) {
        cutoff -= 1;
    }

    let mut truncated = content[..cutoff].to_string();
    truncated.push_str("\n[truncated]");
    truncated
}

fn format_exit_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit_code={code}"),
        None => "exit_code=terminated_by_signal".to_string(),
    }
}

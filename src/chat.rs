use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use directive_engine::{
    build_plan, parse_directives, ExecutionEngine, ProgressObserver, StreamFilter, TurnReport,
};
use log::debug;
use model_gateway::{CancelSignal, ChatBackend, ChatMessage, StreamEvent};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use settings_store::SettingsStore;

use crate::banner;
use crate::commands::{parse_slash_command, SlashCommand};
use crate::providers;
use crate::report::ConsoleReporter;

/// Protocol block appended to every system prompt. The model writes these
/// markers; the user never sees them.
const DIRECTIVE_INSTRUCTIONS: &str = r#"When you need to create or modify files or run commands, embed action directives in your reply. They execute locally and are hidden from the user:

**QUILL_CREATE_FILE: path/to/file.ext**
```language
file content here
```

**QUILL_EDIT_FILE: path/to/file.ext** followed by the same fenced block shape replaces an existing file's full content.

**QUILL_RUN_COMMAND: command**

Rules: always include a language tag and non-empty content in file blocks; describe what you are doing in normal text around the directives; prefer EDIT for files that already exist; commands run after all file writes, in order."#;

const HELP_TEXT: &str = "Commands: /help, /clear, /model <id>, /system <prompt>, /cd <dir>, /exit";

fn build_instructions(system_prompt: &str, working_dir: &Path) -> String {
    format!(
        "{system_prompt}\n\n{DIRECTIVE_INSTRUCTIONS}\n\nCurrent working directory: {}",
        working_dir.display()
    )
}

/// One conversation bound to a backend and a working directory.
///
/// Holds model-facing history across turns; no directive or plan state
/// survives a turn, only the filesystem does.
pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    history: Vec<ChatMessage>,
    system_prompt: String,
    working_dir: PathBuf,
}

impl ChatSession {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        system_prompt: impl Into<String>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            backend,
            history: Vec::new(),
            system_prompt: system_prompt.into(),
            working_dir: working_dir.into(),
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Updates the working directory used by subsequent turns. The process
    /// current directory is never touched.
    pub fn set_working_dir(&mut self, working_dir: impl Into<PathBuf>) {
        self.working_dir = working_dir.into();
    }

    pub fn set_system_prompt(&mut self, system_prompt: impl Into<String>) {
        self.system_prompt = system_prompt.into();
    }

    pub fn set_backend(&mut self, backend: Arc<dyn ChatBackend>) {
        self.backend = backend;
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Model-facing history retained across turns (without the per-turn
    /// system message).
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Runs one complete turn: stream the response (fanning each fragment
    /// out to `display` through the filter and to the raw accumulator),
    /// then parse, plan and execute its directives.
    ///
    /// Gateway failures and the working-directory precondition surface as
    /// errors; everything else lands in the returned report.
    pub fn run_turn(
        &mut self,
        prompt: &str,
        cancel: CancelSignal,
        display: &mut dyn FnMut(&str),
        observer: &dyn ProgressObserver,
    ) -> Result<TurnReport> {
        let mut messages = vec![ChatMessage::system(build_instructions(
            &self.system_prompt,
            &self.working_dir,
        ))];
        messages.extend(self.history.iter().cloned());
        messages.push(ChatMessage::user(prompt));

        let mut raw = String::new();
        let mut filter = StreamFilter::new();
        let mut stream_error: Option<String> = None;

        self.backend
            .stream(&messages, Arc::clone(&cancel), &mut |event| match event {
                StreamEvent::Started => {}
                StreamEvent::Delta { text } => {
                    raw.push_str(&text);
                    let shown = filter.push(&text);
                    if !shown.is_empty() {
                        display(&shown);
                    }
                }
                StreamEvent::Finished => {
                    let rest = filter.finish();
                    if !rest.is_empty() {
                        display(&rest);
                    }
                }
                StreamEvent::Failed { error } => {
                    stream_error = Some(error);
                }
            })
            .map_err(|error| anyhow!("model call failed: {error}"))?;

        if let Some(error) = stream_error {
            return Err(anyhow!("model call failed: {error}"));
        }

        if cancel.load(Ordering::SeqCst) {
            // Interrupted mid-stream: the prose shown so far stands, but an
            // incomplete response is neither parsed nor remembered.
            debug!("turn cancelled after {} raw bytes", raw.len());
            return Ok(TurnReport::default());
        }

        self.history.push(ChatMessage::user(prompt));
        self.history.push(ChatMessage::assistant(raw.clone()));

        let parsed = parse_directives(&raw);
        debug!(
            "turn produced {} directive(s), {} diagnostic(s)",
            parsed.directives.len(),
            parsed.diagnostics.len()
        );

        let mut report = TurnReport::default();
        if !parsed.directives.is_empty() {
            let plan = build_plan(&parsed.directives, &self.working_dir, observer)
                .context("turn aborted before any action")?;
            report = ExecutionEngine::new(observer)
                .with_cancel_signal(cancel)
                .execute(&plan)
                .context("turn aborted before any action")?;
        }
        report.diagnostics = parsed.diagnostics;
        Ok(report)
    }
}

/// Options for an interactive session, from CLI flags.
#[derive(Debug, Default, Clone)]
pub struct ChatOptions {
    pub model: Option<String>,
    pub system: Option<String>,
    pub dir: Option<PathBuf>,
}

enum Flow {
    Continue,
    Exit,
}

/// Runs the interactive chat loop until `/exit` or end of input.
pub fn run(options: ChatOptions) -> Result<()> {
    let root = settings_store::config_root()?;
    let mut store = SettingsStore::load_or_default(&root)?;

    let model_id = options
        .model
        .unwrap_or_else(|| store.settings.default_model.clone());
    let system_prompt = options
        .system
        .unwrap_or_else(|| store.settings.system_prompt.clone());

    let process_cwd = std::env::current_dir().context("cannot determine current directory")?;
    let working_dir = match options.dir {
        Some(dir) if dir.is_absolute() => dir,
        Some(dir) => process_cwd.join(dir),
        None => process_cwd,
    };

    let backend = providers::backend_for_model(&model_id, &store)?;
    let profile = backend.profile();

    println!("{}", banner::banner());
    println!(
        "{} model: {}   directory: {}",
        banner::small(),
        profile.model_id.yellow(),
        working_dir.display().to_string().yellow()
    );
    println!("{}", HELP_TEXT.dimmed());
    println!("{}\n", "Ctrl-C cancels a streaming answer; /exit quits.".dimmed());

    let cancel: CancelSignal = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&cancel))
        .context("failed to install interrupt handler")?;

    let mut session = ChatSession::new(backend, system_prompt, working_dir);
    let reporter = ConsoleReporter::new();
    let mut editor = DefaultEditor::new().context("failed to initialize input editor")?;

    loop {
        cancel.store(false, Ordering::SeqCst);

        match editor.readline("You: ") {
            Ok(line) => {
                let input = line.trim().to_string();
                if input.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(&input);

                if let Some(command) = parse_slash_command(&input) {
                    match handle_command(command, &mut session, &mut store)? {
                        Flow::Continue => continue,
                        Flow::Exit => break,
                    }
                }

                print!("{} ", "Quill:".green().bold());
                flush_stdout();
                let result = session.run_turn(
                    &input,
                    Arc::clone(&cancel),
                    &mut |text| {
                        print!("{text}");
                        flush_stdout();
                    },
                    &reporter,
                );
                println!();

                match result {
                    Ok(report) => print_turn_summary(&report),
                    Err(error) => println!("{} {error:#}", "✗".red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "(use /exit to quit)".dimmed());
            }
            Err(ReadlineError::Eof) => break,
            Err(error) => return Err(error).context("input error"),
        }
    }

    println!("{}", "Bye!".cyan());
    Ok(())
}

fn handle_command(
    command: SlashCommand,
    session: &mut ChatSession,
    store: &mut SettingsStore,
) -> Result<Flow> {
    match command {
        SlashCommand::Help => println!("{}", HELP_TEXT.dimmed()),
        SlashCommand::Clear => {
            session.clear();
            println!("{}", "History cleared.".yellow());
        }
        SlashCommand::Model(model_id) => {
            if model_id.is_empty() {
                println!("{}", "Usage: /model <model-id>".red());
            } else {
                match providers::backend_for_model(&model_id, store) {
                    Ok(backend) => {
                        session.set_backend(backend);
                        store.settings.default_model = model_id.clone();
                        store.save()?;
                        println!("{} {}", "Switched to".green(), model_id.yellow());
                    }
                    Err(error) => println!("{} {error:#}", "✗".red()),
                }
            }
        }
        SlashCommand::System(prompt) => {
            if prompt.is_empty() {
                println!("{}", "Usage: /system <prompt>".red());
            } else {
                session.set_system_prompt(prompt.clone());
                store.settings.system_prompt = prompt;
                store.save()?;
                println!("{}", "System prompt updated.".green());
            }
        }
        SlashCommand::Cd(dir) => {
            if dir.is_empty() {
                println!("{}", session.working_dir().display());
            } else {
                let target = Path::new(&dir);
                let resolved = if target.is_absolute() {
                    target.to_path_buf()
                } else {
                    session.working_dir().join(target)
                };
                session.set_working_dir(resolved.clone());
                println!("{} {}", "Working directory:".green(), resolved.display());
            }
        }
        SlashCommand::Exit => return Ok(Flow::Exit),
        SlashCommand::Unknown(command) => {
            println!("{} {command}", "Unknown command:".red());
        }
    }
    Ok(Flow::Continue)
}

fn print_turn_summary(report: &TurnReport) {
    for diagnostic in &report.diagnostics {
        println!("{} {diagnostic}", "skipped:".yellow());
    }

    if report.outcomes.is_empty() {
        return;
    }

    let failures = report.failure_count();
    if failures == 0 {
        println!(
            "{}",
            format!("All {} action(s) completed.", report.outcomes.len()).green()
        );
    } else {
        println!(
            "{}",
            format!(
                "{failures} of {} action(s) failed.",
                report.outcomes.len()
            )
            .red()
        );
    }
}

fn flush_stdout() {
    let _ = std::io::stdout().flush();
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rustyline::DefaultEditor;
use settings_store::SettingsStore;

use quill::banner;
use quill::catalog::{find_model, AVAILABLE_MODELS};
use quill::chat::{self, ChatOptions};
use quill::providers::model_is_available;

#[derive(Parser)]
#[command(
    name = "quill",
    version,
    about = "Chat with AI models that can build things in your workspace"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start a chat session
    #[command(alias = "c")]
    Chat {
        /// Model id to chat with
        #[arg(short, long)]
        model: Option<String>,
        /// System prompt override for this session
        #[arg(short, long)]
        system: Option<String>,
        /// Working directory for file and command actions
        #[arg(short = 'C', long)]
        dir: Option<std::path::PathBuf>,
    },
    /// List available models and their status
    Models,
    /// Configure API keys and defaults
    Config {
        /// API key to store (requires --model to pick the provider)
        #[arg(short, long)]
        key: Option<String>,
        /// Model id: with --key selects the provider, alone sets the default
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Guided first-run configuration
    Setup,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        None => chat::run(ChatOptions::default()),
        Some(Command::Chat { model, system, dir }) => chat::run(ChatOptions { model, system, dir }),
        Some(Command::Models) => models_command(),
        Some(Command::Config { key, model }) => config_command(key, model),
        Some(Command::Setup) => setup_command(),
    }
}

fn load_store() -> Result<SettingsStore> {
    let root = settings_store::config_root()?;
    SettingsStore::load_or_default(&root).context("failed to load settings")
}

fn models_command() -> Result<()> {
    let store = load_store()?;
    println!("{} {}\n", banner::small(), "Available models".cyan());

    for spec in AVAILABLE_MODELS {
        let status = if model_is_available(spec, &store) {
            "available".green()
        } else {
            "needs api key".red()
        };
        println!(
            "{} {} - {}",
            format!("[{}]", spec.provider.id().to_uppercase()).blue(),
            spec.name.bold(),
            spec.description
        );
        println!("  id: {}   context: {}   streaming: {}   status: {}",
            spec.id,
            spec.context_tokens,
            if spec.supports_streaming { "yes" } else { "no" },
            status
        );
        println!();
    }

    println!(
        "{}",
        "Use `quill config --key <key> --model <id>` to add credentials.".dimmed()
    );
    println!(
        "{}",
        "For Ollama models, make sure Ollama is running locally.".dimmed()
    );
    Ok(())
}

fn config_command(key: Option<String>, model: Option<String>) -> Result<()> {
    let mut store = load_store()?;

    match (key, model) {
        (Some(key), Some(model_id)) => {
            let Some(spec) = find_model(&model_id) else {
                println!("{} unknown model: {model_id}", "✗".red());
                return Ok(());
            };
            let Some(key_name) = spec.provider.settings_key() else {
                println!(
                    "{} {} models need no API key",
                    "✗".red(),
                    spec.provider.id()
                );
                return Ok(());
            };
            store.set_api_key(key_name, key);
            store.save()?;
            println!("{} API key saved for {}", "✓".green(), spec.provider.id());
        }
        (Some(_), None) => {
            println!("{} --key needs --model to pick the provider", "✗".red());
        }
        (None, Some(model_id)) => {
            if find_model(&model_id).is_none() {
                println!("{} unknown model: {model_id}", "✗".red());
                return Ok(());
            }
            store.settings.default_model = model_id.clone();
            store.save()?;
            println!("{} default model set to {model_id}", "✓".green());
        }
        (None, None) => view_config(&store),
    }
    Ok(())
}

fn view_config(store: &SettingsStore) {
    println!("{} {}\n", banner::small(), "Current configuration".cyan());
    println!("Settings file: {}", store.path().display());
    println!(
        "Default model: {}",
        store.settings.default_model.yellow()
    );
    println!("System prompt: {}", store.settings.system_prompt.yellow());
    for (label, key_name) in [
        ("OpenAI API key", "openai_api_key"),
        ("Anthropic API key", "anthropic_api_key"),
        ("xAI API key", "xai_api_key"),
    ] {
        let status = if store.api_key_for(key_name).is_some() {
            "set".green()
        } else {
            "not set".red()
        };
        println!("{label}: {status}");
    }
}

fn setup_command() -> Result<()> {
    let mut store = load_store()?;
    let mut editor = DefaultEditor::new().context("failed to initialize input editor")?;

    println!("{}", banner::banner());
    println!("{} {}\n", banner::small(), "Setup".cyan());

    for (index, spec) in AVAILABLE_MODELS.iter().enumerate() {
        println!(
            "  {:2}. {} ({}) - {}",
            index + 1,
            spec.id.bold(),
            spec.provider.id(),
            spec.description
        );
    }
    println!();

    let default_model = store.settings.default_model.clone();
    let answer = editor
        .readline(&format!("Model id [{default_model}]: "))
        .context("setup interrupted")?;
    let chosen = {
        let answer = answer.trim();
        if answer.is_empty() {
            default_model
        } else {
            answer.to_string()
        }
    };

    let Some(spec) = find_model(&chosen) else {
        println!("{} unknown model: {chosen}", "✗".red());
        return Ok(());
    };
    store.settings.default_model = spec.id.to_string();

    if let Some(key_name) = spec.provider.settings_key() {
        if store.api_key_for(key_name).is_none() {
            let key = editor
                .readline(&format!("{} API key: ", spec.provider.id()))
                .context("setup interrupted")?;
            let key = key.trim();
            if key.is_empty() {
                println!(
                    "{}",
                    "No key entered; you can add one later with `quill config`.".yellow()
                );
            } else {
                store.set_api_key(key_name, key);
            }
        }
    }

    store.save()?;
    println!(
        "{} Saved. Start chatting with {}",
        "✓".green(),
        "`quill chat`".bold()
    );
    Ok(())
}

use colored::Colorize;

const BANNER: &str = r#"
  ██████  ██    ██ ██ ██      ██
 ██    ██ ██    ██ ██ ██      ██
 ██    ██ ██    ██ ██ ██      ██
 ██ ▄▄ ██ ██    ██ ██ ██      ██
  ██████   ██████  ██ ███████ ███████
     ▀▀
"#;

/// Full startup banner.
pub fn banner() -> String {
    format!(
        "{}\n {}\n",
        BANNER.cyan(),
        "Chat with your models. Let them build.".dimmed()
    )
}

/// Compact prefix used by subcommand headers.
pub fn small() -> String {
    format!("{}", "quill".blue().bold())
}

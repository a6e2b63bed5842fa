//! Terminal output for the cloudvox CLI
//!
//! Answers and status lines go to stdout, errors to stderr. With colors off
//! every marker falls back to a bracketed tag so logs stay greppable.

use owo_colors::OwoColorize;
use std::io::{self, Write};

const COLUMN_WIDTH: usize = 22;

#[derive(Debug, Clone, Copy)]
enum Tone {
    Success,
    Info,
    Warning,
    Error,
    Hint,
}

impl Tone {
    fn plain_tag(self) -> &'static str {
        match self {
            Tone::Success => "[OK]",
            Tone::Info => "[INFO]",
            Tone::Warning => "[WARN]",
            Tone::Error => "[ERROR]",
            Tone::Hint => "[TIP]",
        }
    }

    fn styled(self, message: &str) -> String {
        match self {
            Tone::Success => format!("{} {}", "✓".green().bold(), message.green()),
            Tone::Info => format!("{} {}", "•".blue(), message),
            Tone::Warning => format!("{} {}", "⚠".yellow().bold(), message.yellow()),
            Tone::Error => format!("{} {}", "✗".red().bold(), message.red()),
            Tone::Hint => format!("{} {}", "›".dimmed(), message.dimmed().italic()),
        }
    }
}

/// Output style configuration
pub struct Output {
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    fn render(&self, tone: Tone, message: &str) -> String {
        if self.colored {
            format!("  {}", tone.styled(message))
        } else {
            format!("  {} {}", tone.plain_tag(), message)
        }
    }

    /// Greeting printed when `chat` starts
    pub fn banner(&self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        let tagline = "EC2 status, AWS docs and invoices. Type 'exit' to leave.";
        if self.colored {
            println!("\n  {} {}", "cloudvox".bright_cyan().bold(), version.dimmed());
            println!("  {}\n", tagline.dimmed());
        } else {
            println!("\n  cloudvox {}\n  {}\n", version, tagline);
        }
    }

    pub fn success(&self, message: &str) {
        println!("{}", self.render(Tone::Success, message));
    }

    pub fn info(&self, message: &str) {
        println!("{}", self.render(Tone::Info, message));
    }

    pub fn warning(&self, message: &str) {
        println!("{}", self.render(Tone::Warning, message));
    }

    pub fn error(&self, message: &str) {
        eprintln!("{}", self.render(Tone::Error, message));
    }

    pub fn hint(&self, message: &str) {
        println!("\n{}", self.render(Tone::Hint, message));
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Indented `key: value` line
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    pub fn list_item(&self, item: &str) {
        let bullet = if self.colored {
            "•".blue().to_string()
        } else {
            "-".to_string()
        };
        println!("    {} {}", bullet, item);
    }

    /// Print an agent's answer.
    ///
    /// Routed error texts start with `Error:` and are highlighted.
    pub fn answer(&self, text: &str) {
        if !self.colored {
            println!("{}", text);
        } else if is_error_text(text) {
            println!("{}", text.red());
        } else {
            println!("{}", text.bright_white());
        }
    }

    /// Print the chat prompt and read one line.
    ///
    /// Returns `None` at end of input.
    pub fn prompt(&self) -> Option<String> {
        if self.colored {
            print!("{} ", "you>".bright_cyan().bold());
        } else {
            print!("you> ");
        }
        io::stdout().flush().ok();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(input),
        }
    }

    pub fn table_header(&self, columns: &[&str]) {
        let header = format_row(columns);
        let rule_width = columns.len() * (COLUMN_WIDTH + 1);
        if self.colored {
            println!("    {}", header.bright_white().bold());
            println!("    {}", "─".repeat(rule_width).dimmed());
        } else {
            println!("    {}\n    {}", header, "-".repeat(rule_width));
        }
    }

    pub fn table_row(&self, values: &[&str]) {
        println!("    {}", format_row(values));
    }

    pub fn newline(&self) {
        println!();
    }
}

fn is_error_text(text: &str) -> bool {
    text.starts_with("Error:")
}

/// Left-aligned fixed-width columns; longer cells are not truncated
fn format_row(cells: &[&str]) -> String {
    cells
        .iter()
        .map(|cell| format!("{:<width$}", cell, width = COLUMN_WIDTH))
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end()
        .to_string()
}

//! Terminal styling for CLI output

use crate::model::ColumnRole;
use colored::Colorize;
use std::io::{self, IsTerminal, Write};

/// Print an error message to stderr
pub fn error(msg: &str) {
    eprintln!("{} {}", "error:".red().bold(), msg);
}

/// Print a warning message to stderr
pub fn warning(msg: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), msg);
}

/// Print a success message to stdout
pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print a dimmed hint to stderr
pub fn hint(msg: &str) {
    eprintln!("{} {}", "hint:".dimmed(), msg.dimmed());
}

pub fn header(msg: &str) {
    println!("{}", msg.cyan().bold());
}

pub fn status(msg: &str) {
    println!("{} {}", "→".blue(), msg);
}

pub fn path(p: &std::path::Path) -> String {
    p.display().to_string().bright_white().to_string()
}

/// Color a column role by which side of the graph it feeds.
pub fn role(role: ColumnRole) -> String {
    let label = role.to_string();
    match role {
        ColumnRole::SourceNode => label.green().to_string(),
        ColumnRole::TargetNode => label.magenta().to_string(),
        ColumnRole::Link => label.cyan().to_string(),
        ColumnRole::Date => label.yellow().to_string(),
        ColumnRole::Unused => label.dimmed().to_string(),
    }
}

/// Format a label-value pair for metrics display
pub fn metric(label: &str, value: impl std::fmt::Display) -> String {
    format!("  {}: {}", label.dimmed(), value.to_string().cyan())
}

pub fn section(title: &str) {
    println!("\n{}", title.bold());
}

pub fn url(u: &str) -> String {
    u.bright_blue().underline().to_string()
}

/// Check if stdout is a terminal (TTY)
pub fn is_terminal() -> bool {
    io::stdout().is_terminal()
}

/// Render markdown with colors when stdout is a TTY, plain otherwise.
pub fn render_markdown(markdown: &str, output: &mut dyn Write) -> io::Result<()> {
    if is_terminal() {
        write!(output, "{}", colorize(markdown))
    } else {
        write!(output, "{}", markdown)
    }
}

fn colorize(markdown: &str) -> String {
    let skin = create_skin();
    let rendered = skin.term_text(markdown);
    rendered.to_string()
}

fn create_skin() -> termimad::MadSkin {
    use crossterm::style::Color;
    use termimad::*;

    let mut skin = MadSkin::default();
    skin.set_headers_fg(Color::Cyan);
    skin.bold.set_fg(Color::White);
    skin.bullet = StyledChar::from_fg_char(Color::Blue, '•');
    skin.inline_code.set_fg(Color::Yellow);
    skin.italic.set_fg(Color::Magenta);
    skin.horizontal_rule = StyledChar::from_fg_char(Color::DarkGrey, '─');
    skin
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorize_keeps_text() {
        let rendered = colorize("# Summary\n\n- **records**: 10\n");
        assert!(rendered.contains("Summary"));
        assert!(rendered.contains("records"));
    }
}

//! Terminal styling helpers for the offline stages

use std::path::Path;
use std::time::Duration;

use console::{style, Emoji};

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static TARGET: Emoji<'_, '_> = Emoji("🎯 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static CLOCK: Emoji<'_, '_> = Emoji("⏱  ", "");

const CARD_WIDTH: usize = 56;

/// Print the application banner
pub fn print_banner(version: &str, stage: &str) {
    let banner = r#"
    ╦ ╦╔═╗╦ ╦╔═╗╔═╗  ╔═╗╦═╗╦╔═╗╔═╗
    ╠═╣║ ║║ ║╚═╗║╣   ╠═╝╠╦╝║║  ║╣
    ╩ ╩╚═╝╚═╝╚═╝╚═╝  ╩  ╩╚═╩╚═╝╚═╝
    "#;

    println!();
    println!("{}", style(banner).cyan().bold());
    println!(
        "    {} {}",
        style("⌂").magenta().bold(),
        style(format!("House price classification · {}", stage)).dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// One line of the configuration card
pub enum ConfigEntry<'a> {
    Path(&'a str, &'a Path),
    Text(&'a str, &'a str),
    /// Separator between groups
    Rule,
}

/// Print a boxed configuration card
pub fn print_config(entries: &[ConfigEntry]) {
    let line = "─".repeat(CARD_WIDTH - 2);

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("⚙️  Configuration").cyan().bold(),
        " ".repeat(CARD_WIDTH - 20)
    );
    println!("    ├{}┤", line);
    for entry in entries {
        match entry {
            ConfigEntry::Path(label, path) => {
                println!("    │  {:<16}{:<36}│", label, truncate_path(path, 35));
            }
            ConfigEntry::Text(label, value) => {
                println!("    │  {:<16}{:<36}│", label, style(truncate_string(value, 35)).yellow());
            }
            ConfigEntry::Rule => println!("    ├{}┤", line),
        }
    }
    println!("    └{}┘", line);
    println!();
}

/// Print a step header
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

pub fn print_warning(message: &str) {
    println!("    {} {}", style("!").yellow().bold(), style(message).yellow());
}

/// Print how long a step took
pub fn print_step_time(elapsed: Duration) {
    println!("      {}{}", CLOCK, style(format_duration(elapsed)).dim());
}

/// Print the final completion message
pub fn print_completion(message: &str) {
    println!();
    println!("    {} {}", ROCKET, style(message).green().bold());
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, threshold_info: Option<&str>) {
    if let Some(info) = threshold_info {
        println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        );
    } else {
        println!("      Found {} {}", style(count).yellow().bold(), description);
    }
}

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{}m {:.0}s", d.as_secs() / 60, secs % 60.0)
    }
}

fn truncate_path(path: &Path, max_len: usize) -> String {
    truncate_string(&path.display().to_string(), max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string_keeps_tail() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("/very/long/path/to/data.csv", 12), ".../data.csv");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.50s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }
}

use std::fmt::Display;

use burrow_common::plugin::Finding;
use colored::*;
use tracing::info;
use unicode_width::UnicodeWidthStr;

use crate::terminal::logging::PRINT_TARGET;
use crate::terminal::{colors, format};

pub const TOTAL_WIDTH: usize = 64;

pub trait WithDefaultColor {
    fn with_default(self, default_color: Color) -> ColoredString;
}

impl WithDefaultColor for &str {
    fn with_default(self, default_color: Color) -> ColoredString {
        self.color(default_color)
    }
}

impl WithDefaultColor for String {
    fn with_default(self, default_color: Color) -> ColoredString {
        self.color(default_color)
    }
}

impl WithDefaultColor for ColoredString {
    fn with_default(self, _default_color: Color) -> ColoredString {
        self
    }
}

pub fn print(msg: &str) {
    info!(target: PRINT_TARGET, "{msg}");
}

pub fn banner(quiet: bool) {
    if quiet {
        return;
    }

    let text_content = format!("⟦ BURROW v{} ⟧ ", env!("CARGO_PKG_VERSION"));
    let text_width = UnicodeWidthStr::width(text_content.as_str());
    let text = text_content.bright_green().bold();
    let sep = "═".repeat(TOTAL_WIDTH.saturating_sub(text_width) / 2).bright_black();

    print(&format!("{sep}{text}{sep}"));
}

pub fn header(msg: &str, quiet: bool) {
    if quiet {
        return;
    }

    let formatted = format!("⟦ {msg} ⟧");
    let dash_count = TOTAL_WIDTH.saturating_sub(console::measure_text_width(&formatted));
    let left = dash_count / 2;
    let right = dash_count - left;

    let line = format!(
        "{}{}{}",
        "─".repeat(left),
        formatted.to_uppercase().bright_green(),
        "─".repeat(right)
    )
    .bright_black();

    print(&line.to_string());
}

/// Prints `key....: value` lines with the colons lined up.
pub fn aligned_lines<V>(lines: Vec<(&str, V)>)
where
    V: Display + WithDefaultColor,
{
    let key_width = lines.iter().map(|(key, _)| key.width()).max().unwrap_or(0);
    for (key, value) in lines {
        aligned_line(key, value, key_width);
    }
}

fn aligned_line<V>(key: &str, value: V, key_width: usize)
where
    V: Display + WithDefaultColor,
{
    let dots = ".".repeat((key_width + 1).saturating_sub(key.width()));
    let colon = format!("{}{}", dots.color(colors::SEPARATOR), ":".color(colors::SEPARATOR));
    let value = value.with_default(colors::TEXT_DEFAULT);
    print_status(format!("{}{} {}", key.color(colors::PRIMARY), colon, value));
}

pub fn print_status<T: AsRef<str>>(msg: T) {
    let prefix = ">".color(colors::SEPARATOR);
    print(&format!("{} {}", prefix, msg.as_ref().color(colors::TEXT_DEFAULT)));
}

pub fn finding(found: &Finding) {
    print(&format::finding(found));
}

pub fn end_of_program(quiet: bool) {
    if quiet {
        return;
    }
    print(&"═".repeat(TOTAL_WIDTH).color(colors::SEPARATOR).to_string());
}

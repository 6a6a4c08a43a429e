//! Terminal output with colors and formatting
//!
//! Uses ANSI escape codes for colors and styling.

use std::io::{self, Write};

use super::render::{self, Style};
use super::{OutputEvent, OutputWriter};

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const GRAY: &str = "\x1b[90m";

/// Terminal output writer with colors and formatting
pub struct TerminalOutput {
    /// Whether to use colors (can be disabled)
    use_colors: bool,
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalOutput {
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    /// Create without colors
    pub fn without_colors() -> Self {
        Self { use_colors: false }
    }

    fn codes(style: Style) -> &'static [&'static str] {
        match style {
            Style::Header => &[BOLD, CYAN],
            Style::Name => &[BOLD],
            Style::Dim => &[GRAY],
            Style::Good => &[GREEN],
            Style::Bad => &[BOLD, RED],
            Style::Warn => &[YELLOW],
        }
    }

    /// Format with multiple styles
    fn styled(&self, codes: &[&str], text: &str) -> String {
        if self.use_colors && !text.is_empty() {
            let prefix: String = codes.iter().copied().collect();
            format!("{}{}{}", prefix, text, RESET)
        } else {
            text.to_string()
        }
    }

    fn paint(&self, style: Style, text: &str) -> String {
        self.styled(Self::codes(style), text)
    }

    fn print_lines(&self, lines: Vec<String>) {
        let mut out = io::stdout().lock();
        for line in lines {
            let _ = writeln!(out, "{}", line);
        }
    }
}

impl OutputWriter for TerminalOutput {
    fn write(&self, event: OutputEvent) {
        let paint = |style: Style, text: &str| self.paint(style, text);

        match event {
            OutputEvent::Text(text) => println!("{}", text),

            OutputEvent::Banner(title) => self.print_lines(render::banner(&title, &paint)),

            OutputEvent::Step(step) => eprintln!("{}", render::step(&step, &paint)),

            OutputEvent::ToolList(catalog) => self.print_lines(render::tool_list(&catalog, &paint)),

            OutputEvent::ToolDetail(tool) => self.print_lines(render::tool_detail(&tool, &paint)),

            OutputEvent::ParameterPrompt(param) => {
                self.print_lines(render::parameter_prompt(&param, &paint))
            }

            OutputEvent::ToolStart { name, arguments } => {
                self.print_lines(render::tool_start(&name, &arguments, &paint))
            }

            OutputEvent::ToolResult { name, result } => {
                self.print_lines(render::tool_result(&name, &result, &paint))
            }

            OutputEvent::Prompt(prompt) => {
                print!("{}", self.paint(Style::Name, &prompt));
                let _ = io::stdout().flush();
            }

            OutputEvent::Status(msg) => eprintln!("{}", self.paint(Style::Dim, &format!("  {}", msg))),

            OutputEvent::Error(msg) => {
                eprintln!("{} {}", self.styled(&[BOLD, RED], "Error:"), self.styled(&[RED], &msg))
            }

            OutputEvent::Warning(msg) => eprintln!(
                "{} {}",
                self.styled(&[BOLD, YELLOW], "Warning:"),
                self.paint(Style::Warn, &msg)
            ),

            OutputEvent::System(msg) => eprintln!("{}", self.paint(Style::Dim, &msg)),

            OutputEvent::NewLine => println!(),
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
    }

    fn supports_colors(&self) -> bool {
        self.use_colors
    }
}

//! Plain text output for pipes and CI environments
//!
//! No colors or special formatting - just clean text output.

use std::io::{self, Write};

use super::render::{self, Style};
use super::{OutputEvent, OutputWriter};

/// Plain text output writer (no colors)
#[derive(Debug, Default)]
pub struct PlainOutput;

impl PlainOutput {
    pub fn new() -> Self {
        Self
    }
}

fn unstyled(_: Style, text: &str) -> String {
    text.to_string()
}

fn print_lines(lines: Vec<String>) {
    let mut out = io::stdout().lock();
    for line in lines {
        let _ = writeln!(out, "{}", line);
    }
}

impl OutputWriter for PlainOutput {
    fn write(&self, event: OutputEvent) {
        match event {
            OutputEvent::Text(text) => println!("{}", text),
            OutputEvent::Banner(title) => print_lines(render::banner(&title, &unstyled)),
            OutputEvent::Step(step) => eprintln!("{}", render::step(&step, &unstyled)),
            OutputEvent::ToolList(catalog) => print_lines(render::tool_list(&catalog, &unstyled)),
            OutputEvent::ToolDetail(tool) => print_lines(render::tool_detail(&tool, &unstyled)),
            OutputEvent::ParameterPrompt(param) => {
                print_lines(render::parameter_prompt(&param, &unstyled))
            }
            OutputEvent::ToolStart { name, arguments } => {
                print_lines(render::tool_start(&name, &arguments, &unstyled))
            }
            OutputEvent::ToolResult { name, result } => {
                print_lines(render::tool_result(&name, &result, &unstyled))
            }
            OutputEvent::Prompt(prompt) => {
                print!("{}", prompt);
                let _ = io::stdout().flush();
            }
            OutputEvent::Status(msg) => eprintln!("  {}", msg),
            OutputEvent::Error(msg) => eprintln!("Error: {}", msg),
            OutputEvent::Warning(msg) => eprintln!("Warning: {}", msg),
            OutputEvent::System(msg) => eprintln!("{}", msg),
            OutputEvent::NewLine => println!(),
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
    }
}

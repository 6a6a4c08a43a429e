//! Line layout shared by the terminal and plain writers
//!
//! Each function returns finished lines; the caller supplies a painter that
//! decides what a `Style` looks like (ANSI codes or nothing).

use serde_json::Value;

use super::{Phase, StepEvent, StepStatus};
use crate::logging::format_elapsed;
use crate::mcp::{Catalog, ContentItem, FailureKind, InvocationResult, ParamSchema, ToolDescriptor};

const RULE_WIDTH: usize = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Style {
    Header,
    Name,
    Dim,
    Good,
    Bad,
    Warn,
}

pub(crate) fn banner(title: &str, paint: &dyn Fn(Style, &str) -> String) -> Vec<String> {
    let rule = "=".repeat(RULE_WIDTH);
    vec![
        String::new(),
        paint(Style::Dim, &rule),
        paint(Style::Header, title),
        paint(Style::Dim, &rule),
        String::new(),
    ]
}

pub(crate) fn tool_list(catalog: &Catalog, paint: &dyn Fn(Style, &str) -> String) -> Vec<String> {
    let mut lines = banner("AVAILABLE TOOLS", paint);

    if catalog.is_empty() {
        lines.push("No tools available on this server.".to_string());
        return lines;
    }

    for (i, tool) in catalog.tools().iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, paint(Style::Name, &tool.name)));
        if let Some(desc) = &tool.description {
            lines.extend(desc.lines().map(|l| format!("   {}", l)));
        }
        lines.push(String::new());
    }
    lines
}

fn allowed_values(allowed: &[Value]) -> String {
    allowed
        .iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn required_marker(param: &ParamSchema) -> &'static str {
    if param.required {
        "(required)"
    } else {
        "(optional)"
    }
}

pub(crate) fn tool_detail(
    tool: &ToolDescriptor,
    paint: &dyn Fn(Style, &str) -> String,
) -> Vec<String> {
    let mut lines = banner(&format!("TOOL: {}", tool.name), paint);

    if let Some(desc) = &tool.description {
        lines.push(format!("Description: {}", desc));
        lines.push(String::new());
    }

    if !tool.has_params() {
        lines.push("No input parameters required.".to_string());
        lines.push(String::new());
        return lines;
    }

    lines.push("Parameters:".to_string());
    for param in &tool.params {
        lines.push(String::new());
        lines.push(format!(
            "  • {} ({}) {}",
            paint(Style::Name, &param.name),
            param.kind,
            paint(Style::Dim, required_marker(param))
        ));
        lines.push(format!(
            "    {}",
            param.description.as_deref().unwrap_or("No description")
        ));
        if let Some(allowed) = &param.allowed {
            lines.push(format!("    Allowed values: {}", allowed_values(allowed)));
        }
        if let Some(default) = &param.default {
            lines.push(paint(Style::Dim, &format!("    Default: {}", default)));
        }
    }
    lines.push(String::new());
    lines
}

pub(crate) fn parameter_prompt(
    param: &ParamSchema,
    paint: &dyn Fn(Style, &str) -> String,
) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({}) {}",
        paint(Style::Name, &param.name),
        param.kind,
        paint(Style::Dim, required_marker(param))
    )];
    if let Some(desc) = &param.description {
        lines.push(format!("  {}", desc));
    }
    if let Some(allowed) = &param.allowed {
        lines.push(format!("  Allowed values: {}", allowed_values(allowed)));
    }
    if let Some(default) = &param.default {
        lines.push(paint(Style::Dim, &format!("  Default: {}", default)));
    }
    lines
}

pub(crate) fn tool_start(
    name: &str,
    arguments: &Value,
    paint: &dyn Fn(Style, &str) -> String,
) -> Vec<String> {
    let mut lines = banner("CALLING TOOL", paint);
    lines.push(format!("Tool: {}", paint(Style::Name, name)));
    let args = serde_json::to_string_pretty(arguments).unwrap_or_else(|_| arguments.to_string());
    lines.push(format!("Parameters: {}", args));
    lines.push(String::new());
    lines.push("Executing...".to_string());
    lines
}

pub(crate) fn tool_result(
    name: &str,
    result: &InvocationResult,
    paint: &dyn Fn(Style, &str) -> String,
) -> Vec<String> {
    match result {
        InvocationResult::Success {
            content,
            structured,
            elapsed,
        } => {
            let mut lines = vec![
                String::new(),
                paint(
                    Style::Good,
                    &format!("✓ {} completed in {}", name, format_elapsed(*elapsed)),
                ),
            ];
            lines.extend(banner("RESULT", paint));

            if content.is_empty() && structured.is_none() {
                lines.push("No content returned".to_string());
            }
            for item in content {
                match item {
                    ContentItem::Text(text) => lines.push(text.clone()),
                    ContentItem::Other(value) => lines.push(
                        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
                    ),
                }
            }
            if let Some(structured) = structured {
                lines.push(String::new());
                lines.push(paint(Style::Dim, "Structured content:"));
                lines.push(
                    serde_json::to_string_pretty(structured)
                        .unwrap_or_else(|_| structured.to_string()),
                );
            }
            lines.push(String::new());
            lines.push(paint(Style::Dim, &"=".repeat(RULE_WIDTH)));
            lines
        }
        InvocationResult::Failure {
            kind,
            detail,
            elapsed,
        } => {
            let headline = match kind {
                FailureKind::Tool => "Tool reported an error",
                FailureKind::Timeout => "Tool call timed out",
                FailureKind::Transport => "Tool execution failed",
            };
            vec![
                String::new(),
                paint(
                    Style::Bad,
                    &format!("✗ {} after {}", headline, format_elapsed(*elapsed)),
                ),
                format!("   Error: {}", detail),
            ]
        }
    }
}

pub(crate) fn step(event: &StepEvent, paint: &dyn Fn(Style, &str) -> String) -> String {
    let (marker, style) = match event.status {
        StepStatus::InProgress => ("…", Style::Dim),
        StepStatus::Success => ("✓", Style::Good),
        StepStatus::Skipped => ("-", Style::Dim),
        StepStatus::Failed => ("✗", Style::Bad),
    };
    let label = match (event.phase, event.status) {
        (Phase::Wake, StepStatus::Skipped) => "Wake-up skipped".to_string(),
        (Phase::Grace, StepStatus::Skipped) => "Grace wait skipped".to_string(),
        (phase, _) => phase.to_string(),
    };

    match &event.detail {
        Some(detail) => format!("  {} {}: {}", paint(style, marker), label, detail),
        None => format!("  {} {}", paint(style, marker), label),
    }
}

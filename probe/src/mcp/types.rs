//! MCP type definitions
//!
//! Transport-independent views of what a server exposes and returns.

use std::fmt;
use std::time::Duration;

use serde_json::Value;

/// Declared JSON type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Boolean,
    Integer,
    Number,
    Object,
    Array,
}

impl ParamType {
    /// Read the `type` keyword of a property schema.
    ///
    /// Union types (`["string", "null"]`) use the first non-null member;
    /// missing or unrecognised types fall back to `String`.
    pub fn from_schema(schema: &Value) -> Self {
        let name = match schema.get("type") {
            Some(Value::String(s)) => Some(s.as_str()),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .find(|t| *t != "null"),
            _ => None,
        };

        match name {
            Some("boolean") => Self::Boolean,
            Some("integer") => Self::Integer,
            Some("number") => Self::Number,
            Some("object") => Self::Object,
            Some("array") => Self::Array,
            _ => Self::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a tool's input schema
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSchema {
    pub name: String,
    pub kind: ParamType,
    pub required: bool,
    pub description: Option<String>,
    /// `enum` keyword, if present
    pub allowed: Option<Vec<Value>>,
    /// `default` keyword, if present
    pub default: Option<Value>,
    /// Required strings may be empty only with an explicit `"minLength": 0`
    pub allow_empty: bool,
}

impl ParamSchema {
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: None,
            allowed: None,
            default: None,
            allow_empty: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_allowed(mut self, allowed: Vec<Value>) -> Self {
        self.allowed = Some(allowed);
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    fn from_property(name: &str, schema: &Value, required: bool) -> Self {
        let mut param = Self::new(name, ParamType::from_schema(schema));
        if required {
            param = param.required();
        }
        if let Some(allowed) = schema.get("enum").and_then(Value::as_array) {
            param = param.with_allowed(allowed.clone());
        }
        if let Some(default) = schema.get("default") {
            param = param.with_default(default.clone());
        }
        param.description = schema
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        param.allow_empty = schema.get("minLength").and_then(Value::as_u64) == Some(0);
        param
    }
}

/// A tool from the server catalog
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: Option<String>,
    /// Raw input schema (JSON)
    pub input_schema: Option<Value>,
    /// Raw output schema (JSON)
    pub output_schema: Option<Value>,
    /// Parameters in schema declaration order
    pub params: Vec<ParamSchema>,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        input_schema: Option<Value>,
    ) -> Self {
        let params = input_schema
            .as_ref()
            .map(params_from_schema)
            .unwrap_or_default();
        Self {
            name: name.into(),
            description,
            input_schema,
            output_schema: None,
            params,
        }
    }

    pub fn with_output_schema(mut self, output_schema: Option<Value>) -> Self {
        self.output_schema = output_schema;
        self
    }

    /// Whether the schema declares any properties at all
    pub fn has_params(&self) -> bool {
        !self.params.is_empty()
    }

    pub fn required_params(&self) -> impl Iterator<Item = &ParamSchema> {
        self.params.iter().filter(|p| p.required)
    }
}

/// Parse `{"properties": {...}, "required": [...]}` keeping declaration order
fn params_from_schema(schema: &Value) -> Vec<ParamSchema> {
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, prop)| {
                    ParamSchema::from_property(name, prop, required.contains(&name.as_str()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Ordered, immutable set of tools fetched from one live session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    tools: Vec<ToolDescriptor>,
}

impl Catalog {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self { tools }
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up by 1-based display position
    pub fn get(&self, position: usize) -> Option<&ToolDescriptor> {
        position.checked_sub(1).and_then(|i| self.tools.get(i))
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }
}

/// One item of a tool result
#[derive(Debug, Clone, PartialEq)]
pub enum ContentItem {
    Text(String),
    /// Non-text content (images, resources) kept as JSON
    Other(Value),
}

/// What the transport returned for a tool call
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolOutput {
    pub content: Vec<ContentItem>,
    pub structured: Option<Value>,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::Text(text.into())],
            ..Default::default()
        }
    }

    /// Concatenated text content, used for error details
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|item| match item {
                ContentItem::Text(t) => t.clone(),
                ContentItem::Other(v) => v.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Why an invocation did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The tool ran and reported an error
    Tool,
    /// No answer within the tool timeout
    Timeout,
    /// The request could not be delivered or answered
    Transport,
}

/// Outcome of a single tool call, shown once and discarded
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationResult {
    Success {
        content: Vec<ContentItem>,
        structured: Option<Value>,
        elapsed: Duration,
    },
    Failure {
        kind: FailureKind,
        detail: String,
        elapsed: Duration,
    },
}

impl InvocationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            Self::Success { elapsed, .. } | Self::Failure { elapsed, .. } => *elapsed,
        }
    }
}

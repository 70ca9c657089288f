use rand::Rng;
use serde_json::Value;

use crate::constants::CODE_KEY;
use crate::Error;
use crate::UsageError;

/// Program text for a parallel shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptBody {
    /// Literal script, run as is
    Source(String),
    /// Function expression; wrapped into a definition plus a single call
    Callable(String),
}

impl ScriptBody {
    pub fn source(text: impl Into<String>) -> Self {
        ScriptBody::Source(text.into())
    }

    pub fn callable(code: impl Into<String>) -> Self {
        ScriptBody::Callable(code.into())
    }

    /// Program text, wrapping callables as `var f<id> = <code>;f<id>();`
    /// with a random id.
    pub fn render(&self) -> String {
        self.render_with_id(rand::thread_rng().gen_range(0..100_000))
    }

    pub(crate) fn render_with_id(
        &self,
        id: u32,
    ) -> String {
        match self {
            ScriptBody::Source(text) => text.clone(),
            ScriptBody::Callable(code) => format!("var f{id} = {code};f{id}();"),
        }
    }
}

/// Accepts a JSON string as source text or `{"$code": "<function>"}` as a
/// callable. Anything else is rejected before a process exists.
impl TryFrom<Value> for ScriptBody {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(text) => Ok(ScriptBody::Source(text)),
            Value::Object(mut map) if map.len() == 1 => match map.remove(CODE_KEY) {
                Some(Value::String(code)) => Ok(ScriptBody::Callable(code)),
                _ => Err(invalid("object")),
            },
            other => Err(invalid(kind_of(&other))),
        }
    }
}

fn invalid(kind: &'static str) -> Error {
    UsageError::InvalidScriptBody { kind }.into()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Script body plus the named values assigned before it runs.
///
/// Bindings are emitted in insertion order as `name = <json>;`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptTemplate {
    body: ScriptBody,
    bindings: Vec<(String, Value)>,
}

impl ScriptTemplate {
    pub fn new(body: ScriptBody) -> Self {
        Self {
            body,
            bindings: Vec::new(),
        }
    }

    pub fn bind(
        mut self,
        name: impl Into<String>,
        value: Value,
    ) -> Self {
        self.bindings.push((name.into(), value));
        self
    }

    pub fn body(&self) -> &ScriptBody {
        &self.body
    }

    pub fn bindings(&self) -> &[(String, Value)] {
        &self.bindings
    }
}

impl From<ScriptBody> for ScriptTemplate {
    fn from(body: ScriptBody) -> Self {
        Self::new(body)
    }
}

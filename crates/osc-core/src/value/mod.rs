//! Loosely typed, mutable JSON document with path-based access.
//!
//! Reads distinguish three states:
//! - **absent**: the path does not exist
//! - **null**: the path exists and holds an explicit `null`
//! - **defined**: any other value
//!
//! The typed readers (`as_string`, `as_bool`, ...) treat absent and null alike
//! and return the zero value of the requested type. A defined value that can't
//! be coerced is a [`Error::TypeMismatch`].

mod path;

pub use path::PropertyPath;
pub use serde_json::{Map, Value};

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Outcome of a path lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot<'a> {
    Absent,
    Null,
    Defined(&'a Value),
}

impl<'a> Slot<'a> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Slot::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Slot::Null)
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Slot::Defined(_))
    }

    /// The defined value, if any.
    pub fn value(&self) -> Option<&'a Value> {
        match self {
            Slot::Defined(v) => Some(v),
            _ => None,
        }
    }
}

/// JSON document owned by a single resource.
///
/// The root is always an object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueTree {
    root: Map<String, Value>,
}

impl ValueTree {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a parsed value; only objects are accepted as document roots.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(Error::malformed(format!(
                "expected a JSON object, found {}",
                type_name(&other)
            ))),
        }
    }

    /// Parse canonical JSON text.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::malformed(format!("invalid JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Serialize to compact JSON text.
    pub fn to_json(&self) -> String {
        Value::Object(self.root.clone()).to_string()
    }

    /// Serialize to indented JSON text.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    /// Look up a path.
    pub fn get(&self, path: &PropertyPath) -> Slot<'_> {
        let mut segments = path.segments().iter();
        let Some(first) = segments.next() else {
            return Slot::Absent;
        };
        let Some(mut current) = self.root.get(first) else {
            return Slot::Absent;
        };
        for segment in segments {
            let next = match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            match next {
                Some(v) => current = v,
                None => return Slot::Absent,
            }
        }
        match current {
            Value::Null => Slot::Null,
            v => Slot::Defined(v),
        }
    }

    /// Whether the path holds a defined (non-null) value.
    pub fn is_defined(&self, path: &PropertyPath) -> bool {
        self.get(path).is_defined()
    }

    /// Write a value, creating intermediate objects as needed.
    ///
    /// Numeric segments address existing elements of an array, as in
    /// [`get`](Self::get); arrays are never grown. An intermediate scalar
    /// fails with [`Error::TypeMismatch`]. A `null` intermediate is replaced
    /// by an object.
    pub fn set(&mut self, path: &PropertyPath, value: impl Into<Value>) -> Result<()> {
        let Some((first, rest)) = path.segments().split_first() else {
            return Err(Error::malformed("cannot set an empty path"));
        };
        if rest.is_empty() {
            self.root.insert(first.clone(), value.into());
            return Ok(());
        }
        let node = self.root.entry(first.clone()).or_insert(Value::Null);
        write_at(node, path, 1, value.into())
    }

    /// Remove the value at a path, returning it.
    pub fn remove(&mut self, path: &PropertyPath) -> Option<Value> {
        let (last, parents) = path.segments().split_last()?;
        let mut current = &mut self.root;
        for segment in parents {
            current = current.get_mut(segment)?.as_object_mut()?;
        }
        current.remove(last)
    }

    /// Read a string; numbers and booleans are rendered as text.
    pub fn as_string(&self, path: &PropertyPath) -> Result<String> {
        match self.get(path) {
            Slot::Absent | Slot::Null => Ok(String::new()),
            Slot::Defined(v) => scalar_to_string(v).ok_or_else(|| mismatch(path, "string", v)),
        }
    }

    /// Read a boolean; the strings `"true"`/`"false"` are accepted.
    pub fn as_bool(&self, path: &PropertyPath) -> Result<bool> {
        match self.get(path) {
            Slot::Absent | Slot::Null => Ok(false),
            Slot::Defined(Value::Bool(b)) => Ok(*b),
            Slot::Defined(v @ Value::String(s)) => match s.to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(mismatch(path, "boolean", v)),
            },
            Slot::Defined(v) => Err(mismatch(path, "boolean", v)),
        }
    }

    /// Read an integer; integral strings are accepted.
    pub fn as_int(&self, path: &PropertyPath) -> Result<i64> {
        match self.get(path) {
            Slot::Absent | Slot::Null => Ok(0),
            Slot::Defined(v @ Value::Number(n)) => n.as_i64().ok_or_else(|| mismatch(path, "integer", v)),
            Slot::Defined(v @ Value::String(s)) => {
                s.trim().parse::<i64>().map_err(|_| mismatch(path, "integer", v))
            }
            Slot::Defined(v) => Err(mismatch(path, "integer", v)),
        }
    }

    /// Read an array.
    pub fn as_list(&self, path: &PropertyPath) -> Result<Vec<Value>> {
        match self.get(path) {
            Slot::Absent | Slot::Null => Ok(Vec::new()),
            Slot::Defined(Value::Array(items)) => Ok(items.clone()),
            Slot::Defined(v) => Err(mismatch(path, "array", v)),
        }
    }

    /// Read an array of scalars as strings.
    pub fn as_string_list(&self, path: &PropertyPath) -> Result<Vec<String>> {
        self.as_list(path)?
            .iter()
            .enumerate()
            .map(|(i, v)| {
                scalar_to_string(v).ok_or_else(|| mismatch(&path.child(i.to_string()), "string", v))
            })
            .collect()
    }

    /// Read an object whose values are scalars, as a string map.
    pub fn as_map(&self, path: &PropertyPath) -> Result<BTreeMap<String, String>> {
        self.as_object(path)?
            .iter()
            .map(|(k, v)| {
                let text = match v {
                    Value::Null => Some(String::new()),
                    other => scalar_to_string(other),
                };
                text.map(|t| (k.clone(), t))
                    .ok_or_else(|| mismatch(&path.child(k.clone()), "string", v))
            })
            .collect()
    }

    /// Read an object.
    pub fn as_object(&self, path: &PropertyPath) -> Result<Map<String, Value>> {
        match self.get(path) {
            Slot::Absent | Slot::Null => Ok(Map::new()),
            Slot::Defined(Value::Object(map)) => Ok(map.clone()),
            Slot::Defined(v) => Err(mismatch(path, "object", v)),
        }
    }
}

impl std::str::FromStr for ValueTree {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Write `value` below `node`, which sits at `path.segments()[..depth]`.
fn write_at(node: &mut Value, path: &PropertyPath, depth: usize, value: Value) -> Result<()> {
    let segments = path.segments();
    let segment = &segments[depth];
    let last = depth + 1 == segments.len();
    let prefix = || PropertyPath::new(segments[..depth].iter().cloned()).to_string();

    if node.is_null() {
        *node = Value::Object(Map::new());
    }
    let child = match node {
        Value::Object(map) => {
            if last {
                map.insert(segment.clone(), value);
                return Ok(());
            }
            map.entry(segment.clone()).or_insert(Value::Null)
        }
        Value::Array(items) => {
            let len = items.len();
            match segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                Some(item) => item,
                None => {
                    return Err(Error::malformed(format!(
                        "no element '{}' in array of {} at {}",
                        segment,
                        len,
                        prefix()
                    )));
                }
            }
        }
        other => {
            return Err(Error::TypeMismatch {
                path: prefix(),
                expected: "object",
                found: type_name(other),
            });
        }
    };
    if last {
        *child = value;
        return Ok(());
    }
    write_at(child, path, depth + 1, value)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn mismatch(path: &PropertyPath, expected: &'static str, found: &Value) -> Error {
    Error::TypeMismatch {
        path: path.to_string(),
        expected,
        found: type_name(found),
    }
}

/// Short name of a JSON value's type, used in error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

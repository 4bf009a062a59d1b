//! Flat mapping of parsed argument values.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Parsed arguments handed to a handler.
///
/// Every argument registered along the matched path appears under its
/// destination key, `null` when absent. Each category level also records
/// the chosen child under `<category>_command`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedArgs {
    values: BTreeMap<String, Value>,
    path: Vec<String>,
}

impl ParsedArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dest: &str) -> Option<&Value> {
        self.values.get(dest)
    }

    pub fn contains(&self, dest: &str) -> bool {
        self.values.contains_key(dest)
    }

    /// `true` when the destination exists and holds a non-null value.
    pub fn is_present(&self, dest: &str) -> bool {
        self.get(dest).is_some_and(|value| !value.is_null())
    }

    pub fn get_bool(&self, dest: &str) -> Option<bool> {
        self.get(dest).and_then(Value::as_bool)
    }

    pub fn get_str(&self, dest: &str) -> Option<&str> {
        self.get(dest).and_then(Value::as_str)
    }

    pub fn get_i64(&self, dest: &str) -> Option<i64> {
        self.get(dest).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, dest: &str) -> Option<f64> {
        self.get(dest).and_then(Value::as_f64)
    }

    /// String list for `Append`/multi-value arguments.
    pub fn get_strings(&self, dest: &str) -> Option<Vec<String>> {
        let items = self.get(dest)?.as_array()?;
        Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        )
    }

    /// Names of the subcommands chosen below the root, outermost first.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The values as a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
    }

    pub(crate) fn insert(&mut self, dest: impl Into<String>, value: Value) {
        self.values.insert(dest.into(), value);
    }

    pub(crate) fn push_path(&mut self, name: &str) {
        self.path.push(name.to_string());
    }
}

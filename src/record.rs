//! Records, scalar values, and per-record context.
//!
//! A [`Record`] is an insertion-ordered map from field names to [`Value`]s.
//! Values keep the text they were read from, so a field that no verb touches
//! is written back exactly as it arrived.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::{IntoIter, Iter, IterMut};

/// A scalar field value, typed by inference from its text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Empty,
    Int { value: i64, text: String },
    Float { value: f64, text: String },
    Str(String),
}

impl Value {
    /// Infer a value from text: integers, then floats, otherwise a string.
    pub fn infer(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Value::Empty;
        }
        if let Ok(value) = text.parse::<i64>() {
            return Value::Int { value, text };
        }
        // "inf"/"nan" parse as f64 but are words in record data
        if text.bytes().any(|b| b.is_ascii_digit())
            && let Ok(value) = text.parse::<f64>()
        {
            return Value::Float { value, text };
        }
        Value::Str(text)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Value::Empty => "",
            Value::Int { text, .. } | Value::Float { text, .. } => text,
            Value::Str(s) => s,
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int { value, .. } => Some(*value as f64),
            Value::Float { value, .. } => Some(*value),
            Value::Empty | Value::Str(_) => None,
        }
    }

    /// Strip leading and trailing whitespace and collapse inner runs to a
    /// single space, then re-infer the type.
    pub fn clean_whitespace(&self) -> Value {
        Value::infer(clean_whitespace(self.as_str()))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::infer(text)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::infer(text)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int {
            value,
            text: value.to_string(),
        }
    }
}

/// Whitespace-clean a string: trim both ends and collapse internal runs.
pub fn clean_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// An ordered mapping of unique field names to values.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

// Field order is part of a record's identity.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len() && self.fields.iter().eq(other.fields.iter())
    }
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    /// Build a record from string pairs, inferring each value.
    ///
    /// ```
    /// use record_chain::Record;
    ///
    /// let r = Record::from_pairs([("a", "1"), ("b", "x")]);
    /// assert_eq!(r.get("a").and_then(|v| v.as_f64()), Some(1.0));
    /// ```
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Value::infer(v)))
            .collect()
    }

    /// Insert a field. An existing key keeps its position and takes the new
    /// value; a new key is appended.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Insert a field at the front of the record.
    pub fn put_first(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let (index, _) = self.fields.insert_full(key.into(), value.into());
        self.fields.move_index(index, 0);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Remove a field, preserving the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.fields.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, String, Value> {
        self.fields.iter_mut()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.put(k, v);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Where a record came from. Read-only once created and shared by every
/// envelope derived from the same input record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    /// Input file name, `None` for stdin or generated records.
    pub filename: Option<String>,
    /// 1-based index of the input file.
    pub filenum: usize,
    /// 1-based record number across all inputs.
    pub nr: u64,
    /// 1-based record number within the current file.
    pub fnr: u64,
}

impl Context {
    pub fn new(filename: Option<String>, filenum: usize, nr: u64, fnr: u64) -> Arc<Self> {
        Arc::new(Self {
            filename,
            filenum,
            nr,
            fnr,
        })
    }

    /// Context for records not read from any input, such as a stage's
    /// end-of-stream summary.
    pub fn detached() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.filename.as_deref().unwrap_or("(stdin)");
        write!(f, "{name}:{} (NR={})", self.fnr, self.nr)
    }
}

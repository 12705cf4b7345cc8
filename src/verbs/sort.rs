//! sort: order the stream by one or more fields.
//!
//! Flags may be mixed and repeated; keys apply in the order given:
//!
//! ```text
//! sort -f shape -nr quantity
//! ```
//!
//! Records are held until the end of the stream. Records that lack any of
//! the sort fields follow the sorted ones, in arrival order. Under a numeric
//! key, non-numeric values sort after numeric ones.

use std::cmp::Ordering;
use std::sync::Arc;

use clap::{Arg, ArgAction, Command};

use super::field_list;
use crate::error::{PipelineError, Result};
use crate::record::{Context, Record, Value};
use crate::stage::{Emitter, Stage};

const VERB: &str = "sort";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    LexicalAscending,
    LexicalDescending,
    NumericAscending,
    NumericDescending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub order: SortOrder,
}

/// Flag ids paired with the order each selects.
const FLAGS: [(&str, SortOrder); 4] = [
    ("f", SortOrder::LexicalAscending),
    ("r", SortOrder::LexicalDescending),
    ("nf", SortOrder::NumericAscending),
    ("nr", SortOrder::NumericDescending),
];

fn command() -> Command {
    let field_arg = |id: &'static str, help: &'static str| {
        Arg::new(id)
            .value_name("FIELDS")
            .action(ArgAction::Append)
            .help(help)
    };
    Command::new(VERB)
        .about("Sorts records by the given fields, keeping input order among equal keys.")
        .arg(field_arg("f", "Lexical ascending").short('f'))
        .arg(field_arg("r", "Lexical descending").short('r'))
        .arg(field_arg("nf", "Numeric ascending").long("nf"))
        .arg(field_arg("nr", "Numeric descending").long("nr"))
}

pub struct Sort {
    keys: Vec<SortKey>,
    sorted: Vec<(Record, Arc<Context>)>,
    missing: Vec<(Record, Arc<Context>)>,
}

impl Sort {
    pub fn new(keys: Vec<SortKey>) -> Self {
        Self {
            keys,
            sorted: Vec::new(),
            missing: Vec::new(),
        }
    }

    pub fn from_args(args: &[String]) -> Result<Self> {
        // -nf and -nr are single-dash words; clap sees them as long flags.
        let normalized = args.iter().map(|a| match a.as_str() {
            "-nf" => "--nf".to_string(),
            "-nr" => "--nr".to_string(),
            _ => a.clone(),
        });
        let matches = command()
            .try_get_matches_from(normalized)
            .map_err(|e| PipelineError::usage(VERB, e.to_string().trim_end()))?;

        let mut positioned = Vec::new();
        for (id, order) in FLAGS {
            let (Some(indices), Some(values)) =
                (matches.indices_of(id), matches.get_many::<String>(id))
            else {
                continue;
            };
            for (index, spec) in indices.zip(values) {
                for field in field_list(VERB, spec)? {
                    positioned.push((index, SortKey { field, order }));
                }
            }
        }
        if positioned.is_empty() {
            return Err(PipelineError::usage(VERB, "no sort keys given"));
        }
        // stable, so fields within one flag keep their order
        positioned.sort_by_key(|(index, _)| *index);
        Ok(Self::new(positioned.into_iter().map(|(_, key)| key).collect()))
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        for key in &self.keys {
            let (Some(x), Some(y)) = (a.get(&key.field), b.get(&key.field)) else {
                continue;
            };
            let ordering = match key.order {
                SortOrder::LexicalAscending => x.as_str().cmp(y.as_str()),
                SortOrder::LexicalDescending => y.as_str().cmp(x.as_str()),
                SortOrder::NumericAscending => numeric(x, y, false),
                SortOrder::NumericDescending => numeric(x, y, true),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Numbers in value order, then everything non-numeric.
fn numeric(x: &Value, y: &Value, descending: bool) -> Ordering {
    let ordering = match (x, y) {
        // exact beyond 2^53, where f64 would merge neighbours
        (Value::Int { value: a, .. }, Value::Int { value: b, .. }) => a.cmp(b),
        _ => match (x.as_f64(), y.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => return Ordering::Equal,
        },
    };
    if descending { ordering.reverse() } else { ordering }
}

impl Stage for Sort {
    fn process(&mut self, record: Record, context: &Arc<Context>, _emit: &mut Emitter<'_>) {
        let held = (record, Arc::clone(context));
        if self.keys.iter().all(|k| held.0.contains_key(&k.field)) {
            self.sorted.push(held);
        } else {
            self.missing.push(held);
        }
    }

    fn flush(&mut self, emit: &mut Emitter<'_>) {
        let mut sorted = std::mem::take(&mut self.sorted);
        sorted.sort_by(|(a, _), (b, _)| self.compare(a, b));
        for (record, context) in sorted.into_iter().chain(self.missing.drain(..)) {
            emit.emit(record, context);
        }
    }

    fn name(&self) -> &str {
        VERB
    }
}

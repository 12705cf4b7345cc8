//! cat: pass records through, optionally prepending a record counter.

use std::sync::Arc;

use clap::Parser;

use super::parse_flags;
use crate::error::Result;
use crate::record::{Context, Record};
use crate::stage::{Emitter, Stage};

/// Passes input records directly to output.
#[derive(Parser, Debug)]
#[command(name = "cat")]
struct Flags {
    /// Prepend field `n` to each record with the record counter, starting at 1.
    #[arg(short = 'n')]
    number: bool,

    /// Prepend a record counter in a field with the given name.
    #[arg(short = 'N', value_name = "NAME")]
    counter_name: Option<String>,
}

pub struct Cat {
    counter_field: Option<String>,
    count: i64,
}

impl Cat {
    pub fn new(counter_field: Option<String>) -> Self {
        Self {
            counter_field,
            count: 0,
        }
    }

    pub fn from_args(args: &[String]) -> Result<Self> {
        let flags: Flags = parse_flags(args)?;
        let counter_field = match (flags.counter_name, flags.number) {
            (Some(name), _) => Some(name),
            (None, true) => Some("n".to_string()),
            (None, false) => None,
        };
        Ok(Self::new(counter_field))
    }
}

impl Stage for Cat {
    fn process(&mut self, mut record: Record, context: &Arc<Context>, emit: &mut Emitter<'_>) {
        if let Some(field) = &self.counter_field {
            self.count += 1;
            record.put_first(field.as_str(), self.count);
        }
        emit.emit(record, Arc::clone(context));
    }

    fn name(&self) -> &str {
        "cat"
    }
}

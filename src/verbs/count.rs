//! count: emit the number of records seen.

use std::sync::Arc;

use clap::Parser;

use super::parse_flags;
use crate::error::Result;
use crate::record::{Context, Record};
use crate::stage::{Emitter, Stage};

/// Prints the number of records in the stream, once the stream has ended.
#[derive(Parser, Debug)]
#[command(name = "count")]
struct Flags {
    /// Field name for the output count.
    #[arg(short = 'o', value_name = "NAME", default_value = "count")]
    output_field: String,
}

pub struct Count {
    output_field: String,
    count: i64,
}

impl Count {
    pub fn new(output_field: impl Into<String>) -> Self {
        Self {
            output_field: output_field.into(),
            count: 0,
        }
    }

    pub fn from_args(args: &[String]) -> Result<Self> {
        let flags: Flags = parse_flags(args)?;
        Ok(Self::new(flags.output_field))
    }
}

impl Stage for Count {
    fn process(&mut self, _record: Record, _context: &Arc<Context>, _emit: &mut Emitter<'_>) {
        self.count += 1;
    }

    fn flush(&mut self, emit: &mut Emitter<'_>) {
        let mut summary = Record::with_capacity(1);
        summary.put(self.output_field.as_str(), self.count);
        emit.emit(summary, Context::detached());
    }

    fn name(&self) -> &str {
        "count"
    }
}

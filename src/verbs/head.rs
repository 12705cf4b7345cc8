//! head: keep the first records of the stream.

use std::sync::Arc;

use clap::Parser;

use super::parse_flags;
use crate::error::Result;
use crate::record::{Context, Record};
use crate::stage::{Emitter, Stage};

/// Passes through the first records, discarding the rest.
#[derive(Parser, Debug)]
#[command(name = "head")]
struct Flags {
    /// Number of records to keep.
    #[arg(short = 'n', default_value_t = 10)]
    count: u64,
}

pub struct Head {
    limit: u64,
    seen: u64,
}

impl Head {
    pub fn new(limit: u64) -> Self {
        Self { limit, seen: 0 }
    }

    pub fn from_args(args: &[String]) -> Result<Self> {
        let flags: Flags = parse_flags(args)?;
        Ok(Self::new(flags.count))
    }
}

impl Stage for Head {
    // Records past the limit are still consumed so upstream never blocks.
    fn process(&mut self, record: Record, context: &Arc<Context>, emit: &mut Emitter<'_>) {
        if self.seen < self.limit {
            self.seen += 1;
            emit.emit(record, Arc::clone(context));
        }
    }

    fn name(&self) -> &str {
        "head"
    }
}

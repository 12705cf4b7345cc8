//! require: replace records lacking named fields with error envelopes.

use std::sync::Arc;

use clap::Parser;

use super::{field_list, parse_flags};
use crate::error::{RecordError, Result};
use crate::record::{Context, Record};
use crate::stage::{Emitter, Stage};

const VERB: &str = "require";

/// Passes records that have all the named fields; any other record becomes
/// an error at its place in the stream.
#[derive(Parser, Debug)]
#[command(name = VERB)]
struct Flags {
    /// Comma-separated field names.
    #[arg(short = 'f', value_name = "FIELDS")]
    fields: String,
}

pub struct Require {
    fields: Vec<String>,
}

impl Require {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn from_args(args: &[String]) -> Result<Self> {
        let flags: Flags = parse_flags(args)?;
        Ok(Self::new(field_list(VERB, &flags.fields)?))
    }
}

impl Stage for Require {
    fn process(&mut self, record: Record, context: &Arc<Context>, emit: &mut Emitter<'_>) {
        match self.fields.iter().find(|f| !record.contains_key(f)) {
            Some(missing) => emit.emit_error(
                RecordError::MissingField {
                    verb: VERB.to_string(),
                    field: missing.clone(),
                },
                Arc::clone(context),
            ),
            None => emit.emit(record, Arc::clone(context)),
        }
    }

    fn name(&self) -> &str {
        VERB
    }
}

//! tac: emit the stream in reverse order.

use std::sync::Arc;

use clap::Parser;

use super::parse_flags;
use crate::error::Result;
use crate::record::{Context, Record};
use crate::stage::{Emitter, Stage};

/// Prints records in reverse order from the order in which they were encountered.
#[derive(Parser, Debug)]
#[command(name = "tac")]
struct Flags {}

#[derive(Default)]
pub struct Tac {
    held: Vec<(Record, Arc<Context>)>,
}

impl Tac {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_args(args: &[String]) -> Result<Self> {
        let _: Flags = parse_flags(args)?;
        Ok(Self::new())
    }
}

impl Stage for Tac {
    fn process(&mut self, record: Record, context: &Arc<Context>, _emit: &mut Emitter<'_>) {
        self.held.push((record, Arc::clone(context)));
    }

    fn flush(&mut self, emit: &mut Emitter<'_>) {
        while let Some((record, context)) = self.held.pop() {
            emit.emit(record, context);
        }
    }

    fn name(&self) -> &str {
        "tac"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Envelope;
    use crate::pipeline::run_inline;

    #[test]
    fn test_reverses_and_ends_last() {
        let mut stages: Vec<Box<dyn Stage>> = vec![Box::new(Tac::new())];
        let mut input: Vec<Envelope> = (0..3)
            .map(|i: i64| {
                let mut r = Record::new();
                r.put("i", i);
                Envelope::data(r, Context::detached())
            })
            .collect();
        input.push(Envelope::EndOfStream);

        let out = run_inline(&mut stages, input);
        let order: Vec<&str> = out
            .iter()
            .filter_map(Envelope::record)
            .map(|r| r.get("i").unwrap().as_str())
            .collect();
        assert_eq!(order, vec!["2", "1", "0"]);
        assert!(out.last().unwrap().is_end_of_stream());
    }
}

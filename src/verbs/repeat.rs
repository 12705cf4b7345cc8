//! repeat: emit each record several times.

use std::sync::Arc;

use clap::Parser;

use super::parse_flags;
use crate::error::Result;
use crate::record::{Context, Record};
use crate::stage::{Emitter, Stage};

/// Copies each input record `count` times to output.
#[derive(Parser, Debug)]
#[command(name = "repeat")]
struct Flags {
    /// Number of copies of each record.
    #[arg(short = 'n')]
    count: u64,
}

pub struct Repeat {
    count: u64,
}

impl Repeat {
    pub fn new(count: u64) -> Self {
        Self { count }
    }

    pub fn from_args(args: &[String]) -> Result<Self> {
        let flags: Flags = parse_flags(args)?;
        Ok(Self::new(flags.count))
    }
}

impl Stage for Repeat {
    fn process(&mut self, record: Record, context: &Arc<Context>, emit: &mut Emitter<'_>) {
        if self.count == 0 {
            return;
        }
        // every copy is its own record; the original goes out last
        for _ in 1..self.count {
            emit.emit(record.clone(), Arc::clone(context));
        }
        emit.emit(record, Arc::clone(context));
    }

    fn name(&self) -> &str {
        "repeat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Envelope;
    use crate::pipeline::run_inline;
    use crate::verbs::args;

    #[test]
    fn test_repeat_three() {
        let mut stages: Vec<Box<dyn Stage>> = vec![Box::new(Repeat::new(3))];
        let input = [
            Envelope::data(Record::from_pairs([("a", "1")]), Context::detached()),
            Envelope::EndOfStream,
        ];
        let out = run_inline(&mut stages, input);
        assert_eq!(out.len(), 4);
        assert!(out[..3].iter().all(|e| e.record().is_some()));
    }

    #[test]
    fn test_repeat_zero_filters() {
        let mut stages: Vec<Box<dyn Stage>> = vec![Box::new(Repeat::new(0))];
        let input = [
            Envelope::data(Record::new(), Context::detached()),
            Envelope::EndOfStream,
        ];
        assert_eq!(run_inline(&mut stages, input), vec![Envelope::EndOfStream]);
    }

    #[test]
    fn test_count_required() {
        assert!(Repeat::from_args(&args("repeat")).is_err());
        assert_eq!(Repeat::from_args(&args("repeat -n 4")).unwrap().count, 4);
    }
}

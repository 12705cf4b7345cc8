//! clean-whitespace: strip and collapse whitespace in keys and/or values.

use std::sync::Arc;

use clap::Parser;

use super::parse_flags;
use crate::error::{PipelineError, Result};
use crate::record::{Context, Record, clean_whitespace};
use crate::stage::{Emitter, Stage};

const VERB: &str = "clean-whitespace";

/// For each field, whitespace-cleans the keys and/or values: leading and
/// trailing whitespace is stripped and inner runs become a single space.
/// With neither flag, both keys and values are cleaned.
#[derive(Parser, Debug)]
#[command(name = VERB)]
struct Flags {
    /// Do not touch values.
    #[arg(short, long)]
    keys_only: bool,

    /// Do not touch keys.
    #[arg(short, long)]
    values_only: bool,
}

/// Which parts of each field are cleaned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanMode {
    KeysAndValues,
    KeysOnly,
    ValuesOnly,
}

pub struct CleanWhitespace {
    mode: CleanMode,
}

impl CleanWhitespace {
    pub fn new(mode: CleanMode) -> Self {
        Self { mode }
    }

    pub fn from_args(args: &[String]) -> Result<Self> {
        let flags: Flags = parse_flags(args)?;
        let mode = match (flags.keys_only, flags.values_only) {
            (false, false) => CleanMode::KeysAndValues,
            (true, false) => CleanMode::KeysOnly,
            (false, true) => CleanMode::ValuesOnly,
            (true, true) => {
                return Err(PipelineError::usage(
                    VERB,
                    "-k and -v together would clean nothing; omit both to clean keys and values",
                ));
            }
        };
        Ok(Self::new(mode))
    }

    pub fn mode(&self) -> CleanMode {
        self.mode
    }
}

impl Stage for CleanWhitespace {
    fn process(&mut self, mut record: Record, context: &Arc<Context>, emit: &mut Emitter<'_>) {
        let record = match self.mode {
            CleanMode::ValuesOnly => {
                for (_, value) in record.iter_mut() {
                    *value = value.clean_whitespace();
                }
                record
            }
            // Keys change, so the fields move into a new record. Two keys
            // that clean to the same name collapse into one field.
            CleanMode::KeysOnly | CleanMode::KeysAndValues => {
                let clean_values = self.mode == CleanMode::KeysAndValues;
                let mut cleaned = Record::with_capacity(record.len());
                for (key, value) in record {
                    let value = if clean_values {
                        value.clean_whitespace()
                    } else {
                        value
                    };
                    cleaned.put(clean_whitespace(&key), value);
                }
                cleaned
            }
        };
        emit.emit(record, Arc::clone(context));
    }

    fn name(&self) -> &str {
        VERB
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Envelope;
    use crate::pipeline::run_inline;
    use crate::verbs::args;

    fn clean(mode: CleanMode, record: Record) -> Record {
        let mut stages: Vec<Box<dyn Stage>> = vec![Box::new(CleanWhitespace::new(mode))];
        let out = run_inline(&mut stages, [Envelope::data(record, Context::detached())]);
        out.into_iter().next().and_then(Envelope::into_record).unwrap()
    }

    fn pairs(record: &Record) -> Vec<(String, String)> {
        record
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_values_only() {
        let out = clean(
            CleanMode::ValuesOnly,
            Record::from_pairs([("a", " x "), ("b", "y  z")]),
        );
        assert_eq!(
            pairs(&out),
            vec![
                ("a".to_string(), "x".to_string()),
                ("b".to_string(), "y z".to_string())
            ]
        );
    }

    #[test]
    fn test_keys_only_leaves_values() {
        let out = clean(CleanMode::KeysOnly, Record::from_pairs([(" a  b ", " x ")]));
        assert_eq!(pairs(&out), vec![("a b".to_string(), " x ".to_string())]);
    }

    #[test]
    fn test_keys_and_values() {
        let out = clean(
            CleanMode::KeysAndValues,
            Record::from_pairs([(" k ", "\tv\t"), ("j", " 3 ")]),
        );
        assert_eq!(
            pairs(&out),
            vec![
                ("k".to_string(), "v".to_string()),
                ("j".to_string(), "3".to_string())
            ]
        );
        assert_eq!(out.get("j").and_then(|v| v.as_f64()), Some(3.0));
    }

    #[test]
    fn test_colliding_keys_keep_first_position() {
        let out = clean(
            CleanMode::KeysOnly,
            Record::from_pairs([("a", "1"), ("b", "2"), (" a", "3")]),
        );
        assert_eq!(
            pairs(&out),
            vec![
                ("a".to_string(), "3".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn test_idempotent() {
        let input = Record::from_pairs([("  x  y ", " p \t q "), ("z", "  ")]);
        let once = clean(CleanMode::KeysAndValues, input);
        let twice = clean(CleanMode::KeysAndValues, once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_flags() {
        let mode = |line| CleanWhitespace::from_args(&args(line)).map(|c| c.mode());
        assert_eq!(mode("clean-whitespace").unwrap(), CleanMode::KeysAndValues);
        assert_eq!(mode("clean-whitespace -k").unwrap(), CleanMode::KeysOnly);
        assert_eq!(
            mode("clean-whitespace --values-only").unwrap(),
            CleanMode::ValuesOnly
        );
        assert!(matches!(
            mode("clean-whitespace -k -v"),
            Err(PipelineError::VerbUsage { .. })
        ));
    }
}

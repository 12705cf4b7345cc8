//! Verbs: the concrete stages, built from command-line style arguments.
//!
//! A chain is written as verbs separated by `then`:
//!
//! ```text
//! clean-whitespace -v then sort -nr score then head -n 3
//! ```
//!
//! Supported verbs:
//! - `cat [-n] [-N name]` - pass records through, optionally numbering them
//! - `clean-whitespace [-k|-v]` - trim and collapse whitespace in keys and/or values
//! - `count [-o name]` - emit one record holding the record count
//! - `head [-n count]` - keep the first records
//! - `repeat -n count` - emit each record `count` times
//! - `require -f a,b,...` - turn records missing a field into errors
//! - `sort -f|-r|-nf|-nr fields` - sort by one or more fields
//! - `tac` - reverse the stream

mod cat;
mod clean_whitespace;
mod count;
mod head;
mod repeat;
mod require;
mod sort;
mod tac;

use clap::Parser;

pub use cat::Cat;
pub use clean_whitespace::{CleanMode, CleanWhitespace};
pub use count::Count;
pub use head::Head;
pub use repeat::Repeat;
pub use require::Require;
pub use sort::{Sort, SortKey, SortOrder};
pub use tac::Tac;

use crate::error::{PipelineError, Result};
use crate::stage::Stage;

/// Word separating verbs in a chain.
pub const THEN: &str = "then";

/// Names of all verbs [`build_stage`] accepts.
pub const VERB_NAMES: &[&str] = &[
    "cat",
    "clean-whitespace",
    "count",
    "head",
    "repeat",
    "require",
    "sort",
    "tac",
];

/// Split a `then`-separated argument list and build one stage per verb.
pub fn parse_chain(args: &[String]) -> Result<Vec<Box<dyn Stage>>> {
    if args.is_empty() {
        return Err(PipelineError::EmptyPipeline);
    }
    args.split(|a| a == THEN)
        .map(|verb_args| {
            if verb_args.is_empty() {
                Err(PipelineError::usage(THEN, "expected a verb before and after 'then'"))
            } else {
                build_stage(verb_args)
            }
        })
        .collect()
}

/// Create a stage from its argument list; `args[0]` is the verb name.
pub fn build_stage(args: &[String]) -> Result<Box<dyn Stage>> {
    let Some(verb) = args.first() else {
        return Err(PipelineError::EmptyPipeline);
    };
    match verb.as_str() {
        "cat" => Ok(Box::new(Cat::from_args(args)?)),
        "clean-whitespace" => Ok(Box::new(CleanWhitespace::from_args(args)?)),
        "count" => Ok(Box::new(Count::from_args(args)?)),
        "head" => Ok(Box::new(Head::from_args(args)?)),
        "repeat" => Ok(Box::new(Repeat::from_args(args)?)),
        "require" => Ok(Box::new(Require::from_args(args)?)),
        "sort" => Ok(Box::new(Sort::from_args(args)?)),
        "tac" => Ok(Box::new(Tac::from_args(args)?)),
        other => Err(PipelineError::UnknownVerb(other.to_string())),
    }
}

/// Parse verb flags with clap, reporting failures as usage errors.
fn parse_flags<P: Parser>(args: &[String]) -> Result<P> {
    P::try_parse_from(args).map_err(|e| {
        let verb = args.first().map(String::as_str).unwrap_or_default();
        PipelineError::usage(verb, e.to_string().trim_end())
    })
}

/// Split comma-separated field names, rejecting empty ones.
fn field_list(verb: &str, spec: &str) -> Result<Vec<String>> {
    let fields: Vec<String> = spec.split(',').map(|f| f.trim().to_string()).collect();
    if fields.iter().any(String::is_empty) {
        return Err(PipelineError::usage(verb, format!("empty field name in '{spec}'")));
    }
    Ok(fields)
}

#[cfg(test)]
fn args(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chain_names() {
        let stages = parse_chain(&args("cat -n then clean-whitespace -k then tac")).unwrap();
        let names: Vec<&str> = stages.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["cat", "clean-whitespace", "tac"]);
    }

    #[test]
    fn test_every_verb_builds_with_defaults() {
        for verb in VERB_NAMES {
            let line = match *verb {
                "repeat" => "repeat -n 2",
                "require" => "require -f a",
                "sort" => "sort -f a",
                other => other,
            };
            let stage = build_stage(&args(line)).unwrap();
            assert_eq!(stage.name(), *verb);
        }
    }

    #[test]
    fn test_unknown_verb() {
        let err = parse_chain(&args("cat then frobnicate")).err().unwrap();
        assert!(matches!(err, PipelineError::UnknownVerb(v) if v == "frobnicate"));
    }

    #[test]
    fn test_dangling_then() {
        assert!(matches!(
            parse_chain(&args("cat then")).err().unwrap(),
            PipelineError::VerbUsage { .. }
        ));
        assert!(matches!(
            parse_chain(&args("then cat")).err().unwrap(),
            PipelineError::VerbUsage { .. }
        ));
    }

    #[test]
    fn test_empty_chain() {
        assert!(matches!(
            parse_chain(&[]).err().unwrap(),
            PipelineError::EmptyPipeline
        ));
    }

    #[test]
    fn test_bad_flag_is_usage_error() {
        let err = build_stage(&args("head -n lots")).err().unwrap();
        assert!(matches!(err, PipelineError::VerbUsage { verb, .. } if verb == "head"));
    }

    #[test]
    fn test_field_list() {
        assert_eq!(field_list("x", "a, b").unwrap(), vec!["a", "b"]);
        assert!(field_list("x", "a,,b").is_err());
    }
}

pub mod canned;
pub mod process;

use serde::Serialize;
use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("could not launch {program}: {source}")]
    Launch { program: String, source: io::Error },
    #[error("could not read output of {program}: {source}")]
    Read { program: String, source: io::Error },
    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

/// A source of text lines produced by running an external utility.
///
/// The parsers in this crate only ever see the lines, so tests can feed
/// captured `ping`, `arp` or `dig` output through a canned source.
pub trait TextCommandSource {
    fn run(&self, program: &str, args: &[String]) -> Result<Vec<String>, CommandError>;
}

/// Outcome of a lookup whose utility ran fine but may not have printed
/// the datum we were after.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Lookup::Found(value),
            None => Lookup::NotFound,
        }
    }
}

pub fn command_line(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

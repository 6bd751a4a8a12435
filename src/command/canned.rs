use crate::command::{command_line, CommandError, TextCommandSource};
use log::info;
use std::io;
use std::sync::Mutex;

/// Answers every command with the same fixed lines and remembers what it was
/// asked to run.
pub struct CannedSource {
    output: Vec<String>,
    launchable: bool,
    calls: Mutex<Vec<String>>,
}

impl CannedSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CannedSource {
            output: lines.into_iter().map(Into::into).collect(),
            launchable: true,
            calls: Mutex::new(vec![]),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::<String>::new())
    }

    /// A source whose commands can never be started.
    pub fn unlaunchable() -> Self {
        CannedSource {
            launchable: false,
            ..Self::empty()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl TextCommandSource for CannedSource {
    fn run(&self, program: &str, args: &[String]) -> Result<Vec<String>, CommandError> {
        let line = command_line(program, args);
        info!("faking command {}", line);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(line);
        }
        if !self.launchable {
            return Err(CommandError::Launch {
                program: program.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "canned source refuses to launch"),
            });
        }
        Ok(self.output.clone())
    }
}

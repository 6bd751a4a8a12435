use crate::command::{command_line, CommandError, TextCommandSource};
use log::debug;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

const TERMINATE_GRACE: Duration = Duration::from_millis(100);

/// Runs utilities as child processes and collects their stdout line by line.
///
/// Without a timeout a hung utility blocks the caller forever, the same as
/// reading from a pipe would. With one, the child is terminated at the
/// deadline and the call fails with [`CommandError::TimedOut`].
///
/// Only the direct child is signalled. A grandchild that inherited stdout
/// (e.g. a command run under `sh -c`) keeps the pipe open, and the reader
/// thread lingers until it exits; `ping`, `arp` and `dig` are launched
/// directly so this does not arise for them.
#[derive(Clone, Debug, Default)]
pub struct ProcessSource {
    timeout: Option<Duration>,
}

impl ProcessSource {
    pub fn new() -> Self {
        Self { timeout: None }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

impl TextCommandSource for ProcessSource {
    fn run(&self, program: &str, args: &[String]) -> Result<Vec<String>, CommandError> {
        debug!("running {}", command_line(program, args));
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| CommandError::Launch {
                program: program.to_string(),
                source,
            })?;
        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                reap(program, &mut child);
                return Err(CommandError::Launch {
                    program: program.to_string(),
                    source: io::Error::new(io::ErrorKind::Other, "stdout was not captured"),
                });
            }
        };
        let lines = match self.timeout {
            None => read_lines(stdout).map_err(|source| CommandError::Read {
                program: program.to_string(),
                source,
            }),
            Some(timeout) => read_lines_until(program, stdout, &mut child, timeout),
        };
        reap(program, &mut child);
        lines
    }
}

fn read_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut buf = vec![];
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(&buf);
    Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
}

fn read_lines<R: Read>(output: R) -> io::Result<Vec<String>> {
    let mut reader = BufReader::new(output);
    let mut lines = vec![];
    while let Some(line) = read_line(&mut reader)? {
        lines.push(line);
    }
    Ok(lines)
}

fn read_lines_until<R: Read + Send + 'static>(
    program: &str,
    output: R,
    child: &mut Child,
    timeout: Duration,
) -> Result<Vec<String>, CommandError> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut reader = BufReader::new(output);
        loop {
            let next = read_line(&mut reader);
            let done = !matches!(next, Ok(Some(_)));
            if tx.send(next).is_err() || done {
                break;
            }
        }
    });

    let deadline = Instant::now() + timeout;
    let mut lines = vec![];
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(Ok(Some(line))) => lines.push(line),
            Ok(Ok(None)) | Err(RecvTimeoutError::Disconnected) => return Ok(lines),
            Ok(Err(source)) => {
                return Err(CommandError::Read {
                    program: program.to_string(),
                    source,
                })
            }
            Err(RecvTimeoutError::Timeout) => {
                debug!("{} timed out after {:?}, terminating", program, timeout);
                terminate(child);
                return Err(CommandError::TimedOut {
                    program: program.to_string(),
                    timeout,
                });
            }
        }
    }
}

fn terminate(child: &mut Child) {
    if let Ok(pid) = i32::try_from(child.id()) {
        if kill(Pid::from_raw(pid), Signal::SIGTERM).is_ok() {
            let deadline = Instant::now() + TERMINATE_GRACE;
            while Instant::now() < deadline {
                if let Ok(Some(_)) = child.try_wait() {
                    return;
                }
                thread::sleep(Duration::from_millis(10));
            }
        }
    }
    let _ = child.kill();
}

fn reap(program: &str, child: &mut Child) {
    match child.wait() {
        Ok(status) => debug!("{} exited with {}", program, status),
        Err(e) => debug!("could not reap {}: {}", program, e),
    }
}

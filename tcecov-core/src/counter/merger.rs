//! Merging two counter blocks for the same compiled unit.
//!
//! The arithmetic lives outside this crate. [`ProcessMerger`] hands both
//! blocks to an external program and reads the merged block back from its
//! standard output.

use super::record::CounterRecord;
use crate::config::Config;
use crate::CovError;
use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(20);
/// How long a killed merge's pipe readers get to see end of file
const READER_GRACE: Duration = Duration::from_millis(200);

/// Combines two checksum-matched records into one
pub trait CounterMerger: Send + Sync {
    fn merge_counter_sets(
        &self,
        a: &CounterRecord,
        b: &CounterRecord,
    ) -> crate::Result<CounterRecord>;
}

/// Runs `command... <file-a> <file-b>` and parses its standard output
#[derive(Debug, Clone)]
pub struct ProcessMerger {
    command: Vec<String>,
    timeout: Duration,
}

impl ProcessMerger {
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        Self { command, timeout }
    }

    /// Fails if the configured timeout does not parse
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        Ok(Self::new(config.merge.command.clone(), config.merge_timeout()?))
    }

    fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

impl CounterMerger for ProcessMerger {
    fn merge_counter_sets(
        &self,
        a: &CounterRecord,
        b: &CounterRecord,
    ) -> crate::Result<CounterRecord> {
        let source = a.source();
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| CovError::merge(source, "no merge command configured"))?;

        // Removed when dropped, whichever way this function returns
        let file_a = write_temp(a)?;
        let file_b = write_temp(b)?;

        debug!(command = %self.command_line(), source, "running counter merge");
        let mut child = Command::new(program)
            .args(args)
            .arg(file_a.path())
            .arg(file_b.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CovError::merge(source, format!("cannot run '{}': {}", program, e)))?;

        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = match wait_with_timeout(&mut child, self.timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                reap_reader(stdout, READER_GRACE);
                reap_reader(stderr, READER_GRACE);
                return Err(CovError::MergeTimeout {
                    command: self.command_line(),
                    timeout: self.timeout,
                });
            }
        };

        let output = stdout.join().unwrap_or_default();
        if !status.success() {
            let errors = stderr.join().unwrap_or_default();
            return Err(CovError::merge(
                source,
                format!("'{}' failed ({}): {}", self.command_line(), status, errors.trim()),
            ));
        }

        CounterRecord::from_text(&output)
            .map_err(|e| CovError::merge(source, format!("unreadable merge output: {}", e)))
    }
}

fn write_temp(record: &CounterRecord) -> crate::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(record.to_text().as_bytes())?;
    file.flush()?;
    Ok(file)
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    })
}

/// Join `reader` if it finishes within `grace`.
///
/// A grandchild of the killed merge program can hold the pipe open long
/// after the child is gone; such a reader is left detached and ends with
/// the grandchild.
fn reap_reader(reader: thread::JoinHandle<String>, grace: Duration) -> bool {
    let deadline = Instant::now() + grace;
    while !reader.is_finished() {
        if Instant::now() >= deadline {
            debug!("merge output pipe still open after kill, detaching reader");
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
    let _ = reader.join();
    true
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

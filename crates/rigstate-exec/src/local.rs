//! Local command execution using `std::process`

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, instrument, warn};

use crate::error::ExecError;
use crate::result::CommandResult;
use crate::traits::ProcessInvoker;

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Minimum wait for buffered output once the child has exited
const DRAIN_GRACE: Duration = Duration::from_millis(100);

/// Local command invoker
///
/// Spawns programs directly (no shell) and blocks the calling thread until
/// they exit or the timeout expires, in which case the child is killed.
#[derive(Debug, Clone)]
pub struct LocalInvoker;

impl LocalInvoker {
    /// Create a new local invoker
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalInvoker {
    fn default() -> Self {
        Self::new()
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(buf);
    });
    rx
}

/// Collected pipe output, or `None` when the pipe is still open at `deadline`
///
/// A grandchild that inherited the pipe keeps it open after the child exits.
/// Its reader thread is left behind.
fn collect_output(rx: &Receiver<Vec<u8>>, deadline: Instant) -> Option<String> {
    let wait = deadline.saturating_duration_since(Instant::now()).max(DRAIN_GRACE);
    rx.recv_timeout(wait)
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).to_string())
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

impl ProcessInvoker for LocalInvoker {
    #[instrument(skip(self), level = "debug")]
    fn invoke(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<CommandResult, ExecError> {
        let start = Instant::now();
        let deadline = start + timeout;

        debug!(program = %program, ?args, timeout = ?timeout, "executing local command");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ExecError::NotFound(program.to_string()),
                _ => ExecError::SpawnError(format!("{program}: {e}")),
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if start.elapsed() >= timeout {
                        kill(&mut child);
                        warn!(
                            program = %program,
                            timeout = ?timeout,
                            elapsed = ?start.elapsed(),
                            "command timed out"
                        );
                        return Err(ExecError::Timeout { timeout });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    kill(&mut child);
                    return Err(ExecError::IoError(format!("{program}: {e}")));
                }
            }
        };

        let status = status.code().unwrap_or(-1);
        let (Some(stdout), Some(stderr)) = (
            collect_output(&stdout, deadline),
            collect_output(&stderr, deadline),
        ) else {
            warn!(program = %program, timeout = ?timeout, "output pipe held open past the timeout");
            return Err(ExecError::Timeout { timeout });
        };
        let duration = start.elapsed();

        debug!(
            program = %program,
            status = status,
            duration = ?duration,
            "command completed"
        );

        if status != 0 {
            debug!(
                program = %program,
                status = status,
                stderr = %stderr.trim(),
                "command exited non-zero"
            );
        }

        Ok(CommandResult {
            status,
            stdout,
            stderr,
            duration,
        })
    }

    fn invoker_type(&self) -> &'static str {
        "local"
    }
}

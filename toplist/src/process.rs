//! Helpers for running a child process with its stdout and stderr streamed into separate sinks.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, warn};

/// What was observed while draining a finished child.
#[derive(Debug)]
pub struct StreamedOutput {
    pub status: ExitStatus,
    pub stdout_bytes: u64,
    pub stderr_bytes: u64,
    /// Set when reading stdout failed; the rest of that stream was dropped.
    pub stdout_read_error: Option<io::Error>,
    pub stderr_read_error: Option<io::Error>,
}

/// Spawn `cmd` with stdin closed and both output streams piped.
///
/// The raw `io::Error` is returned so callers can tell a launch failure
/// apart from anything that goes wrong later.
pub fn spawn_piped(mut cmd: Command) -> io::Result<Child> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    debug!("spawning child process");
    cmd.spawn()
}

/// Copy the child's stdout and stderr into the sinks as lines arrive, then wait for it.
///
/// Both pipes are read concurrently so a child that fills one of them never
/// blocks. Each line is flushed to its sink immediately. A final line without
/// a trailing newline gets one appended. Sink write failures do not stop the
/// draining; the first one is returned as an error once the child has exited.
/// A failed read ends that stream only and is reported in the output.
pub fn drain_to<O, E>(
    mut child: Child,
    stdout_sink: &mut O,
    stderr_sink: &mut E,
) -> Result<StreamedOutput>
where
    O: Write + Send,
    E: Write + Send,
{
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let (stdout_result, stderr_result) = thread::scope(|scope| {
        let stdout_handle = scope.spawn(move || tee_lines(stdout, stdout_sink));
        let stderr_handle = scope.spawn(move || tee_lines(stderr, stderr_sink));
        (join_output(stdout_handle), join_output(stderr_handle))
    });

    let status = child.wait().context("wait for child")?;

    let stdout = stdout_result.context("drain stdout")?;
    let stderr = stderr_result.context("drain stderr")?;
    if let Some(err) = stdout.write_error {
        return Err(err).context("write child stdout");
    }
    if let Some(err) = stderr.write_error {
        return Err(err).context("write child stderr");
    }

    debug!(
        exit_code = ?status.code(),
        stdout_bytes = stdout.bytes,
        stderr_bytes = stderr.bytes,
        "child finished"
    );
    Ok(StreamedOutput {
        status,
        stdout_bytes: stdout.bytes,
        stderr_bytes: stderr.bytes,
        stdout_read_error: stdout.read_error,
        stderr_read_error: stderr.read_error,
    })
}

#[derive(Debug)]
struct Drained {
    bytes: u64,
    write_error: Option<io::Error>,
    read_error: Option<io::Error>,
}

fn join_output(handle: thread::ScopedJoinHandle<'_, Drained>) -> Result<Drained> {
    handle
        .join()
        .map_err(|_| anyhow!("output reader thread panicked"))
}

fn tee_lines<R: Read, W: Write>(reader: R, sink: &mut W) -> Drained {
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    let mut bytes = 0u64;
    let mut ends_with_newline = true;
    let mut write_error = None;
    let mut read_error = None;

    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line);
        if !line.is_empty() {
            bytes += line.len() as u64;
            ends_with_newline = line.ends_with(b"\n");
            if write_error.is_none()
                && let Err(err) = write_line(sink, &line)
            {
                warn!(err = %err, "failed to write child output; draining the rest");
                write_error = Some(err);
            }
        }
        match read {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                warn!(
                    err = %err,
                    "failed to read child output; dropping the rest of the stream"
                );
                read_error = Some(err);
                break;
            }
        }
    }

    if !ends_with_newline && write_error.is_none() {
        write_error = write_line(sink, b"\n").err();
    }

    Drained {
        bytes,
        write_error,
        read_error,
    }
}

fn write_line<W: Write>(sink: &mut W, line: &[u8]) -> io::Result<()> {
    sink.write_all(line)?;
    sink.flush()
}

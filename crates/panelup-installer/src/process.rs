use std::ffi::OsStr;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Receives child output one line at a time, as it is produced.
pub trait OutputSink {
    fn line(&mut self, stream: OutputStream, line: &str);
}

/// Sink that keeps every line, for commands whose output is parsed.
#[derive(Debug, Default, Clone)]
pub struct CaptureSink {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl OutputSink for CaptureSink {
    fn line(&mut self, stream: OutputStream, line: &str) {
        match stream {
            OutputStream::Stdout => self.stdout.push(line.to_string()),
            OutputStream::Stderr => self.stderr.push(line.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    pub success: bool,
    pub code: Option<i32>,
}

impl ProcessExit {
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
        }
    }

    pub fn failure(code: Option<i32>) -> Self {
        Self {
            success: false,
            code,
        }
    }

    fn from_status(status: ExitStatus) -> Self {
        Self {
            success: status.success(),
            code: status.code(),
        }
    }

    fn and(self, other: Self) -> Self {
        if !self.success {
            return self;
        }
        other
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I, cwd: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: cwd.to_path_buf(),
        }
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(shell_word)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(self.args.iter().map(OsStr::new))
            .current_dir(&self.cwd);
        command
    }
}

pub(crate) fn shell_word(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || "-_./:=@%+,".contains(ch));
    if plain {
        word.to_string()
    } else {
        format!("\"{}\"", word.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

/// Runs the external side of a pipeline step. `Err` means the process could
/// not be started at all; a non-zero exit is an `Ok` carrying the failure.
pub trait CommandRunner {
    fn run(&mut self, invocation: &Invocation, sink: &mut dyn OutputSink) -> Result<ProcessExit>;

    fn fetch_extract(
        &mut self,
        request: &crate::fetch::FetchRequest,
        sink: &mut dyn OutputSink,
    ) -> Result<ProcessExit>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation, sink: &mut dyn OutputSink) -> Result<ProcessExit> {
        let mut command = invocation.to_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        tracing::debug!(
            command = %invocation.command_line(),
            cwd = %invocation.cwd.display(),
            "spawning"
        );
        let mut child = command
            .spawn()
            .with_context(|| format!("failed to launch '{}'", invocation.program))?;

        let readers = take_output_readers(&mut child, OutputStream::Stdout, OutputStream::Stderr);
        forward_output(readers, sink);
        let exit = wait_child(&mut child, &invocation.program)?;
        tracing::debug!(
            command = %invocation.command_line(),
            code = ?exit.code,
            "exited"
        );
        Ok(exit)
    }

    fn fetch_extract(
        &mut self,
        request: &crate::fetch::FetchRequest,
        sink: &mut dyn OutputSink,
    ) -> Result<ProcessExit> {
        crate::fetch::run_fetch_extract(request, sink)
    }
}

pub(crate) type OutputReader = (OutputStream, Box<dyn Read + Send>);

pub(crate) fn take_output_readers(
    child: &mut Child,
    stdout_as: OutputStream,
    stderr_as: OutputStream,
) -> Vec<OutputReader> {
    let mut readers: Vec<OutputReader> = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push((stdout_as, Box::new(stdout)));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push((stderr_as, Box::new(stderr)));
    }
    readers
}

/// Forwards every reader line by line until all of them reach EOF. Lines are
/// delivered on the calling thread in arrival order.
pub(crate) fn forward_output(readers: Vec<OutputReader>, sink: &mut dyn OutputSink) {
    let (tx, rx) = mpsc::channel::<(OutputStream, String)>();
    thread::scope(|scope| {
        for (stream, reader) in readers {
            let tx = tx.clone();
            scope.spawn(move || read_lines(reader, stream, &tx));
        }
        drop(tx);
        for (stream, line) in rx {
            sink.line(stream, &line);
        }
    });
}

fn read_lines(
    reader: Box<dyn Read + Send>,
    stream: OutputStream,
    tx: &mpsc::Sender<(OutputStream, String)>,
) {
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer) {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buffer);
                if tx.send((stream, last_segment(&text))).is_err() {
                    break;
                }
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                tracing::warn!(error = %err, "stopped reading child output");
                break;
            }
        }
    }
}

// Progress meters redraw in place with '\r'; keep only the final redraw.
fn last_segment(text: &str) -> String {
    let text = text.trim_end_matches(['\n', '\r']);
    text.rsplit('\r')
        .find(|segment| !segment.trim().is_empty())
        .unwrap_or(text)
        .to_string()
}

pub(crate) fn wait_child(child: &mut Child, program: &str) -> Result<ProcessExit> {
    let status = child
        .wait()
        .with_context(|| format!("failed waiting for '{program}'"))?;
    Ok(ProcessExit::from_status(status))
}

pub(crate) fn combine_exits(exits: &[ProcessExit]) -> ProcessExit {
    exits
        .iter()
        .copied()
        .fold(ProcessExit::ok(), ProcessExit::and)
}

pub fn error_chain_has_not_found(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|io_err| io_err.kind() == io::ErrorKind::NotFound)
    })
}

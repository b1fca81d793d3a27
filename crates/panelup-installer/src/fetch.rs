use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;

use anyhow::{anyhow, Context, Result};
use panelup_core::ArchiveType;

use crate::process::{
    combine_exits, error_chain_has_not_found, forward_output, shell_word, take_output_readers,
    wait_child, OutputSink, OutputStream, ProcessExit,
};

const CURL_PROGRAM: &str = "curl";

/// Download `url` and unpack it over `dest` without touching a temp file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub archive: ArchiveType,
    pub dest: PathBuf,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, dest: &Path) -> Self {
        let url = url.into();
        Self {
            archive: ArchiveType::for_url(&url),
            url,
            dest: dest.to_path_buf(),
        }
    }

    pub fn curl_args(&self) -> Vec<String> {
        vec!["-L".to_string(), self.url.clone()]
    }

    pub fn tar_args(&self) -> Vec<String> {
        self.archive
            .tar_extract_args()
            .iter()
            .map(|arg| arg.to_string())
            .collect()
    }

    pub fn command_line(&self) -> String {
        let curl = std::iter::once(CURL_PROGRAM.to_string())
            .chain(self.curl_args().iter().map(|arg| shell_word(arg)))
            .collect::<Vec<_>>()
            .join(" ");
        let tar = std::iter::once("tar".to_string())
            .chain(self.tar_args())
            .collect::<Vec<_>>()
            .join(" ");
        format!("{curl} | {tar}")
    }
}

pub(crate) fn run_fetch_extract(
    request: &FetchRequest,
    sink: &mut dyn OutputSink,
) -> Result<ProcessExit> {
    run_fetch_extract_with(request, CURL_PROGRAM, sink)
}

pub(crate) fn run_fetch_extract_with(
    request: &FetchRequest,
    curl_program: &str,
    sink: &mut dyn OutputSink,
) -> Result<ProcessExit> {
    match spawn_curl(request, curl_program) {
        Ok(curl) => pipe_curl_into_tar(request, curl, sink),
        Err(err) if error_chain_has_not_found(&err) => {
            tracing::info!(
                url = %request.url,
                program = curl_program,
                "curl not found on PATH, using built-in http client"
            );
            sink.line(
                OutputStream::Stderr,
                "curl was not found on PATH; downloading with the built-in http client",
            );
            stream_http_into_tar(request, sink)
        }
        Err(err) => Err(err),
    }
}

fn spawn_curl(request: &FetchRequest, curl_program: &str) -> Result<Child> {
    Command::new(curl_program)
        .args(request.curl_args())
        .current_dir(&request.dest)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to launch '{curl_program}'"))
}

fn tar_command(request: &FetchRequest, stdin: Stdio) -> Command {
    let mut command = Command::new("tar");
    command
        .args(request.tar_args())
        .current_dir(&request.dest)
        .stdin(stdin)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    command
}

fn pipe_curl_into_tar(
    request: &FetchRequest,
    mut curl: Child,
    sink: &mut dyn OutputSink,
) -> Result<ProcessExit> {
    let Some(curl_stdout) = curl.stdout.take() else {
        let _ = curl.kill();
        return Err(anyhow!("curl stdout was not captured"));
    };

    let mut tar = match tar_command(request, Stdio::from(curl_stdout)).spawn() {
        Ok(tar) => tar,
        Err(err) => {
            let _ = curl.kill();
            let _ = curl.wait();
            return Err(err).context("failed to launch 'tar'");
        }
    };

    let mut readers = take_output_readers(&mut curl, OutputStream::Stdout, OutputStream::Stderr);
    readers.extend(take_output_readers(
        &mut tar,
        OutputStream::Stdout,
        OutputStream::Stderr,
    ));
    forward_output(readers, sink);

    let curl_exit = wait_child(&mut curl, "curl")?;
    let tar_exit = wait_child(&mut tar, "tar")?;
    tracing::debug!(curl = ?curl_exit.code, tar = ?tar_exit.code, "fetch pipeline exited");
    Ok(combine_exits(&[curl_exit, tar_exit]))
}

fn stream_http_into_tar(request: &FetchRequest, sink: &mut dyn OutputSink) -> Result<ProcessExit> {
    let mut response = reqwest::blocking::get(&request.url)
        .with_context(|| format!("failed to download {}", request.url))?
        .error_for_status()
        .with_context(|| format!("failed to download {}", request.url))?;

    let mut tar = tar_command(request, Stdio::piped()).spawn().context("failed to launch 'tar'")?;
    let Some(mut tar_stdin) = tar.stdin.take() else {
        let _ = tar.kill();
        return Err(anyhow!("tar stdin was not captured"));
    };
    let readers = take_output_readers(&mut tar, OutputStream::Stdout, OutputStream::Stderr);

    let copied = thread::scope(|scope| {
        let writer = scope.spawn(move || -> io::Result<u64> {
            let copied = io::copy(&mut response, &mut tar_stdin);
            drop(tar_stdin);
            copied
        });
        forward_output(readers, sink);
        writer.join()
    });

    let tar_exit = wait_child(&mut tar, "tar")?;
    match copied {
        Ok(Ok(bytes)) => {
            tracing::debug!(bytes, "streamed archive into tar");
            Ok(tar_exit)
        }
        Ok(Err(err)) => {
            sink.line(
                OutputStream::Stderr,
                &format!("download of {} was interrupted: {err}", request.url),
            );
            Ok(ProcessExit::failure(tar_exit.code))
        }
        Err(_) => Err(anyhow!("archive download thread panicked")),
    }
}

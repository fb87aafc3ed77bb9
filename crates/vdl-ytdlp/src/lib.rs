//! yt-dlp adapter.
//!
//! Implements the `vdl-core` `MediaFetcher` port by driving the `yt-dlp` CLI.

use std::{
    collections::VecDeque,
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
    sync::Arc,
};

use async_trait::async_trait;

use vdl_core::{download::MediaFetcher, errors::Error, Result};

use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    process::Command,
    sync::Mutex,
};

const STDERR_TAIL_MAX_BYTES: usize = 16 * 1024;
const STDERR_TAIL_MAX_LINES: usize = 200;

/// Output file named after the resource's own id and extension.
const OUTPUT_TEMPLATE: &str = "%(id)s.%(ext)s";

#[derive(Clone, Debug)]
pub struct YtDlpConfig {
    pub program: PathBuf,
    pub verbose: bool,
}

/// Program + arguments for one yt-dlp run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

#[derive(Clone, Debug)]
pub struct YtDlpFetcher {
    cfg: YtDlpConfig,
}

#[derive(Clone, Debug, Default)]
struct StderrTail {
    lines: VecDeque<String>,
    bytes: usize,
}

impl StderrTail {
    fn push_line(&mut self, line: String) {
        // +1 for the '\n' we join with later.
        self.bytes = self.bytes.saturating_add(line.len() + 1);
        self.lines.push_back(line);

        while self.lines.len() > STDERR_TAIL_MAX_LINES || self.bytes > STDERR_TAIL_MAX_BYTES {
            if let Some(front) = self.lines.pop_front() {
                self.bytes = self.bytes.saturating_sub(front.len() + 1);
            } else {
                break;
            }
        }
    }

    fn snapshot(&self) -> String {
        self.lines.iter().cloned().collect::<Vec<_>>().join("\n")
    }
}

impl YtDlpFetcher {
    pub fn new(cfg: YtDlpConfig) -> Self {
        Self { cfg }
    }

    /// Single item only (no playlist expansion), written into `work_dir` alone.
    pub fn build_invocation(&self, url: &str, work_dir: &Path) -> Invocation {
        let mut args: Vec<OsString> = vec!["--no-playlist".into()];
        if self.cfg.verbose {
            args.push("--verbose".into());
        }
        args.push("-o".into());
        args.push(work_dir.join(OUTPUT_TEMPLATE).into_os_string());
        // `--` keeps a URL from ever being parsed as an option.
        args.push("--".into());
        args.push(url.into());

        Invocation {
            program: self.cfg.program.clone(),
            args,
        }
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(&self, url: &str, work_dir: &Path) -> Result<()> {
        let inv = self.build_invocation(url, work_dir);

        let mut cmd = Command::new(&inv.program);
        cmd.args(&inv.args)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Timeouts drop this future; the child must not outlive it.
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            Error::Fetch(format!(
                "failed to start {}: {e}",
                inv.program.display()
            ))
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Fetch("yt-dlp stdout was not captured".to_string()))?;
        let stderr = child.stderr.take();
        let stderr_tail: Arc<Mutex<StderrTail>> = Arc::new(Mutex::new(StderrTail::default()));

        // Drain stderr in background to avoid blocking on a full pipe.
        let stderr_task = stderr.map(|stderr| {
            let tail = stderr_tail.clone();
            tokio::spawn(async move {
                let mut r = BufReader::new(stderr);
                let mut buf = Vec::new();
                while let Ok(Some(line)) = next_lossy_line(&mut r, &mut buf).await {
                    tracing::debug!(target: "vdl_ytdlp::stderr", "{line}");
                    tail.lock().await.push_line(line);
                }
            })
        });

        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        while let Some(line) = next_lossy_line(&mut reader, &mut buf).await? {
            tracing::debug!(target: "vdl_ytdlp::stdout", "{line}");
        }

        let status = child.wait().await?;
        if let Some(task) = stderr_task {
            let _ = task.await;
        }

        if !status.success() {
            let stderr = stderr_tail.lock().await.snapshot();
            if !stderr.trim().is_empty() {
                return Err(Error::Fetch(format!(
                    "yt-dlp exited with status {status}\nstderr (tail):\n{stderr}"
                )));
            }
            return Err(Error::Fetch(format!("yt-dlp exited with status {status}")));
        }

        Ok(())
    }
}

/// Next `\n`-terminated line, decoded lossily; `None` at EOF.
///
/// yt-dlp echoes titles and paths verbatim, which are not always UTF-8. The
/// pipe must keep being drained or the child dies on SIGPIPE.
async fn next_lossy_line<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf);
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

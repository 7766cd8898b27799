use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::render::domain::render_error::RenderError;
use crate::render::domain::render_job::RenderJob;
use crate::render::domain::renderer::Renderer;
use crate::shared::config::RenderConfig;

const STDERR_TAIL_LINES: usize = 20;

/// Renders captions by running the Remotion CLI as a child process.
///
/// Invocation:
/// `<program> <prefix args> <entry point> <composition> <output> --props <json>
/// [--gl=<backend>] [--concurrency=<n>]`
///
/// On unix the process leads its own process group, so a timeout takes down
/// everything it started (npx, node, headless browsers), not only the direct child.
#[derive(Debug, Clone)]
pub struct RemotionRenderer {
    program: String,
    prefix_args: Vec<String>,
    entry_point: String,
    composition_id: String,
    gl_backend: Option<String>,
    concurrency: Option<u32>,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl RemotionRenderer {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            program: config.program.clone(),
            prefix_args: config.prefix_args.clone(),
            entry_point: config.entry_point.clone(),
            composition_id: config.composition_id.clone(),
            gl_backend: config.gl_backend.clone(),
            concurrency: config.concurrency,
            working_dir: config.working_dir.clone(),
            timeout: config.timeout(),
        }
    }

    /// Arguments passed after the program name.
    pub fn command_args(&self, job: &RenderJob) -> Result<Vec<OsString>, RenderError> {
        let mut args: Vec<OsString> = self.prefix_args.iter().map(OsString::from).collect();
        args.push(OsString::from(&self.entry_point));
        args.push(OsString::from(&self.composition_id));
        args.push(job.output_path().as_os_str().to_owned());
        args.push(OsString::from("--props"));
        args.push(OsString::from(job.props_json()?));
        if let Some(ref gl) = self.gl_backend {
            args.push(OsString::from(format!("--gl={gl}")));
        }
        if let Some(n) = self.concurrency {
            args.push(OsString::from(format!("--concurrency={n}")));
        }
        Ok(args)
    }

    async fn run(&self, args: Vec<OsString>) -> Result<(), RenderError> {
        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        if let Some(ref dir) = self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| RenderError::Spawn {
            program: self.program.clone(),
            source: e,
        })?;
        // `id()` is gone once the child is reaped; the group id outlives it.
        let pid = child.id();

        let stdout = child.stdout.take().map(|out| spawn_drain(out, false));
        let stderr = child.stderr.take().map(|err| spawn_drain(err, true));

        let status = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status.map_err(RenderError::Wait)?,
                Err(_) => {
                    log::warn!("Render exceeded {limit:?}; killing process group {pid:?}");
                    terminate(pid, &mut child).await;
                    return Err(RenderError::Timeout(limit));
                }
            },
            None => child.wait().await.map_err(RenderError::Wait)?,
        };

        // Leftover helpers would hold the pipes open.
        kill_group(pid);

        if let Some(handle) = stdout {
            let _ = handle.await;
        }
        let stderr_tail = match stderr {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            return Err(RenderError::ProcessFailed {
                status: status.to_string(),
                stderr_tail,
            });
        }
        Ok(())
    }
}

impl Renderer for RemotionRenderer {
    fn submit(&self, job: &RenderJob) -> Result<PathBuf, RenderError> {
        let args = self.command_args(job)?;

        log::info!(
            "Rendering {} -> {} ({} segments)",
            job.video_path().display(),
            job.output_path().display(),
            job.segments().len()
        );
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(RenderError::Runtime)?;
        runtime.block_on(self.run(args))?;
        Ok(job.output_path().to_path_buf())
    }
}

async fn terminate(pid: Option<u32>, child: &mut Child) {
    kill_group(pid);
    let _ = child.kill().await;
    let _ = child.wait().await;
}

#[cfg(unix)]
fn kill_group(pid: Option<u32>) {
    let Some(pid) = pid.and_then(|p| libc::pid_t::try_from(p).ok()) else {
        return;
    };
    // SAFETY: killpg only sends a signal; the group was created for this child.
    unsafe {
        libc::killpg(pid, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: Option<u32>) {}

/// Forward a child pipe to the log and keep its last lines.
fn spawn_drain<R>(pipe: R, is_stderr: bool) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
        let mut lines = BufReader::new(pipe).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if is_stderr {
                log::debug!("[remotion stderr] {line}");
            } else {
                log::debug!("[remotion] {line}");
            }
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }
        tail.into_iter().collect::<Vec<_>>().join("\n")
    })
}

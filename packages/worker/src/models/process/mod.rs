pub mod error;

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use error::ProcessError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How long pipe readers may keep draining after the process is gone.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(1);

/// One process invocation: argument vector, no shell.
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Written to the child's stdin, which is then closed. `None` attaches /dev/null.
    pub stdin: Option<String>,
    pub timeout: Duration,
    /// Bytes kept from each of stdout and stderr.
    pub max_output_bytes: usize,
    /// Start from an empty environment, keeping only `PATH`.
    pub clear_env: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Exited(ExitStatus),
    /// Killed after exceeding the timeout.
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ProcessStatus,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
    /// Set when either stream exceeded `max_output_bytes` or could not be read to the end.
    pub truncated: bool,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        matches!(self.status, ProcessStatus::Exited(status) if status.success())
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.status {
            ProcessStatus::Exited(status) => status.code(),
            ProcessStatus::TimedOut => None,
        }
    }

    /// Human-readable reason for a non-zero exit.
    pub fn describe_exit(&self) -> String {
        match self.status {
            ProcessStatus::TimedOut => "process timed out".to_string(),
            ProcessStatus::Exited(status) => {
                if let Some(code) = status.code() {
                    return format!("process exited with code {code}");
                }
                #[cfg(unix)]
                {
                    use std::os::unix::process::ExitStatusExt;
                    if let Some(signal) = status.signal() {
                        return format!("process terminated by signal {signal}");
                    }
                }
                "process terminated abnormally".to_string()
            }
        }
    }
}

/// Spawn the process, feed stdin, capture output incrementally and enforce the timeout.
///
/// On timeout the child is killed and reaped before returning.
pub async fn run_process(spec: &ProcessSpec) -> Result<ProcessOutput, ProcessError> {
    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .current_dir(&spec.cwd)
        .stdin(if spec.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Own process group, so descendants can be killed together with the child.
    #[cfg(unix)]
    command.process_group(0);

    if spec.clear_env {
        command.env_clear();
        if let Some(path) = std::env::var_os("PATH") {
            command.env("PATH", path);
        }
    }

    let start = Instant::now();
    let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
        program: spec.program.clone(),
        source,
    })?;
    let pid = child.id();
    debug!(program = %spec.program, pid = ?pid, "Process spawned");

    let stdin_task = match (child.stdin.take(), spec.stdin.clone()) {
        (Some(mut pipe), Some(input)) => Some(tokio::spawn(async move {
            // The child may exit without reading; a broken pipe is not an error here.
            let _ = pipe.write_all(input.as_bytes()).await;
            let _ = pipe.shutdown().await;
        })),
        _ => None,
    };

    let stdout = child.stdout.take().ok_or(ProcessError::Pipe("stdout"))?;
    let stderr = child.stderr.take().ok_or(ProcessError::Pipe("stderr"))?;
    let stdout_capture = SharedCapture::default();
    let stderr_capture = SharedCapture::default();
    let stdout_task = tokio::spawn(read_capped(
        stdout,
        spec.max_output_bytes,
        stdout_capture.clone(),
    ));
    let stderr_task = tokio::spawn(read_capped(
        stderr,
        spec.max_output_bytes,
        stderr_capture.clone(),
    ));

    let status = match tokio::time::timeout(spec.timeout, child.wait()).await {
        Ok(status) => ProcessStatus::Exited(status?),
        Err(_) => {
            kill_process_group(pid);
            child.kill().await?;
            debug!(
                program = %spec.program,
                timeout_ms = spec.timeout.as_millis() as u64,
                "Process killed after timeout"
            );
            ProcessStatus::TimedOut
        }
    };
    let elapsed = start.elapsed();
    // Reap anything the program left running in the background.
    kill_process_group(pid);

    if let Some(task) = stdin_task {
        task.abort();
    }
    let (stdout, stdout_truncated) = collect(stdout_task, stdout_capture, "stdout").await;
    let (stderr, stderr_truncated) = collect(stderr_task, stderr_capture, "stderr").await;

    Ok(ProcessOutput {
        status,
        stdout,
        stderr,
        elapsed,
        truncated: stdout_truncated || stderr_truncated,
    })
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid.and_then(|p| libc::pid_t::try_from(p).ok()) else {
        return;
    };
    // SAFETY: kill(2) has no memory-safety preconditions; a negative pid targets the group.
    // ESRCH (group already gone) is expected and ignored.
    unsafe {
        libc::kill(-pid, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

/// Output read so far. Lives outside the reader task so an aborted reader loses nothing.
#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    truncated: bool,
}

type SharedCapture = Arc<Mutex<Captured>>;

fn lock(capture: &SharedCapture) -> MutexGuard<'_, Captured> {
    capture.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn read_capped<R: AsyncRead + Unpin>(
    mut reader: R,
    limit: usize,
    capture: SharedCapture,
) -> std::io::Result<()> {
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        // Keep draining past the limit so the child never blocks on a full pipe.
        {
            let mut captured = lock(&capture);
            let room = limit.saturating_sub(captured.bytes.len());
            if n > room {
                captured.truncated = true;
            }
            captured.bytes.extend_from_slice(&chunk[..n.min(room)]);
        }
    }
}

async fn collect(
    mut task: JoinHandle<std::io::Result<()>>,
    capture: SharedCapture,
    stream: &'static str,
) -> (String, bool) {
    let mut cut_short = false;
    match tokio::time::timeout(OUTPUT_DRAIN_GRACE, &mut task).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => {
            warn!(stream, error = %e, "Failed to read process output");
            cut_short = true;
        }
        Ok(Err(e)) => {
            warn!(stream, error = %e, "Output reader task failed");
            cut_short = true;
        }
        Err(_) => {
            // A descendant outside the process group still holds the pipe open.
            task.abort();
            warn!(
                stream,
                "Output pipe still open after process exit, keeping output read so far"
            );
            cut_short = true;
        }
    }

    let captured = std::mem::take(&mut *lock(&capture));
    (
        String::from_utf8_lossy(&captured.bytes).into_owned(),
        captured.truncated || cut_short,
    )
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn spec(program: &str, args: &[&str], stdin: Option<&str>, timeout: Duration) -> ProcessSpec {
        ProcessSpec {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: std::env::temp_dir(),
            stdin: stdin.map(str::to_string),
            timeout,
            max_output_bytes: 1024,
            clear_env: true,
        }
    }

    #[tokio::test]
    async fn test_stdin_reaches_child() {
        let out = run_process(&spec("cat", &[], Some("hello\n"), Duration::from_secs(5)))
            .await
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.exit_code(), Some(0));
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let out = run_process(&spec("sleep", &["5"], None, Duration::from_millis(200)))
            .await
            .unwrap();
        assert_eq!(out.status, ProcessStatus::TimedOut);
        assert!(out.elapsed < Duration::from_secs(4));
        assert_eq!(out.exit_code(), None);
    }

    /// Gone from the process table, or a zombie waiting to be reaped by its new parent.
    #[cfg(target_os = "linux")]
    fn not_running(pid: u32) -> bool {
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Err(_) => true,
            Ok(stat) => stat
                .rsplit_once(')')
                .is_some_and(|(_, rest)| rest.trim_start().starts_with('Z')),
        }
    }

    #[tokio::test]
    async fn test_timeout_kills_background_descendants() {
        let out = run_process(&spec(
            "sh",
            &["-c", "sleep 5 & echo $$ $!; sleep 5; echo done"],
            None,
            Duration::from_millis(300),
        ))
        .await
        .unwrap();
        assert_eq!(out.status, ProcessStatus::TimedOut);
        // Pipes close once the whole group is gone, so nothing is cut short.
        assert!(!out.truncated);

        #[cfg(target_os = "linux")]
        {
            let pids: Vec<u32> = out
                .stdout
                .split_whitespace()
                .map(|pid| pid.parse().unwrap())
                .collect();
            assert_eq!(pids.len(), 2, "{}", out.stdout);
            // The shell was reaped before returning.
            assert!(not_running(pids[0]));
            // The orphaned sleep got SIGKILL; give init a moment to reap it.
            let deadline = Instant::now() + Duration::from_secs(1);
            while !not_running(pids[1]) && Instant::now() < deadline {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            assert!(not_running(pids[1]));
        }
    }

    #[tokio::test]
    async fn test_output_survives_descendant_holding_pipe() {
        if std::process::Command::new("setsid").arg("true").status().is_err() {
            eprintln!("skipping: setsid not found");
            return;
        }
        let out = run_process(&spec(
            "sh",
            &["-c", "echo 42; setsid sleep 3 & sleep 0.3"],
            None,
            Duration::from_secs(5),
        ))
        .await
        .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, "42\n");
        assert!(out.truncated);
    }

    #[tokio::test]
    async fn test_nonzero_exit_keeps_stderr() {
        let out = run_process(&spec(
            "sh",
            &["-c", "echo broken >&2; exit 3"],
            None,
            Duration::from_secs(5),
        ))
        .await
        .unwrap();
        assert!(!out.success());
        assert_eq!(out.exit_code(), Some(3));
        assert_eq!(out.stderr, "broken\n");
        assert_eq!(out.describe_exit(), "process exited with code 3");
    }

    #[tokio::test]
    async fn test_output_is_capped() {
        let out = run_process(&spec(
            "sh",
            &["-c", "head -c 5000 /dev/zero"],
            None,
            Duration::from_secs(5),
        ))
        .await
        .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.len(), 1024);
        assert!(out.truncated);
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let err = run_process(&spec(
            "definitely-not-a-real-binary",
            &[],
            None,
            Duration::from_secs(1),
        ))
        .await
        .unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }
}

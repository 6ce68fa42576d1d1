//! Execution backend: compile (if needed) and run one program against one input.

use std::time::Duration;

use async_trait::async_trait;
use common::{ExecutionResult, FailureKind, Language};
use tokio::fs;
use tracing::{debug, instrument, warn};

use super::language::{CommandLine, Toolchain};
use super::process::{ProcessOutput, ProcessSpec, ProcessStatus, run_process};
use super::workspace::{ArtifactDir, WorkDir};
use crate::config::ExecutionConfig;

/// Runs submitted code. The seam between judging and process management.
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    /// Compile if needed, run with `stdin`, and clean up. Never fails: every fault is
    /// folded into the returned result.
    async fn execute(&self, code: &str, language: Language, stdin: &str) -> ExecutionResult;

    /// Like [`CodeExecutor::execute`] for a raw language identifier. Unknown identifiers
    /// are rejected before anything is spawned.
    async fn execute_raw(&self, code: &str, language: &str, stdin: &str) -> ExecutionResult {
        match language.parse::<Language>() {
            Ok(language) => self.execute(code, language, stdin).await,
            Err(e) => ExecutionResult::failure(
                FailureKind::UnsupportedLanguage,
                e.to_string(),
                Duration::ZERO,
            ),
        }
    }
}

/// Lifecycle of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Created,
    Compiling,
    Running,
    Succeeded,
    CompileFailed,
    TimedOut,
    RuntimeFailed,
    /// Backend fault (I/O, spawn).
    Errored,
    Cleaned,
}

impl InvocationState {
    /// Terminal state reached by a finished invocation.
    pub fn terminal(result: &ExecutionResult) -> Self {
        match result.failure_kind() {
            None => Self::Succeeded,
            Some(FailureKind::CompilationError) => Self::CompileFailed,
            Some(FailureKind::TimeLimitExceeded) => Self::TimedOut,
            Some(FailureKind::RuntimeError) => Self::RuntimeFailed,
            Some(FailureKind::InternalError | FailureKind::UnsupportedLanguage) => Self::Errored,
        }
    }
}

struct Invocation {
    state: InvocationState,
}

impl Invocation {
    fn new() -> Self {
        Self {
            state: InvocationState::Created,
        }
    }

    fn advance(&mut self, next: InvocationState) {
        debug!(from = ?self.state, to = ?next, "Invocation state change");
        self.state = next;
    }
}

/// Executes code as local child processes inside per-invocation artifact directories.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    work_dir: WorkDir,
    toolchain: Toolchain,
    timeout: Duration,
    compile_timeout: Duration,
    max_output_bytes: usize,
}

impl ProcessExecutor {
    pub fn new(work_dir: WorkDir, config: &ExecutionConfig) -> Self {
        Self {
            work_dir,
            toolchain: Toolchain::from(config),
            timeout: config.timeout(),
            compile_timeout: config.compile_timeout(),
            max_output_bytes: config.max_output_bytes,
        }
    }

    fn spec(
        &self,
        command: &CommandLine,
        dir: &ArtifactDir,
        stdin: Option<&str>,
        timeout: Duration,
        clear_env: bool,
    ) -> ProcessSpec {
        ProcessSpec {
            program: command.program.clone(),
            args: command.args.clone(),
            cwd: dir.path().to_path_buf(),
            stdin: stdin.map(str::to_string),
            timeout,
            max_output_bytes: self.max_output_bytes,
            clear_env,
        }
    }

    async fn run_invocation(
        &self,
        invocation: &mut Invocation,
        dir: &ArtifactDir,
        code: &str,
        language: Language,
        stdin: &str,
    ) -> ExecutionResult {
        let descriptor = self.toolchain.descriptor(language, dir.path());

        if let Err(e) = fs::write(dir.file(&descriptor.source_file), code).await {
            return internal_error(format!("failed to write source file: {e}"));
        }

        if let Some(compile) = &descriptor.compile {
            invocation.advance(InvocationState::Compiling);
            let spec = self.spec(compile, dir, None, self.compile_timeout, false);
            let output = match run_process(&spec).await {
                Ok(output) => output,
                Err(e) => return internal_error(e.to_string()),
            };
            if output.status == ProcessStatus::TimedOut {
                return ExecutionResult::failure(
                    FailureKind::CompilationError,
                    format!(
                        "Compilation timed out after {} ms",
                        self.compile_timeout.as_millis()
                    ),
                    Duration::ZERO,
                );
            }
            if !output.success() {
                return ExecutionResult::failure(
                    FailureKind::CompilationError,
                    compiler_diagnostic(&output),
                    Duration::ZERO,
                )
                .with_exit_code(output.exit_code());
            }
        }

        invocation.advance(InvocationState::Running);
        let spec = self.spec(&descriptor.run, dir, Some(stdin), self.timeout, true);
        match run_process(&spec).await {
            Ok(output) => self.classify(output),
            Err(e) => internal_error(e.to_string()),
        }
    }

    fn classify(&self, output: ProcessOutput) -> ExecutionResult {
        if output.truncated {
            warn!(
                limit = self.max_output_bytes,
                "Program output exceeded capture limit and was truncated"
            );
        }

        match output.status {
            ProcessStatus::TimedOut => ExecutionResult::failure(
                FailureKind::TimeLimitExceeded,
                format!("Time limit exceeded ({} ms)", self.timeout.as_millis()),
                output.elapsed,
            ),
            ProcessStatus::Exited(_) if output.success() => {
                ExecutionResult::success(output.stdout.trim(), output.elapsed)
            }
            ProcessStatus::Exited(_) => {
                let diagnostic = if output.stderr.trim().is_empty() {
                    output.describe_exit()
                } else {
                    output.stderr.clone()
                };
                ExecutionResult::failure(FailureKind::RuntimeError, diagnostic, output.elapsed)
                    .with_exit_code(output.exit_code())
            }
        }
    }
}

#[async_trait]
impl CodeExecutor for ProcessExecutor {
    #[instrument(skip(self, code, stdin), fields(language = %language))]
    async fn execute(&self, code: &str, language: Language, stdin: &str) -> ExecutionResult {
        let dir = match self.work_dir.acquire().await {
            Ok(dir) => dir,
            Err(e) => return internal_error(format!("failed to create artifact directory: {e}")),
        };

        let mut invocation = Invocation::new();
        let result = self
            .run_invocation(&mut invocation, &dir, code, language, stdin)
            .await;
        invocation.advance(InvocationState::terminal(&result));

        let path = dir.path().to_path_buf();
        if let Err(e) = dir.release().await {
            // The drop guard retries synchronously.
            warn!(path = %path.display(), error = %e, "Failed to release artifact directory");
        }
        invocation.advance(InvocationState::Cleaned);

        debug!(
            success = result.is_success(),
            duration_ms = result.duration_ms(),
            "Execution finished"
        );
        result
    }
}

fn internal_error(message: String) -> ExecutionResult {
    warn!(error = %message, "Execution backend fault");
    ExecutionResult::failure(FailureKind::InternalError, message, Duration::ZERO)
}

fn compiler_diagnostic(output: &ProcessOutput) -> String {
    let combined = format!("{}{}", output.stderr, output.stdout);
    if combined.trim().is_empty() {
        format!("compiler {}", output.describe_exit())
    } else {
        combined
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use common::ExecutionOutcome;
    use std::path::Path;

    /// Executor whose "python" is `sh`, so shell snippets stand in for programs.
    async fn shell_executor(root: &Path, timeout_ms: u64) -> ProcessExecutor {
        let config = ExecutionConfig {
            work_dir: root.to_path_buf(),
            timeout_ms,
            python_bin: "sh".into(),
            cpp_compiler: "false".into(),
            ..ExecutionConfig::default()
        };
        let work_dir = WorkDir::init(root).await.unwrap();
        ProcessExecutor::new(work_dir, &config)
    }

    fn leftover_entries(root: &Path) -> usize {
        std::fs::read_dir(root).unwrap().count()
    }

    #[tokio::test]
    async fn test_success_trims_stdout() {
        let tmp = tempfile::tempdir().unwrap();
        let executor = shell_executor(tmp.path(), 5_000).await;
        let result = executor.execute("cat", Language::Python, "  42\n\n").await;
        assert_eq!(
            result.outcome,
            ExecutionOutcome::Success {
                stdout: "42".into()
            }
        );
        assert_eq!(leftover_entries(tmp.path()), 0);
    }

    #[tokio::test]
    async fn test_timeout_is_time_limit_exceeded() {
        let tmp = tempfile::tempdir().unwrap();
        let executor = shell_executor(tmp.path(), 200).await;
        let result = executor.execute("sleep 5", Language::Python, "").await;
        assert_eq!(result.failure_kind(), Some(FailureKind::TimeLimitExceeded));
        assert!(result.duration >= Duration::from_millis(200));
        assert!(result.duration < Duration::from_secs(4));
        assert_eq!(leftover_entries(tmp.path()), 0);
    }

    #[tokio::test]
    async fn test_runtime_error_carries_stderr() {
        let tmp = tempfile::tempdir().unwrap();
        let executor = shell_executor(tmp.path(), 5_000).await;
        let result = executor
            .execute("echo 'index out of range' >&2; exit 1", Language::Python, "")
            .await;
        assert_eq!(
            result.outcome,
            ExecutionOutcome::Failure {
                kind: FailureKind::RuntimeError,
                diagnostic: "index out of range\n".into()
            }
        );
        assert_eq!(result.exit_code, Some(1));
    }

    #[tokio::test]
    async fn test_silent_crash_gets_synthesized_diagnostic() {
        let tmp = tempfile::tempdir().unwrap();
        let executor = shell_executor(tmp.path(), 5_000).await;
        let result = executor.execute("exit 7", Language::Python, "").await;
        match result.outcome {
            ExecutionOutcome::Failure { kind, diagnostic } => {
                assert_eq!(kind, FailureKind::RuntimeError);
                assert_eq!(diagnostic, "process exited with code 7");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_compile_failure_skips_run_phase() {
        let tmp = tempfile::tempdir().unwrap();
        let executor = shell_executor(tmp.path(), 5_000).await;
        let result = executor
            .execute("int main() { return 0 }", Language::Cpp, "")
            .await;
        assert_eq!(result.failure_kind(), Some(FailureKind::CompilationError));
        assert_eq!(result.duration, Duration::ZERO);
        assert_eq!(leftover_entries(tmp.path()), 0);
    }

    #[tokio::test]
    async fn test_unknown_language_rejected_before_spawn() {
        let tmp = tempfile::tempdir().unwrap();
        let executor = shell_executor(tmp.path(), 5_000).await;
        let result = executor.execute_raw("fn main() {}", "rust", "").await;
        assert_eq!(result.failure_kind(), Some(FailureKind::UnsupportedLanguage));
        assert_eq!(leftover_entries(tmp.path()), 0);
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_internal_error() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ExecutionConfig {
            work_dir: tmp.path().to_path_buf(),
            node_bin: "no-such-node-binary".into(),
            ..ExecutionConfig::default()
        };
        let executor = ProcessExecutor::new(WorkDir::init(tmp.path()).await.unwrap(), &config);
        let result = executor.execute("console.log(1)", Language::Javascript, "").await;
        assert_eq!(result.failure_kind(), Some(FailureKind::InternalError));
        assert_eq!(leftover_entries(tmp.path()), 0);
    }

    #[tokio::test]
    async fn test_relative_work_dir_still_finds_source() {
        let relative = std::path::PathBuf::from(format!("exec-rel-{}", uuid::Uuid::new_v4()));
        let executor = shell_executor(&relative, 5_000).await;
        let result = executor.execute("cat", Language::Python, "42").await;
        let leftovers = leftover_entries(&relative);
        std::fs::remove_dir_all(&relative).unwrap();

        assert_eq!(
            result.outcome,
            ExecutionOutcome::Success {
                stdout: "42".into()
            }
        );
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_output_kept_when_descendant_escapes_group() {
        if std::process::Command::new("setsid").arg("true").status().is_err() {
            eprintln!("skipping: setsid not found");
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let executor = shell_executor(tmp.path(), 5_000).await;
        let result = executor
            .execute("echo 42; setsid sleep 3 & sleep 0.3", Language::Python, "")
            .await;
        assert_eq!(
            result.outcome,
            ExecutionOutcome::Success {
                stdout: "42".into()
            }
        );
    }

    #[test]
    fn test_terminal_states() {
        let ok = ExecutionResult::success("1", Duration::ZERO);
        assert_eq!(InvocationState::terminal(&ok), InvocationState::Succeeded);
        let tle = ExecutionResult::failure(FailureKind::TimeLimitExceeded, "", Duration::ZERO);
        assert_eq!(InvocationState::terminal(&tle), InvocationState::TimedOut);
    }
}

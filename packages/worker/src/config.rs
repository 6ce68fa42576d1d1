use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Worker-specific configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkerConfig {
    /// Unique identifier for this worker instance. Default: "worker-1".
    #[serde(default = "default_worker_id")]
    pub id: String,
    /// Jobs judged at the same time. Default: 4.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
    /// Jobs allowed to wait for a free slot before new ones are rejected. Default: 32.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_worker_id() -> String {
    "worker-1".into()
}
fn default_max_concurrent_jobs() -> usize {
    4
}
fn default_queue_capacity() -> usize {
    32
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            id: default_worker_id(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Execution backend configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ExecutionConfig {
    /// Directory hosting per-invocation artifact directories.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    /// Wall-clock budget of the run phase in milliseconds. Default: 20000.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Wall-clock budget of the compile phase in milliseconds. Default: 30000.
    #[serde(default = "default_compile_timeout_ms")]
    pub compile_timeout_ms: u64,
    /// Bytes kept from each of stdout and stderr. Default: 8 MiB.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
    /// C++ compiler executable. Default: "g++".
    #[serde(default = "default_cpp_compiler")]
    pub cpp_compiler: String,
    /// Python interpreter executable. Default: "python3".
    #[serde(default = "default_python_bin")]
    pub python_bin: String,
    /// JavaScript runtime executable. Default: "node".
    #[serde(default = "default_node_bin")]
    pub node_bin: String,
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("judge-work")
}
fn default_timeout_ms() -> u64 {
    20_000
}
fn default_compile_timeout_ms() -> u64 {
    30_000
}
fn default_max_output_bytes() -> usize {
    8 * 1024 * 1024
}
fn default_cpp_compiler() -> String {
    "g++".into()
}
fn default_python_bin() -> String {
    "python3".into()
}
fn default_node_bin() -> String {
    "node".into()
}

impl ExecutionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn compile_timeout(&self) -> Duration {
        Duration::from_millis(self.compile_timeout_ms)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            timeout_ms: default_timeout_ms(),
            compile_timeout_ms: default_compile_timeout_ms(),
            max_output_bytes: default_max_output_bytes(),
            cpp_compiler: default_cpp_compiler(),
            python_bin: default_python_bin(),
            node_bin: default_node_bin(),
        }
    }
}

/// Worker application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct WorkerAppConfig {
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl WorkerAppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("JUDGE_CONFIG").unwrap_or_else(|_| "config/worker".to_string());

        let s = Config::builder()
            .set_default("worker.id", "worker-1")?
            .set_default("worker.max_concurrent_jobs", 4_i64)?
            .set_default("worker.queue_capacity", 32_i64)?
            .set_default("execution.timeout_ms", 20_000_i64)?
            .set_default("execution.compile_timeout_ms", 30_000_i64)?
            .add_source(File::with_name(&config_path).required(false))
            .add_source(Environment::with_prefix("JUDGE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

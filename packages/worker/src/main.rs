use std::sync::Arc;

use anyhow::Context;
use common::worker::{Task, TaskResult};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use worker::{JudgePool, ProcessExecutor, WorkDir, Worker, WorkerAppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries result lines only.
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = WorkerAppConfig::load().context("Failed to load config")?;
    info!(
        worker_id = %config.worker.id,
        max_concurrent_jobs = config.worker.max_concurrent_jobs,
        queue_capacity = config.worker.queue_capacity,
        "Worker starting"
    );

    let work_dir = WorkDir::init(&config.execution.work_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to initialize working directory {}",
                config.execution.work_dir.display()
            )
        })?;
    info!(work_dir = %work_dir.path().display(), "Working directory ready");

    let executor = Arc::new(ProcessExecutor::new(work_dir.clone(), &config.execution));
    let worker = Worker::new(executor, JudgePool::from_config(&config.worker));

    let (tx, rx) = mpsc::unbounded_channel::<TaskResult>();
    let writer = tokio::spawn(write_results(rx));

    let mut tasks = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read task from stdin")?,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, finishing in-flight tasks");
                break;
            }
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let task = match parse_task(&line) {
            Ok(task) => task,
            Err(result) => {
                let _ = tx.send(result);
                continue;
            }
        };

        let worker = worker.clone();
        let tx = tx.clone();
        tasks.spawn(async move {
            let result = worker.execute_task(task).await;
            let _ = tx.send(result);
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "Task panicked");
        }
    }
    drop(tx);
    writer.await.context("Result writer failed")??;

    worker.pool().close();
    work_dir
        .teardown()
        .await
        .context("Failed to tear down working directory")?;
    info!("Worker stopped");
    Ok(())
}

/// Decode one input line. Malformed lines become an error result, keyed by their `id`
/// when one can be recovered.
fn parse_task(line: &str) -> Result<Task, TaskResult> {
    serde_json::from_str::<Task>(line).map_err(|e| {
        let id = serde_json::from_str::<serde_json::Value>(line)
            .ok()
            .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(str::to_string))
            .unwrap_or_default();
        warn!(task_id = %id, error = %e, "Malformed task");
        TaskResult::error(id, format!("Malformed task: {e}"))
    })
}

async fn write_results(mut rx: mpsc::UnboundedReceiver<TaskResult>) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(result) = rx.recv().await {
        let mut line = serde_json::to_vec(&result).context("Failed to encode result")?;
        line.push(b'\n');
        stdout.write_all(&line).await?;
        stdout.flush().await?;
    }
    Ok(())
}

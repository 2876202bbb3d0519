use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use fanout_core::impls::RecordingEventSink;
use fanout_core::{Dispatcher, DispatcherConfig, Task, TaskFailure, TaskId};
use rand::Rng;
use serde::Serialize;
use tokio::time::{Duration, sleep};
use tracing_subscriber::EnvFilter;

/// Run a batch of demo workers concurrently and print their results as they finish.
#[derive(Debug, Parser)]
#[command(name = "fanout", version)]
struct Args {
    /// Number of workers to launch.
    #[arg(long, default_value_t = 3)]
    workers: u64,

    /// Cap on concurrently running workers (unbounded when omitted).
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Worker id that fails deliberately (repeatable).
    #[arg(long = "fail", value_name = "ID")]
    fail: Vec<u64>,

    /// TOML file with a `[dispatcher]` table.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print each result as a JSON line.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Summary {
    session: String,
    delivered: usize,
    succeeded: usize,
    failed: usize,
    events: usize,
}

/// 1 worker 分のタスク：少し待ってから完了メッセージを返す
fn worker_task(id: u64, delay: Duration, fail: bool) -> Task {
    Task::from_future(TaskId::new(id), async move {
        sleep(delay).await;
        if fail {
            return Err(TaskFailure::new(format!("worker {id} failed deliberately")));
        }
        Ok(format!("Worker {id} completed task"))
    })
}

/// 存在しない worker id を `--fail` に渡されたら黙って無視せずに弾く
fn validate_args(args: &Args) -> Result<()> {
    let unknown: Vec<u64> = args
        .fail
        .iter()
        .copied()
        .filter(|id| !(1..=args.workers).contains(id))
        .collect();
    if !unknown.is_empty() {
        bail!(
            "--fail ids {unknown:?} are outside the worker range 1..={}",
            args.workers
        );
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<DispatcherConfig> {
    let mut config = match &args.config {
        Some(path) => DispatcherConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DispatcherConfig::default(),
    };
    // CLI フラグは設定ファイルより優先
    if let Some(limit) = args.max_concurrency {
        config.max_concurrency = Some(limit);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    validate_args(&args)?;
    let config = load_config(&args)?;
    tracing::info!(workers = args.workers, max_concurrency = ?config.max_concurrency, "starting");

    let events = Arc::new(RecordingEventSink::new());
    let dispatcher = Dispatcher::builder()
        .config(config)
        .event_sink(events.clone())
        .build()?;

    let failing: BTreeSet<u64> = args.fail.iter().copied().collect();
    let mut rng = rand::thread_rng();
    let tasks: Vec<Task> = (1..=args.workers)
        .map(|id| {
            let delay = Duration::from_millis(rng.gen_range(10..200));
            worker_task(id, delay, failing.contains(&id))
        })
        .collect();

    let mut stream = dispatcher.submit(tasks)?;
    let session = stream.session_id();

    while let Some(result) = stream.next().await {
        if args.json {
            println!("{}", serde_json::to_string(&result)?);
            continue;
        }
        match &result.outcome {
            Ok(message) => println!("{message}"),
            Err(failure) => println!("{} failed: {}", result.task_id, failure.message),
        }
    }

    let progress = stream.progress();
    let summary = Summary {
        session: session.to_string(),
        delivered: progress.delivered,
        succeeded: progress.succeeded,
        failed: progress.failed,
        events: events.len(),
    };
    if args.json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!(
            "all {} results received ({} ok, {} failed)",
            summary.delivered, summary.succeeded, summary.failed
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse_repeated_fail_flags() {
        let args = Args::parse_from(["fanout", "--workers", "5", "--fail", "2", "--fail", "4"]);
        assert_eq!(args.workers, 5);
        assert_eq!(args.fail, vec![2, 4]);
        assert!(!args.json);
    }

    #[test]
    fn fail_ids_outside_worker_range_are_rejected() {
        let args = Args::parse_from(["fanout", "--workers", "3", "--fail", "4"]);
        let err = validate_args(&args).unwrap_err();
        assert!(err.to_string().contains("[4]"));

        let args = Args::parse_from(["fanout", "--workers", "3", "--fail", "0"]);
        assert!(validate_args(&args).is_err());

        let args = Args::parse_from(["fanout", "--workers", "3", "--fail", "3"]);
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn flag_overrides_config_limit() {
        let args = Args::parse_from(["fanout", "--max-concurrency", "2"]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.max_concurrency, Some(2));
    }

    #[tokio::test]
    async fn worker_task_reports_deliberate_failure() {
        let dispatcher = Dispatcher::new();
        let tasks = vec![
            worker_task(1, Duration::from_millis(1), false),
            worker_task(2, Duration::from_millis(1), true),
        ];
        let results = dispatcher.submit(tasks).unwrap().collect().await;
        assert_eq!(results.len(), 2);
        for r in results {
            match r.task_id.get() {
                1 => assert_eq!(r.value().map(String::as_str), Some("Worker 1 completed task")),
                _ => assert!(r.is_failure()),
            }
        }
    }
}

//! task-router — 任务路由的命令行工具：查看路由表、发起缓存调用与流式调用
//!
//! Usage:
//!   task-router routes                                   Show the routing table
//!   task-router call <task> <cache-key> <prompt> [--ttl N]   Cached call, prints JSON
//!   task-router stream <task> <prompt>                   Stream a plain-text answer
//!
//! Configuration comes from the environment, optionally layered over a YAML
//! file given with `--config <path>`.

use anyhow::{anyhow, bail, Context};
use futures::StreamExt;
use llm_task_router::config::RouterConfig;
use llm_task_router::routing::RoutingTable;
use llm_task_router::structured::extract_json;
use llm_task_router::{Task, TaskRouter};
use std::io::Write;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_TTL_SECS: u64 = 3600;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let outcome = match args[1].as_str() {
        "routes" => {
            cmd_routes();
            Ok(())
        }
        "call" => cmd_call(&args[2..]).await,
        "stream" => cmd_stream(&args[2..]).await,
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"task-router — 任务路由命令行工具

USAGE:
    task-router <COMMAND> [OPTIONS]

COMMANDS:
    routes                                      Show the task routing table
    call <task> <cache-key> <prompt> [--ttl N]  Cached call; prints the JSON result
    stream <task> <prompt>                      Stream a plain-text answer to stdout
    version                                     Show version information
    help                                        Show this help message

OPTIONS:
    --config <path>     YAML config, overridden by the environment
    --ttl <secs>        Cache TTL for `call` (default {DEFAULT_TTL_SECS})

TASKS:
    analyze, chat, translate, digest, suggest

ENVIRONMENT:
    GROQ_API_KEY, GEMINI_API_KEY        Provider credentials (required)
    GROQ_BASE_URL, GROQ_MODEL           Provider overrides
    GEMINI_BASE_URL, GEMINI_MODEL
    KV_REST_API_URL, KV_REST_API_TOKEN  Shared store (in-memory when unset)
    ROUTER_GROQ_RPM, ROUTER_GEMINI_RPM  Per-minute budgets
    RUST_LOG                            Log filter (default info)"#
    );
}

fn cmd_version() {
    println!("task-router {}", env!("CARGO_PKG_VERSION"));
}

fn cmd_routes() {
    let table = RoutingTable::default();
    println!("{:<10} {:<8} {:<8} REASON", "TASK", "PRIMARY", "FALLBACK");
    for (task, route) in table.iter() {
        println!(
            "{:<10} {:<8} {:<8} {}",
            task.as_str(),
            route.primary.as_str(),
            route.fallback.as_str(),
            route.reason
        );
    }
}

async fn cmd_call(args: &[String]) -> anyhow::Result<()> {
    let positional = positional_args(args);
    let [task, cache_key, prompt] = positional.as_slice() else {
        bail!("usage: task-router call <task> <cache-key> <prompt> [--ttl N]");
    };
    let task = parse_task(task)?;
    let ttl = match flag_value(args, "--ttl") {
        Some(v) => v.parse::<u64>().with_context(|| format!("invalid --ttl '{v}'"))?,
        None => DEFAULT_TTL_SECS,
    };

    let router = build_router(args)?;
    let result = router
        .call_cached(task, cache_key, prompt, Duration::from_secs(ttl), extract_json)
        .await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn cmd_stream(args: &[String]) -> anyhow::Result<()> {
    let positional = positional_args(args);
    let [task, prompt] = positional.as_slice() else {
        bail!("usage: task-router stream <task> <prompt>");
    };
    let task = parse_task(task)?;

    let router = build_router(args)?;
    let mut result = router.call_stream(task, prompt).await?;
    eprintln!("[{}]", result.provider);

    let mut stdout = std::io::stdout();
    while let Some(chunk) = result.stream.next().await {
        stdout.write_all(&chunk?)?;
        stdout.flush()?;
    }
    println!();
    Ok(())
}

fn build_router(args: &[String]) -> anyhow::Result<TaskRouter> {
    let mut config = match flag_value(args, "--config") {
        Some(path) => RouterConfig::from_yaml_file(path)?,
        None => RouterConfig::default(),
    };
    config.apply_env()?;
    Ok(TaskRouter::from_config(&config)?)
}

fn parse_task(s: &str) -> anyhow::Result<Task> {
    s.parse::<Task>().map_err(|e| anyhow!(e))
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Arguments that are neither flags nor flag values.
fn positional_args(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            iter.next();
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

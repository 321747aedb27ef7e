//! Calculator Server
//!
//! Line-oriented JSON-RPC 2.0 server: reads one payload per line from stdin
//! and writes each response body as one line to stdout. Logs go to stderr.
//!
//! Usage:
//! ```bash
//! echo '{"jsonrpc":"2.0","method":"calc.add","params":[1,2],"id":1}' \
//!     | RUST_LOG=debug cargo run --package calculator-server
//!
//! # Print the service catalog and exit
//! cargo run --package calculator-server -- --catalog
//!
//! # Tight deadline, sequential batches, raw failure text in responses
//! cargo run --package calculator-server -- --timeout-ms 250 --sequential --expose-errors
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use jsonrpc_dispatch::prelude::*;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the calculator server
#[derive(Parser, Debug)]
#[command(name = "calculator-server")]
#[command(about = "Line-oriented JSON-RPC 2.0 calculator over stdin/stdout")]
struct Args {
    /// Per-invocation deadline in milliseconds
    #[arg(long, default_value = "30000")]
    timeout_ms: u64,

    /// Disable the per-invocation deadline
    #[arg(long, conflicts_with = "timeout_ms")]
    no_timeout: bool,

    /// Forward raw failure messages in error data
    #[arg(long)]
    expose_errors: bool,

    /// Run batch items one after another instead of concurrently
    #[arg(long)]
    sequential: bool,

    /// Reject batches with more items than this
    #[arg(long)]
    max_batch: Option<usize>,

    /// Print the service catalog and exit
    #[arg(long)]
    catalog: bool,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        let mut builder = ServerConfig::builder()
            .expose_fault_messages(self.expose_errors)
            .concurrent_batches(!self.sequential);

        builder = if self.no_timeout {
            builder.no_invocation_timeout()
        } else {
            builder.invocation_timeout(Duration::from_millis(self.timeout_ms))
        };

        match self.max_batch {
            Some(limit) => builder.max_batch_size(limit).build(),
            None => builder.build(),
        }
    }
}

fn calc_service() -> Result<FnService> {
    let service = FnService::builder()
        .operation(
            OperationSchema::new("add")
                .description("Adds two numbers")
                .param(ParamSpec::int("a"))
                .param(ParamSpec::int("b").with_default(json!(0))),
            |args: BoundArgs| async move {
                let a: f64 = number(&args, "a")?;
                let b: f64 = number(&args, "b")?;
                Ok(json!(a + b))
            },
        )
        .operation(
            OperationSchema::new("subtract")
                .description("Subtracts b from a")
                .param(ParamSpec::int("a"))
                .param(ParamSpec::int("b")),
            |args: BoundArgs| async move {
                let a: f64 = number(&args, "a")?;
                let b: f64 = number(&args, "b")?;
                Ok(json!(a - b))
            },
        )
        .operation(
            OperationSchema::new("divide")
                .description("Divides a by b")
                .param(ParamSpec::int("a").with_description("dividend"))
                .param(ParamSpec::int("b").with_description("divisor")),
            |args: BoundArgs| async move {
                let a: f64 = number(&args, "a")?;
                let b: f64 = number(&args, "b")?;
                if b == 0.0 {
                    return Err(RpcFault::new(-32010, "Division by zero")
                        .with_data(json!({"dividend": a}))
                        .into());
                }
                Ok(json!(a / b))
            },
        )
        .operation(
            OperationSchema::new("sum")
                .description("Sums a list of numbers")
                .param(ParamSpec::array("values"))
                .param(ParamSpec::bool("absolute").with_default(json!(false))),
            |args: BoundArgs| async move {
                let absolute: bool = args.get("absolute")?;
                let values = match args.get_value("values") {
                    Some(Value::Array(items)) => items.clone(),
                    Some(Value::Object(map)) => map.values().cloned().collect(),
                    _ => Vec::new(),
                };
                let mut total = 0.0;
                for value in &values {
                    let n = value.as_f64().ok_or_else(|| {
                        InvocationError::failure(format!("{value} is not a number"))
                    })?;
                    total += if absolute { n.abs() } else { n };
                }
                Ok(json!(total))
            },
        )
        .operation(
            OperationSchema::new("sleep")
                .description("Waits for the given number of milliseconds")
                .param(ParamSpec::int("ms")),
            |args: BoundArgs| async move {
                let ms = number(&args, "ms")?.max(0.0) as u64;
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok(json!(ms))
            },
        )
        .build()?;
    Ok(service)
}

/// Integer parameters may arrive as numbers or numeric strings
fn number(args: &BoundArgs, name: &str) -> Result<f64, InvocationError> {
    match args.get_value(name) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| InvocationError::failure(format!("{name} is out of range"))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| InvocationError::failure(format!("{name} is not a number"))),
        _ => Err(InvocationError::failure(format!("{name} is missing"))),
    }
}

/// In-memory named registers
struct Memory {
    operations: Vec<OperationSchema>,
    slots: Mutex<BTreeMap<String, Value>>,
}

impl Memory {
    fn new() -> Self {
        Self {
            operations: vec![
                OperationSchema::new("store")
                    .description("Stores a value in a named register")
                    .param(ParamSpec::string("name"))
                    .param(ParamSpec::untyped("value")),
                OperationSchema::new("recall")
                    .description("Reads a named register")
                    .param(ParamSpec::string("name")),
                OperationSchema::new("clear").description("Empties every register"),
                OperationSchema::new("dump").hidden(),
            ],
            slots: Mutex::new(BTreeMap::new()),
        }
    }
}

#[async_trait]
impl RpcService for Memory {
    fn operations(&self) -> &[OperationSchema] {
        &self.operations
    }

    async fn invoke(&self, operation: &str, args: BoundArgs) -> Result<Value, InvocationError> {
        match operation {
            "store" => {
                let name: String = args.get("name")?;
                let value = args.get_value("value").cloned().unwrap_or(Value::Null);
                let previous = self.slots.lock().await.insert(name, value);
                Ok(previous.unwrap_or(Value::Null))
            }
            "recall" => {
                let name: String = args.get("name")?;
                self.slots.lock().await.get(&name).cloned().ok_or_else(|| {
                    RpcFault::new(-32020, format!("Register '{name}' is empty")).into()
                })
            }
            "clear" => {
                let mut slots = self.slots.lock().await;
                let cleared = slots.len();
                slots.clear();
                Ok(json!(cleared))
            }
            "dump" => Ok(json!(*self.slots.lock().await)),
            other => Err(InvocationError::with_code(
                METHOD_NOT_FOUND,
                format!("Unknown operation '{other}'"),
            )),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let server = JsonRpcServer::builder()
        .config(args.server_config())
        .service("calc", calc_service()?)?
        .service("memory", Memory::new())?
        .build();

    if args.catalog {
        let catalog = serde_json::to_string_pretty(&server.catalog())?;
        println!("{catalog}");
        return Ok(());
    }

    info!(aliases = ?server.registry().aliases(), "Reading JSON-RPC payloads from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }

        let payload = server.process_str(&line).await;
        match payload.to_json_string() {
            Some(body) => {
                stdout.write_all(body.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
            None => debug!("No response body"),
        }
    }

    info!("stdin closed, shutting down");
    Ok(())
}

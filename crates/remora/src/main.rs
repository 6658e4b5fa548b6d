mod sample;

use std::error::Error;
use std::fmt::Write as _;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use remora_core::bridge::DebuggerBridge;
use remora_core::config::{BridgeConfig, NavigatorConfig};
use remora_core::navigation::RemoteObject;
use remora_core::registry::{first_roots, FieldOutput, PresentationHint, RootSet};
use remora_core::types::Address;
use remora_utils::{init_logging, LogLevel, LoggingOptions};

use crate::sample::Sample;

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Explore typed data structures inside a suspended debuggee.
///
/// Without `--pid` every command runs against the bundled sample snapshot, a
/// small layout box tree.
#[derive(Parser, Debug)]
#[command(name = "remora")]
#[command(version)]
#[command(about = "Explore typed data structures inside a suspended debuggee", long_about = None)]
struct Cli
{
    /// Read a stopped live Linux process instead of the sample (module and read only)
    #[arg(long, global = true)]
    pid: Option<u32>,
    /// Log level (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Resolve the module containing an address, or a module by name
    Module
    {
        /// Address (0x-prefixed hex or decimal) or module name
        target: String,
    },
    /// Read raw bytes
    Read
    {
        /// Address to read from (0x-prefixed hex or decimal)
        address: Address,
        /// Number of bytes to read
        #[arg(short, long, default_value_t = 64)]
        length: usize,
    },
    /// Show the current thread's call stack
    Stack,
    /// List the registered roots and the boxes they produce
    Roots,
    /// Print the box tree from the first non-empty root or from an address
    Tree
    {
        /// Start from this address instead of the roots
        address: Option<Address>,
        /// Maximum depth to descend
        #[arg(short, long, default_value_t = 16)]
        depth: usize,
    },
    /// Show the computed fields of the box at an address
    Fields
    {
        /// Address of the box
        address: Address,
    },
}

fn main()
{
    let cli = Cli::parse();

    let _logging = match init_logging(LoggingOptions::from_env().with_level(cli.log_level)) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start the async runtime: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli)) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult<()>
{
    let bridge_config = BridgeConfig::from_env();
    let nav_config = NavigatorConfig::from_env();

    if let Some(pid) = cli.pid {
        let bridge = live_bridge(pid, bridge_config)?;
        return match cli.command {
            Commands::Module { target } => print_module(bridge.as_ref(), &target).await,
            Commands::Read { address, length } => print_bytes(bridge.as_ref(), address, length).await,
            other => Err(format!("{} needs type metadata; run it without --pid", command_name(&other)).into()),
        };
    }

    let sample = sample::load(bridge_config, nav_config);
    match cli.command {
        Commands::Module { target } => print_module(sample.bridge.as_ref(), &target).await,
        Commands::Read { address, length } => print_bytes(sample.bridge.as_ref(), address, length).await,
        Commands::Stack => print_stack(sample.bridge.as_ref()).await,
        Commands::Roots => print_roots(&sample).await,
        Commands::Tree { address, depth } => print_tree(&sample, address, depth).await,
        Commands::Fields { address } => {
            let layout_box = sample.registry.interpret_address(&sample.nav, address).await?;
            println!("{}", sample.registry.describe(&sample.nav, layout_box.clone()).await?);
            for (name, output) in sample.registry.compute_fields(&sample.nav, &layout_box).await? {
                println!("  {name:<10} {}", render_output(&sample, &output).await);
            }
            Ok(())
        }
    }
}

fn command_name(command: &Commands) -> &'static str
{
    match command {
        Commands::Module { .. } => "module",
        Commands::Read { .. } => "read",
        Commands::Stack => "stack",
        Commands::Roots => "roots",
        Commands::Tree { .. } => "tree",
        Commands::Fields { .. } => "fields",
    }
}

#[cfg(target_os = "linux")]
fn live_bridge(pid: u32, config: BridgeConfig) -> CliResult<Arc<dyn DebuggerBridge>>
{
    use remora_core::backends::ProcfsBackend;
    use remora_core::bridge::BackendBridge;
    use remora_utils::info;

    let backend = ProcfsBackend::new(pid)?;
    let status = require_stopped(pid, backend.current_status()?)?;
    info!("reading process {pid}");
    let bridge = BackendBridge::new(backend, config);
    bridge.notify_state(status);
    Ok(Arc::new(bridge))
}

/// Only a stopped process may open the gate.
#[cfg(target_os = "linux")]
fn require_stopped(
    pid: u32,
    status: remora_core::events::DebuggerStatus,
) -> remora_core::error::RemoraResult<remora_core::events::DebuggerStatus>
{
    use remora_core::error::RemoraError;
    use remora_core::events::{format_status, DebuggerStatus};

    match status {
        DebuggerStatus::Break => Ok(status),
        other => Err(RemoraError::DebuggeeUnavailable(format!(
            "process {pid} is not stopped ({}); stop it with SIGSTOP or attach a tracer",
            format_status(other)
        ))),
    }
}

#[cfg(not(target_os = "linux"))]
fn live_bridge(_pid: u32, _config: BridgeConfig) -> CliResult<Arc<dyn DebuggerBridge>>
{
    Err("--pid is only supported on Linux".into())
}

async fn print_module(bridge: &dyn DebuggerBridge, target: &str) -> CliResult<()>
{
    let module = match target.parse::<Address>() {
        Ok(address) => bridge.module_by_address(address).await?,
        Err(_) => bridge.module_by_name(target).await?,
    };
    println!("{} {}..{} ({:#x} bytes)", module.name, module.base, module.end(), module.size);
    Ok(())
}

async fn print_bytes(bridge: &dyn DebuggerBridge, address: Address, length: usize) -> CliResult<()>
{
    let bytes = bridge.read_bytes(address, length).await?;
    for (line, chunk) in bytes.chunks(16).enumerate() {
        let offset = address.element(line as u64, 16).unwrap_or(address);
        let mut text = String::new();
        for byte in chunk {
            let _ = write!(text, "{byte:02x} ");
        }
        let ascii: String = chunk
            .iter()
            .map(|b| if b.is_ascii_graphic() { char::from(*b) } else { '.' })
            .collect();
        println!("{offset}  {text:<48} {ascii}");
    }
    Ok(())
}

async fn print_stack(bridge: &dyn DebuggerBridge) -> CliResult<()>
{
    let frames = bridge.capture_call_stack().await?;
    println!("{:<4} {:<18} {:<18} {:<18}", "#", "frame", "instruction", "stack");
    for (index, frame) in frames.iter().enumerate() {
        let module = match bridge.module_by_address(frame.instruction_address).await {
            Ok(module) => module.name,
            Err(_) => "?".to_string(),
        };
        println!(
            "{index:<4} {:<18} {:<18} {:<18} {module}",
            frame.frame_address.to_string(),
            frame.instruction_address.to_string(),
            frame.stack_address.to_string(),
        );
    }
    Ok(())
}

async fn print_roots(sample: &Sample) -> CliResult<()>
{
    for name in sample.registry.root_names() {
        match sample.registry.roots(&sample.nav, &name).await {
            Ok(RootSet::Found(handles)) => {
                println!("{name}:");
                for handle in handles {
                    println!("  {}", sample.registry.describe(&sample.nav, handle).await?);
                }
            }
            Ok(RootSet::Empty) => println!("{name}: (empty)"),
            Err(e) => println!("{name}: failed: {e}"),
        }
    }
    Ok(())
}

async fn print_tree(sample: &Sample, address: Option<Address>, max_depth: usize) -> CliResult<()>
{
    let roots = match address {
        Some(address) => vec![sample.registry.interpret_address(&sample.nav, address).await?],
        None => first_roots(&sample.registry, &sample.nav).await?.1,
    };

    let mut pending: Vec<(RemoteObject, usize)> = roots.into_iter().rev().map(|root| (root, 0)).collect();
    while let Some((node, depth)) = pending.pop() {
        let mut line = format!(
            "{:indent$}{}",
            "",
            sample.registry.describe(&sample.nav, node.clone()).await?,
            indent = depth * 2
        );
        for (name, output) in sample.registry.compute_fields(&sample.nav, &node).await? {
            let _ = write!(line, "  {name}={}", render_output(sample, &output).await);
        }
        println!("{line}");

        if depth < max_depth {
            let children = sample::children(&sample.nav, node).await?;
            pending.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        }
    }
    Ok(())
}

async fn render_output(sample: &Sample, output: &FieldOutput) -> String
{
    use remora_core::registry::FieldDisplay;

    let mut text = match &output.display {
        Some(FieldDisplay::Object(handle)) => sample
            .registry
            .describe(&sample.nav, handle.clone())
            .await
            .unwrap_or_else(|e| format!("error: {e}")),
        Some(display) => display.to_string(),
        None => String::new(),
    };
    match &output.hint {
        Some(PresentationHint::Background(color)) => {
            let _ = write!(text, "[{color}]");
        }
        Some(PresentationHint::Emphasis) => text = format!("*{text}*"),
        None => {}
    }
    text
}

#[cfg(all(test, target_os = "linux"))]
mod tests
{
    use remora_core::error::RemoraError;
    use remora_core::events::DebuggerStatus;

    use super::require_stopped;

    #[test]
    fn test_only_a_stopped_process_opens_the_gate()
    {
        assert_eq!(require_stopped(42, DebuggerStatus::Break).unwrap(), DebuggerStatus::Break);

        for status in [DebuggerStatus::Waiting, DebuggerStatus::Detaching] {
            match require_stopped(42, status) {
                Err(RemoraError::DebuggeeUnavailable(message)) => {
                    assert!(message.contains("process 42 is not stopped"));
                }
                other => panic!("expected DebuggeeUnavailable, got {other:?}"),
            }
        }
    }
}

use std::process;

use clap::{Parser, Subcommand};
use vigil_core::value::Value;
use vigil_core::{FrameSnapshot, PlainRenderer, RuntimeValue, SnapshotContext, ThreadSnapshot};
use vigil_engine::{Engine, EngineConfig};
use vigil_utils::{info, init_logging};

/// Prompt templating for debugging sessions.
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(version)]
#[command(about = "Expand ${...} prompt templates against debugging session state", long_about = None)]
struct Cli
{
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Expand a template against the built-in demo session
    Render
    {
        /// Template text, e.g. '${t:num}:${f:name} ${r:eax|%08X}'
        template: String,
        /// Disable ANSI escape sequences in the output
        #[arg(long, default_value_t = false)]
        no_ansi: bool,
        /// Maximum placeholder nesting depth
        #[arg(long, default_value_t = 64)]
        max_depth: usize,
        /// Show the typed value instead of the stringified expansion
        #[arg(long, default_value_t = false)]
        typed: bool,
    },
    /// Describe the built-in demo session
    Info,
}

fn main()
{
    // Initialize logging (reads from RUST_LOG env var)
    // Defaults to INFO level and Pretty format if not set
    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    let cli = Cli::parse();
    if let Err(e) = run_command(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_command(cli: Cli) -> Result<(), Box<dyn std::error::Error>>
{
    match cli.command {
        Commands::Render { template, no_ansi, max_depth, typed } => {
            info!("Rendering template: {}", template);
            let ctx = demo_context(!no_ansi);
            let engine = Engine::with_config(&ctx, EngineConfig { max_depth });
            if typed {
                let value = engine.substitute_typed(&template)?;
                println!("{value:?}");
            } else {
                println!("{}", engine.substitute(&template)?);
            }
            Ok(())
        }
        Commands::Info => {
            let ctx = demo_context(true);
            println!("Demo session:");
            println!("  thread 1 \"main\" (pid 4242, lwpid 4242, tid 1), stopped");
            println!("  frame 0: main_loop, pc 0x1000_0040, registers eax/ebx/ecx");
            println!("  frame 1: main, pc 0x1000_0200 (selected)");
            println!("  parameters: prompt-color, listsize");
            let engine = Engine::new(&ctx);
            println!("  example: {}", engine.substitute("[${t:num}] ${f:name} @${f:pc|0x%x}")?);
            Ok(())
        }
    }
}

/// A small canned session: one stopped thread, two frames, a few
/// registers and variables to poke at.
fn demo_context(ansi: bool) -> SnapshotContext
{
    SnapshotContext::new()
        .with_thread(
            ThreadSnapshot::new(1)
                .with_name("main")
                .with_ptid(4242, 4242, 1),
        )
        .with_frame(
            FrameSnapshot::new(0)
                .with_name("main_loop")
                .with_pc(0x1000_0040)
                .with_register("eax", RuntimeValue::from_int(255))
                .with_register("ebx", RuntimeValue::from_int(-1))
                .with_register("ecx", RuntimeValue::from_int(0x7fff_0000))
                .with_variable("x", Value::Runtime(RuntimeValue::from_int(1_000_000)))
                .with_variable("greeting", Value::Runtime(RuntimeValue::from_bytes(*b"hello\tworld"))),
        )
        .with_frame(
            FrameSnapshot::new(1)
                .with_name("main")
                .with_pc(0x1000_0200),
        )
        .with_parameter("prompt-color", Value::text("1;32"))
        .with_parameter("listsize", Value::Int(10))
        .with_runtime_result("x+1", Value::Runtime(RuntimeValue::from_int(1_000_001)))
        .with_renderer(PlainRenderer { ansi_enabled: ansi })
}

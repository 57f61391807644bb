use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use lama_vm::prelude::*;

/// Stack-machine bytecode interpreter for the Lama language.
#[derive(Parser, Debug)]
#[command(name = "lama-vm", version, about = "Run a compiled Lama bytecode image")]
struct Args {
    /// Path to a compiled bytecode image.
    bytecode_file: PathBuf,

    /// Fixed capacity of the operand stack, in slots.
    #[arg(long, default_value_t = lama_vm::consts::DEFAULT_STACK_CAPACITY)]
    stack_capacity: usize,

    /// Emit one trace event per dispatched instruction.
    #[arg(long)]
    trace: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.trace { "lama_vm=trace" } else { "lama_vm=info" };
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::new(filter)).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("lama-vm: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let bytes = std::fs::read(&args.bytecode_file)
        .with_context(|| format!("reading bytecode file {}", args.bytecode_file.display()))?;
    let image = BytecodeImage::parse(&bytes).map_err(VmError::from).context("parsing bytecode image")?;

    let mut evaluator = EvaluatorBuilder::new().with_stack_capacity(args.stack_capacity).build(image);

    evaluator.run().map_err(|err| anyhow::anyhow!(err.diagnostic())).context("running bytecode image")?;
    Ok(())
}

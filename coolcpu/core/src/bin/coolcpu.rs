use anyhow::Context;
use clap::Parser;
use coolcpu_core::{decode_program, HostConfig, Session, Variant};
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const EXIT_LOAD_ERROR: u8 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "coolcpu",
    about = "Run a hex-encoded CoolCPU program and report its output and final state."
)]
struct Args {
    /// Program as hex, `@path` to read hex from a file, or `-` for stdin.
    program: String,

    /// Machine variant. The extended variant adds the block transfer engine.
    #[arg(long, value_enum, env = "COOLCPU_VARIANT", default_value_t = Variant::Base)]
    variant: Variant,

    /// Wall-clock budget for the run.
    #[arg(long, env = "COOLCPU_TIMEOUT_MS", default_value_t = 2_000)]
    timeout_ms: u64,

    /// Print the report as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Do not plant the base-variant secret in RAM.
    #[arg(long, default_value_t = false)]
    no_seed: bool,

    /// Print a disassembly listing before running.
    #[arg(long, default_value_t = false)]
    disasm: bool,

    /// Fixed RNG seed for the magic sector (reproducible runs). Debug builds only.
    #[cfg(debug_assertions)]
    #[arg(long, hide = true)]
    seed: Option<u64>,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn read_program(source: &str) -> anyhow::Result<Vec<u8>> {
    let text = if source == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read program from stdin")?;
        buffer
    } else if let Some(path) = source.strip_prefix('@') {
        fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?
    } else {
        source.to_string()
    };
    Ok(decode_program(&text)?)
}

fn run(args: &Args) -> anyhow::Result<u8> {
    let code = read_program(&args.program)?;
    if args.disasm {
        print!("{}", coolcpu_isa::listing(&code, 0));
        println!();
    }

    let config = HostConfig {
        variant: args.variant,
        timeout: Duration::from_millis(args.timeout_ms),
        seed_secret: !args.no_seed,
    };
    #[allow(unused_mut)]
    let mut session = Session::new(config);
    #[cfg(debug_assertions)]
    if let Some(seed) = args.seed {
        session = session.with_seed(seed);
    }
    let report = session.run(&code).context("failed to load program")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to encode report")?
        );
    } else {
        print!("{}", report.render_text());
    }
    Ok(report.exit_code())
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();
    match run(&args) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_LOAD_ERROR)
        }
    }
}

use anyhow::Context;
use clap::Parser;
use coolcpu_isa::{disassemble, listing};
use std::io::{self, Read, Write};

#[derive(Parser, Debug)]
#[command(name = "coolcpu-disasm")]
#[command(about = "Disassemble a hex-encoded CoolCPU program read from stdin", long_about = None)]
struct Args {
    /// Address of the first byte.
    #[arg(long, default_value_t = 0, value_parser = parse_byte)]
    origin: u8,

    /// Emit one JSON object per instruction instead of a listing.
    #[arg(long)]
    json: bool,
}

fn parse_byte(raw: &str) -> Result<u8, String> {
    let trimmed = raw.trim();
    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => trimmed.parse::<u8>(),
    };
    parsed.map_err(|err| format!("invalid byte '{raw}': {err}"))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    let cleaned: String = buffer.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let image = hex::decode(&cleaned).context("program is not valid hex")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        for line in disassemble(&image, args.origin) {
            serde_json::to_writer(&mut out, &line)?;
            writeln!(out)?;
        }
    } else {
        out.write_all(listing(&image, args.origin).as_bytes())?;
    }
    Ok(())
}

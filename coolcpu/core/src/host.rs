//! Local host for untrusted programs: decode, load, seed, run under a deadline
//! and collect a [`RunReport`].

use crate::memory::ROM_SIZE;
use crate::report::RunReport;
use crate::runtime::Deadline;
use crate::{CoreError, Machine, Result, Variant};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Where the base variant's secret string is planted in RAM.
pub const BASE_SECRET_ADDR: u8 = 0x93;
/// NUL-terminated secret planted for base-variant runs.
pub const BASE_SECRET: &[u8] = b"flag{l00p_d3_l00p_r34d_th3_r4m}\x00";

#[derive(Debug, Clone)]
pub struct HostConfig {
    pub variant: Variant,
    pub timeout: Duration,
    /// Plant [`BASE_SECRET`] before base-variant runs.
    pub seed_secret: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            variant: Variant::Base,
            timeout: DEFAULT_TIMEOUT,
            seed_secret: true,
        }
    }
}

/// Strip whitespace and hex-decode a program, enforcing the ROM size limit.
pub fn decode_program(text: &str) -> Result<Vec<u8>> {
    let cleaned: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(CoreError::EmptyProgram);
    }
    let code = hex::decode(&cleaned)?;
    if code.len() > ROM_SIZE {
        return Err(CoreError::RomTooLarge {
            len: code.len(),
            max: ROM_SIZE,
        });
    }
    Ok(code)
}

/// Runs programs with a fixed [`HostConfig`]. Every run gets a fresh machine.
#[derive(Debug, Clone, Default)]
pub struct Session {
    config: HostConfig,
    seed: Option<u64>,
}

impl Session {
    pub fn new(config: HostConfig) -> Self {
        Self { config, seed: None }
    }

    /// Draw magic sectors from a seeded RNG instead of the thread RNG.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Build the machine for `code`, including any host-side RAM seeding.
    pub fn prepare(&self, code: &[u8]) -> Result<Machine> {
        let mut machine = match self.seed {
            Some(seed) => {
                Machine::with_rng(self.config.variant, code, &mut StdRng::seed_from_u64(seed))?
            }
            None => Machine::new(self.config.variant, code)?,
        };
        if self.config.variant == Variant::Base && self.config.seed_secret {
            machine
                .memory_mut()
                .load_ram(BASE_SECRET_ADDR, BASE_SECRET)?;
        }
        Ok(machine)
    }

    pub fn run(&self, code: &[u8]) -> Result<RunReport> {
        let mut machine = self.prepare(code)?;
        let mut output = Vec::new();
        let started = Instant::now();
        let deadline = Deadline::at(started + self.config.timeout);
        debug!(
            variant = %self.config.variant,
            len = code.len(),
            timeout_ms = self.config.timeout.as_millis() as u64,
            "starting run"
        );
        let outcome = machine.run(&deadline, &mut output);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            outcome = ?outcome,
            cycles = machine.cycle(),
            output_len = output.len(),
            elapsed_ms,
            "run complete"
        );
        Ok(RunReport::new(outcome, output, machine.snapshot(), elapsed_ms))
    }

    pub fn run_hex(&self, text: &str) -> Result<RunReport> {
        let code = decode_program(text)?;
        self.run(&code)
    }
}

//! Run-to-completion driver plus the output and cancellation seams it uses.

use crate::exec::StepOutcome;
use crate::{Fault, Machine};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Receives bytes written to the OUTPUT register, in program order.
pub trait OutputSink {
    fn emit(&mut self, byte: u8);
}

impl OutputSink for Vec<u8> {
    fn emit(&mut self, byte: u8) {
        self.push(byte);
    }
}

impl<O: OutputSink + ?Sized> OutputSink for &mut O {
    fn emit(&mut self, byte: u8) {
        (**self).emit(byte);
    }
}

/// Adapts a closure into an [`OutputSink`].
pub struct FnSink<F>(pub F);

impl<F: FnMut(u8)> OutputSink for FnSink<F> {
    fn emit(&mut self, byte: u8) {
        (self.0)(byte);
    }
}

/// Discards all output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit(&mut self, _byte: u8) {}
}

/// Checked once before every step; a `true` result ends the run as
/// [`RunOutcome::Cancelled`].
pub trait CancelSignal {
    fn is_cancelled(&self) -> bool;
}

impl<F: Fn() -> bool> CancelSignal for F {
    fn is_cancelled(&self) -> bool {
        self()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NeverCancel;

impl CancelSignal for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Wall-clock deadline.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    pub fn after(timeout: Duration) -> Self {
        Self::at(Instant::now() + timeout)
    }

    pub fn instant(&self) -> Instant {
        self.at
    }
}

impl CancelSignal for Deadline {
    fn is_cancelled(&self) -> bool {
        Instant::now() >= self.at
    }
}

/// Shared flag another thread can raise to stop a run.
#[derive(Debug, Default, Clone)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }
}

impl CancelSignal for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Halted,
    Fault(Fault),
    Cancelled,
}

impl RunOutcome {
    pub fn is_halted(&self) -> bool {
        matches!(self, RunOutcome::Halted)
    }
}

impl Machine {
    /// Run from PC 0 until HCF, a fault, or `cancel` fires.
    ///
    /// Cancellation is polled between steps, so a run can overshoot a deadline
    /// by at most one instruction. A machine that already halted or faulted
    /// reports that outcome again and keeps its state.
    pub fn run<C, O>(&mut self, cancel: &C, out: &mut O) -> RunOutcome
    where
        C: CancelSignal + ?Sized,
        O: OutputSink + ?Sized,
    {
        if let Some(fault) = self.fault {
            return RunOutcome::Fault(fault);
        }
        if self.halted {
            return RunOutcome::Halted;
        }
        self.regs.pc = 0;
        let mut steps: u64 = 0;
        let outcome = loop {
            if cancel.is_cancelled() {
                break RunOutcome::Cancelled;
            }
            match self.step(out) {
                Ok(StepOutcome::Continue) => steps += 1,
                Ok(StepOutcome::Halted) => break RunOutcome::Halted,
                Err(fault) => break RunOutcome::Fault(fault),
            }
        };
        debug!(
            variant = %self.variant,
            steps,
            cycle = self.cycle(),
            outcome = ?outcome,
            "run finished"
        );
        outcome
    }
}

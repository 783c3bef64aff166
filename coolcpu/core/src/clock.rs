/// Monotonic cycle counter.
///
/// Device writes observe the value at the start of the instruction performing
/// them; the executor advances the clock only after an instruction commits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleClock {
    cycles: u64,
}

impl CycleClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.cycles
    }

    pub fn advance(&mut self, cycles: u8) {
        self.cycles = self.cycles.saturating_add(cycles as u64);
    }
}

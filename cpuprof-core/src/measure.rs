//! High-Precision Timing
//!
//! Cycle counters come from RDTSCP on x86_64 and CNTVCT_EL0 on AArch64.
//! Wall-clock time always comes from `std::time::Instant`.

use std::time::{Duration, Instant};

#[cfg(target_arch = "x86_64")]
#[inline(always)]
fn read_cycles() -> u64 {
    // SAFETY: RDTSCP is present on every x86_64 CPU we can run on and has
    // no memory side effects.
    unsafe {
        let mut aux: u32 = 0;
        std::arch::x86_64::__rdtscp(&mut aux)
    }
}

#[cfg(target_arch = "aarch64")]
#[inline(always)]
fn read_cycles() -> u64 {
    let cnt: u64;
    // SAFETY: CNTVCT_EL0 is readable from EL0 on all AArch64 implementations.
    unsafe {
        std::arch::asm!("mrs {}, cntvct_el0", out(reg) cnt, options(nostack, nomem));
    }
    cnt
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
#[inline(always)]
fn read_cycles() -> u64 {
    0
}

/// Whether this platform provides real cycle counters.
pub const HAS_CYCLE_COUNTER: bool = cfg!(target_arch = "x86_64") || cfg!(target_arch = "aarch64");

/// Wall-clock plus cycle timer
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
    cycles_start: u64,
}

impl Timer {
    /// Start a new timer
    #[inline(always)]
    pub fn start() -> Self {
        let cycles_start = read_cycles();
        Self {
            start: Instant::now(),
            cycles_start,
        }
    }

    /// Elapsed wall-clock time so far
    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return elapsed nanoseconds and cycles
    #[inline(always)]
    pub fn stop(&self) -> (u64, u64) {
        let nanos = self.start.elapsed().as_nanos() as u64;
        let cycles = read_cycles().saturating_sub(self.cycles_start);
        (nanos, cycles)
    }
}

/// Run `f` and return its result together with the elapsed wall time.
pub fn time<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let timer = Timer::start();
    let out = f();
    (out, timer.elapsed())
}

/// Render a duration as seconds with three decimals (`0.125s`).
pub fn format_seconds(d: Duration) -> String {
    format!("{:.3}s", d.as_secs_f64())
}

/// Prints `   <name>: <secs>s` when dropped.
///
/// Useful for timing a lexical scope without threading a closure through it.
pub struct ScopedTimer {
    name: String,
    timer: Timer,
    silent: bool,
}

impl ScopedTimer {
    /// Start timing a named scope
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timer: Timer::start(),
            silent: false,
        }
    }

    /// Stop early and return the elapsed time without printing.
    pub fn finish(mut self) -> Duration {
        self.silent = true;
        self.timer.elapsed()
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        if !self.silent {
            println!("   {}: {}", self.name, format_seconds(self.timer.elapsed()));
        }
    }
}

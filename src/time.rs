// Copyright 2024-2026 David Allison
// All Rights Reserved
// See LICENSE file for licensing information.

use nix::time::{clock_gettime, ClockId};

/// Microseconds on the monotonic clock.
pub type AbsTime = u64;

pub fn absolute_time() -> AbsTime {
    // CLOCK_MONOTONIC is always available on the platforms we build for.
    match clock_gettime(ClockId::CLOCK_MONOTONIC) {
        Ok(ts) => 1_000_000 * ts.tv_sec() as u64 + ts.tv_nsec() as u64 / 1000,
        Err(_) => 0,
    }
}

/// Microseconds since `then`.
pub fn elapsed_time(then: AbsTime) -> AbsTime {
    absolute_time().saturating_sub(then)
}

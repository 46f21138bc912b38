// Copyright 2024-2026 David Allison
// All Rights Reserved
// See LICENSE file for licensing information.

use crate::device::RawState;

/// Point-in-time view of a topic as reported by its driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TopicState {
    /// Highest requested publish rate in Hz, 0 if no interval is set.
    pub max_frequency: u32,
    /// Shortest requested batch latency in microseconds.
    pub min_batch_interval: u32,
    pub queue_size: u32,
    pub nsubscribers: u32,
    pub nadvertisers: u32,
    pub generation: u64,
}

impl From<&RawState> for TopicState {
    fn from(raw: &RawState) -> Self {
        let max_frequency = if raw.min_interval != 0 {
            1_000_000 / raw.min_interval
        } else {
            0
        };
        Self {
            max_frequency: max_frequency as u32,
            min_batch_interval: raw.min_latency as u32,
            queue_size: raw.nbuffer as u32,
            nsubscribers: raw.nsubscribers as u32,
            nadvertisers: raw.nadvertisers as u32,
            generation: raw.generation as u64,
        }
    }
}

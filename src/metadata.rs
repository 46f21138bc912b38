// Copyright 2024-2026 David Allison
// All Rights Reserved
// See LICENSE file for licensing information.

/// Describes a topic class: its name and the fixed size of one element.
///
/// Descriptors are normally generated ahead of time and live in statics:
///
/// ```
/// use uorb_client::TopicMetadata;
/// static SENSOR_ACCEL: TopicMetadata = TopicMetadata::new("sensor_accel", 48);
/// assert_eq!(SENSOR_ACCEL.payload_size(), 48);
/// ```
///
/// Names must not end in digits: the instance number is appended directly,
/// so `baro1` instance 0 and `baro` instance 10 would share a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TopicMetadata {
    name: &'static str,
    payload_size: u16,
}

impl TopicMetadata {
    pub const fn new(name: &'static str, payload_size: u16) -> Self {
        Self { name, payload_size }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn payload_size(&self) -> usize {
        self.payload_size as usize
    }

    /// Size as carried in driver records.
    pub(crate) fn element_size(&self) -> u16 {
        self.payload_size
    }
}

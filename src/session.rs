// Copyright 2024-2026 David Allison
// All Rights Reserved
// See LICENSE file for licensing information.

use crate::device::{DeviceNode, RawState, Request};
use crate::error::{OrbError, Result};
use crate::metadata::TopicMetadata;
use crate::state::TopicState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Advertiser,
    Subscriber,
}

/// An open topic node.  Owns its handle; dropping the session releases it,
/// `close` does the same and reports the result.
#[derive(Debug)]
pub struct Session<N: DeviceNode> {
    node: N,
    role: Role,
    path: String,
}

impl<N: DeviceNode> Session<N> {
    pub(crate) fn new(node: N, role: Role, path: String) -> Self {
        Self { node, role, path }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    // ── Data transfer ───────────────────────────────────────────────────

    /// One bounded write.  Returns the byte count the driver accepted;
    /// a short write is not retried.
    pub fn publish(&self, data: &[u8]) -> Result<usize> {
        Ok(self.node.write(data)?)
    }

    /// Publishes exactly one element of `meta`.
    pub fn publish_topic(&self, meta: &TopicMetadata, data: &[u8]) -> Result<usize> {
        if data.len() != meta.payload_size() {
            return Err(OrbError::InvalidArgument(format!(
                "{} element is {} bytes, got {}",
                meta.name(),
                meta.payload_size(),
                data.len()
            )));
        }
        self.publish(data)
    }

    /// One bounded read.
    pub fn receive(&self, buffer: &mut [u8]) -> Result<usize> {
        Ok(self.node.read(buffer)?)
    }

    /// Copies exactly one element of `meta` into `buffer`.
    pub fn copy_topic(&self, meta: &TopicMetadata, buffer: &mut [u8]) -> Result<usize> {
        if buffer.len() != meta.payload_size() {
            return Err(OrbError::InvalidArgument(format!(
                "{} element is {} bytes, buffer is {}",
                meta.name(),
                meta.payload_size(),
                buffer.len()
            )));
        }
        self.receive(buffer)
    }

    // ── Introspection ───────────────────────────────────────────────────

    pub fn get_state(&self) -> Result<TopicState> {
        query_state(&self.node).map(|raw| TopicState::from(&raw))
    }

    /// Current publish interval in microseconds.
    pub fn get_interval(&self) -> Result<u32> {
        query_state(&self.node).map(|raw| raw.min_interval as u32)
    }

    pub fn set_interval(&self, interval_us: u32) -> Result<()> {
        self.node.ioctl(Request::SetInterval(interval_us))?;
        Ok(())
    }

    /// Current batch latency in microseconds.
    pub fn get_batch_interval(&self) -> Result<u32> {
        query_state(&self.node).map(|raw| raw.min_latency as u32)
    }

    pub fn set_batch_interval(&self, interval_us: u32) -> Result<()> {
        self.node.ioctl(Request::Batch(interval_us))?;
        Ok(())
    }

    /// True if an unread element is waiting.  Never blocks and never
    /// consumes data.
    pub fn check_updated(&self) -> Result<bool> {
        Ok(self.node.poll_in(0)?)
    }

    /// Passes an arbitrary control command straight to the driver.
    pub fn ioctl(&self, cmd: u32, arg: libc::c_ulong) -> Result<i32> {
        Ok(self.node.ioctl(Request::Raw { cmd, arg })?)
    }

    // ── Close ───────────────────────────────────────────────────────────

    pub fn close(self) -> Result<()> {
        Ok(self.node.close()?)
    }

    pub fn unadvertise(self) -> Result<()> {
        self.close()
    }

    pub fn unsubscribe(self) -> Result<()> {
        self.close()
    }
}

pub(crate) fn query_state<N: DeviceNode>(node: &N) -> Result<RawState> {
    let mut raw = RawState::default();
    node.ioctl(Request::GetState(&mut raw))
        .map_err(OrbError::QueryFailed)?;
    Ok(raw)
}

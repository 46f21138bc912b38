// Copyright 2024-2026 David Allison
// All Rights Reserved
// See LICENSE file for licensing information.

use crate::device::{Access, DevFs, DeviceFs, DeviceNode, RegistrationRequest, Request};
use crate::error::{OrbError, Result};
use crate::metadata::TopicMetadata;
use crate::options::{AdvertiseOptions, OrbOptions};
use crate::path::topic_path;
use crate::session::{query_state, Role, Session};
use nix::errno::Errno;

/// Entry point for advertising, subscribing and checking for topics.
///
/// Holds no per-topic state.  Every call derives the node path afresh and
/// sessions are independent of the `Orb` that opened them.
#[derive(Debug, Clone)]
pub struct Orb<F: DeviceFs = DevFs> {
    fs: F,
    options: OrbOptions,
}

impl Orb<DevFs> {
    pub fn new() -> Self {
        Self::with_options(OrbOptions::default())
    }

    pub fn with_options(options: OrbOptions) -> Self {
        Self {
            fs: DevFs::new(options.codes),
            options,
        }
    }
}

impl Default for Orb<DevFs> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: DeviceFs> Orb<F> {
    pub fn with_fs(fs: F, options: OrbOptions) -> Self {
        Self { fs, options }
    }

    pub fn options(&self) -> &OrbOptions {
        &self.options
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn path(&self, meta: &TopicMetadata, instance: u32) -> Result<String> {
        topic_path(
            &self.options.sensor_root,
            meta,
            instance,
            self.options.path_max,
        )
    }

    /// Makes sure the node at `path` exists.  Returns true when this call
    /// found it missing, whether or not our registration won the race.
    fn register(&self, path: &str, meta: &TopicMetadata, queue_size: u32) -> Result<bool> {
        if self.fs.access(path) {
            return Ok(false);
        }

        let request = RegistrationRequest {
            path,
            element_size: meta.element_size(),
            initial_queue_size: queue_size,
            persist: false,
        };

        let control = self
            .fs
            .open(&self.options.control_path, Access::WriteOnly)
            .map_err(|source| OrbError::OpenFailed {
                path: self.options.control_path.clone(),
                source,
            })?;
        let result = control.ioctl(Request::Register(&request));
        let _ = control.close();

        match result {
            Ok(_) => log::debug!("registered {path}"),
            Err(Errno::EEXIST) => log::debug!("{path} registered concurrently"),
            Err(source) => {
                return Err(OrbError::RegistrationFailed {
                    path: path.to_string(),
                    source,
                })
            }
        }
        Ok(true)
    }

    fn open(
        &self,
        meta: &TopicMetadata,
        role: Role,
        instance: u32,
        queue_size: u32,
    ) -> Result<Session<F::Node>> {
        let path = self.path(meta, instance)?;
        let first_open = self.register(&path, meta, queue_size)?;

        let access = match role {
            Role::Advertiser => Access::WriteOnly,
            Role::Subscriber => Access::ReadOnly,
        };
        let node = self
            .fs
            .open(&path, access)
            .map_err(|source| OrbError::OpenFailed {
                path: path.clone(),
                source,
            })?;

        if first_open {
            if let Err(e) = node.ioctl(Request::SetUserPriv(meta)) {
                log::warn!("{path}: attaching metadata failed: {e}");
            }
        }

        // Only the advertiser that created the buffer can resize it.
        if queue_size != 0 {
            if let Err(e) = node.ioctl(Request::SetBufferNumber(queue_size)) {
                log::warn!("{path}: setting queue size {queue_size} failed: {e}");
            }
        }

        Ok(Session::new(node, role, path))
    }

    /// Opens `meta` for writing, optionally publishing `data` as the first
    /// element.  If `data` is not exactly one element, or the driver takes
    /// less than all of it, the session is closed and the call fails.
    pub fn advertise(
        &self,
        meta: &TopicMetadata,
        data: Option<&[u8]>,
        opts: &AdvertiseOptions,
    ) -> Result<Session<F::Node>> {
        let instance = match opts.instance {
            Some(i) => i,
            None => self.group_count(meta),
        };

        let session = self
            .open(meta, Role::Advertiser, instance, opts.queue_size)
            .inspect_err(|e| log::error!("{} advertise failed ({e})", meta.name()))?;

        if let Some(data) = data {
            // A wrong-sized slice never reaches the driver's queue.
            if data.len() != meta.payload_size() {
                log::error!(
                    "{} publish {} bytes, expect {}",
                    meta.name(),
                    data.len(),
                    meta.payload_size()
                );
                let _ = session.close();
                return Err(OrbError::PublishMismatch {
                    name: meta.name().to_string(),
                    written: 0,
                    expected: meta.payload_size(),
                });
            }

            let written = match session.publish(data) {
                Ok(n) => n,
                Err(e) => {
                    log::error!("{} initial publish failed ({e})", meta.name());
                    let _ = session.close();
                    return Err(e);
                }
            };
            if written != meta.payload_size() {
                log::error!(
                    "{} publish {}, expect {}",
                    meta.name(),
                    written,
                    meta.payload_size()
                );
                let _ = session.close();
                return Err(OrbError::PublishMismatch {
                    name: meta.name().to_string(),
                    written,
                    expected: meta.payload_size(),
                });
            }
        }

        Ok(session)
    }

    pub fn subscribe(&self, meta: &TopicMetadata, instance: u32) -> Result<Session<F::Node>> {
        self.open(meta, Role::Subscriber, instance, 0)
    }

    /// True if `instance` has at least one advertiser attached.  A node that
    /// exists with no advertisers, or any failure to look, counts as absent.
    pub fn exists(&self, meta: &TopicMetadata, instance: u32) -> bool {
        let Ok(path) = self.path(meta, instance) else {
            return false;
        };
        let Ok(node) = self.fs.open(&path, Access::ReadOnly) else {
            return false;
        };
        let state = query_state(&node);
        let _ = node.close();

        matches!(state, Ok(raw) if raw.nadvertisers > 0)
    }

    /// Number of advertised instances counting up from 0.  Stops at the
    /// first missing instance, so anything past a gap is not counted.
    pub fn group_count(&self, meta: &TopicMetadata) -> u32 {
        let mut instance = 0;
        while self.exists(meta, instance) {
            instance += 1;
        }
        instance
    }
}

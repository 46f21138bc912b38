// Copyright 2024-2026 David Allison
// All Rights Reserved
// See LICENSE file for licensing information.

//! In-memory sensor driver used by the integration tests.

#![allow(dead_code)]

use nix::errno::Errno;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use uorb_client::{
    Access, DeviceFs, DeviceNode, OrbOptions, RawState, Request, TopicMetadata,
};

pub const CONTROL_PATH: &str = "/dev/usensor";

pub fn options() -> OrbOptions {
    OrbOptions::new()
}

#[derive(Debug, Default, Clone)]
pub struct Topic {
    pub esize: u16,
    pub nbuffer: u32,
    pub min_interval: u32,
    pub min_latency: u32,
    pub nsubscribers: u32,
    pub nadvertisers: u32,
    pub generation: u64,
    pub userpriv: Option<&'static str>,
    pub userpriv_calls: usize,
    pub published: u64,
    elements: VecDeque<(u64, Vec<u8>)>,
}

#[derive(Debug, Default)]
struct Bus {
    topics: HashMap<String, Topic>,
    control_missing: bool,
    register_error: Option<Errno>,
    register_calls: usize,
    userpriv_error: Option<Errno>,
    write_limit: Option<usize>,
    blind_access: bool,
    open_handles: usize,
    poll_timeouts: Vec<i32>,
}

#[derive(Clone, Default)]
pub struct FakeFs {
    bus: Arc<Mutex<Bus>>,
    access_barrier: Option<Arc<Barrier>>,
}

impl FakeFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `access` call waits here after looking, so concurrent openers
    /// all see the node missing before any of them registers it.
    pub fn with_access_barrier(&self, barrier: Arc<Barrier>) -> Self {
        Self {
            bus: self.bus.clone(),
            access_barrier: Some(barrier),
        }
    }

    pub fn create_node(&self, path: &str, esize: u16) {
        self.bus.lock().unwrap().topics.insert(
            path.to_string(),
            Topic {
                esize,
                nbuffer: 1,
                ..Default::default()
            },
        );
    }

    /// Makes `access` report every node as missing.
    pub fn blind_access(&self) {
        self.bus.lock().unwrap().blind_access = true;
    }

    pub fn remove_control(&self) {
        self.bus.lock().unwrap().control_missing = true;
    }

    pub fn fail_register(&self, errno: Errno) {
        self.bus.lock().unwrap().register_error = Some(errno);
    }

    pub fn fail_userpriv(&self, errno: Errno) {
        self.bus.lock().unwrap().userpriv_error = Some(errno);
    }

    /// Caps every topic write at `limit` bytes.
    pub fn short_writes(&self, limit: usize) {
        self.bus.lock().unwrap().write_limit = Some(limit);
    }

    pub fn topic(&self, path: &str) -> Option<Topic> {
        self.bus.lock().unwrap().topics.get(path).cloned()
    }

    pub fn node_count(&self) -> usize {
        self.bus.lock().unwrap().topics.len()
    }

    pub fn register_calls(&self) -> usize {
        self.bus.lock().unwrap().register_calls
    }

    pub fn open_handles(&self) -> usize {
        self.bus.lock().unwrap().open_handles
    }

    pub fn poll_timeouts(&self) -> Vec<i32> {
        self.bus.lock().unwrap().poll_timeouts.clone()
    }
}

impl DeviceFs for FakeFs {
    type Node = FakeNode;

    fn access(&self, path: &str) -> bool {
        let found = {
            let bus = self.bus.lock().unwrap();
            !bus.blind_access && bus.topics.contains_key(path)
        };
        if let Some(barrier) = &self.access_barrier {
            barrier.wait();
        }
        found
    }

    fn open(&self, path: &str, access: Access) -> Result<FakeNode, Errno> {
        let mut bus = self.bus.lock().unwrap();
        let kind = if path == CONTROL_PATH {
            if bus.control_missing {
                return Err(Errno::ENOENT);
            }
            Kind::Control
        } else {
            let topic = bus.topics.get_mut(path).ok_or(Errno::ENOENT)?;
            match access {
                Access::WriteOnly => topic.nadvertisers += 1,
                Access::ReadOnly => topic.nsubscribers += 1,
            }
            Kind::Topic
        };
        bus.open_handles += 1;

        // New subscribers start at the newest element, if there is one.
        let cursor = bus
            .topics
            .get(path)
            .map(|t| t.published.saturating_sub(1))
            .unwrap_or(0);
        Ok(FakeNode {
            bus: self.bus.clone(),
            path: path.to_string(),
            access,
            kind,
            cursor: AtomicU64::new(cursor),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Control,
    Topic,
}

pub struct FakeNode {
    bus: Arc<Mutex<Bus>>,
    path: String,
    access: Access,
    kind: Kind,
    cursor: AtomicU64,
}

impl std::fmt::Debug for FakeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeNode").field("path", &self.path).finish()
    }
}

impl FakeNode {
    fn with_topic<T>(&self, f: impl FnOnce(&mut Topic) -> Result<T, Errno>) -> Result<T, Errno> {
        if self.kind != Kind::Topic {
            return Err(Errno::ENOTTY);
        }
        let mut bus = self.bus.lock().unwrap();
        let topic = bus.topics.get_mut(&self.path).ok_or(Errno::ENOENT)?;
        f(topic)
    }
}

impl DeviceNode for FakeNode {
    fn read(&self, buf: &mut [u8]) -> Result<usize, Errno> {
        if self.access != Access::ReadOnly {
            return Err(Errno::EBADF);
        }
        let cursor = self.cursor.load(Ordering::Relaxed);
        let next = self.with_topic(|t| {
            Ok(t.elements
                .iter()
                .find(|(seq, _)| *seq >= cursor)
                .cloned())
        })?;
        match next {
            Some((seq, data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                self.cursor.store(seq + 1, Ordering::Relaxed);
                Ok(n)
            }
            None => Err(Errno::EAGAIN),
        }
    }

    fn write(&self, data: &[u8]) -> Result<usize, Errno> {
        if self.access != Access::WriteOnly {
            return Err(Errno::EBADF);
        }
        let limit = self.bus.lock().unwrap().write_limit;
        let data = match limit {
            Some(n) if n < data.len() => &data[..n],
            _ => data,
        };
        self.with_topic(|t| {
            let seq = t.published;
            t.published += 1;
            t.elements.push_back((seq, data.to_vec()));
            while t.elements.len() > t.nbuffer.max(1) as usize {
                t.elements.pop_front();
            }
            Ok(data.len())
        })
    }

    fn ioctl(&self, request: Request<'_>) -> Result<i32, Errno> {
        match request {
            Request::Register(req) => {
                if self.kind != Kind::Control {
                    return Err(Errno::ENOTTY);
                }
                let mut bus = self.bus.lock().unwrap();
                bus.register_calls += 1;
                if let Some(errno) = bus.register_error {
                    return Err(errno);
                }
                if bus.topics.contains_key(req.path) {
                    return Err(Errno::EEXIST);
                }
                bus.topics.insert(
                    req.path.to_string(),
                    Topic {
                        esize: req.element_size,
                        nbuffer: req.initial_queue_size.max(1),
                        ..Default::default()
                    },
                );
                Ok(0)
            }
            Request::SetUserPriv(meta) => {
                let error = self.bus.lock().unwrap().userpriv_error;
                self.with_topic(|t| {
                    t.userpriv_calls += 1;
                    if let Some(errno) = error {
                        return Err(errno);
                    }
                    t.userpriv = Some(meta.name());
                    Ok(0)
                })
            }
            Request::SetBufferNumber(n) => {
                let advertiser = self.access == Access::WriteOnly;
                self.with_topic(|t| {
                    if !advertiser || t.published != 0 {
                        return Err(Errno::EBUSY);
                    }
                    t.nbuffer = n;
                    t.generation += 1;
                    Ok(0)
                })
            }
            Request::GetState(state) => self.with_topic(|t| {
                *state = RawState {
                    esize: t.esize as libc::c_ulong,
                    nbuffer: t.nbuffer as libc::c_ulong,
                    min_latency: t.min_latency as libc::c_ulong,
                    min_interval: t.min_interval as libc::c_ulong,
                    nsubscribers: t.nsubscribers as libc::c_ulong,
                    nadvertisers: t.nadvertisers as libc::c_ulong,
                    generation: t.generation as libc::c_ulong,
                    userpriv: 0,
                };
                Ok(0)
            }),
            Request::SetInterval(us) => self.with_topic(|t| {
                t.min_interval = us;
                Ok(0)
            }),
            Request::Batch(us) => self.with_topic(|t| {
                t.min_latency = us;
                Ok(0)
            }),
            Request::Raw { .. } => Err(Errno::ENOTTY),
        }
    }

    fn poll_in(&self, timeout_ms: i32) -> Result<bool, Errno> {
        self.bus.lock().unwrap().poll_timeouts.push(timeout_ms);
        let cursor = self.cursor.load(Ordering::Relaxed);
        self.with_topic(|t| Ok(t.elements.iter().any(|(seq, _)| *seq >= cursor)))
    }

    fn close(self) -> Result<(), Errno> {
        Ok(())
    }
}

impl Drop for FakeNode {
    fn drop(&mut self) {
        let mut bus = self.bus.lock().unwrap();
        bus.open_handles -= 1;
        if let Some(topic) = bus.topics.get_mut(&self.path) {
            match self.access {
                Access::WriteOnly => topic.nadvertisers -= 1,
                Access::ReadOnly => topic.nsubscribers -= 1,
            }
        }
    }
}

pub fn path_of(meta: &TopicMetadata, instance: u32) -> String {
    format!("/dev/uorb/{}{}", meta.name(), instance)
}

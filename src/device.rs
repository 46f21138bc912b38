// Copyright 2024-2026 David Allison
// All Rights Reserved
// See LICENSE file for licensing information.

use crate::metadata::TopicMetadata;
use crate::options::ControlCodes;
use nix::errno::Errno;
use nix::fcntl::{open, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::{access, AccessFlags};
use std::collections::HashMap;
use std::ffi::{c_char, CString};
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd};
use std::sync::{Mutex, OnceLock};

// ── Driver records ──────────────────────────────────────────────────────────

/// State record reported by the driver for a GET_STATE request.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawState {
    pub esize: libc::c_ulong,
    pub nbuffer: libc::c_ulong,
    pub min_latency: libc::c_ulong,
    pub min_interval: libc::c_ulong,
    pub nsubscribers: libc::c_ulong,
    pub nadvertisers: libc::c_ulong,
    pub generation: libc::c_ulong,
    pub userpriv: usize,
}

/// Sent once on the control channel to create a topic's node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationRequest<'a> {
    pub path: &'a str,
    pub element_size: u16,
    pub initial_queue_size: u32,
    pub persist: bool,
}

#[repr(C)]
struct RawRegInfo {
    path: *const c_char,
    esize: u16,
    nbuffer: u32,
    persist: bool,
}

#[repr(C)]
struct RawMetadata {
    o_name: *const c_char,
    o_size: u16,
}

// ── Driver seam ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    WriteOnly,
}

/// One control operation against an open node.
#[derive(Debug)]
pub enum Request<'a> {
    Register(&'a RegistrationRequest<'a>),
    SetUserPriv(&'a TopicMetadata),
    SetBufferNumber(u32),
    GetState(&'a mut RawState),
    SetInterval(u32),
    Batch(u32),
    Raw { cmd: u32, arg: libc::c_ulong },
}

/// An open handle on a device node.  Dropping it releases the handle.
pub trait DeviceNode: Sized {
    fn read(&self, buf: &mut [u8]) -> Result<usize, Errno>;

    fn write(&self, data: &[u8]) -> Result<usize, Errno>;

    fn ioctl(&self, request: Request<'_>) -> Result<i32, Errno>;

    /// Waits up to `timeout_ms` for readable data.  Zero never blocks.
    fn poll_in(&self, timeout_ms: i32) -> Result<bool, Errno>;

    fn close(self) -> Result<(), Errno>;
}

/// The device-node namespace a topic lives in.
pub trait DeviceFs {
    type Node: DeviceNode;

    fn access(&self, path: &str) -> bool;

    fn open(&self, path: &str, access: Access) -> Result<Self::Node, Errno>;
}

// ── DevFs: the real OS namespace ────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct DevFs {
    codes: ControlCodes,
}

impl DevFs {
    pub fn new(codes: ControlCodes) -> Self {
        Self { codes }
    }
}

impl DeviceFs for DevFs {
    type Node = DevNode;

    fn access(&self, path: &str) -> bool {
        access(path, AccessFlags::F_OK).is_ok()
    }

    fn open(&self, path: &str, mode: Access) -> Result<DevNode, Errno> {
        let flags = match mode {
            Access::ReadOnly => OFlag::O_RDONLY,
            Access::WriteOnly => OFlag::O_WRONLY,
        };
        let fd = open(path, OFlag::O_CLOEXEC | flags, Mode::empty())?;
        Ok(DevNode {
            fd: unsafe { OwnedFd::from_raw_fd(fd) },
            codes: self.codes,
        })
    }
}

#[derive(Debug)]
pub struct DevNode {
    fd: OwnedFd,
    codes: ControlCodes,
}

impl DevNode {
    fn raw_ioctl(&self, cmd: u32, arg: libc::c_ulong) -> Result<i32, Errno> {
        Errno::result(unsafe { libc::ioctl(self.fd.as_raw_fd(), cmd as _, arg) })
    }
}

impl DeviceNode for DevNode {
    fn read(&self, buf: &mut [u8]) -> Result<usize, Errno> {
        let n = unsafe {
            libc::read(
                self.fd.as_raw_fd(),
                buf.as_mut_ptr() as *mut libc::c_void,
                buf.len(),
            )
        };
        Errno::result(n).map(|n| n as usize)
    }

    fn write(&self, data: &[u8]) -> Result<usize, Errno> {
        let n = unsafe {
            libc::write(
                self.fd.as_raw_fd(),
                data.as_ptr() as *const libc::c_void,
                data.len(),
            )
        };
        Errno::result(n).map(|n| n as usize)
    }

    fn ioctl(&self, request: Request<'_>) -> Result<i32, Errno> {
        match request {
            Request::Register(req) => {
                let path = CString::new(req.path).map_err(|_| Errno::EINVAL)?;
                let info = RawRegInfo {
                    path: path.as_ptr(),
                    esize: req.element_size,
                    nbuffer: req.initial_queue_size,
                    persist: req.persist,
                };
                let arg = &info as *const RawRegInfo as libc::c_ulong;
                self.raw_ioctl(self.codes.register, arg)
            }
            Request::SetUserPriv(meta) => {
                let arg = interned_descriptor(meta)? as libc::c_ulong;
                self.raw_ioctl(self.codes.set_userpriv, arg)
            }
            Request::SetBufferNumber(n) => {
                self.raw_ioctl(self.codes.set_buffer_number, n as libc::c_ulong)
            }
            Request::GetState(state) => {
                let arg = state as *mut RawState as libc::c_ulong;
                self.raw_ioctl(self.codes.get_state, arg)
            }
            Request::SetInterval(us) => {
                self.raw_ioctl(self.codes.set_interval, us as libc::c_ulong)
            }
            Request::Batch(us) => self.raw_ioctl(self.codes.batch, us as libc::c_ulong),
            Request::Raw { cmd, arg } => self.raw_ioctl(cmd, arg),
        }
    }

    fn poll_in(&self, timeout_ms: i32) -> Result<bool, Errno> {
        let mut pfd = libc::pollfd {
            fd: self.fd.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        Errno::result(unsafe { libc::poll(&mut pfd, 1, timeout_ms) })?;
        Ok((pfd.revents & libc::POLLIN) != 0)
    }

    fn close(self) -> Result<(), Errno> {
        nix::unistd::close(self.fd.into_raw_fd())
    }
}

/// The driver keeps the SET_USERPRIV pointer for the life of the node, so
/// each distinct (name, size) pair gets one C descriptor that is never freed.
/// Returns its address.
fn interned_descriptor(meta: &TopicMetadata) -> Result<usize, Errno> {
    static DESCRIPTORS: OnceLock<Mutex<HashMap<(&'static str, u16), usize>>> = OnceLock::new();

    let key = (meta.name(), meta.element_size());
    let mut table = DESCRIPTORS
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .map_err(|_| Errno::EAGAIN)?;
    if let Some(&addr) = table.get(&key) {
        return Ok(addr);
    }

    let name = CString::new(meta.name()).map_err(|_| Errno::EINVAL)?;
    let raw: &'static RawMetadata = Box::leak(Box::new(RawMetadata {
        o_name: name.into_raw(),
        o_size: meta.element_size(),
    }));
    let addr = raw as *const RawMetadata as usize;
    table.insert(key, addr);
    Ok(addr)
}

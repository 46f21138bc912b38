// Copyright 2024-2026 David Allison
// All Rights Reserved
// See LICENSE file for licensing information.

pub const DEFAULT_SENSOR_ROOT: &str = "/dev/uorb/";
pub const DEFAULT_CONTROL_PATH: &str = "/dev/usensor";

/// Path buffer size, including the terminating NUL.
pub const DEFAULT_PATH_MAX: usize = 64;

const SNIOC_BASE: u32 = 0x2600;

const fn snioc(nr: u32) -> u32 {
    SNIOC_BASE | nr
}

/// Numeric ioctl commands understood by the sensor driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlCodes {
    pub set_interval: u32,
    pub batch: u32,
    pub set_userpriv: u32,
    pub set_buffer_number: u32,
    pub register: u32,
    pub get_state: u32,
}

impl Default for ControlCodes {
    fn default() -> Self {
        Self {
            set_interval: snioc(0x0081),
            batch: snioc(0x0082),
            set_userpriv: snioc(0x0086),
            set_buffer_number: snioc(0x0087),
            register: snioc(0x0089),
            get_state: snioc(0x008b),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrbOptions {
    pub sensor_root: String,
    pub control_path: String,
    pub path_max: usize,
    pub codes: ControlCodes,
}

impl Default for OrbOptions {
    fn default() -> Self {
        Self {
            sensor_root: DEFAULT_SENSOR_ROOT.to_string(),
            control_path: DEFAULT_CONTROL_PATH.to_string(),
            path_max: DEFAULT_PATH_MAX,
            codes: ControlCodes::default(),
        }
    }
}

impl OrbOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_sensor_root(mut self, root: String) -> Self {
        self.sensor_root = root;
        self
    }

    pub fn set_control_path(mut self, path: String) -> Self {
        self.control_path = path;
        self
    }

    pub fn set_path_max(mut self, max: usize) -> Self {
        self.path_max = max;
        self
    }

    pub fn set_codes(mut self, codes: ControlCodes) -> Self {
        self.codes = codes;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct AdvertiseOptions {
    /// `None` advertises on the next free instance.
    pub instance: Option<u32>,
    pub queue_size: u32,
}

impl AdvertiseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_instance(mut self, instance: u32) -> Self {
        self.instance = Some(instance);
        self
    }

    pub fn set_queue_size(mut self, queue_size: u32) -> Self {
        self.queue_size = queue_size;
        self
    }
}

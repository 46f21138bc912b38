// Copyright 2024-2026 David Allison
// All Rights Reserved
// See LICENSE file for licensing information.

pub mod device;
pub mod error;
pub mod metadata;
pub mod options;
pub mod orb;
pub mod path;
pub mod session;
pub mod state;
pub mod time;

pub use device::{
    Access, DevFs, DevNode, DeviceFs, DeviceNode, RawState, RegistrationRequest, Request,
};
pub use error::{OrbError, Result};
pub use metadata::TopicMetadata;
pub use options::{AdvertiseOptions, ControlCodes, OrbOptions};
pub use orb::Orb;
pub use session::{Role, Session};
pub use state::TopicState;
pub use time::{absolute_time, elapsed_time, AbsTime};

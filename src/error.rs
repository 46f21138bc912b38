// Copyright 2024-2026 David Allison
// All Rights Reserved
// See LICENSE file for licensing information.

use nix::errno::Errno;

#[derive(Debug, thiserror::Error)]
pub enum OrbError {
    #[error("open of {path} failed: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: Errno,
    },

    #[error("registration of {path} failed: {source}")]
    RegistrationFailed {
        path: String,
        #[source]
        source: Errno,
    },

    #[error("{name} publish {written}, expect {expected}")]
    PublishMismatch {
        name: String,
        written: usize,
        expected: usize,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("state query failed: {0}")]
    QueryFailed(#[source] Errno),

    #[error("path {path} exceeds {max} bytes")]
    PathTooLong { path: String, max: usize },

    #[error("nix error: {0}")]
    Nix(#[from] nix::Error),
}

impl OrbError {
    /// The OS error behind this failure, if there is one.
    pub fn errno(&self) -> Option<Errno> {
        match self {
            OrbError::OpenFailed { source, .. } | OrbError::RegistrationFailed { source, .. } => {
                Some(*source)
            }
            OrbError::QueryFailed(e) | OrbError::Nix(e) => Some(*e),
            OrbError::InvalidArgument(_) => Some(Errno::EINVAL),
            OrbError::PathTooLong { .. } => Some(Errno::ENAMETOOLONG),
            OrbError::PublishMismatch { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, OrbError>;

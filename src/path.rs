// Copyright 2024-2026 David Allison
// All Rights Reserved
// See LICENSE file for licensing information.

use crate::error::{OrbError, Result};
use crate::metadata::TopicMetadata;
use std::fmt::Write;

/// Builds `<root><name><instance>`.
///
/// `path_max` is a buffer size that includes the terminating NUL, so the
/// longest accepted path is `path_max - 1` bytes.  Longer paths fail rather
/// than being truncated.
pub fn topic_path(
    root: &str,
    meta: &TopicMetadata,
    instance: u32,
    path_max: usize,
) -> Result<String> {
    let mut path = String::with_capacity(path_max);
    path.push_str(root);
    path.push_str(meta.name());
    let _ = write!(path, "{instance}");

    if path.len() >= path_max {
        return Err(OrbError::PathTooLong {
            path,
            max: path_max.saturating_sub(1),
        });
    }
    Ok(path)
}

// SPDX-License-Identifier: MIT

//! Error taxonomy (spec §7) and the wire markers that carry it over the
//! reply channel (spec §6.4).

use thiserror::Error;

/// Structural/user-visible errors a caller can distinguish between,
/// following the teacher's convention of one small `thiserror` enum per
/// failure domain rather than a single catch-all type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShareError {
    #[error("no such entry: {0}")]
    MissingEntry(String),

    #[error("coordinator error: {0}")]
    CoordinatorError(String),

    #[error("timed out waiting for a reply")]
    ChannelTimeout,

    #[error("unsupported share type: {0}")]
    UnsupportedShareType(String),

    #[error("shared state for {0:?} is corrupt")]
    SharedStateCorrupt(String),

    #[error("coordinator is unavailable")]
    CoordinatorUnavailable,

    #[error("invalid share name: {0:?}")]
    InvalidShareName(String),
}

/// Markers carried on the reply channel for non-exception structural
/// outcomes (spec §6.4). `Marker` round-trips to/from [`ShareError`] so the
/// wire layer can stay oblivious to error message formatting.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Marker {
    MissingEntry(String),
    CoordinatorError(String),
    ChannelTimeout,
    UnsupportedShareType(String),
    SharedStateCorrupt(String),
    CoordinatorUnavailable,
    InvalidShareName(String),
}

impl From<ShareError> for Marker {
    fn from(err: ShareError) -> Self {
        match err {
            ShareError::MissingEntry(n) => Marker::MissingEntry(n),
            ShareError::CoordinatorError(m) => Marker::CoordinatorError(m),
            ShareError::ChannelTimeout => Marker::ChannelTimeout,
            ShareError::UnsupportedShareType(t) => Marker::UnsupportedShareType(t),
            ShareError::SharedStateCorrupt(n) => Marker::SharedStateCorrupt(n),
            ShareError::CoordinatorUnavailable => Marker::CoordinatorUnavailable,
            ShareError::InvalidShareName(n) => Marker::InvalidShareName(n),
        }
    }
}

impl From<Marker> for ShareError {
    fn from(marker: Marker) -> Self {
        match marker {
            Marker::MissingEntry(n) => ShareError::MissingEntry(n),
            Marker::CoordinatorError(m) => ShareError::CoordinatorError(m),
            Marker::ChannelTimeout => ShareError::ChannelTimeout,
            Marker::UnsupportedShareType(t) => ShareError::UnsupportedShareType(t),
            Marker::SharedStateCorrupt(n) => ShareError::SharedStateCorrupt(n),
            Marker::CoordinatorUnavailable => ShareError::CoordinatorUnavailable,
            Marker::InvalidShareName(n) => ShareError::InvalidShareName(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_round_trips_through_share_error() {
        let err = ShareError::MissingEntry("x".to_string());
        let marker: Marker = err.clone().into();
        let back: ShareError = marker.into();
        assert_eq!(err, back);
    }
}

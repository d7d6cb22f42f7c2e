//! Error types
//!
//! `OverlayError` covers fallible setup and I/O paths. `LifecycleFault` describes event-stream
//! anomalies the lifecycle manager recovers from locally; faults are logged and kept in the
//! manager's diagnostics, never returned to the dispatch path.

use crate::capture::touch::types::{ContactId, ContactPhase};
use crate::compositor::CompositorError;
use crate::config::DuplicateBeginPolicy;
use crate::render::RenderError;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Compositor error: {0}")]
    Compositor(#[from] CompositorError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Script error: {0}")]
    ScriptError(String),

    #[error("Overlay driver is not running")]
    DriverClosed,
}

pub type OverlayResult<T> = Result<T, OverlayError>;

/// Which indicator animation a fault concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationStage {
    Appear,
    Disappear,
}

impl fmt::Display for AnimationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnimationStage::Appear => write!(f, "appear"),
            AnimationStage::Disappear => write!(f, "disappear"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LifecycleFault {
    #[error("Began for contact {contact} which already has an indicator ({policy:?})")]
    DuplicateBegin {
        contact: ContactId,
        policy: DuplicateBeginPolicy,
    },

    #[error("{phase} for contact {contact} which has no indicator")]
    UnknownIdentity {
        contact: ContactId,
        phase: ContactPhase,
    },

    #[error("{stage} animation rejected for contact {contact}: {source}")]
    AnimationAttachment {
        contact: ContactId,
        stage: AnimationStage,
        source: CompositorError,
    },

    #[error("Indicator layer for contact {contact} could not be inserted: {source}")]
    LayerInsertion {
        contact: ContactId,
        source: CompositorError,
    },
}

impl LifecycleFault {
    pub fn contact(&self) -> ContactId {
        match self {
            LifecycleFault::DuplicateBegin { contact, .. }
            | LifecycleFault::UnknownIdentity { contact, .. }
            | LifecycleFault::AnimationAttachment { contact, .. }
            | LifecycleFault::LayerInsertion { contact, .. } => *contact,
        }
    }
}

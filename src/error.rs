use thiserror::Error;

use crate::state_machine::{ProjectorState, StateTransitionError};

#[derive(Debug, Error)]
pub enum ProjectorError {
    #[error("notification is not active (current state: {0:?})")]
    NotActive(ProjectorState),
    #[error(transparent)]
    Transition(#[from] StateTransitionError),
    #[error("notification surface rejected the request: {0}")]
    Surface(#[from] SurfaceError),
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("notification channel unavailable: {0}")]
    ChannelUnavailable(String),
    #[error("foreground registration refused: {0}")]
    ForegroundRefused(String),
    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("background host refused to bind: {0}")]
    BindRefused(String),
    #[error("background host unavailable")]
    Unavailable,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("control receiver registration failed: {0}")]
    Subscribe(String),
    #[error("no session binder installed")]
    NotInstalled,
}

#[derive(Debug, Error)]
pub enum ArtworkError {
    #[error("failed to fetch remote artwork: {0}")]
    Network(#[from] reqwest::Error),
    #[error("failed to decode artwork: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to open bundled asset '{path}': {source}")]
    Asset {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("remote artwork must be resolved asynchronously")]
    RequiresAsync,
    #[error("no worker runtime available for remote artwork")]
    NoRuntime,
    #[error("HTTP client for remote artwork unavailable")]
    ClientUnavailable,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Catalog error: {0}")]
    Catalog(#[from] core_catalog::FetchError),

    #[error("Playback error: {0}")]
    Playback(#[from] core_playback::PlaybackError),

    /// A media-button or transport-control action id nobody handles.
    #[error("Unknown media action: {0}")]
    UnknownAction(String),

    /// An action arrived without the argument it needs, or with one that
    /// does not resolve (e.g. a playlist missing from the catalog).
    #[error("Invalid action argument: {0}")]
    InvalidArgument(String),
}

impl CoreError {
    /// The command needed a prepared session and none existed.
    pub fn is_no_session(&self) -> bool {
        matches!(
            self,
            CoreError::Playback(core_playback::PlaybackError::NoActiveSession)
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

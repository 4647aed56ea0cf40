use crate::pkg::error::{codes, PkgError};
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focus operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Pkg(#[from] PkgError),

    #[error("No workspace root found from {start}")]
    ProjectNotFound { start: PathBuf },
}

impl Error {
    /// Stable machine-readable code for JSON output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Pkg(e) => e.code(),
            Self::ProjectNotFound { .. } => codes::FOCUS_NO_WORKSPACE_ROOT,
        }
    }
}

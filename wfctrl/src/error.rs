use thiserror::Error;
use wfcore::error::{
    BackendError,
    ConfigurationError,
};

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// A role binding rule resolved to something other than a user or
    /// a group.
    #[error("expected a user or group at {path:?} for role {role}, found {found}")]
    TypeMismatch {
        path: String,
        role: String,
        found: &'static str,
    },
    #[error(transparent)]
    Rbac(#[from] wfrbac::error::Error),
    #[error("missing required argument {0}")]
    Builder(&'static str),
}

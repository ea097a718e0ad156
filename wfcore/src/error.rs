use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    #[cfg(feature = "sqlx")]
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    /// Denotes custom application invariant; generally informative.
    #[error("application invariant violated: {0}")]
    AppInvariantViolation(String),
    #[error("unknown error")]
    Unknown,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ValueError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("uninitialized value")]
    Uninitialized,
    #[error("unsupported value: {0}")]
    Unsupported(String),
}

/// Errors raised while turning a declaration into workflow definitions.
///
/// These are never recovered from silently; a workflow that cannot be
/// built from its declaration is a deployment problem.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error(
        "the attribute or key ({key}) must be specified in the \
        workflow({workflow}) configuration"
    )]
    MissingKey {
        key: String,
        workflow: String,
    },
    #[error(
        "the attribute or key ({key}) must be specified in the {parent} \
        configuration, associated with workflow ({workflow})"
    )]
    MissingNestedKey {
        key: String,
        parent: String,
        workflow: String,
    },
    #[error(
        "the attribute or key ({key}) in the workflow({workflow}) \
        configuration must be {expected}"
    )]
    InvalidValue {
        key: String,
        workflow: String,
        expected: &'static str,
    },
    #[error("{kind} {name:?} referenced by workflow ({workflow}) does not exist")]
    UnknownReference {
        kind: &'static str,
        name: String,
        workflow: String,
    },
    #[error("{kind} {name:?} does not belong to workflow ({workflow})")]
    CrossWorkflow {
        kind: &'static str,
        name: String,
        workflow: String,
    },
    #[error(
        "{kind} {name:?} is already defined in workflow ({workflow}) \
        with different attributes"
    )]
    Conflict {
        kind: &'static str,
        name: String,
        workflow: String,
    },
    #[error("malformed workflow configuration: {0}")]
    Malformed(String),
}

//! Faults raised while dispatching a pipeline step.
//!
//! Every failure the runtime or a handler can produce is one of three kinds.
//! The dispatcher never recovers from any of them locally: each is traced and
//! returned to the host unchanged in kind. Not finding a handler is not a
//! fault; see [`DispatchOutcome::NoMatch`](crate::DispatchOutcome::NoMatch).

use thiserror::Error;

/// Failure reported by a collaborator service (persistence, messaging).
///
/// # Example
///
/// ```
/// use stagehand_core::ServiceFault;
///
/// let fault = ServiceFault::new("record is locked");
/// assert_eq!(fault.to_string(), "record is locked");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServiceFault {
    message: String,
}

impl ServiceFault {
    /// Creates a fault carrying the collaborator's message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Message reported by the collaborator.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Discriminant of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// The host invocation is absent or unusable.
    Configuration,
    /// A handler rejected the proposed state.
    Validation,
    /// A collaborator reported a remote failure.
    Collaborator,
}

impl FaultKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Validation => "validation",
            Self::Collaborator => "collaborator",
        }
    }
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced to the host from [`Dispatcher::handle`](crate::Dispatcher::handle).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The host invocation is missing or cannot be interpreted. Raised before
    /// any handler runs.
    #[error("invalid plugin configuration: {message}")]
    Configuration {
        /// What was wrong with the invocation.
        message: String,
    },

    /// A handler rejected the triggering operation. The host aborts the
    /// operation and persists nothing.
    #[error("{message}")]
    Validation {
        /// Reason shown to the caller of the operation.
        message: String,
    },

    /// A collaborator call failed; the operation could not be executed.
    #[error("operation execution fault: {message}")]
    Collaborator {
        /// Message reported by the collaborator.
        message: String,
        /// Underlying collaborator fault.
        #[source]
        source: ServiceFault,
    },
}

impl PipelineError {
    /// Creates a configuration fault.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a validation fault.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Wraps a collaborator fault, keeping its message.
    #[must_use]
    pub fn collaborator(source: ServiceFault) -> Self {
        Self::Collaborator {
            message: source.message().to_owned(),
            source,
        }
    }

    /// Returns the kind of fault.
    #[must_use]
    pub const fn kind(&self) -> FaultKind {
        match self {
            Self::Configuration { .. } => FaultKind::Configuration,
            Self::Validation { .. } => FaultKind::Validation,
            Self::Collaborator { .. } => FaultKind::Collaborator,
        }
    }

    /// Message carried by the fault, without the kind prefix.
    #[must_use]
    pub const fn message(&self) -> &str {
        match self {
            Self::Configuration { message }
            | Self::Validation { message }
            | Self::Collaborator { message, .. } => message.as_str(),
        }
    }
}

impl From<ServiceFault> for PipelineError {
    fn from(source: ServiceFault) -> Self {
        Self::collaborator(source)
    }
}

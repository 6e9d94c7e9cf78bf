//! Request-scoped state handed to a handler.
//!
//! A [`RequestContext`] lives for exactly one
//! [`Dispatcher::handle`](crate::Dispatcher::handle) call. It borrows the
//! invocation and both collaborators from the host, so it cannot outlive the
//! call or be reused for another event.

use tracing::debug;

use crate::entity::{Entity, Value};
use crate::error::PipelineError;
use crate::invocation::{Invocation, Target};
use crate::resolver::AttributeResolver;
use crate::services::{PersistenceService, TraceSink};

/// Tracing target for messages mirrored from the host trace channel.
pub(crate) const CONTEXT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::context");

/// Everything a handler can see and touch while it runs.
pub struct RequestContext<'a> {
    component: &'a str,
    invocation: &'a mut Invocation,
    persistence: &'a dyn PersistenceService,
    trace_sink: Option<&'a dyn TraceSink>,
}

impl<'a> RequestContext<'a> {
    /// Wraps one invocation and the host collaborators.
    ///
    /// The dispatcher builds a fresh context for every call; handler unit
    /// tests can build one directly.
    #[must_use]
    pub fn new(
        component: &'a str,
        invocation: &'a mut Invocation,
        persistence: &'a dyn PersistenceService,
        trace_sink: Option<&'a dyn TraceSink>,
    ) -> Self {
        Self {
            component,
            invocation,
            persistence,
            trace_sink,
        }
    }

    /// Name of the component whose handler is running.
    #[must_use]
    pub const fn component(&self) -> &str {
        self.component
    }

    /// The event being processed.
    #[must_use]
    pub const fn invocation(&self) -> &Invocation {
        &*self.invocation
    }

    /// Record store.
    #[must_use]
    pub const fn persistence(&self) -> &'a dyn PersistenceService {
        self.persistence
    }

    /// Host trace channel, when one is attached.
    #[must_use]
    pub const fn trace_sink(&self) -> Option<&'a dyn TraceSink> {
        self.trace_sink
    }

    /// Attribute reads across the target and the images.
    #[must_use]
    pub const fn resolver(&self) -> AttributeResolver<'_> {
        AttributeResolver::new(&*self.invocation)
    }

    /// Writes `message` to the host trace channel, tagged with the
    /// correlation id and initiating user.
    ///
    /// Does nothing for a blank message or when no sink is attached.
    pub fn trace(&self, message: &str) {
        if message.trim().is_empty() {
            return;
        }
        debug!(
            target: CONTEXT_TARGET,
            component = self.component,
            correlation_id = %self.invocation.correlation_id(),
            "{message}"
        );
        if let Some(sink) = self.trace_sink {
            sink.write(
                message,
                self.invocation.correlation_id(),
                self.invocation.initiating_user_id(),
            );
        }
    }

    /// Mutable access to the target record, when the payload is a record.
    ///
    /// Changes are visible to the host once `handle` returns; only
    /// pre-commit stages have them persisted.
    pub fn target_entity_mut(&mut self) -> Option<&mut Entity> {
        match self.invocation.target_mut() {
            Some(Target::Entity(entity)) => Some(entity),
            Some(Target::Reference(_)) | None => None,
        }
    }

    /// Sets an attribute on the target record, returning the value it
    /// replaced.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] when the invocation carries
    /// no target record.
    pub fn set_target_value(
        &mut self,
        attribute: &str,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, PipelineError> {
        let entity = self.target_entity_mut().ok_or_else(|| {
            PipelineError::configuration(format!(
                "cannot set '{attribute}': invocation has no target record"
            ))
        })?;
        Ok(entity.set(attribute, value))
    }
}

impl std::fmt::Debug for RequestContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("component", &self.component)
            .field("invocation", &self.invocation)
            .field("has_trace_sink", &self.trace_sink.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;

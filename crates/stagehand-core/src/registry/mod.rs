//! Registration table mapping pipeline events to handlers.
//!
//! Business components declare interest in (stage, operation, entity type)
//! triples during setup through a [`RegistrationTableBuilder`]. Calling
//! [`RegistrationTableBuilder::build`] freezes the entries into a
//! [`RegistrationTable`] that is read-only from then on and can be shared
//! across threads without locking.

use std::fmt;

use crate::context::RequestContext;
use crate::error::PipelineError;
use crate::invocation::{Operation, Stage};

/// A handler the dispatcher can invoke.
///
/// Implemented for every `Fn(&mut RequestContext<'_>) -> Result<(),
/// PipelineError>` closure that is `Send + Sync`, so plain functions and
/// closures capturing shared state register directly.
pub trait StepHandler: Send + Sync {
    /// Runs the handler against one request.
    ///
    /// # Errors
    ///
    /// Returns any [`PipelineError`] the handler raises; the dispatcher
    /// propagates it unchanged.
    fn call(&self, context: &mut RequestContext<'_>) -> Result<(), PipelineError>;
}

impl<F> StepHandler for F
where
    F: Fn(&mut RequestContext<'_>) -> Result<(), PipelineError> + Send + Sync,
{
    fn call(&self, context: &mut RequestContext<'_>) -> Result<(), PipelineError> {
        self(context)
    }
}

/// One entry in the registration table.
pub struct Registration {
    stage: Stage,
    operation: Operation,
    entity_filter: Option<String>,
    label: String,
    handler: Box<dyn StepHandler>,
}

impl Registration {
    /// Stage the entry answers to.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Operation the entry answers to.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        self.operation
    }

    /// Entity type filter, or `None` when the entry matches any type.
    #[must_use]
    pub fn entity_filter(&self) -> Option<&str> {
        self.entity_filter.as_deref()
    }

    /// Name used in traces for the handler.
    #[must_use]
    pub const fn label(&self) -> &str {
        self.label.as_str()
    }

    /// The handler itself.
    #[must_use]
    pub fn handler(&self) -> &dyn StepHandler {
        self.handler.as_ref()
    }

    /// Returns `true` when the entry answers to the given event.
    #[must_use]
    pub fn matches(&self, stage: Stage, operation: Operation, entity_type: &str) -> bool {
        self.stage == stage
            && self.operation == operation
            && self
                .entity_filter
                .as_deref()
                .is_none_or(|filter| filter == entity_type)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("stage", &self.stage)
            .field("operation", &self.operation)
            .field("entity_filter", &self.entity_filter)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Collects registrations during setup.
///
/// # Example
///
/// ```
/// use stagehand_core::{Operation, RegistrationTable, Stage};
///
/// let mut builder = RegistrationTable::builder();
/// builder.register(
///     Stage::PreOperate,
///     Operation::Update,
///     "contact",
///     "noop",
///     |_context| Ok(()),
/// );
/// let table = builder.build();
/// assert!(table.find_match(Stage::PreOperate, Operation::Update, "contact").is_some());
/// assert!(table.find_match(Stage::PreOperate, Operation::Update, "account").is_none());
/// ```
#[derive(Debug, Default)]
pub struct RegistrationTableBuilder {
    entries: Vec<Registration>,
}

impl RegistrationTableBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    ///
    /// An empty or whitespace-only `entity_filter` matches every entity
    /// type. Later entries never displace earlier ones: lookups return the
    /// first match in registration order.
    pub fn register<F>(
        &mut self,
        stage: Stage,
        operation: Operation,
        entity_filter: &str,
        label: impl Into<String>,
        handler: F,
    ) -> &mut Self
    where
        F: Fn(&mut RequestContext<'_>) -> Result<(), PipelineError> + Send + Sync + 'static,
    {
        let filter = entity_filter.trim();
        self.entries.push(Registration {
            stage,
            operation,
            entity_filter: (!filter.is_empty()).then(|| filter.to_owned()),
            label: label.into(),
            handler: Box::new(handler),
        });
        self
    }

    /// Number of entries collected so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freezes the collected entries.
    #[must_use]
    pub fn build(self) -> RegistrationTable {
        RegistrationTable {
            entries: self.entries.into_boxed_slice(),
        }
    }
}

/// Immutable, ordered set of registrations.
#[derive(Debug)]
pub struct RegistrationTable {
    entries: Box<[Registration]>,
}

impl RegistrationTable {
    /// Starts a new table.
    #[must_use]
    pub fn builder() -> RegistrationTableBuilder {
        RegistrationTableBuilder::new()
    }

    /// First entry, in registration order, that answers to the event.
    #[must_use]
    pub fn find_match(
        &self,
        stage: Stage,
        operation: Operation,
        entity_type: &str,
    ) -> Option<&Registration> {
        self.entries
            .iter()
            .find(|entry| entry.matches(stage, operation, entity_type))
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A business component that contributes registrations.
pub trait Plugin {
    /// Name the component reports in traces.
    fn name(&self) -> &str;

    /// Adds the component's entries to `table`.
    fn register(&self, table: &mut RegistrationTableBuilder);
}

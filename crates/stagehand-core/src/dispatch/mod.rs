//! Single-match dispatch of host invocations.
//!
//! A [`Dispatcher`] owns one frozen [`RegistrationTable`] and the name of the
//! component it serves. Each call to [`Dispatcher::handle`] builds a fresh
//! [`RequestContext`], picks the first matching registration and runs it.
//! The dispatcher holds no per-call state, so a single instance can serve
//! concurrent invocations from many host threads.

use std::fmt;

use tracing::{debug, warn};

use crate::context::RequestContext;
use crate::error::PipelineError;
use crate::invocation::Invocation;
use crate::registry::{Plugin, RegistrationTable, RegistrationTableBuilder};
use crate::services::{PersistenceService, TraceSink};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// What happened to an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The named handler ran to completion.
    Handled {
        /// Label of the registration that ran.
        handler: String,
    },
    /// No registration answers to the event.
    NoMatch,
}

impl DispatchOutcome {
    /// Returns `true` when a handler ran.
    #[must_use]
    pub const fn is_handled(&self) -> bool {
        matches!(self, Self::Handled { .. })
    }

    /// Label of the handler that ran, if any.
    #[must_use]
    pub fn handler(&self) -> Option<&str> {
        match self {
            Self::Handled { handler } => Some(handler),
            Self::NoMatch => None,
        }
    }
}

/// Routes invocations to at most one registered handler.
///
/// # Example
///
/// ```
/// use stagehand_core::{
///     ColumnSet, DispatchOutcome, Dispatcher, Entity, Invocation, Operation,
///     PersistenceService, QueryExpression, RegistrationTable, ServiceFault, Stage,
/// };
/// use uuid::Uuid;
///
/// struct NullStore;
///
/// impl PersistenceService for NullStore {
///     fn create(&self, _: &Entity) -> Result<Uuid, ServiceFault> { Ok(Uuid::nil()) }
///     fn update(&self, _: &Entity) -> Result<(), ServiceFault> { Ok(()) }
///     fn retrieve(&self, name: &str, id: Uuid, _: &ColumnSet) -> Result<Entity, ServiceFault> {
///         Ok(Entity::with_id(name, id))
///     }
///     fn query(&self, _: &QueryExpression) -> Result<Vec<Entity>, ServiceFault> { Ok(Vec::new()) }
/// }
///
/// let mut table = RegistrationTable::builder();
/// table.register(Stage::PreOperate, Operation::Create, "contact", "stamp", |context| {
///     context.set_target_value("app_incrementvalue", 1_i64)?;
///     Ok(())
/// });
/// let dispatcher = Dispatcher::new("Contacts", table.build());
///
/// let mut invocation = Invocation::builder(Stage::PreOperate, Operation::Create, "contact")
///     .target(Entity::new("contact"))
///     .build()?;
/// let outcome = dispatcher.handle(&mut invocation, &NullStore, None)?;
/// assert_eq!(outcome.handler(), Some("stamp"));
/// assert!(invocation.resolver().is_changing("app_incrementvalue"));
/// # Ok::<(), stagehand_core::PipelineError>(())
/// ```
pub struct Dispatcher {
    component: String,
    table: RegistrationTable,
}

impl Dispatcher {
    /// Creates a dispatcher over a frozen table.
    #[must_use]
    pub fn new(component: impl Into<String>, table: RegistrationTable) -> Self {
        Self {
            component: component.into(),
            table,
        }
    }

    /// Builds a dispatcher from the registrations a plugin contributes.
    #[must_use]
    pub fn from_plugin<P: Plugin + ?Sized>(plugin: &P) -> Self {
        let mut builder = RegistrationTableBuilder::new();
        plugin.register(&mut builder);
        Self::new(plugin.name(), builder.build())
    }

    /// Name reported in traces.
    #[must_use]
    pub const fn component(&self) -> &str {
        self.component.as_str()
    }

    /// Registrations the dispatcher consults.
    #[must_use]
    pub const fn table(&self) -> &RegistrationTable {
        &self.table
    }

    /// Processes one host invocation.
    ///
    /// Runs the first registration matching the invocation's stage,
    /// operation and entity type. An invocation nothing answers to is not an
    /// error and yields [`DispatchOutcome::NoMatch`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] when the invocation fails
    /// validation, before any handler runs. Any error a handler raises is
    /// traced and returned unchanged.
    pub fn handle(
        &self,
        invocation: &mut Invocation,
        persistence: &dyn PersistenceService,
        trace_sink: Option<&dyn TraceSink>,
    ) -> Result<DispatchOutcome, PipelineError> {
        invocation.validate()?;

        let stage = invocation.stage();
        let operation = invocation.operation();
        let entity_type = invocation.entity_type().to_owned();
        let entity_id = invocation.primary_entity_id();

        let mut context = RequestContext::new(&self.component, invocation, persistence, trace_sink);
        context.trace(&format!("Entered {}.handle()", self.component));
        debug!(
            target: DISPATCH_TARGET,
            component = %self.component,
            %stage,
            %operation,
            entity_type = %entity_type,
            %entity_id,
            "dispatching invocation"
        );

        let Some(entry) = self.table.find_match(stage, operation, &entity_type) else {
            debug!(
                target: DISPATCH_TARGET,
                component = %self.component,
                %stage,
                %operation,
                entity_type = %entity_type,
                "no registration matches"
            );
            return Ok(DispatchOutcome::NoMatch);
        };

        context.trace(&format!(
            "{} is firing for entity: {entity_type}({entity_id}), operation: {operation}, stage: {stage}, handler: {}",
            self.component,
            entry.label(),
        ));
        debug!(
            target: DISPATCH_TARGET,
            component = %self.component,
            handler = entry.label(),
            "invoking handler"
        );

        if let Err(error) = entry.handler().call(&mut context) {
            context.trace(&format!("Exception: {error}"));
            warn!(
                target: DISPATCH_TARGET,
                component = %self.component,
                handler = entry.label(),
                kind = %error.kind(),
                %error,
                "handler failed"
            );
            return Err(error);
        }

        context.trace(&format!("Exiting {}.handle()", self.component));
        Ok(DispatchOutcome::Handled {
            handler: entry.label().to_owned(),
        })
    }

    /// Processes an invocation the host may have failed to supply.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] when `invocation` is `None`;
    /// otherwise behaves as [`handle`](Self::handle).
    pub fn handle_optional(
        &self,
        invocation: Option<&mut Invocation>,
        persistence: &dyn PersistenceService,
        trace_sink: Option<&dyn TraceSink>,
    ) -> Result<DispatchOutcome, PipelineError> {
        let Some(supplied) = invocation else {
            return Err(PipelineError::configuration(format!(
                "{} received no invocation from the host",
                self.component
            )));
        };
        self.handle(supplied, persistence, trace_sink)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("component", &self.component)
            .field("registrations", &self.table.len())
            .finish()
    }
}

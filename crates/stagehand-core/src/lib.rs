//! Dispatch and state-resolution runtime for record pipeline extensions.
//!
//! A host record platform calls into business rules at fixed points of every
//! record operation: before validation, before the write commits, and after
//! it commits. `stagehand-core` turns each such call (an [`Invocation`]) into
//! at most one handler run:
//!
//! - components declare interest in (stage, operation, entity type) triples
//!   through a [`RegistrationTableBuilder`] and freeze it into a
//!   [`RegistrationTable`];
//! - a [`Dispatcher`] picks the first matching registration and runs its
//!   handler with a fresh [`RequestContext`];
//! - handlers read attribute values through the [`AttributeResolver`],
//!   which merges the caller's write payload with the pre and post images
//!   under a fixed precedence and reports absence explicitly;
//! - faults come back as a [`PipelineError`] tagged Configuration,
//!   Validation or Collaborator.
//!
//! The host supplies the record store ([`PersistenceService`]) and its
//! diagnostic channel ([`TraceSink`]). A single dispatcher can serve
//! concurrent invocations; the table is immutable after setup.
//!
//! # Example
//!
//! ```
//! use stagehand_core::{
//!     ColumnSet, Dispatcher, Entity, Invocation, Operation, PersistenceService,
//!     PipelineError, QueryExpression, RegistrationTable, ServiceFault, Stage,
//! };
//! use uuid::Uuid;
//!
//! struct NullStore;
//!
//! impl PersistenceService for NullStore {
//!     fn create(&self, _: &Entity) -> Result<Uuid, ServiceFault> { Ok(Uuid::nil()) }
//!     fn update(&self, _: &Entity) -> Result<(), ServiceFault> { Ok(()) }
//!     fn retrieve(&self, name: &str, id: Uuid, _: &ColumnSet) -> Result<Entity, ServiceFault> {
//!         Ok(Entity::with_id(name, id))
//!     }
//!     fn query(&self, _: &QueryExpression) -> Result<Vec<Entity>, ServiceFault> { Ok(Vec::new()) }
//! }
//!
//! let mut table = RegistrationTable::builder();
//! table.register(Stage::PreValidate, Operation::Update, "contact", "require-name", |context| {
//!     let name = context.resolver().read_latest_value::<String>("fullname");
//!     if name.value().trim().is_empty() {
//!         return Err(PipelineError::validation("a contact needs a name"));
//!     }
//!     Ok(())
//! });
//! let dispatcher = Dispatcher::new("Contacts", table.build());
//!
//! let mut invocation = Invocation::builder(Stage::PreValidate, Operation::Update, "contact")
//!     .target(Entity::new("contact").with("fullname", ""))
//!     .build()?;
//! let err = dispatcher
//!     .handle(&mut invocation, &NullStore, None)
//!     .expect_err("blank name is rejected");
//! assert_eq!(err.to_string(), "a contact needs a name");
//! # Ok::<(), PipelineError>(())
//! ```

pub mod context;
pub mod dispatch;
pub mod entity;
pub mod error;
pub mod invocation;
pub mod registry;
pub mod resolver;
pub mod services;
pub mod telemetry;

#[cfg(test)]
mod tests;

pub use self::context::RequestContext;
pub use self::dispatch::{DispatchOutcome, Dispatcher};
pub use self::entity::{Entity, EntityReference, Value};
pub use self::error::{FaultKind, PipelineError, ServiceFault};
pub use self::invocation::{ImageSet, Invocation, InvocationBuilder, Operation, Stage, Target};
pub use self::registry::{
    Plugin, Registration, RegistrationTable, RegistrationTableBuilder, StepHandler,
};
pub use self::resolver::{AttributeChange, AttributeResolver, AttributeValue, Resolved, Source};
pub use self::services::{
    ColumnSet, Condition, ConditionOperator, LinkEntity, PersistenceService, QueryExpression,
    TraceSink,
};
pub use self::telemetry::{TelemetryError, TelemetryHandle};

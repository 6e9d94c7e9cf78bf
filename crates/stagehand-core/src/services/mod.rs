//! Collaborator contracts the runtime borrows from its host.
//!
//! The host owns the record store and the diagnostic trace channel. The
//! runtime only sees them through these traits, for the duration of one
//! [`Dispatcher::handle`](crate::Dispatcher::handle) call. Test code
//! implements the traits with doubles.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{Entity, Value};
use crate::error::ServiceFault;

/// Attributes to return from a read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColumnSet {
    /// Every attribute of the record.
    #[default]
    All,
    /// Only the listed attributes.
    Columns(Vec<String>),
}

impl ColumnSet {
    /// Selects the given attributes.
    #[must_use]
    pub fn of<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Columns(columns.into_iter().map(Into::into).collect())
    }

    /// Returns `true` when `attribute` is selected.
    #[must_use]
    pub fn includes(&self, attribute: &str) -> bool {
        match self {
            Self::All => true,
            Self::Columns(columns) => columns.iter().any(|column| column == attribute),
        }
    }
}

/// Comparison applied by a [`Condition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConditionOperator {
    /// Attribute equals the value.
    Equal(Value),
    /// Attribute has a value.
    NotNull,
}

/// Filter on one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    attribute: String,
    operator: ConditionOperator,
}

impl Condition {
    /// Matches records whose `attribute` equals `value`.
    #[must_use]
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            attribute: attribute.into(),
            operator: ConditionOperator::Equal(value.into()),
        }
    }

    /// Matches records where `attribute` is set.
    #[must_use]
    pub fn not_null(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            operator: ConditionOperator::NotNull,
        }
    }

    /// Attribute the condition tests.
    #[must_use]
    pub const fn attribute(&self) -> &str {
        self.attribute.as_str()
    }

    /// Comparison applied.
    #[must_use]
    pub const fn operator(&self) -> &ConditionOperator {
        &self.operator
    }

    /// Evaluates the condition against a snapshot.
    #[must_use]
    pub fn matches(&self, entity: &Entity) -> bool {
        match (&self.operator, entity.get(&self.attribute)) {
            (ConditionOperator::NotNull, value) => value.is_some(),
            (ConditionOperator::Equal(expected), Some(actual)) => expected == actual,
            (ConditionOperator::Equal(_), None) => false,
        }
    }
}

/// Inner join from the queried record type to a related one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkEntity {
    from_attribute: String,
    to_entity: String,
    to_attribute: String,
    conditions: Vec<Condition>,
}

impl LinkEntity {
    /// Joins `from_attribute` on the queried type to `to_attribute` on
    /// `to_entity`.
    #[must_use]
    pub fn inner(
        from_attribute: impl Into<String>,
        to_entity: impl Into<String>,
        to_attribute: impl Into<String>,
    ) -> Self {
        Self {
            from_attribute: from_attribute.into(),
            to_entity: to_entity.into(),
            to_attribute: to_attribute.into(),
            conditions: Vec::new(),
        }
    }

    /// Adds a condition on the linked record.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Lookup attribute on the queried record type.
    #[must_use]
    pub const fn from_attribute(&self) -> &str {
        self.from_attribute.as_str()
    }

    /// Linked record type.
    #[must_use]
    pub const fn to_entity(&self) -> &str {
        self.to_entity.as_str()
    }

    /// Key attribute on the linked record type.
    #[must_use]
    pub const fn to_attribute(&self) -> &str {
        self.to_attribute.as_str()
    }

    /// Conditions on the linked record.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

/// Query criteria passed to [`PersistenceService::query`].
///
/// # Example
///
/// ```
/// use stagehand_core::{ColumnSet, Condition, LinkEntity, QueryExpression};
/// use uuid::Uuid;
///
/// let account = Uuid::new_v4();
/// let query = QueryExpression::new("contact")
///     .columns(ColumnSet::of(["app_age"]))
///     .with_condition(Condition::not_null("app_age"))
///     .with_link(
///         LinkEntity::inner("parentcustomerid", "account", "accountid")
///             .with_condition(Condition::equal("accountid", account.to_string())),
///     );
/// assert_eq!(query.entity(), "contact");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryExpression {
    entity: String,
    columns: ColumnSet,
    conditions: Vec<Condition>,
    links: Vec<LinkEntity>,
}

impl QueryExpression {
    /// Queries every attribute of `entity` records.
    #[must_use]
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            columns: ColumnSet::All,
            conditions: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Restricts the returned attributes.
    #[must_use]
    pub fn columns(mut self, columns: ColumnSet) -> Self {
        self.columns = columns;
        self
    }

    /// Adds a condition on the queried record.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Adds a join.
    #[must_use]
    pub fn with_link(mut self, link: LinkEntity) -> Self {
        self.links.push(link);
        self
    }

    /// Queried record type.
    #[must_use]
    pub const fn entity(&self) -> &str {
        self.entity.as_str()
    }

    /// Returned attributes.
    #[must_use]
    pub const fn column_set(&self) -> &ColumnSet {
        &self.columns
    }

    /// Conditions on the queried record.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Joins.
    #[must_use]
    pub fn links(&self) -> &[LinkEntity] {
        &self.links
    }
}

/// Record store operations available to handlers.
///
/// All calls are synchronous. The runtime never retries a failed call;
/// retry policy belongs to the implementation or the host.
pub trait PersistenceService: Send + Sync {
    /// Creates a record and returns its id.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceFault`] when the store rejects the write.
    fn create(&self, entity: &Entity) -> Result<Uuid, ServiceFault>;

    /// Updates the attributes present on `entity`.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceFault`] when the store rejects the write.
    fn update(&self, entity: &Entity) -> Result<(), ServiceFault>;

    /// Reads one record.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceFault`] when the record cannot be read.
    fn retrieve(
        &self,
        logical_name: &str,
        id: Uuid,
        columns: &ColumnSet,
    ) -> Result<Entity, ServiceFault>;

    /// Runs a query.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceFault`] when the query cannot be executed.
    fn query(&self, query: &QueryExpression) -> Result<Vec<Entity>, ServiceFault>;
}

/// Host diagnostic channel.
///
/// Writes are best effort; implementations swallow their own failures.
pub trait TraceSink: Send + Sync {
    /// Records one message for the event identified by `correlation_id`.
    fn write(&self, message: &str, correlation_id: Uuid, initiating_user: Uuid);
}

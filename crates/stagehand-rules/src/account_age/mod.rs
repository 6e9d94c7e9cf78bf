//! Recomputes the total age stored on an account.
//!
//! The total is the sum of `app_age` over every contact whose parent lookup
//! points at the account. It is refreshed from the contact lifecycle rules
//! and can also be requested on demand for a single account.

use stagehand_config::{Config, EntityNames};
use stagehand_core::{
    ColumnSet, Condition, Entity, EntityReference, LinkEntity, PersistenceService, PipelineError,
    QueryExpression, Value,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::schema::{account, contact};

const ACCOUNT_AGE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::account_age");

/// On-demand refresh of an account's total age.
#[derive(Debug, Clone)]
pub struct AccountAgeRefresh {
    entities: EntityNames,
}

impl AccountAgeRefresh {
    /// Uses the record type names from `config`.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            entities: config.entities(),
        }
    }

    /// Record type names in use.
    #[must_use]
    pub const fn entities(&self) -> &EntityNames {
        &self.entities
    }

    /// Recomputes the total age of the referenced account and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Validation`] when `reference` does not point
    /// at an account, and [`PipelineError::Collaborator`] when the query or
    /// the update fails.
    pub fn refresh_account(
        &self,
        reference: &EntityReference,
        persistence: &dyn PersistenceService,
    ) -> Result<i64, PipelineError> {
        if !reference.targets(self.entities.account()) {
            return Err(PipelineError::validation(format!(
                "expected a reference to '{}', got '{}'",
                self.entities.account(),
                reference.logical_name()
            )));
        }
        self.refresh_account_total_age(reference.id(), persistence)
    }

    /// Sums the ages of the account's contacts and writes the total back.
    ///
    /// Issues exactly one query and one update.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Collaborator`] when either call fails.
    pub fn refresh_account_total_age(
        &self,
        account_id: Uuid,
        persistence: &dyn PersistenceService,
    ) -> Result<i64, PipelineError> {
        let contacts = persistence.query(&self.contacts_of(account_id))?;
        let total: i64 = contacts
            .iter()
            .filter_map(|record| match record.get(contact::AGE) {
                Some(Value::Integer(age)) => Some(*age),
                other => {
                    debug!(
                        target: ACCOUNT_AGE_TARGET,
                        contact = %record.id(),
                        value = ?other,
                        "skipping contact without an integer age"
                    );
                    None
                }
            })
            .sum();

        let update = Entity::with_id(self.entities.account(), account_id)
            .with(account::TOTAL_AGE, total);
        persistence.update(&update)?;
        info!(
            target: ACCOUNT_AGE_TARGET,
            account = %account_id,
            contacts = contacts.len(),
            total,
            "account total age refreshed"
        );
        Ok(total)
    }

    fn contacts_of(&self, account_id: Uuid) -> QueryExpression {
        let key = EntityReference::new(self.entities.account(), account_id);
        QueryExpression::new(self.entities.contact())
            .columns(ColumnSet::of([contact::AGE]))
            .with_condition(Condition::not_null(contact::AGE))
            .with_link(
                LinkEntity::inner(
                    contact::PARENT_CUSTOMER,
                    self.entities.account(),
                    account::PRIMARY_KEY,
                )
                .with_condition(Condition::equal(account::PRIMARY_KEY, key)),
            )
    }
}

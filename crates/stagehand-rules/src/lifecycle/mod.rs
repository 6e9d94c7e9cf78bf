//! Contact birthdate, age and parent-account rules.
//!
//! Registered steps, all on the contact record type:
//!
//! | Stage        | Operation       | Handler                      |
//! |--------------|-----------------|------------------------------|
//! | PreValidate  | Create, Update  | `validate_birthdate`         |
//! | PreOperate   | Create, Update  | `calculate_age`              |
//! | PostOperate  | Create          | `refresh_parent_on_create`   |
//! | PostOperate  | Update          | `refresh_parents_on_update`  |

use std::fmt;
use std::sync::Arc;

use stagehand_config::{Config, EntityNames, ImageNames};
use stagehand_core::{
    EntityReference, Operation, PipelineError, Plugin, RegistrationTableBuilder, RequestContext,
    Stage,
};
use time::Date;
use tracing::debug;
use uuid::Uuid;

use crate::account_age::AccountAgeRefresh;
use crate::age::{Clock, SystemClock, age_on};
use crate::schema::contact;

const LIFECYCLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::lifecycle");

type Step = fn(&ContactLifecycle, &mut RequestContext<'_>) -> Result<(), PipelineError>;

/// Keeps contact ages and account age totals consistent.
#[derive(Clone)]
pub struct ContactLifecycle {
    images: ImageNames,
    entities: EntityNames,
    clock: Arc<dyn Clock>,
    accounts: AccountAgeRefresh,
}

impl ContactLifecycle {
    /// Component name reported in traces.
    pub const NAME: &'static str = "ContactLifecycle";

    const STEPS: [(Stage, Operation, &'static str, Step); 6] = [
        (
            Stage::PreValidate,
            Operation::Create,
            "validate_birthdate",
            Self::validate_birthdate as Step,
        ),
        (
            Stage::PreValidate,
            Operation::Update,
            "validate_birthdate",
            Self::validate_birthdate as Step,
        ),
        (
            Stage::PreOperate,
            Operation::Create,
            "calculate_age",
            Self::calculate_age as Step,
        ),
        (
            Stage::PreOperate,
            Operation::Update,
            "calculate_age",
            Self::calculate_age as Step,
        ),
        (
            Stage::PostOperate,
            Operation::Create,
            "refresh_parent_on_create",
            Self::refresh_parent_on_create as Step,
        ),
        (
            Stage::PostOperate,
            Operation::Update,
            "refresh_parents_on_update",
            Self::refresh_parents_on_update as Step,
        ),
    ];

    /// Builds the component from configuration, reading dates from `clock`.
    #[must_use]
    pub fn new(config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            images: config.images(),
            entities: config.entities(),
            clock,
            accounts: AccountAgeRefresh::new(config),
        }
    }

    /// Builds the component against the system clock.
    #[must_use]
    pub fn with_system_clock(config: &Config) -> Self {
        Self::new(config, Arc::new(SystemClock))
    }

    /// Rejects a birthdate later than today.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Validation`] when the target sets a future
    /// birthdate.
    pub fn validate_birthdate(&self, context: &mut RequestContext<'_>) -> Result<(), PipelineError> {
        let Some(birthdate) = changing_birthdate(context) else {
            return Ok(());
        };
        self.reject_future(context, birthdate)
    }

    /// Writes the age derived from a changing birthdate into the target.
    ///
    /// The birthdate is checked again before the age is derived, so a future
    /// date is rejected even when no validation step ran first.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Validation`] when the target sets a future
    /// birthdate, and [`PipelineError::Configuration`] when the invocation
    /// carries no target record.
    pub fn calculate_age(&self, context: &mut RequestContext<'_>) -> Result<(), PipelineError> {
        let Some(birthdate) = changing_birthdate(context) else {
            return Ok(());
        };
        self.reject_future(context, birthdate)?;
        let age = age_on(birthdate, self.clock.today());
        context.set_target_value(contact::AGE, age)?;
        debug!(target: LIFECYCLE_TARGET, %birthdate, age, "contact age derived");
        Ok(())
    }

    /// Refreshes the parent account after a contact is created.
    ///
    /// Runs only when the birthdate or the parent lookup is part of the
    /// create.
    ///
    /// # Errors
    ///
    /// Propagates collaborator faults from the refresh.
    pub fn refresh_parent_on_create(
        &self,
        context: &mut RequestContext<'_>,
    ) -> Result<(), PipelineError> {
        let resolver = context.resolver();
        if !resolver.is_changing(contact::BIRTHDATE)
            && !resolver.is_changing(contact::PARENT_CUSTOMER)
        {
            debug!(target: LIFECYCLE_TARGET, "neither birthdate nor parent changed");
            return Ok(());
        }
        let parent = resolver
            .read_latest_value::<EntityReference>(contact::PARENT_CUSTOMER)
            .into_option()
            .filter(|reference| reference.targets(self.entities.account()));
        let Some(account) = parent else {
            debug!(target: LIFECYCLE_TARGET, "contact has no parent account");
            return Ok(());
        };
        self.accounts
            .refresh_account_total_age(account.id(), context.persistence())?;
        Ok(())
    }

    /// Refreshes the accounts a contact update affects.
    ///
    /// Compares the parent lookup in the pre and post images named by
    /// `images.parent_lookup`. Every distinct account found on either side
    /// is refreshed once: the new parent picks up the contact's age and the
    /// old parent drops it.
    ///
    /// # Errors
    ///
    /// Propagates collaborator faults from the refreshes.
    pub fn refresh_parents_on_update(
        &self,
        context: &mut RequestContext<'_>,
    ) -> Result<(), PipelineError> {
        let accounts = self.affected_accounts(context);
        if accounts.is_empty() {
            debug!(target: LIFECYCLE_TARGET, "update touches no parent account");
        }
        for account_id in accounts {
            self.accounts
                .refresh_account_total_age(account_id, context.persistence())?;
        }
        Ok(())
    }

    fn reject_future(
        &self,
        context: &RequestContext<'_>,
        birthdate: Date,
    ) -> Result<(), PipelineError> {
        let today = self.clock.today();
        if birthdate > today {
            context.trace(&format!("Rejected birthdate {birthdate} after {today}"));
            return Err(PipelineError::validation(
                "birthdate cannot be later than today",
            ));
        }
        Ok(())
    }

    fn affected_accounts(&self, context: &RequestContext<'_>) -> Vec<Uuid> {
        let resolver = context.resolver();
        let image = Some(self.images.parent_lookup());
        let post = resolver
            .has_post_value(contact::PARENT_CUSTOMER, image)
            .then(|| resolver.read_post_value::<EntityReference>(contact::PARENT_CUSTOMER, image));
        let pre = resolver
            .has_pre_value(contact::PARENT_CUSTOMER, image)
            .then(|| resolver.read_pre_value::<EntityReference>(contact::PARENT_CUSTOMER, image));

        let mut accounts: Vec<Uuid> = Vec::with_capacity(2);
        for reference in [post, pre].into_iter().flatten() {
            let Some(parent) = reference.into_option() else {
                continue;
            };
            if parent.targets(self.entities.account()) && !accounts.contains(&parent.id()) {
                accounts.push(parent.id());
            }
        }
        accounts
    }
}

/// Birthdate written by the target, if it writes one.
fn changing_birthdate(context: &RequestContext<'_>) -> Option<Date> {
    let resolver = context.resolver();
    if !resolver.is_changing(contact::BIRTHDATE) {
        return None;
    }
    resolver
        .read_from_target::<Date>(contact::BIRTHDATE)
        .into_option()
}

impl Plugin for ContactLifecycle {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn register(&self, table: &mut RegistrationTableBuilder) {
        for (stage, operation, label, step) in Self::STEPS {
            let component = self.clone();
            table.register(
                stage,
                operation,
                self.entities.contact(),
                label,
                move |context| step(&component, context),
            );
        }
    }
}

impl fmt::Debug for ContactLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContactLifecycle")
            .field("images", &self.images)
            .field("entities", &self.entities)
            .field("accounts", &self.accounts)
            .finish_non_exhaustive()
    }
}

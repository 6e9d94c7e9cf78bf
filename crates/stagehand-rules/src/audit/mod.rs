//! Audit trail for contact creates and updates.
//!
//! Every audited event produces one audit record whose field, before and
//! after columns hold newline-terminated lines, one line per audited field
//! and aligned across the three columns.

use std::fmt;
use std::sync::Arc;

use stagehand_config::{Config, EntityNames, ImageNames};
use stagehand_core::{
    AttributeResolver, AttributeValue, ColumnSet, Entity, EntityReference, Operation,
    PipelineError, Plugin, RegistrationTableBuilder, RequestContext, Resolved, Stage, Value,
};
use time::Date;
use tracing::{debug, info};

use crate::age::{Clock, SystemClock, age_on};
use crate::schema::{audit, contact};

const AUDIT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::audit");

/// Event label written for contact creates.
pub const CREATE_EVENT: &str = "Create Contact";
/// Event label written for contact updates.
pub const UPDATE_EVENT: &str = "Update Contact";

type Step = fn(&ContactAudit, &mut RequestContext<'_>) -> Result<(), PipelineError>;

/// Field, before and after columns of one audit record.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AuditLines {
    fields: String,
    before: String,
    after: String,
}

impl AuditLines {
    /// Appends one audited field.
    pub fn push(&mut self, field: &str, before: &str, after: &str) {
        for (column, line) in [
            (&mut self.fields, field),
            (&mut self.before, before),
            (&mut self.after, after),
        ] {
            column.push_str(line);
            column.push('\n');
        }
    }

    /// Field labels.
    #[must_use]
    pub const fn fields(&self) -> &str {
        self.fields.as_str()
    }

    /// Values before the change.
    #[must_use]
    pub const fn before(&self) -> &str {
        self.before.as_str()
    }

    /// Values after the change.
    #[must_use]
    pub const fn after(&self) -> &str {
        self.after.as_str()
    }

    /// Returns `true` when no field was audited.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Writes audit records for contact changes.
#[derive(Clone)]
pub struct ContactAudit {
    images: ImageNames,
    entities: EntityNames,
    clock: Arc<dyn Clock>,
}

impl ContactAudit {
    /// Component name reported in traces.
    pub const NAME: &'static str = "ContactAudit";

    const STEPS: [(Stage, Operation, &'static str, Step); 3] = [
        (
            Stage::PreOperate,
            Operation::Create,
            "stamp_increment_on_create",
            Self::stamp_increment_on_create as Step,
        ),
        (
            Stage::PostOperate,
            Operation::Create,
            "audit_create",
            Self::audit_create as Step,
        ),
        (
            Stage::PostOperate,
            Operation::Update,
            "audit_update",
            Self::audit_update as Step,
        ),
    ];

    /// Builds the component from configuration, reading dates from `clock`.
    #[must_use]
    pub fn new(config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            images: config.images(),
            entities: config.entities(),
            clock,
        }
    }

    /// Builds the component against the system clock.
    #[must_use]
    pub fn with_system_clock(config: &Config) -> Self {
        Self::new(config, Arc::new(SystemClock))
    }

    /// Starts the increment counter of a new contact at one.
    ///
    /// A target that is only a reference is left alone.
    ///
    /// # Errors
    ///
    /// Never fails; the signature matches the other steps.
    pub fn stamp_increment_on_create(
        &self,
        context: &mut RequestContext<'_>,
    ) -> Result<(), PipelineError> {
        if let Some(target) = context.target_entity_mut() {
            target.set(contact::INCREMENT_VALUE, 1_i64);
        }
        Ok(())
    }

    /// Records the initial values of a new contact.
    ///
    /// Reads the post image named by `images.create_audit`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Collaborator`] when the audit record cannot
    /// be created.
    pub fn audit_create(&self, context: &mut RequestContext<'_>) -> Result<(), PipelineError> {
        let resolver = context.resolver();
        let image = self.images.create_audit();
        let mut lines = AuditLines::default();

        if let Some(full_name) = post_value::<String>(&resolver, contact::FULL_NAME, image) {
            lines.push("fullname", "", &full_name);
            for (label, attribute) in [
                ("firstname", contact::FIRST_NAME),
                ("lastname", contact::LAST_NAME),
            ] {
                if let Some(value) = post_value::<String>(&resolver, attribute, image) {
                    lines.push(label, "", &value);
                }
            }
            lines.push("increment value", "", "1");
        }

        if let Some(birthdate) = post_value::<Date>(&resolver, contact::BIRTHDATE, image) {
            lines.push("birthday", "", &birthdate.to_string());
            lines.push("age", "", &self.age_of(birthdate).to_string());
        }

        if let Some(company) =
            post_value::<EntityReference>(&resolver, contact::PARENT_CUSTOMER, image)
        {
            lines.push("company name", "", company.name().unwrap_or_default());
        }

        self.create_audit(context, CREATE_EVENT, &lines)
    }

    /// Records what changed on an existing contact.
    ///
    /// Compares the pre and post images named by `images.update_audit`. A
    /// full name change also bumps the contact's increment counter, which is
    /// read from and written back to the store.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Collaborator`] when the counter or the audit
    /// record cannot be read or written.
    pub fn audit_update(&self, context: &mut RequestContext<'_>) -> Result<(), PipelineError> {
        let image = self.images.update_audit();
        let mut lines = AuditLines::default();

        let full_name = ImagePair::<String>::read(&context.resolver(), contact::FULL_NAME, image);
        if full_name.is_present() && full_name.pre != full_name.post {
            lines.push(
                "fullname",
                full_name.pre.as_deref().unwrap_or_default(),
                full_name.post.as_deref().unwrap_or_default(),
            );
            for (label, attribute) in [
                ("firstname", contact::FIRST_NAME),
                ("lastname", contact::LAST_NAME),
            ] {
                ImagePair::<String>::read(&context.resolver(), attribute, image)
                    .record(&mut lines, label, Clone::clone);
            }
            bump_increment(context, &mut lines)?;
        }

        let birthdate = ImagePair::<Date>::read(&context.resolver(), contact::BIRTHDATE, image);
        self.record_birthdate(&birthdate, &mut lines);

        ImagePair::<EntityReference>::read(&context.resolver(), contact::PARENT_CUSTOMER, image)
            .record(&mut lines, "company name", |reference| {
                reference.name().unwrap_or_default().to_owned()
            });

        self.create_audit(context, UPDATE_EVENT, &lines)
    }

    fn record_birthdate(&self, birthdate: &ImagePair<Date>, lines: &mut AuditLines) {
        match (birthdate.pre, birthdate.post) {
            (None, None) => {}
            (Some(before), Some(after)) => {
                if before != after {
                    lines.push("birthday", &before.to_string(), &after.to_string());
                }
                let (age_before, age_after) = (self.age_of(before), self.age_of(after));
                if age_before != age_after {
                    lines.push("age", &age_before.to_string(), &age_after.to_string());
                }
            }
            (before, after) => {
                let text =
                    |day: Option<Date>| day.map(|value| value.to_string()).unwrap_or_default();
                let age = |day: Option<Date>| {
                    day.map(|value| self.age_of(value).to_string())
                        .unwrap_or_default()
                };
                lines.push("birthday", &text(before), &text(after));
                lines.push("age", &age(before), &age(after));
            }
        }
    }

    fn create_audit(
        &self,
        context: &RequestContext<'_>,
        event: &str,
        lines: &AuditLines,
    ) -> Result<(), PipelineError> {
        let invocation = context.invocation();
        let id = invocation.primary_entity_id();
        let record = Entity::new(self.entities.audit())
            .with(audit::EVENT, event)
            .with(audit::NAME, format!("{event} - {id}"))
            .with(
                audit::AUDIT_FROM,
                EntityReference::new(invocation.entity_type(), id),
            )
            .with(audit::FIELD_NAME, lines.fields())
            .with(audit::BEFORE, lines.before())
            .with(audit::AFTER, lines.after());
        let audit_id = context.persistence().create(&record)?;
        if lines.is_empty() {
            debug!(target: AUDIT_TARGET, %id, event, "no audited field changed");
        }
        info!(target: AUDIT_TARGET, %id, %audit_id, event, "audit record written");
        Ok(())
    }

    fn age_of(&self, birthdate: Date) -> i64 {
        age_on(birthdate, self.clock.today())
    }
}

fn pre_value<T: AttributeValue>(
    resolver: &AttributeResolver<'_>,
    attribute: &str,
    image: &str,
) -> Option<T> {
    let name = Some(image);
    resolver
        .has_pre_value(attribute, name)
        .then(|| resolver.read_pre_value::<T>(attribute, name))
        .and_then(Resolved::into_option)
}

fn post_value<T: AttributeValue>(
    resolver: &AttributeResolver<'_>,
    attribute: &str,
    image: &str,
) -> Option<T> {
    let name = Some(image);
    resolver
        .has_post_value(attribute, name)
        .then(|| resolver.read_post_value::<T>(attribute, name))
        .and_then(Resolved::into_option)
}

/// Values of one attribute in the named pre and post images.
#[derive(Debug)]
struct ImagePair<T> {
    pre: Option<T>,
    post: Option<T>,
}

impl<T: AttributeValue + PartialEq> ImagePair<T> {
    fn read(resolver: &AttributeResolver<'_>, attribute: &str, image: &str) -> Self {
        Self {
            pre: pre_value(resolver, attribute, image),
            post: post_value(resolver, attribute, image),
        }
    }

    const fn is_present(&self) -> bool {
        self.pre.is_some() || self.post.is_some()
    }

    /// Records the attribute when it differs, or when only one side has it.
    fn record(&self, lines: &mut AuditLines, label: &str, render: impl Fn(&T) -> String) {
        let text = |value: Option<&T>| value.map(&render).unwrap_or_default();
        match (&self.pre, &self.post) {
            (None, None) => {}
            (Some(before), Some(after)) if before == after => {}
            (before, after) => lines.push(label, &text(before.as_ref()), &text(after.as_ref())),
        }
    }
}

/// Reads the stored increment counter, writes it back plus one and records
/// both values.
fn bump_increment(
    context: &RequestContext<'_>,
    lines: &mut AuditLines,
) -> Result<(), PipelineError> {
    let invocation = context.invocation();
    let stored = context.persistence().retrieve(
        invocation.entity_type(),
        invocation.primary_entity_id(),
        &ColumnSet::of([contact::INCREMENT_VALUE]),
    )?;
    let current = match stored.get(contact::INCREMENT_VALUE) {
        Some(Value::Integer(value)) => *value,
        _ => 0,
    };
    let next = current.saturating_add(1);
    let update = Entity::with_id(invocation.entity_type(), invocation.primary_entity_id())
        .with(contact::INCREMENT_VALUE, next);
    context.persistence().update(&update)?;
    lines.push("increment value", &current.to_string(), &next.to_string());
    Ok(())
}

impl Plugin for ContactAudit {
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

impl fmt::Debug for ContactAudit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContactAudit")
            .field("images", &self.images)
            .field("entities", &self.entities)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;

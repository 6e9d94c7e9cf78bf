//! Unit tests for the contact audit trail.

use std::sync::{Arc, Mutex};

use rstest::{fixture, rstest};
use stagehand_core::{Invocation, InvocationBuilder, ServiceFault};
use time::macros::date;
use uuid::Uuid;

use super::*;
use crate::age::FixedClock;
use crate::schema::account;
use crate::tests::MockStore;

#[fixture]
fn auditor() -> ContactAudit {
    ContactAudit::new(
        &Config::default(),
        Arc::new(FixedClock::new(date!(2024 - 06 - 15))),
    )
}

fn contact_event(stage: Stage, operation: Operation, id: Uuid) -> InvocationBuilder {
    Invocation::builder(stage, operation, contact::ENTITY_NAME).primary_entity_id(id)
}

fn run(
    component: &ContactAudit,
    step: Step,
    invocation: &mut Invocation,
    store: &MockStore,
) -> Result<(), PipelineError> {
    let mut context = RequestContext::new(ContactAudit::NAME, invocation, store, None);
    step(component, &mut context)
}

/// Captures the audit record passed to `create`.
fn capture_audit(store: &mut MockStore) -> Arc<Mutex<Option<Entity>>> {
    let captured = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&captured);
    store.expect_create().times(1).returning(move |record| {
        if let Ok(mut slot) = sink.lock() {
            *slot = Some(record.clone());
        }
        Ok(Uuid::new_v4())
    });
    captured
}

fn column(record: &Entity, attribute: &str) -> String {
    match record.get(attribute) {
        Some(Value::String(text)) => text.clone(),
        other => panic!("expected text in {attribute}, got {other:?}"),
    }
}

fn written(captured: &Arc<Mutex<Option<Entity>>>) -> Entity {
    captured
        .lock()
        .expect("audit lock")
        .clone()
        .expect("audit record created")
}

fn company(name: &str, id: Uuid) -> EntityReference {
    EntityReference::new(account::ENTITY_NAME, id).with_name(name)
}

#[test]
fn audit_lines_stay_aligned() {
    let mut lines = AuditLines::default();
    assert!(lines.is_empty());
    lines.push("fullname", "", "Ada Lovelace");
    lines.push("age", "33", "34");
    assert_eq!(lines.fields(), "fullname\nage\n");
    assert_eq!(lines.before(), "\n33\n");
    assert_eq!(lines.after(), "Ada Lovelace\n34\n");
}

#[rstest]
fn create_stamps_the_increment_counter(auditor: ContactAudit) {
    let store = MockStore::new();
    let mut invocation = contact_event(Stage::PreOperate, Operation::Create, Uuid::new_v4())
        .target(Entity::new(contact::ENTITY_NAME).with(contact::FULL_NAME, "Ada Lovelace"))
        .build()
        .expect("valid invocation");
    run(
        &auditor,
        ContactAudit::stamp_increment_on_create,
        &mut invocation,
        &store,
    )
    .expect("stamp succeeds");
    assert_eq!(
        invocation
            .resolver()
            .read_from_target::<i64>(contact::INCREMENT_VALUE)
            .into_option(),
        Some(1)
    );
}

#[rstest]
fn reference_target_is_not_stamped(auditor: ContactAudit) {
    let store = MockStore::new();
    let mut invocation = contact_event(Stage::PreOperate, Operation::Create, Uuid::new_v4())
        .target(EntityReference::new(contact::ENTITY_NAME, Uuid::new_v4()))
        .build()
        .expect("valid invocation");
    run(
        &auditor,
        ContactAudit::stamp_increment_on_create,
        &mut invocation,
        &store,
    )
    .expect("nothing to stamp");
    assert!(!invocation.resolver().is_changing(contact::INCREMENT_VALUE));
}

#[rstest]
fn create_lists_every_initial_value(auditor: ContactAudit) {
    let id = Uuid::new_v4();
    let mut store = MockStore::new();
    let captured = capture_audit(&mut store);
    let mut invocation = contact_event(Stage::PostOperate, Operation::Create, id)
        .target(Entity::new(contact::ENTITY_NAME))
        .post_image(
            "focusField",
            Entity::new(contact::ENTITY_NAME)
                .with(contact::FULL_NAME, "Ada Lovelace")
                .with(contact::FIRST_NAME, "Ada")
                .with(contact::LAST_NAME, "Lovelace")
                .with(contact::BIRTHDATE, date!(1990 - 05 - 01))
                .with(contact::PARENT_CUSTOMER, company("Contoso", Uuid::new_v4())),
        )
        .build()
        .expect("valid invocation");
    run(&auditor, ContactAudit::audit_create, &mut invocation, &store).expect("audit written");

    let record = written(&captured);
    assert_eq!(record.logical_name(), audit::ENTITY_NAME);
    assert_eq!(column(&record, audit::EVENT), CREATE_EVENT);
    assert_eq!(column(&record, audit::NAME), format!("Create Contact - {id}"));
    assert_eq!(
        record.get(audit::AUDIT_FROM),
        Some(&Value::Reference(EntityReference::new(
            contact::ENTITY_NAME,
            id
        )))
    );
    assert_eq!(
        column(&record, audit::FIELD_NAME),
        "fullname\nfirstname\nlastname\nincrement value\nbirthday\nage\ncompany name\n"
    );
    assert_eq!(column(&record, audit::BEFORE), "\n\n\n\n\n\n\n");
    assert_eq!(
        column(&record, audit::AFTER),
        "Ada Lovelace\nAda\nLovelace\n1\n1990-05-01\n34\nContoso\n"
    );
}

#[rstest]
fn create_without_image_writes_an_empty_audit(auditor: ContactAudit) {
    let mut store = MockStore::new();
    let captured = capture_audit(&mut store);
    let mut invocation = contact_event(Stage::PostOperate, Operation::Create, Uuid::new_v4())
        .target(Entity::new(contact::ENTITY_NAME))
        .build()
        .expect("valid invocation");
    run(&auditor, ContactAudit::audit_create, &mut invocation, &store).expect("audit written");
    assert_eq!(column(&written(&captured), audit::FIELD_NAME), "");
}

#[rstest]
fn rename_bumps_the_increment_counter(auditor: ContactAudit) {
    let id = Uuid::new_v4();
    let mut store = MockStore::new();
    store
        .expect_retrieve()
        .withf(move |entity, record_id, columns| {
            entity == contact::ENTITY_NAME
                && *record_id == id
                && columns.includes(contact::INCREMENT_VALUE)
        })
        .times(1)
        .returning(|entity, record_id, _| {
            Ok(Entity::with_id(entity, record_id).with(contact::INCREMENT_VALUE, 4_i64))
        });
    store
        .expect_update()
        .withf(move |record| {
            record.id() == id && record.get(contact::INCREMENT_VALUE) == Some(&Value::Integer(5))
        })
        .times(1)
        .returning(|_| Ok(()));
    let captured = capture_audit(&mut store);
    let mut invocation = contact_event(Stage::PostOperate, Operation::Update, id)
        .target(Entity::new(contact::ENTITY_NAME).with(contact::LAST_NAME, "King"))
        .pre_image(
            "NameImage",
            Entity::new(contact::ENTITY_NAME)
                .with(contact::FULL_NAME, "Ada Byron")
                .with(contact::FIRST_NAME, "Ada")
                .with(contact::LAST_NAME, "Byron"),
        )
        .post_image(
            "NameImage",
            Entity::new(contact::ENTITY_NAME)
                .with(contact::FULL_NAME, "Ada King")
                .with(contact::FIRST_NAME, "Ada")
                .with(contact::LAST_NAME, "King"),
        )
        .build()
        .expect("valid invocation");
    run(&auditor, ContactAudit::audit_update, &mut invocation, &store).expect("audit written");

    let record = written(&captured);
    assert_eq!(column(&record, audit::EVENT), UPDATE_EVENT);
    assert_eq!(
        column(&record, audit::FIELD_NAME),
        "fullname\nlastname\nincrement value\n"
    );
    assert_eq!(column(&record, audit::BEFORE), "Ada Byron\nByron\n4\n");
    assert_eq!(column(&record, audit::AFTER), "Ada King\nKing\n5\n");
}

#[rstest]
fn missing_counter_starts_from_zero(auditor: ContactAudit) {
    let id = Uuid::new_v4();
    let mut store = MockStore::new();
    store
        .expect_retrieve()
        .times(1)
        .returning(|entity, record_id, _| Ok(Entity::with_id(entity, record_id)));
    store
        .expect_update()
        .withf(|record| record.get(contact::INCREMENT_VALUE) == Some(&Value::Integer(1)))
        .times(1)
        .returning(|_| Ok(()));
    let captured = capture_audit(&mut store);
    let mut invocation = contact_event(Stage::PostOperate, Operation::Update, id)
        .target(Entity::new(contact::ENTITY_NAME).with(contact::FULL_NAME, "Grace Hopper"))
        .post_image(
            "NameImage",
            Entity::new(contact::ENTITY_NAME).with(contact::FULL_NAME, "Grace Hopper"),
        )
        .build()
        .expect("valid invocation");
    run(&auditor, ContactAudit::audit_update, &mut invocation, &store).expect("audit written");
    let record = written(&captured);
    assert_eq!(column(&record, audit::BEFORE), "\n0\n");
    assert_eq!(column(&record, audit::AFTER), "Grace Hopper\n1\n");
}

#[rstest]
fn counter_read_failure_skips_the_audit(auditor: ContactAudit) {
    let mut store = MockStore::new();
    store
        .expect_retrieve()
        .times(1)
        .returning(|_, _, _| Err(ServiceFault::new("record is locked")));
    store.expect_update().never();
    store.expect_create().never();
    let mut invocation = contact_event(Stage::PostOperate, Operation::Update, Uuid::new_v4())
        .target(Entity::new(contact::ENTITY_NAME))
        .pre_image(
            "NameImage",
            Entity::new(contact::ENTITY_NAME).with(contact::FULL_NAME, "Ada Byron"),
        )
        .post_image(
            "NameImage",
            Entity::new(contact::ENTITY_NAME).with(contact::FULL_NAME, "Ada King"),
        )
        .build()
        .expect("valid invocation");
    let err = run(&auditor, ContactAudit::audit_update, &mut invocation, &store)
        .expect_err("retrieve fails");
    assert_eq!(err.message(), "record is locked");
}

#[rstest]
#[case::moved_birthday(
    Some(date!(1990 - 05 - 01)),
    Some(date!(1991 - 05 - 01)),
    "birthday\nage\n",
    "1990-05-01\n34\n",
    "1991-05-01\n33\n"
)]
#[case::same_age(
    Some(date!(1990 - 01 - 01)),
    Some(date!(1990 - 02 - 01)),
    "birthday\n",
    "1990-01-01\n",
    "1990-02-01\n"
)]
#[case::unchanged(Some(date!(1990 - 01 - 01)), Some(date!(1990 - 01 - 01)), "", "", "")]
#[case::added(None, Some(date!(2000 - 06 - 15)), "birthday\nage\n", "\n\n", "2000-06-15\n24\n")]
#[case::cleared(Some(date!(2000 - 06 - 16)), None, "birthday\nage\n", "2000-06-16\n23\n", "\n\n")]
fn birthdate_changes(
    auditor: ContactAudit,
    #[case] before: Option<Date>,
    #[case] after: Option<Date>,
    #[case] fields: &str,
    #[case] before_lines: &str,
    #[case] after_lines: &str,
) {
    let mut store = MockStore::new();
    let captured = capture_audit(&mut store);
    let image = |day: Option<Date>| {
        day.into_iter().fold(Entity::new(contact::ENTITY_NAME), |entity, value| {
            entity.with(contact::BIRTHDATE, value)
        })
    };
    let mut invocation = contact_event(Stage::PostOperate, Operation::Update, Uuid::new_v4())
        .target(Entity::new(contact::ENTITY_NAME))
        .pre_image("NameImage", image(before))
        .post_image("NameImage", image(after))
        .build()
        .expect("valid invocation");
    run(&auditor, ContactAudit::audit_update, &mut invocation, &store).expect("audit written");
    let record = written(&captured);
    assert_eq!(column(&record, audit::FIELD_NAME), fields);
    assert_eq!(column(&record, audit::BEFORE), before_lines);
    assert_eq!(column(&record, audit::AFTER), after_lines);
}

#[rstest]
fn company_is_compared_by_identity(auditor: ContactAudit) {
    let id = Uuid::new_v4();
    let mut store = MockStore::new();
    let captured = capture_audit(&mut store);
    let mut invocation = contact_event(Stage::PostOperate, Operation::Update, Uuid::new_v4())
        .target(Entity::new(contact::ENTITY_NAME))
        .pre_image(
            "NameImage",
            Entity::new(contact::ENTITY_NAME).with(contact::PARENT_CUSTOMER, company("Contoso", id)),
        )
        .post_image(
            "NameImage",
            Entity::new(contact::ENTITY_NAME)
                .with(contact::PARENT_CUSTOMER, company("Contoso Ltd", id)),
        )
        .build()
        .expect("valid invocation");
    run(&auditor, ContactAudit::audit_update, &mut invocation, &store).expect("audit written");
    assert_eq!(column(&written(&captured), audit::FIELD_NAME), "");
}

#[rstest]
fn company_move_records_both_names(auditor: ContactAudit) {
    let mut store = MockStore::new();
    let captured = capture_audit(&mut store);
    let mut invocation = contact_event(Stage::PostOperate, Operation::Update, Uuid::new_v4())
        .target(Entity::new(contact::ENTITY_NAME))
        .pre_image(
            "NameImage",
            Entity::new(contact::ENTITY_NAME)
                .with(contact::PARENT_CUSTOMER, company("Contoso", Uuid::new_v4())),
        )
        .post_image(
            "NameImage",
            Entity::new(contact::ENTITY_NAME)
                .with(contact::PARENT_CUSTOMER, company("Fabrikam", Uuid::new_v4())),
        )
        .build()
        .expect("valid invocation");
    run(&auditor, ContactAudit::audit_update, &mut invocation, &store).expect("audit written");
    let record = written(&captured);
    assert_eq!(column(&record, audit::FIELD_NAME), "company name\n");
    assert_eq!(column(&record, audit::BEFORE), "Contoso\n");
    assert_eq!(column(&record, audit::AFTER), "Fabrikam\n");
}

#[rstest]
fn registers_three_contact_steps(auditor: ContactAudit) {
    let mut builder = RegistrationTableBuilder::new();
    auditor.register(&mut builder);
    let table = builder.build();
    assert_eq!(table.len(), 3);
    let stamp = table
        .find_match(Stage::PreOperate, Operation::Create, contact::ENTITY_NAME)
        .expect("pre-create step");
    assert_eq!(stamp.label(), "stamp_increment_on_create");
    assert!(
        table
            .find_match(Stage::PostOperate, Operation::Update, account::ENTITY_NAME)
            .is_none()
    );
}

//! Unit tests for the request context.

use rstest::{fixture, rstest};
use uuid::Uuid;

use super::*;
use crate::entity::EntityReference;
use crate::error::{FaultKind, ServiceFault};
use crate::invocation::{Operation, Stage};
use crate::tests::{MockSink, MockStore};

struct Ids {
    correlation: Uuid,
    user: Uuid,
}

#[fixture]
fn ids() -> Ids {
    Ids {
        correlation: Uuid::new_v4(),
        user: Uuid::new_v4(),
    }
}

fn invocation(ids: &Ids, target: Option<Target>) -> Invocation {
    let mut builder = Invocation::builder(Stage::PreOperate, Operation::Update, "contact")
        .correlation_id(ids.correlation)
        .initiating_user_id(ids.user);
    if let Some(payload) = target {
        builder = builder.target(payload);
    }
    builder.build().expect("valid invocation")
}

#[rstest]
fn trace_forwards_identity_to_sink(ids: Ids) {
    let mut sink = MockSink::new();
    let (correlation, user) = (ids.correlation, ids.user);
    sink.expect_write()
        .withf(move |message, id, initiator| {
            message == "hello" && *id == correlation && *initiator == user
        })
        .times(1)
        .return_const(());
    let store = MockStore::new();
    let mut invocation = invocation(&ids, None);
    let context = RequestContext::new("Contacts", &mut invocation, &store, Some(&sink));
    context.trace("hello");
}

#[rstest]
#[case("")]
#[case("   ")]
fn blank_trace_is_dropped(ids: Ids, #[case] message: &str) {
    let mut sink = MockSink::new();
    sink.expect_write().never();
    let store = MockStore::new();
    let mut invocation = invocation(&ids, None);
    let context = RequestContext::new("Contacts", &mut invocation, &store, Some(&sink));
    context.trace(message);
}

#[rstest]
fn trace_without_sink_is_a_no_op(ids: Ids) {
    let store = MockStore::new();
    let mut invocation = invocation(&ids, None);
    let context = RequestContext::new("Contacts", &mut invocation, &store, None);
    context.trace("nobody listens");
    assert!(context.trace_sink().is_none());
    assert_eq!(context.component(), "Contacts");
}

#[rstest]
fn set_target_value_writes_through_to_invocation(ids: Ids) {
    let store = MockStore::new();
    let mut invocation = invocation(
        &ids,
        Some(Target::Entity(Entity::new("contact").with("app_age", 1_i64))),
    );
    {
        let mut context = RequestContext::new("Contacts", &mut invocation, &store, None);
        let previous = context
            .set_target_value("app_age", 34_i64)
            .expect("target record present");
        assert_eq!(previous, Some(Value::Integer(1)));
        assert!(context.resolver().is_changing("app_age"));
    }
    assert_eq!(
        *invocation.resolver().read_from_target::<i64>("app_age").value(),
        34
    );
}

#[rstest]
#[case::reference(Some(Target::Reference(EntityReference::new("contact", Uuid::nil()))))]
#[case::missing(None)]
fn set_target_value_without_record_is_configuration_fault(
    ids: Ids,
    #[case] target: Option<Target>,
) {
    let store = MockStore::new();
    let mut invocation = invocation(&ids, target);
    let mut context = RequestContext::new("Contacts", &mut invocation, &store, None);
    let err = context
        .set_target_value("app_age", 34_i64)
        .expect_err("no target record");
    assert_eq!(err.kind(), FaultKind::Configuration);
}

#[rstest]
fn persistence_is_reachable_from_context(ids: Ids) {
    let mut store = MockStore::new();
    store
        .expect_update()
        .times(1)
        .returning(|_| Err(ServiceFault::new("locked")));
    let mut invocation = invocation(&ids, None);
    let context = RequestContext::new("Contacts", &mut invocation, &store, None);
    let fault = context
        .persistence()
        .update(&Entity::new("account"))
        .expect_err("store rejects");
    assert_eq!(fault.message(), "locked");
}

//! Unit tests for attribute resolution and precedence.

use rstest::{fixture, rstest};
use time::macros::date;
use uuid::Uuid;

use super::*;
use crate::invocation::{Operation, Stage};

fn update_with(target: Entity) -> crate::invocation::InvocationBuilder {
    Invocation::builder(Stage::PostOperate, Operation::Update, "contact").target(target)
}

#[fixture]
fn contact_id() -> Uuid {
    Uuid::new_v4()
}

#[test]
fn target_beats_pre_image() {
    let invocation = update_with(Entity::new("contact").with("a", 1_i64))
        .pre_image("before", Entity::new("contact").with("a", 0_i64))
        .build()
        .expect("valid invocation");
    let latest = invocation.resolver().read_latest_value::<i64>("a");
    assert_eq!(latest, Resolved::found(1, Source::Target));
}

#[test]
fn post_image_beats_target_and_pre_image() {
    let invocation = update_with(Entity::new("contact").with("a", 1_i64))
        .pre_image("before", Entity::new("contact").with("a", 0_i64))
        .post_image("after", Entity::new("contact").with("a", 2_i64))
        .build()
        .expect("valid invocation");
    let latest = invocation.resolver().read_latest_value::<i64>("a");
    assert_eq!(latest, Resolved::found(2, Source::Post));
}

#[test]
fn pre_image_is_used_when_attribute_is_not_changing() {
    let invocation = update_with(Entity::new("contact").with("b", "other"))
        .pre_image("before", Entity::new("contact").with("a", 7_i64))
        .build()
        .expect("valid invocation");
    let resolver = invocation.resolver();
    assert!(!resolver.is_changing("a"));
    assert_eq!(
        resolver.read_latest_value::<i64>("a"),
        Resolved::found(7, Source::Pre)
    );
}

#[test]
fn absent_everywhere_reports_zero_and_not_found() {
    let invocation = update_with(Entity::new("contact"))
        .build()
        .expect("valid invocation");
    let resolver = invocation.resolver();
    let text = resolver.read_latest_value::<String>("fullname");
    assert!(!text.is_found());
    assert_eq!(text.value(), "");
    assert_eq!(text.source(), Source::None);

    let day = resolver.read_latest_value::<Date>("birthdate");
    assert_eq!(*day.value(), ZERO_DATE);
    assert!(day.into_option().is_none());
}

#[test]
fn found_zero_is_distinct_from_absent() {
    let invocation = update_with(Entity::new("contact").with("app_age", 0_i64))
        .build()
        .expect("valid invocation");
    let read = invocation.resolver().read_from_target::<i64>("app_age");
    assert!(read.is_found());
    assert_eq!(read.into_option(), Some(0));
}

#[test]
fn is_changing_ignores_images() {
    let invocation = update_with(Entity::new("contact"))
        .pre_image("before", Entity::new("contact").with("a", 1_i64))
        .post_image("after", Entity::new("contact").with("a", 2_i64))
        .build()
        .expect("valid invocation");
    assert!(!invocation.resolver().is_changing("a"));
}

#[rstest]
fn reference_target_is_never_changing(contact_id: Uuid) {
    let invocation = Invocation::builder(Stage::PreOperate, Operation::Delete, "contact")
        .target(EntityReference::new("contact", contact_id))
        .build()
        .expect("valid invocation");
    let resolver = invocation.resolver();
    assert!(!resolver.is_changing("a"));
    assert!(resolver.target_entity().is_none());
    assert_eq!(
        resolver.target_entity_reference(),
        Some(EntityReference::new("contact", contact_id))
    );
}

#[rstest]
fn entity_target_yields_reference(contact_id: Uuid) {
    let invocation = update_with(Entity::with_id("contact", contact_id))
        .build()
        .expect("valid invocation");
    let reference = invocation
        .resolver()
        .target_entity_reference()
        .expect("reference");
    assert_eq!(reference.logical_name(), "contact");
    assert_eq!(reference.id(), contact_id);
}

#[test]
fn type_mismatch_reads_as_absent() {
    let invocation = update_with(Entity::new("contact").with("app_age", "forty"))
        .build()
        .expect("valid invocation");
    let resolver = invocation.resolver();
    assert!(resolver.is_changing("app_age"));
    assert!(!resolver.read_from_target::<i64>("app_age").is_found());
    assert!(resolver.read_from_target::<String>("app_age").is_found());
}

#[rstest]
#[case::named_present(Some("first"), true)]
#[case::named_without_attribute(Some("second"), false)]
#[case::named_missing(Some("missing"), false)]
#[case::any_image(None, true)]
#[case::blank_name_means_any(Some("  "), true)]
fn has_pre_value_respects_image_name(#[case] image: Option<&str>, #[case] expected: bool) {
    let invocation = update_with(Entity::new("contact"))
        .pre_image("first", Entity::new("contact").with("a", 1_i64))
        .pre_image("second", Entity::new("contact").with("b", 2_i64))
        .build()
        .expect("valid invocation");
    assert_eq!(invocation.resolver().has_pre_value("a", image), expected);
}

#[test]
fn named_image_is_preferred_then_host_order_is_scanned() {
    let invocation = update_with(Entity::new("contact"))
        .post_image("first", Entity::new("contact").with("a", 1_i64))
        .post_image("second", Entity::new("contact").with("a", 2_i64))
        .post_image("third", Entity::new("contact").with("b", 3_i64))
        .build()
        .expect("valid invocation");
    let resolver = invocation.resolver();
    assert_eq!(*resolver.read_post_value::<i64>("a", Some("second")).value(), 2);
    assert_eq!(*resolver.read_post_value::<i64>("a", None).value(), 1);
    // Named image lacks the attribute, so the scan finds it elsewhere.
    assert_eq!(*resolver.read_post_value::<i64>("a", Some("third")).value(), 1);
}

#[test]
fn change_reports_previous_and_latest() {
    let invocation = update_with(Entity::new("contact").with("birthdate", date!(1990 - 05 - 01)))
        .pre_image("before", Entity::new("contact").with("birthdate", date!(1985 - 01 - 01)))
        .build()
        .expect("valid invocation");
    let change = invocation.resolver().change::<Date>("birthdate");
    assert!(change.is_changing());
    assert_eq!(*change.previous().value(), date!(1985 - 01 - 01));
    assert_eq!(*change.latest().value(), date!(1990 - 05 - 01));
}

#[test]
fn image_selection_defaults_to_first() {
    let invocation = Invocation::builder(Stage::PostOperate, Operation::Create, "contact")
        .post_image("b", Entity::new("contact").with("n", 1_i64))
        .post_image("a", Entity::new("contact").with("n", 2_i64))
        .build()
        .expect("valid invocation");
    let resolver = invocation.resolver();
    assert_eq!(
        resolver.post_image(None).and_then(|image| image.get("n")),
        Some(&Value::Integer(1))
    );
    assert_eq!(
        resolver.post_image(Some("a")).and_then(|image| image.get("n")),
        Some(&Value::Integer(2))
    );
    assert!(resolver.pre_image(None).is_none());
}

#[test]
fn relationship_is_exposed() {
    let invocation = Invocation::builder(Stage::PostOperate, Operation::Associate, "contact")
        .relationship("contact_accounts")
        .build()
        .expect("valid invocation");
    assert_eq!(invocation.resolver().relationship(), Some("contact_accounts"));
}

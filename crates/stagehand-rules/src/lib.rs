//! Contact business rules built on the `stagehand-core` dispatch runtime.
//!
//! Two components plug into the host pipeline for the contact record type:
//!
//! - [`ContactLifecycle`] validates birthdates, derives the contact's age
//!   and keeps the parent account's total age in step;
//! - [`ContactAudit`] writes one audit record per contact create or update.
//!
//! [`AccountAgeRefresh`] exposes the account total recomputation on its own
//! for hosts that trigger it outside a contact event.
//!
//! # Example
//!
//! ```
//! use stagehand_config::Config;
//! use stagehand_core::{Dispatcher, Operation, Stage};
//! use stagehand_rules::ContactLifecycle;
//!
//! let lifecycle = ContactLifecycle::with_system_clock(&Config::default());
//! let dispatcher = Dispatcher::from_plugin(&lifecycle);
//! assert_eq!(dispatcher.component(), "ContactLifecycle");
//! assert!(
//!     dispatcher
//!         .table()
//!         .find_match(Stage::PreOperate, Operation::Create, "contact")
//!         .is_some()
//! );
//! ```

mod account_age;
mod age;
mod audit;
mod lifecycle;
pub mod schema;

pub use account_age::AccountAgeRefresh;
pub use age::{Clock, FixedClock, SystemClock, age_on};
pub use audit::{AuditLines, CREATE_EVENT, ContactAudit, UPDATE_EVENT};
pub use lifecycle::ContactLifecycle;

#[cfg(test)]
mod tests;

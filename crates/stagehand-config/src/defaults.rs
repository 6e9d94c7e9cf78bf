//! Built-in values used when no configuration layer sets a field.

use crate::LogFormat;

/// Default log filter expression used by hosts embedding the runtime.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Image carrying the parent lookup for the post-update age refresh.
pub const DEFAULT_PARENT_LOOKUP_IMAGE: &str = "companyName";

/// Post image read when auditing a contact creation.
pub const DEFAULT_CREATE_AUDIT_IMAGE: &str = "focusField";

/// Pre and post images compared when auditing a contact update.
pub const DEFAULT_UPDATE_AUDIT_IMAGE: &str = "NameImage";

/// Logical name of the contact record type.
pub const DEFAULT_CONTACT_ENTITY: &str = "contact";

/// Logical name of the account record type.
pub const DEFAULT_ACCOUNT_ENTITY: &str = "account";

/// Logical name of the audit record type.
pub const DEFAULT_AUDIT_ENTITY: &str = "app_audit";

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter, for the configuration defaults layer.
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default log output format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

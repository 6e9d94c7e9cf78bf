//! Attribute names of the record types the rules touch.

/// Account attributes.
pub mod account {
    /// Logical name of the record type.
    pub const ENTITY_NAME: &str = "account";
    /// Primary key.
    pub const PRIMARY_KEY: &str = "accountid";
    /// Sum of the ages of the account's contacts.
    pub const TOTAL_AGE: &str = "app_totalage";
}

/// Contact attributes.
pub mod contact {
    /// Logical name of the record type.
    pub const ENTITY_NAME: &str = "contact";
    /// Primary key.
    pub const PRIMARY_KEY: &str = "contactid";
    /// Display name.
    pub const FULL_NAME: &str = "fullname";
    /// Given name.
    pub const FIRST_NAME: &str = "firstname";
    /// Family name.
    pub const LAST_NAME: &str = "lastname";
    /// Date of birth.
    pub const BIRTHDATE: &str = "birthdate";
    /// Age derived from the birthdate.
    pub const AGE: &str = "app_age";
    /// Lookup to the parent account.
    pub const PARENT_CUSTOMER: &str = "parentcustomerid";
    /// Counter bumped whenever the full name changes.
    pub const INCREMENT_VALUE: &str = "app_incrementvalue";
}

/// Audit trail attributes.
pub mod audit {
    /// Logical name of the record type.
    pub const ENTITY_NAME: &str = "app_audit";
    /// Primary key.
    pub const PRIMARY_KEY: &str = "app_auditid";
    /// Display name of the audit row.
    pub const NAME: &str = "app_name";
    /// Event being audited.
    pub const EVENT: &str = "app_event";
    /// Lookup to the audited record.
    pub const AUDIT_FROM: &str = "app_auditfrom";
    /// Newline-separated labels of the audited fields.
    pub const FIELD_NAME: &str = "app_fieldname";
    /// Newline-separated values before the change.
    pub const BEFORE: &str = "app_before";
    /// Newline-separated values after the change.
    pub const AFTER: &str = "app_after";
}

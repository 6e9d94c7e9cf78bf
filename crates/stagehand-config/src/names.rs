//! Image and record-type names the business rules are registered against.
//!
//! The host attaches pre and post images to each pipeline step under names
//! chosen when the step was registered. The rules only know those names
//! through this configuration so a deployment can rename an image without
//! touching handler code.

use crate::defaults::{
    DEFAULT_ACCOUNT_ENTITY, DEFAULT_AUDIT_ENTITY, DEFAULT_CONTACT_ENTITY,
    DEFAULT_CREATE_AUDIT_IMAGE, DEFAULT_PARENT_LOOKUP_IMAGE, DEFAULT_UPDATE_AUDIT_IMAGE,
};

/// Names of the entity images attached to the registered steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageNames {
    parent_lookup: String,
    create_audit: String,
    update_audit: String,
}

impl ImageNames {
    /// Groups the three image names.
    #[must_use]
    pub fn new(
        parent_lookup: impl Into<String>,
        create_audit: impl Into<String>,
        update_audit: impl Into<String>,
    ) -> Self {
        Self {
            parent_lookup: parent_lookup.into(),
            create_audit: create_audit.into(),
            update_audit: update_audit.into(),
        }
    }

    /// Image holding the contact's parent lookup before and after an update.
    #[must_use]
    pub const fn parent_lookup(&self) -> &str {
        self.parent_lookup.as_str()
    }

    /// Post image read when a contact is created.
    #[must_use]
    pub const fn create_audit(&self) -> &str {
        self.create_audit.as_str()
    }

    /// Pre and post images compared when a contact is updated.
    #[must_use]
    pub const fn update_audit(&self) -> &str {
        self.update_audit.as_str()
    }
}

impl Default for ImageNames {
    fn default() -> Self {
        Self::new(
            DEFAULT_PARENT_LOOKUP_IMAGE,
            DEFAULT_CREATE_AUDIT_IMAGE,
            DEFAULT_UPDATE_AUDIT_IMAGE,
        )
    }
}

/// Logical names of the record types the rules read and write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityNames {
    contact: String,
    account: String,
    audit: String,
}

impl EntityNames {
    /// Groups the three record type names.
    #[must_use]
    pub fn new(
        contact: impl Into<String>,
        account: impl Into<String>,
        audit: impl Into<String>,
    ) -> Self {
        Self {
            contact: contact.into(),
            account: account.into(),
            audit: audit.into(),
        }
    }

    /// Contact record type.
    #[must_use]
    pub const fn contact(&self) -> &str {
        self.contact.as_str()
    }

    /// Account record type.
    #[must_use]
    pub const fn account(&self) -> &str {
        self.account.as_str()
    }

    /// Audit record type.
    #[must_use]
    pub const fn audit(&self) -> &str {
        self.audit.as_str()
    }
}

impl Default for EntityNames {
    fn default() -> Self {
        Self::new(
            DEFAULT_CONTACT_ENTITY,
            DEFAULT_ACCOUNT_ENTITY,
            DEFAULT_AUDIT_ENTITY,
        )
    }
}

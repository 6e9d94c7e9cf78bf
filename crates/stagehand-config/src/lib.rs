//! Shared configuration for the stagehand runtime and its business rules.
//!
//! [`Config`] is layered by `ortho_config`: built-in defaults, then a TOML
//! file, then `STAGEHAND_*` environment variables, then command-line flags.
//! The file is found through `--config-path`, `STAGEHAND_CONFIG_PATH` or the
//! usual `.stagehand.toml` discovery locations. Hosts typically load the
//! configuration once at start-up, install telemetry from it and hand it to
//! the rule plugins.
//!
//! ```toml
//! log_filter = "stagehand_core=debug"
//! log_format = "compact"
//! parent_lookup_image = "companyName"
//! account_entity = "account"
//! ```

pub mod defaults;
mod names;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use self::defaults::{default_log_filter, default_log_format};
pub use self::names::{EntityNames, ImageNames};

/// Output format for the `tracing` subscriber.
///
/// Parsed case-insensitively on the command line.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One flattened JSON object per event.
    #[default]
    Json,
    /// Single-line human-readable events.
    Compact,
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "STAGEHAND")]
pub struct Config {
    /// `EnvFilter` expression for the telemetry subscriber.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Output format for the telemetry subscriber.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
    /// Image carrying the parent lookup on contact updates.
    #[ortho_config(default = defaults::DEFAULT_PARENT_LOOKUP_IMAGE.to_owned())]
    pub parent_lookup_image: String,
    /// Post image audited on contact creation.
    #[ortho_config(default = defaults::DEFAULT_CREATE_AUDIT_IMAGE.to_owned())]
    pub create_audit_image: String,
    /// Pre and post images audited on contact updates.
    #[ortho_config(default = defaults::DEFAULT_UPDATE_AUDIT_IMAGE.to_owned())]
    pub update_audit_image: String,
    /// Logical name of the contact record type.
    #[ortho_config(default = defaults::DEFAULT_CONTACT_ENTITY.to_owned())]
    pub contact_entity: String,
    /// Logical name of the account record type.
    #[ortho_config(default = defaults::DEFAULT_ACCOUNT_ENTITY.to_owned())]
    pub account_entity: String,
    /// Logical name of the audit record type.
    #[ortho_config(default = defaults::DEFAULT_AUDIT_ENTITY.to_owned())]
    pub audit_entity: String,
}

impl Default for Config {
    fn default() -> Self {
        let images = ImageNames::default();
        let entities = EntityNames::default();
        Self {
            log_filter: defaults::default_log_filter_string(),
            log_format: default_log_format(),
            parent_lookup_image: images.parent_lookup().to_owned(),
            create_audit_image: images.create_audit().to_owned(),
            update_audit_image: images.update_audit().to_owned(),
            contact_entity: entities.contact().to_owned(),
            account_entity: entities.account().to_owned(),
            audit_entity: entities.audit().to_owned(),
        }
    }
}

impl Config {
    /// `EnvFilter` expression for the telemetry subscriber.
    #[must_use]
    pub const fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Output format for the telemetry subscriber.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Image names attached to the registered steps.
    #[must_use]
    pub fn images(&self) -> ImageNames {
        ImageNames::new(
            self.parent_lookup_image.as_str(),
            self.create_audit_image.as_str(),
            self.update_audit_image.as_str(),
        )
    }

    /// Record type names used by the rules.
    #[must_use]
    pub fn entities(&self) -> EntityNames {
        EntityNames::new(
            self.contact_entity.as_str(),
            self.account_entity.as_str(),
            self.audit_entity.as_str(),
        )
    }
}

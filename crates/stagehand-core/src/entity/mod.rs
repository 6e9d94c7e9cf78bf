//! Record snapshots and the typed values they carry.
//!
//! An [`Entity`] is a partial or full snapshot of one record: its logical
//! name, its id and a bag of attribute values. The same shape is used for
//! the target payload of a write and for the pre and post images captured
//! by the host around it.

use std::collections::HashMap;
use std::collections::hash_map;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

/// Typed attribute value.
///
/// Serialised with an explicit type tag so host payloads stay unambiguous:
///
/// ```
/// use stagehand_core::Value;
///
/// let value: Value = serde_json::from_str(r#"{"type":"integer","value":42}"#).unwrap();
/// assert_eq!(value, Value::Integer(42));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Text.
    String(String),
    /// Whole number.
    Integer(i64),
    /// Calendar date without a time component.
    Date(Date),
    /// Decimal number.
    Decimal(f64),
    /// Lookup pointing at another record.
    Reference(EntityReference),
}

impl Value {
    /// Returns the name of the value's type, as used in the serde tag.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Date(_) => "date",
            Self::Decimal(_) => "decimal",
            Self::Reference(_) => "reference",
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<Date> for Value {
    fn from(value: Date) -> Self {
        Self::Date(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<EntityReference> for Value {
    fn from(value: EntityReference) -> Self {
        Self::Reference(value)
    }
}

/// Pointer to a record: its logical name, id and an optional display name.
///
/// Equality and hashing use the logical name and id only. Two references
/// to the same record are equal even when their display names differ, which
/// is what change detection between images needs.
///
/// ```
/// use stagehand_core::EntityReference;
/// use uuid::Uuid;
///
/// let id = Uuid::new_v4();
/// let before = EntityReference::new("account", id).with_name("Contoso");
/// let after = EntityReference::new("account", id).with_name("Contoso Ltd");
/// assert_eq!(before, after);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityReference {
    logical_name: String,
    id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl EntityReference {
    /// Creates a reference without a display name.
    #[must_use]
    pub fn new(logical_name: impl Into<String>, id: Uuid) -> Self {
        Self {
            logical_name: logical_name.into(),
            id,
            name: None,
        }
    }

    /// Attaches a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Logical name of the referenced record type.
    #[must_use]
    pub const fn logical_name(&self) -> &str {
        self.logical_name.as_str()
    }

    /// Id of the referenced record.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Display name, when the host supplied one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns `true` for the empty reference (no type, nil id).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.logical_name.is_empty() && self.id.is_nil()
    }

    /// Returns `true` when the reference points at a record of type
    /// `logical_name`.
    #[must_use]
    pub fn targets(&self, logical_name: &str) -> bool {
        self.logical_name == logical_name
    }
}

impl PartialEq for EntityReference {
    fn eq(&self, other: &Self) -> bool {
        self.logical_name == other.logical_name && self.id == other.id
    }
}

impl Eq for EntityReference {}

impl Hash for EntityReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.logical_name.hash(state);
        self.id.hash(state);
    }
}

/// Snapshot of a record's attributes.
///
/// ```
/// use stagehand_core::{Entity, Value};
///
/// let contact = Entity::new("contact").with("firstname", "Ada");
/// assert!(contact.contains("firstname"));
/// assert_eq!(contact.get("firstname"), Some(&Value::from("Ada")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    logical_name: String,
    #[serde(default)]
    id: Uuid,
    #[serde(default)]
    attributes: HashMap<String, Value>,
}

impl Entity {
    /// Creates an empty snapshot with a nil id.
    #[must_use]
    pub fn new(logical_name: impl Into<String>) -> Self {
        Self::with_id(logical_name, Uuid::nil())
    }

    /// Creates an empty snapshot of a known record.
    #[must_use]
    pub fn with_id(logical_name: impl Into<String>, id: Uuid) -> Self {
        Self {
            logical_name: logical_name.into(),
            id,
            attributes: HashMap::new(),
        }
    }

    /// Builder-style attribute assignment.
    #[must_use]
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(attribute, value);
        self
    }

    /// Logical name of the record type.
    #[must_use]
    pub const fn logical_name(&self) -> &str {
        self.logical_name.as_str()
    }

    /// Record id; nil when the record has not been created yet.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Returns `true` when the snapshot carries `attribute`.
    #[must_use]
    pub fn contains(&self, attribute: &str) -> bool {
        self.attributes.contains_key(attribute)
    }

    /// Returns the raw value of `attribute`.
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    /// Sets `attribute`, returning the value it replaced.
    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.attributes.insert(attribute.into(), value.into())
    }

    /// Removes `attribute`, returning its value.
    pub fn remove(&mut self, attribute: &str) -> Option<Value> {
        self.attributes.remove(attribute)
    }

    /// Iterates over the attributes in unspecified order.
    pub fn attributes(&self) -> hash_map::Iter<'_, String, Value> {
        self.attributes.iter()
    }

    /// Number of attributes in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns `true` when the snapshot carries no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Reference to this record.
    #[must_use]
    pub fn to_reference(&self) -> EntityReference {
        EntityReference::new(self.logical_name.clone(), self.id)
    }
}

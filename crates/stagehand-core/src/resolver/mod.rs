//! Attribute resolution across the three state sources of an invocation.
//!
//! A handler rarely knows where the value it needs lives. On `Create` there
//! is no pre image; on `Delete` there is no post image; on `Update` the
//! target only carries the attributes being written. The
//! [`AttributeResolver`] answers "is this attribute present, and what is its
//! value" against each source and combines them under a fixed precedence:
//!
//! 1. post images (the committed state, when the host captured one);
//! 2. the target payload, when it writes the attribute;
//! 3. pre images (the state before the operation).
//!
//! Absence is never an error. Every read returns a [`Resolved`] that records
//! whether the attribute was found and where, alongside the type's zero
//! value when it was not.

use time::Date;
use time::macros::date;
use tracing::debug;

use crate::entity::{Entity, EntityReference, Value};
use crate::invocation::{ImageSet, Invocation, Target};

/// Tracing target for resolver diagnostics.
const RESOLVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::resolver");

/// The zero value of [`Date`], matching the host's default date.
pub const ZERO_DATE: Date = date!(0001 - 01 - 01);

/// State source a value was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// The caller's write payload.
    Target,
    /// A post image.
    Post,
    /// A pre image.
    Pre,
    /// Not found anywhere.
    None,
}

/// Conversion between stored [`Value`]s and handler-facing types.
///
/// Implementations exist for every value type the runtime stores. A read of
/// an attribute holding a value of another type resolves as not found.
pub trait AttributeValue: Sized {
    /// Extracts `Self` from a stored value, or `None` on a type mismatch.
    fn from_value(value: &Value) -> Option<Self>;

    /// Value reported when the attribute is absent.
    fn zero() -> Self;
}

impl AttributeValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(text.clone()),
            _ => None,
        }
    }

    fn zero() -> Self {
        Self::new()
    }
}

impl AttributeValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(number) => Some(*number),
            _ => None,
        }
    }

    fn zero() -> Self {
        0
    }
}

impl AttributeValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Decimal(number) => Some(*number),
            _ => None,
        }
    }

    fn zero() -> Self {
        0.0
    }
}

impl AttributeValue for Date {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Date(date) => Some(*date),
            _ => None,
        }
    }

    fn zero() -> Self {
        ZERO_DATE
    }
}

impl AttributeValue for EntityReference {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Reference(reference) => Some(reference.clone()),
            _ => None,
        }
    }

    fn zero() -> Self {
        Self::default()
    }
}

/// Outcome of an attribute read.
///
/// Keeps "found and equal to zero" distinguishable from "not found".
///
/// # Example
///
/// ```
/// use stagehand_core::{Resolved, Source};
///
/// let absent: Resolved<i64> = Resolved::absent();
/// assert!(!absent.is_found());
/// assert_eq!(absent.source(), Source::None);
/// assert_eq!(*absent.value(), 0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    found: bool,
    value: T,
    source: Source,
}

impl<T> Resolved<T> {
    /// A value read from `source`.
    #[must_use]
    pub const fn found(value: T, source: Source) -> Self {
        Self {
            found: true,
            value,
            source,
        }
    }

    /// Returns `true` when the attribute was present.
    #[must_use]
    pub const fn is_found(&self) -> bool {
        self.found
    }

    /// Where the value came from.
    #[must_use]
    pub const fn source(&self) -> Source {
        self.source
    }

    /// The value, or the zero value when absent.
    #[must_use]
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Consumes the reading, returning the value or the zero value.
    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }

    /// Consumes the reading, returning `None` when absent.
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        self.found.then_some(self.value)
    }
}

impl<T: AttributeValue> Resolved<T> {
    /// A reading for an attribute found nowhere.
    #[must_use]
    pub fn absent() -> Self {
        Self {
            found: false,
            value: T::zero(),
            source: Source::None,
        }
    }
}

/// Previous and latest values of an attribute, plus whether the current
/// operation writes it.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeChange<T> {
    changing: bool,
    previous: Resolved<T>,
    latest: Resolved<T>,
}

impl<T> AttributeChange<T> {
    /// Returns `true` when the target writes the attribute.
    #[must_use]
    pub const fn is_changing(&self) -> bool {
        self.changing
    }

    /// Value from the pre images.
    #[must_use]
    pub const fn previous(&self) -> &Resolved<T> {
        &self.previous
    }

    /// Value under the post > target > pre precedence.
    #[must_use]
    pub const fn latest(&self) -> &Resolved<T> {
        &self.latest
    }
}

/// Read-only view over the state sources of one invocation.
#[derive(Debug, Clone, Copy)]
pub struct AttributeResolver<'a> {
    invocation: &'a Invocation,
}

impl<'a> AttributeResolver<'a> {
    /// Creates a resolver over `invocation`.
    #[must_use]
    pub const fn new(invocation: &'a Invocation) -> Self {
        Self { invocation }
    }

    /// Returns `true` when the target record writes `attribute`.
    ///
    /// Images play no part: an attribute is changing only when the caller
    /// put it in the payload.
    #[must_use]
    pub fn is_changing(&self, attribute: &str) -> bool {
        self.target_entity()
            .is_some_and(|entity| entity.contains(attribute))
    }

    /// Reads `attribute` from the target record.
    #[must_use]
    pub fn read_from_target<T: AttributeValue>(&self, attribute: &str) -> Resolved<T> {
        self.target_entity().map_or_else(Resolved::absent, |entity| {
            read_entity(entity, attribute, Source::Target)
        })
    }

    /// Returns `true` when a post image carries `attribute`. With an image
    /// name, only that image is considered.
    #[must_use]
    pub fn has_post_value(&self, attribute: &str, image: Option<&str>) -> bool {
        has_value(self.invocation.post_images(), attribute, image)
    }

    /// Reads `attribute` from the post images.
    ///
    /// The named image is preferred when it carries the attribute; otherwise
    /// the first image in host order that carries it is used.
    #[must_use]
    pub fn read_post_value<T: AttributeValue>(
        &self,
        attribute: &str,
        image: Option<&str>,
    ) -> Resolved<T> {
        read_images(self.invocation.post_images(), attribute, image, Source::Post)
    }

    /// Returns `true` when a pre image carries `attribute`. With an image
    /// name, only that image is considered.
    #[must_use]
    pub fn has_pre_value(&self, attribute: &str, image: Option<&str>) -> bool {
        has_value(self.invocation.pre_images(), attribute, image)
    }

    /// Reads `attribute` from the pre images, with the same image selection
    /// as [`read_post_value`](Self::read_post_value).
    #[must_use]
    pub fn read_pre_value<T: AttributeValue>(
        &self,
        attribute: &str,
        image: Option<&str>,
    ) -> Resolved<T> {
        read_images(self.invocation.pre_images(), attribute, image, Source::Pre)
    }

    /// Best current knowledge of what `attribute` will be once the operation
    /// completes: post images, then the target when it writes the attribute,
    /// then pre images.
    #[must_use]
    pub fn read_latest_value<T: AttributeValue>(&self, attribute: &str) -> Resolved<T> {
        if self.has_post_value(attribute, None) {
            return self.read_post_value(attribute, None);
        }
        if self.is_changing(attribute) {
            return self.read_from_target(attribute);
        }
        self.read_pre_value(attribute, None)
    }

    /// Pre and latest values of `attribute` together with its change flag.
    #[must_use]
    pub fn change<T: AttributeValue>(&self, attribute: &str) -> AttributeChange<T> {
        AttributeChange {
            changing: self.is_changing(attribute),
            previous: self.read_pre_value(attribute, None),
            latest: self.read_latest_value(attribute),
        }
    }

    /// The target payload when it is a record.
    #[must_use]
    pub fn target_entity(&self) -> Option<&'a Entity> {
        match self.invocation.target() {
            Some(Target::Entity(entity)) => Some(entity),
            Some(Target::Reference(_)) | None => None,
        }
    }

    /// Reference to the target record, derived from the payload whether it
    /// is a record or a bare reference.
    #[must_use]
    pub fn target_entity_reference(&self) -> Option<EntityReference> {
        match self.invocation.target() {
            Some(Target::Entity(entity)) => Some(entity.to_reference()),
            Some(Target::Reference(reference)) => Some(reference.clone()),
            None => None,
        }
    }

    /// The named pre image, or the first one when no name is given.
    #[must_use]
    pub fn pre_image(&self, name: Option<&str>) -> Option<&'a Entity> {
        select_image(self.invocation.pre_images(), name)
    }

    /// The named post image, or the first one when no name is given.
    #[must_use]
    pub fn post_image(&self, name: Option<&str>) -> Option<&'a Entity> {
        select_image(self.invocation.post_images(), name)
    }

    /// Relationship input of `Associate` and `Disassociate`.
    #[must_use]
    pub fn relationship(&self) -> Option<&'a str> {
        self.invocation.relationship()
    }
}

impl Invocation {
    /// Attribute reads across this invocation's state sources.
    #[must_use]
    pub const fn resolver(&self) -> AttributeResolver<'_> {
        AttributeResolver::new(self)
    }
}

fn image_name(name: Option<&str>) -> Option<&str> {
    name.filter(|value| !value.trim().is_empty())
}

fn select_image<'a>(images: &'a ImageSet, name: Option<&str>) -> Option<&'a Entity> {
    image_name(name).map_or_else(|| images.first(), |image| images.get(image))
}

fn has_value(images: &ImageSet, attribute: &str, image: Option<&str>) -> bool {
    image_name(image).map_or_else(
        || images.iter().any(|(_, entity)| entity.contains(attribute)),
        |name| {
            images
                .get(name)
                .is_some_and(|entity| entity.contains(attribute))
        },
    )
}

fn read_images<T: AttributeValue>(
    images: &ImageSet,
    attribute: &str,
    image: Option<&str>,
    source: Source,
) -> Resolved<T> {
    let named = image_name(image)
        .and_then(|name| images.get(name))
        .filter(|entity| entity.contains(attribute));
    let entity = named.or_else(|| {
        images
            .iter()
            .map(|(_, entity)| entity)
            .find(|entity| entity.contains(attribute))
    });
    entity.map_or_else(Resolved::absent, |found| {
        read_entity(found, attribute, source)
    })
}

fn read_entity<T: AttributeValue>(entity: &Entity, attribute: &str, source: Source) -> Resolved<T> {
    let Some(stored) = entity.get(attribute) else {
        return Resolved::absent();
    };
    if let Some(value) = T::from_value(stored) {
        return Resolved::found(value, source);
    }
    debug!(
        target: RESOLVER_TARGET,
        attribute,
        stored_type = stored.type_name(),
        requested_type = std::any::type_name::<T>(),
        "attribute type mismatch; treating as absent"
    );
    Resolved::absent()
}

#[cfg(test)]
mod tests;

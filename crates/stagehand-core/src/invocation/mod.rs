//! The host's description of one pipeline event.
//!
//! An [`Invocation`] is built by the host for every event it routes through
//! the runtime. It names the pipeline [`Stage`], the [`Operation`] being
//! processed and the record type, and carries the three state sources the
//! resolver reads: the target payload and the named pre and post images.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{Entity, EntityReference};
use crate::error::PipelineError;

/// Point in the host pipeline at which a handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Stage {
    /// Before the platform validates the operation, outside the transaction.
    PreValidate,
    /// Before the operation is committed, inside the transaction.
    PreOperate,
    /// After the operation is committed.
    PostOperate,
}

impl Stage {
    /// Host wire code of the stage.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::PreValidate => 10,
            Self::PreOperate => 20,
            Self::PostOperate => 40,
        }
    }

    /// Parses a host wire code.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] for codes other than 10, 20
    /// and 40.
    pub fn from_code(code: i32) -> Result<Self, PipelineError> {
        match code {
            10 => Ok(Self::PreValidate),
            20 => Ok(Self::PreOperate),
            40 => Ok(Self::PostOperate),
            other => Err(PipelineError::configuration(format!(
                "unknown pipeline stage code {other}"
            ))),
        }
    }

    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreValidate => "PreValidate",
            Self::PreOperate => "PreOperate",
            Self::PostOperate => "PostOperate",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i32> for Stage {
    type Error = PipelineError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<Stage> for i32 {
    fn from(stage: Stage) -> Self {
        stage.code()
    }
}

/// Kind of change being processed.
///
/// Names follow the host's message names, including its two custom
/// messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operation {
    /// Record creation.
    Create,
    /// Record update.
    Update,
    /// Record deletion.
    Delete,
    /// Ownership change.
    Assign,
    /// Relationship creation.
    Associate,
    /// Relationship removal.
    Disassociate,
    /// Single-record read.
    Retrieve,
    /// Multi-record read.
    RetrieveMultiple,
    /// Record state change.
    SetStateDynamicEntity,
    /// Record merge.
    Merge,
    /// Custom message generating a work-order credit note.
    GenerateWorkOrderCreditNote,
    /// Custom message generating an extended-warranty credit note.
    GenerateWarrantyCreditNote,
}

impl Operation {
    const ALL: [Self; 12] = [
        Self::Create,
        Self::Update,
        Self::Delete,
        Self::Assign,
        Self::Associate,
        Self::Disassociate,
        Self::Retrieve,
        Self::RetrieveMultiple,
        Self::SetStateDynamicEntity,
        Self::Merge,
        Self::GenerateWorkOrderCreditNote,
        Self::GenerateWarrantyCreditNote,
    ];

    /// Host message name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::Assign => "Assign",
            Self::Associate => "Associate",
            Self::Disassociate => "Disassociate",
            Self::Retrieve => "Retrieve",
            Self::RetrieveMultiple => "RetrieveMultiple",
            Self::SetStateDynamicEntity => "SetStateDynamicEntity",
            Self::Merge => "Merge",
            Self::GenerateWorkOrderCreditNote => "app_SMAPGenerateWOCreditNote",
            Self::GenerateWarrantyCreditNote => "app_SMAPGenerateEWCreditNote",
        }
    }

}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = PipelineError;

    /// Parses a host message name. Matching is exact, as the host's names
    /// are case-sensitive.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|operation| operation.as_str() == value)
            .ok_or_else(|| PipelineError::configuration(format!("unknown operation '{value}'")))
    }
}

impl TryFrom<String> for Operation {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Operation> for String {
    fn from(operation: Operation) -> Self {
        operation.as_str().to_owned()
    }
}

/// Write payload supplied by the caller of the operation.
///
/// Most operations carry a (partial) record; a few, such as `Delete`, only
/// carry a reference to the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Target {
    /// Attributes being written.
    Entity(Entity),
    /// Bare pointer to the record being acted on.
    Reference(EntityReference),
}

impl From<Entity> for Target {
    fn from(entity: Entity) -> Self {
        Self::Entity(entity)
    }
}

impl From<EntityReference> for Target {
    fn from(reference: EntityReference) -> Self {
        Self::Reference(reference)
    }
}

/// Named entity images in host insertion order.
///
/// The order is the deterministic scan order used when no image name is
/// given to a read.
///
/// Image names are unique; a decoded set naming the same image twice is
/// rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(String, Entity)>", into = "Vec<(String, Entity)>")]
pub struct ImageSet {
    images: Vec<(String, Entity)>,
}

impl ImageSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { images: Vec::new() }
    }

    /// Adds or replaces the image called `name`. A replaced image keeps its
    /// position.
    pub fn insert(&mut self, name: impl Into<String>, image: Entity) {
        let key: String = name.into();
        match self.images.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = image,
            None => self.images.push((key, image)),
        }
    }

    /// Looks up an image by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.images
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, image)| image)
    }

    /// First image in insertion order.
    #[must_use]
    pub fn first(&self) -> Option<&Entity> {
        self.images.first().map(|(_, image)| image)
    }

    /// Iterates over images in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entity)> {
        self.images
            .iter()
            .map(|(name, image)| (name.as_str(), image))
    }

    /// Number of images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Returns `true` when no images were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl TryFrom<Vec<(String, Entity)>> for ImageSet {
    type Error = PipelineError;

    fn try_from(images: Vec<(String, Entity)>) -> Result<Self, Self::Error> {
        let mut set = Self::new();
        for (name, image) in images {
            if set.get(&name).is_some() {
                return Err(PipelineError::configuration(format!(
                    "image '{name}' is supplied more than once"
                )));
            }
            set.insert(name, image);
        }
        Ok(set)
    }
}

impl From<ImageSet> for Vec<(String, Entity)> {
    fn from(set: ImageSet) -> Self {
        set.images
    }
}

/// One pipeline event as supplied by the host.
///
/// Built once per event through [`Invocation::builder`] or decoded from the
/// host's JSON with [`Invocation::from_json`].
///
/// # Example
///
/// ```
/// use stagehand_core::{Entity, Invocation, Operation, Stage};
///
/// let invocation = Invocation::builder(Stage::PreOperate, Operation::Update, "contact")
///     .target(Entity::new("contact").with("firstname", "Ada"))
///     .build()
///     .expect("valid invocation");
/// assert_eq!(invocation.entity_type(), "contact");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    stage: Stage,
    operation: Operation,
    entity_type: String,
    #[serde(default)]
    primary_entity_id: Uuid,
    #[serde(default)]
    correlation_id: Uuid,
    #[serde(default)]
    initiating_user_id: Uuid,
    #[serde(default)]
    target: Option<Target>,
    #[serde(default)]
    relationship: Option<String>,
    #[serde(default)]
    pre_images: ImageSet,
    #[serde(default)]
    post_images: ImageSet,
}

impl Invocation {
    /// Starts building an invocation.
    #[must_use]
    pub fn builder(
        stage: Stage,
        operation: Operation,
        entity_type: impl Into<String>,
    ) -> InvocationBuilder {
        InvocationBuilder {
            invocation: Self {
                stage,
                operation,
                entity_type: entity_type.into(),
                primary_entity_id: Uuid::nil(),
                correlation_id: Uuid::nil(),
                initiating_user_id: Uuid::nil(),
                target: None,
                relationship: None,
                pre_images: ImageSet::new(),
                post_images: ImageSet::new(),
            },
        }
    }

    /// Decodes an invocation from the host's JSON representation.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] when the document is
    /// malformed, names an unknown stage or operation, or has a blank entity
    /// type.
    pub fn from_json(document: &str) -> Result<Self, PipelineError> {
        let invocation: Self = serde_json::from_str(document).map_err(|error| {
            PipelineError::configuration(format!("malformed invocation: {error}"))
        })?;
        invocation.validate()?;
        Ok(invocation)
    }

    /// Checks that the invocation can be dispatched.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] when the entity type is
    /// blank.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.entity_type.trim().is_empty() {
            return Err(PipelineError::configuration(
                "invocation does not name an entity type",
            ));
        }
        Ok(())
    }

    /// Pipeline stage.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Operation being processed.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        self.operation
    }

    /// Logical name of the primary record type.
    #[must_use]
    pub const fn entity_type(&self) -> &str {
        self.entity_type.as_str()
    }

    /// Id of the primary record; nil before a create has committed.
    #[must_use]
    pub const fn primary_entity_id(&self) -> Uuid {
        self.primary_entity_id
    }

    /// Host correlation id for the event.
    #[must_use]
    pub const fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    /// User who started the operation.
    #[must_use]
    pub const fn initiating_user_id(&self) -> Uuid {
        self.initiating_user_id
    }

    /// Write payload.
    #[must_use]
    pub const fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    /// Mutable write payload. Handlers reach it through
    /// [`RequestContext`](crate::RequestContext).
    pub(crate) const fn target_mut(&mut self) -> Option<&mut Target> {
        self.target.as_mut()
    }

    /// Relationship name for `Associate` and `Disassociate`.
    #[must_use]
    pub fn relationship(&self) -> Option<&str> {
        self.relationship.as_deref()
    }

    /// Images captured before the operation.
    #[must_use]
    pub const fn pre_images(&self) -> &ImageSet {
        &self.pre_images
    }

    /// Images captured after the operation.
    #[must_use]
    pub const fn post_images(&self) -> &ImageSet {
        &self.post_images
    }
}

/// Builder for [`Invocation`].
#[derive(Debug, Clone)]
pub struct InvocationBuilder {
    invocation: Invocation,
}

impl InvocationBuilder {
    /// Sets the id of the primary record.
    #[must_use]
    pub const fn primary_entity_id(mut self, id: Uuid) -> Self {
        self.invocation.primary_entity_id = id;
        self
    }

    /// Sets the correlation id.
    #[must_use]
    pub const fn correlation_id(mut self, id: Uuid) -> Self {
        self.invocation.correlation_id = id;
        self
    }

    /// Sets the initiating user.
    #[must_use]
    pub const fn initiating_user_id(mut self, id: Uuid) -> Self {
        self.invocation.initiating_user_id = id;
        self
    }

    /// Sets the write payload.
    #[must_use]
    pub fn target(mut self, target: impl Into<Target>) -> Self {
        self.invocation.target = Some(target.into());
        self
    }

    /// Sets the relationship name.
    #[must_use]
    pub fn relationship(mut self, name: impl Into<String>) -> Self {
        self.invocation.relationship = Some(name.into());
        self
    }

    /// Adds a pre image.
    #[must_use]
    pub fn pre_image(mut self, name: impl Into<String>, image: Entity) -> Self {
        self.invocation.pre_images.insert(name, image);
        self
    }

    /// Adds a post image.
    #[must_use]
    pub fn post_image(mut self, name: impl Into<String>, image: Entity) -> Self {
        self.invocation.post_images.insert(name, image);
        self
    }

    /// Finishes the invocation.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] when the entity type is
    /// blank.
    pub fn build(self) -> Result<Invocation, PipelineError> {
        self.invocation.validate()?;
        Ok(self.invocation)
    }
}

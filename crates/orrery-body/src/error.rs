//! Error taxonomy for the body engine.
//!
//! Range violations are not errors: values are clamped silently and the
//! clamped value is what gets stored.

use orrery_lod::LodError;
use thiserror::Error;

/// Errors raised by the property registry and the animation overlay.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PropertyError {
    /// No property with this key is defined on the current blueprint.
    #[error("unknown property: {0}")]
    UnknownProperty(String),

    /// A definition referenced a texture group the blueprint does not declare.
    #[error("unknown texture group: {0}")]
    UnknownGroup(String),

    /// Two texture groups share a name.
    #[error("duplicate texture group: {0}")]
    DuplicateGroup(String),

    /// The supplied value has the wrong shape for the property.
    #[error("property {key} expects a {expected} value")]
    TypeMismatch {
        /// Property key.
        key: String,
        /// Expected value kind.
        expected: &'static str,
    },

    /// A non-finite number was supplied.
    #[error("property {0} received a non-finite value")]
    NonFinite(String),

    /// Only numeric properties can be animated.
    #[error("property {0} is not numeric")]
    NotNumeric(String),

    /// The definition itself is malformed.
    #[error("invalid definition for {key}: {reason}")]
    InvalidDefinition {
        /// Property key.
        key: String,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// A failed procedural-texture backend invocation.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("texture backend failed on group {group}: {message}")]
pub struct BackendError {
    /// Group being generated.
    pub group: String,
    /// Backend-provided description.
    pub message: String,
}

impl BackendError {
    /// Create a backend error for a group.
    pub fn new(group: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            message: message.into(),
        }
    }
}

/// Malformed serialized state. Existing state is never touched when this is returned.
#[derive(Debug, Error)]
pub enum DeserializationError {
    /// The text is not a valid cache object.
    #[error("malformed cache document: {0}")]
    Json(#[from] serde_json::Error),

    /// A property entry has the wrong shape or an out-of-domain value.
    #[error("invalid value for property {key}: {reason}")]
    InvalidValue {
        /// Property key.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A pinned blueprint index does not exist.
    #[error("blueprint index {0} does not exist")]
    UnknownBlueprint(i64),
}

/// Errors surfaced by [`crate::PlanetBody`].
#[derive(Debug, Error)]
pub enum BodyError {
    /// Property registry failure.
    #[error(transparent)]
    Property(#[from] PropertyError),

    /// Texture backend failure during a rebuild.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Cache import failure.
    #[error(transparent)]
    Deserialization(#[from] DeserializationError),

    /// The cache document could not be encoded.
    #[error("failed to encode cache document: {0}")]
    Export(serde_json::Error),

    /// Invalid LOD configuration.
    #[error(transparent)]
    Lod(#[from] LodError),

    /// A blueprint index outside the library was requested.
    #[error("blueprint index {index} out of range (library has {count})")]
    UnknownBlueprint {
        /// Requested index.
        index: usize,
        /// Library size.
        count: usize,
    },

    /// A body needs at least one blueprint.
    #[error("blueprint library is empty")]
    EmptyLibrary,
}

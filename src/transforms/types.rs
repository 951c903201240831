//! Core transform types and error definitions
//!
//! Contains the `Transform` enum representing every transform shape a tile
//! can carry, and `TransformError` for failures during parsing, resolution
//! and consolidation.

use serde::{Deserialize, Serialize};

use super::affine::AffineModel;
use super::polynomial::Polynomial2D;
use crate::models::TransformSpec;

/// Errors that can occur while parsing, resolving or consolidating transforms
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TransformError {
    /// A reference names a transform that is not in the shared pool
    #[error("unresolved transform reference: '{0}'")]
    UnresolvedReference(String),

    /// Nested transform lists exceed the supported depth
    #[error("transform lists nested deeper than {0} levels")]
    NestingTooDeep(usize),

    /// Requested polynomial degree is negative or above `MAX_POLY_DEGREE`
    #[error("invalid polynomial degree {0}: must be between 0 and 64")]
    InvalidDegree(i64),

    /// Consolidation produced more transforms than it was given
    #[error("consolidation grew transform list from {input} to {output} entries")]
    LengthIncreased { input: usize, output: usize },

    /// A sub-range was requested on a tile with no transforms
    #[error("cannot consolidate range '{range}' of an empty transform list")]
    EmptyTransformList { range: String },

    /// Transform range string could not be parsed
    #[error("invalid transform range '{0}'")]
    InvalidRange(String),

    /// Leaf data string does not match its class
    #[error("invalid data string for {class_name}: {message}")]
    InvalidDataString { class_name: String, message: String },

    /// Shared pool entry is a reference or a list
    #[error("shared pool entry '{0}' must be a concrete transform")]
    InvalidPoolEntry(String),

    /// Polynomial cannot be lowered without losing terms
    #[error("cannot reduce polynomial of order {from} to order {to}: higher terms are non-zero")]
    OrderReduction { from: u32, to: u32 },
}

impl TransformError {
    /// Whether this error is a caller precondition violation rather than a
    /// problem with the data being processed.
    pub fn is_precondition(&self) -> bool {
        matches!(self, TransformError::InvalidDegree(_) | TransformError::InvalidRange(_))
    }
}

/// A leaf transform the engine does not interpret.
///
/// Class name, data string and any inline id are kept verbatim so the
/// transform can be written back exactly as it was read.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafTransform {
    pub class_name: String,
    pub data_string: String,
    pub id: Option<String>,
}

impl LeafTransform {
    pub fn new(class_name: impl Into<String>, data_string: impl Into<String>) -> Self {
        Self { class_name: class_name.into(), data_string: data_string.into(), id: None }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// A single element of a tile's transform chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TransformSpec", into = "TransformSpec")]
pub enum Transform {
    /// 2D affine map
    Affine(AffineModel),
    /// 2D polynomial map
    Polynomial(Polynomial2D),
    /// Any other leaf class (splines, lens corrections, ...)
    Opaque(LeafTransform),
    /// Pointer into the shared pool
    Reference { ref_id: String },
    /// Ordered sub-list applied as if inlined
    List(Vec<Transform>),
}

impl Transform {
    /// Shorthand for a reference transform.
    pub fn reference(ref_id: impl Into<String>) -> Self {
        Transform::Reference { ref_id: ref_id.into() }
    }

    /// Whether this transform can be merged into an affine run.
    pub fn is_affine(&self) -> bool {
        matches!(self, Transform::Affine(_))
    }

    /// Whether this transform is concrete (not a reference or a list).
    pub fn is_concrete(&self) -> bool {
        !matches!(self, Transform::Reference { .. } | Transform::List(_))
    }

    /// Apply a concrete transform to a point.
    ///
    /// Returns `None` for transforms that cannot be evaluated here: opaque
    /// leaves, and unresolved references or lists.
    pub fn apply(&self, point: (f64, f64)) -> Option<(f64, f64)> {
        match self {
            Transform::Affine(affine) => Some(affine.apply(point)),
            Transform::Polynomial(poly) => Some(poly.apply(point)),
            _ => None,
        }
    }

    /// Number of transforms after flattening nested lists.
    pub fn flat_len(&self) -> usize {
        match self {
            Transform::List(items) => items.iter().map(Transform::flat_len).sum(),
            _ => 1,
        }
    }

    /// Short human readable description, used in log output.
    pub fn describe(&self) -> String {
        match self {
            Transform::Affine(a) => format!("affine[{}]", a.data_string()),
            Transform::Polynomial(p) => format!("polynomial(order {})", p.order()),
            Transform::Opaque(leaf) => leaf.class_name.clone(),
            Transform::Reference { ref_id } => format!("ref:{}", ref_id),
            Transform::List(items) => format!("list({})", items.len()),
        }
    }
}

impl From<AffineModel> for Transform {
    fn from(affine: AffineModel) -> Self {
        Transform::Affine(affine)
    }
}

impl From<Polynomial2D> for Transform {
    fn from(poly: Polynomial2D) -> Self {
        Transform::Polynomial(poly)
    }
}

/// Highest polynomial order the engine builds or parses.
pub const MAX_POLY_DEGREE: u32 = 64;

/// Requested output form for merged affine runs.
///
/// Degree 0 keeps merged runs affine; any higher degree promotes each merged
/// run to a polynomial of that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PolyDegree(u32);

impl PolyDegree {
    /// Keep merged runs as affine models.
    pub const AFFINE: PolyDegree = PolyDegree(0);

    /// Validate a requested degree.
    pub fn new(degree: i64) -> Result<Self, TransformError> {
        u32::try_from(degree)
            .ok()
            .filter(|d| *d <= MAX_POLY_DEGREE)
            .map(PolyDegree)
            .ok_or(TransformError::InvalidDegree(degree))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Whether merged runs should be promoted to polynomials.
    pub fn promotes(self) -> bool {
        self.0 > 0
    }
}

impl std::fmt::Display for PolyDegree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

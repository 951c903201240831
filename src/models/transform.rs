//! Transform specifications as stored in the render tile store.

use serde::{Deserialize, Serialize};

use crate::transforms::{
    AffineModel, LeafTransform, Polynomial2D, Transform, TransformError, POLYNOMIAL_CLASS,
};

/// Transform specification, tagged by `"type"` in JSON.
///
/// ```json
/// {"type": "leaf", "className": "mpicbg.trakem2.transform.AffineModel2D", "dataString": "1 0 0 1 0 0"}
/// {"type": "ref", "refId": "lens_correction_0"}
/// {"type": "list", "specList": [ ... ]}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransformSpec {
    Leaf {
        #[serde(rename = "className")]
        class_name: String,
        #[serde(rename = "dataString")]
        data_string: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    Ref {
        #[serde(rename = "refId")]
        ref_id: String,
    },
    List {
        #[serde(rename = "specList", default)]
        spec_list: Vec<TransformSpec>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
}

impl TransformSpec {
    /// Identifier of this spec, if it carries one.
    pub fn id(&self) -> Option<&str> {
        match self {
            TransformSpec::Leaf { id, .. } | TransformSpec::List { id, .. } => id.as_deref(),
            TransformSpec::Ref { .. } => None,
        }
    }

    /// Return this spec with its identifier replaced.
    ///
    /// References cannot carry an identifier and are returned unchanged.
    pub fn with_id(self, new_id: impl Into<String>) -> Self {
        match self {
            TransformSpec::Leaf { class_name, data_string, .. } => {
                TransformSpec::Leaf { class_name, data_string, id: Some(new_id.into()) }
            }
            TransformSpec::List { spec_list, .. } => {
                TransformSpec::List { spec_list, id: Some(new_id.into()) }
            }
            other => other,
        }
    }
}

/// Whether a leaf class name denotes an affine model.
///
/// Only `AffineModel2D` classes merge; rigid, similarity and translation
/// models are kept as barriers.
pub fn is_affine_class(class_name: &str) -> bool {
    class_name.contains("AffineModel2D")
}

fn is_polynomial_class(class_name: &str) -> bool {
    class_name == POLYNOMIAL_CLASS
}

/// Ids of inline affine and polynomial leaves and of lists are dropped: those
/// entries are merged or flattened and do not survive as one transform.
impl TryFrom<TransformSpec> for Transform {
    type Error = TransformError;

    fn try_from(spec: TransformSpec) -> Result<Self, Self::Error> {
        match spec {
            TransformSpec::Leaf { class_name, data_string, id } => {
                if is_affine_class(&class_name) {
                    AffineModel::from_data_string(&data_string).map(Transform::Affine)
                } else if is_polynomial_class(&class_name) {
                    Polynomial2D::from_data_string(&data_string).map(Transform::Polynomial)
                } else {
                    Ok(Transform::Opaque(LeafTransform { class_name, data_string, id }))
                }
            }
            TransformSpec::Ref { ref_id } => Ok(Transform::Reference { ref_id }),
            TransformSpec::List { spec_list, .. } => spec_list
                .into_iter()
                .map(Transform::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Transform::List),
        }
    }
}

impl From<Transform> for TransformSpec {
    fn from(transform: Transform) -> Self {
        match transform {
            Transform::Affine(affine) => TransformSpec::Leaf {
                class_name: crate::transforms::AFFINE_CLASS.to_string(),
                data_string: affine.data_string(),
                id: None,
            },
            Transform::Polynomial(poly) => TransformSpec::Leaf {
                class_name: POLYNOMIAL_CLASS.to_string(),
                data_string: poly.data_string(),
                id: None,
            },
            Transform::Opaque(LeafTransform { class_name, data_string, id }) => {
                TransformSpec::Leaf { class_name, data_string, id }
            }
            Transform::Reference { ref_id } => TransformSpec::Ref { ref_id },
            Transform::List(items) => TransformSpec::List {
                spec_list: items.into_iter().map(TransformSpec::from).collect(),
                id: None,
            },
        }
    }
}

//! 2D affine model
//!
//! Six coefficients of a homogeneous 3x3 matrix whose last row is `[0 0 1]`:
//!
//! ```text
//! | m00 m01 b0 |
//! | m10 m11 b1 |
//! |  0   0   1 |
//! ```

use super::types::TransformError;

/// Class name the render store uses for affine leaves.
pub const AFFINE_CLASS: &str = "mpicbg.trakem2.transform.AffineModel2D";

/// A 2D affine map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineModel {
    pub m00: f64,
    pub m01: f64,
    pub m10: f64,
    pub m11: f64,
    pub b0: f64,
    pub b1: f64,
}

impl Default for AffineModel {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineModel {
    /// Create an affine model from its matrix entries in row-major order.
    pub fn new(m00: f64, m01: f64, m10: f64, m11: f64, b0: f64, b1: f64) -> Self {
        Self { m00, m01, m10, m11, b0, b1 }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub fn translation(x: f64, y: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation by `radians` counter-clockwise about the origin.
    pub fn rotation(radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::new(cos, -sin, sin, cos, 0.0, 0.0)
    }

    /// Map a point through this model.
    ///
    /// The translation term is summed first so that a degree-1 polynomial
    /// built from this model evaluates to bit-identical results.
    pub fn apply(&self, (x, y): (f64, f64)) -> (f64, f64) {
        (self.b0 + self.m00 * x + self.m01 * y, self.b1 + self.m10 * x + self.m11 * y)
    }

    /// Compose with `first`, producing the map that applies `first` and then
    /// `self` (matrix product `self · first`).
    pub fn concatenate(&self, first: &AffineModel) -> AffineModel {
        AffineModel {
            m00: self.m00 * first.m00 + self.m01 * first.m10,
            m01: self.m00 * first.m01 + self.m01 * first.m11,
            m10: self.m10 * first.m00 + self.m11 * first.m10,
            m11: self.m10 * first.m01 + self.m11 * first.m11,
            b0: self.m00 * first.b0 + self.m01 * first.b1 + self.b0,
            b1: self.m10 * first.b0 + self.m11 * first.b1 + self.b1,
        }
    }

    /// Render data string: `m00 m10 m01 m11 b0 b1` (column-major).
    pub fn data_string(&self) -> String {
        format!("{} {} {} {} {} {}", self.m00, self.m10, self.m01, self.m11, self.b0, self.b1)
    }

    /// Parse a render data string.
    pub fn from_data_string(data: &str) -> Result<Self, TransformError> {
        let values = parse_coefficients(AFFINE_CLASS, data)?;
        match values.as_slice() {
            &[m00, m10, m01, m11, b0, b1] => Ok(Self::new(m00, m01, m10, m11, b0, b1)),
            _ => Err(TransformError::InvalidDataString {
                class_name: AFFINE_CLASS.to_string(),
                message: format!("expected 6 coefficients, found {}", values.len()),
            }),
        }
    }
}

/// Split a whitespace separated data string into floats.
pub(crate) fn parse_coefficients(class_name: &str, data: &str) -> Result<Vec<f64>, TransformError> {
    data.split_whitespace()
        .map(|field| {
            field.parse::<f64>().map_err(|e| TransformError::InvalidDataString {
                class_name: class_name.to_string(),
                message: format!("'{}': {}", field, e),
            })
        })
        .collect()
}

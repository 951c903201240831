//! 2D polynomial transform
//!
//! Each output coordinate is a polynomial in `x` and `y`. Monomials are
//! ordered by total degree, then by increasing power of `y`:
//! `1, x, y, x², xy, y², x³, ...`.

use super::affine::{parse_coefficients, AffineModel};
use super::types::{TransformError, MAX_POLY_DEGREE};

/// Class name the render store uses for polynomial leaves.
pub const POLYNOMIAL_CLASS: &str = "mpicbg.trakem2.transform.PolynomialTransform2D";

/// Number of monomials in a polynomial of the given order, `None` on overflow.
pub fn term_count(order: u32) -> Option<usize> {
    let o = usize::try_from(order).ok()?;
    o.checked_add(1)?.checked_mul(o.checked_add(2)?).map(|n| n / 2)
}

fn checked_term_count(order: u32) -> Result<usize, TransformError> {
    if order > MAX_POLY_DEGREE {
        return Err(TransformError::InvalidDegree(i64::from(order)));
    }
    term_count(order).ok_or(TransformError::InvalidDegree(i64::from(order)))
}

/// A 2D polynomial map of a fixed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial2D {
    order: u32,
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Polynomial2D {
    /// Build from coefficient vectors; both must hold `term_count(order)` values.
    pub fn new(order: u32, x: Vec<f64>, y: Vec<f64>) -> Result<Self, TransformError> {
        let expected = checked_term_count(order)?;
        if x.len() != expected || y.len() != expected {
            return Err(TransformError::InvalidDataString {
                class_name: POLYNOMIAL_CLASS.to_string(),
                message: format!(
                    "order {} needs {} coefficients per axis, found {} and {}",
                    order,
                    expected,
                    x.len(),
                    y.len()
                ),
            });
        }
        Ok(Self { order, x, y })
    }

    /// Exact degree-1 embedding of an affine model.
    pub fn from_affine(affine: &AffineModel) -> Self {
        Self {
            order: 1,
            x: vec![affine.b0, affine.m00, affine.m01],
            y: vec![affine.b1, affine.m10, affine.m11],
        }
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn x_coefficients(&self) -> &[f64] {
        &self.x
    }

    pub fn y_coefficients(&self) -> &[f64] {
        &self.y
    }

    /// Re-express at another order.
    ///
    /// Raising the order pads the new monomials with zero. Lowering it only
    /// succeeds when every dropped coefficient is zero.
    pub fn as_order(&self, order: u32) -> Result<Self, TransformError> {
        let count = checked_term_count(order)?;
        if order < self.order {
            let dropped_nonzero =
                self.x[count..].iter().chain(&self.y[count..]).any(|c| *c != 0.0);
            if dropped_nonzero {
                return Err(TransformError::OrderReduction { from: self.order, to: order });
            }
        }

        let mut x = self.x.clone();
        let mut y = self.y.clone();
        x.resize(count, 0.0);
        y.resize(count, 0.0);
        Ok(Self { order, x, y })
    }

    /// Map a point through the polynomial.
    pub fn apply(&self, (x, y): (f64, f64)) -> (f64, f64) {
        let order = self.order as usize;
        let mut x_pow = vec![1.0; order + 1];
        let mut y_pow = vec![1.0; order + 1];
        for k in 1..=order {
            x_pow[k] = x_pow[k - 1] * x;
            y_pow[k] = y_pow[k - 1] * y;
        }

        let mut out_x = 0.0;
        let mut out_y = 0.0;
        let mut term = 0;
        for degree in 0..=order {
            for y_exp in 0..=degree {
                let monomial = x_pow[degree - y_exp] * y_pow[y_exp];
                out_x += self.x[term] * monomial;
                out_y += self.y[term] * monomial;
                term += 1;
            }
        }
        (out_x, out_y)
    }

    /// Render data string: all x coefficients followed by all y coefficients.
    pub fn data_string(&self) -> String {
        self.x.iter().chain(&self.y).map(|c| c.to_string()).collect::<Vec<_>>().join(" ")
    }

    /// Parse a render data string, inferring the order from its length.
    pub fn from_data_string(data: &str) -> Result<Self, TransformError> {
        let values = parse_coefficients(POLYNOMIAL_CLASS, data)?;
        let per_axis = values.len() / 2;
        let order = (0..=MAX_POLY_DEGREE)
            .find(|o| term_count(*o) == Some(per_axis))
            .filter(|_| values.len() % 2 == 0);

        match order {
            Some(order) => {
                let (x, y) = values.split_at(per_axis);
                Self::new(order, x.to_vec(), y.to_vec())
            }
            None => Err(TransformError::InvalidDataString {
                class_name: POLYNOMIAL_CLASS.to_string(),
                message: format!("{} coefficients do not match any polynomial order", values.len()),
            }),
        }
    }
}

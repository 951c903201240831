//! Stack run context containing the parameters of one consolidation run.

use crate::config::ConsolidateConfig;
use crate::stack::StackError;
use crate::transforms::{PolyDegree, TransformRange};

/// Default postfix appended to the input stack name.
pub const DEFAULT_POSTFIX: &str = "_CONS";

/// Default number of sections processed concurrently.
pub const DEFAULT_POOL_SIZE: usize = 10;

/// Parameters of a stack consolidation run.
///
/// Values are stored as given and checked by [`validate`](Self::validate)
/// before any section is touched.
#[derive(Debug, Clone)]
pub struct StackContext {
    /// Input stack
    stack: String,
    /// Explicit output stack; `stack + postfix` when absent
    output_stack: Option<String>,
    postfix: String,
    min_z: Option<f64>,
    max_z: Option<f64>,
    /// Restrict the run to these sections
    sections: Option<Vec<f64>>,
    range: TransformRange,
    poly_degree: i64,
    pool_size: usize,
    fail_fast: bool,
}

impl StackContext {
    /// Create a context for `stack` with default settings.
    pub fn new(stack: impl Into<String>) -> Self {
        Self {
            stack: stack.into(),
            output_stack: None,
            postfix: DEFAULT_POSTFIX.to_string(),
            min_z: None,
            max_z: None,
            sections: None,
            range: TransformRange::full(),
            poly_degree: 0,
            pool_size: DEFAULT_POOL_SIZE,
            fail_fast: false,
        }
    }

    /// Create a context for `stack` from the `[consolidate]` config section.
    pub fn from_config(
        stack: impl Into<String>,
        config: &ConsolidateConfig,
    ) -> Result<Self, StackError> {
        Ok(Self::new(stack)
            .with_postfix(config.postfix.clone())
            .with_range(config.transform_range()?)
            .with_poly_degree(config.poly_degree)
            .with_pool_size(config.pool_size)
            .with_fail_fast(config.fail_fast))
    }

    /// Get the input stack.
    pub fn stack(&self) -> &str {
        &self.stack
    }

    /// Get the output stack.
    pub fn output_stack(&self) -> String {
        match &self.output_stack {
            Some(name) => name.clone(),
            None => format!("{}{}", self.stack, self.postfix),
        }
    }

    pub fn min_z(&self) -> Option<f64> {
        self.min_z
    }

    pub fn max_z(&self) -> Option<f64> {
        self.max_z
    }

    pub fn range(&self) -> &TransformRange {
        &self.range
    }

    pub fn poly_degree(&self) -> i64 {
        self.poly_degree
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn is_fail_fast(&self) -> bool {
        self.fail_fast
    }

    pub fn with_output_stack(mut self, output_stack: impl Into<String>) -> Self {
        self.output_stack = Some(output_stack.into());
        self
    }

    pub fn with_postfix(mut self, postfix: impl Into<String>) -> Self {
        self.postfix = postfix.into();
        self
    }

    /// Limit the run to sections within `[min_z, max_z]`; `None` leaves a side open.
    pub fn with_z_bounds(mut self, min_z: Option<f64>, max_z: Option<f64>) -> Self {
        self.min_z = min_z;
        self.max_z = max_z;
        self
    }

    /// Limit the run to the listed sections.
    pub fn with_sections(mut self, sections: Vec<f64>) -> Self {
        self.sections = Some(sections);
        self
    }

    pub fn with_range(mut self, range: TransformRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_poly_degree(mut self, poly_degree: i64) -> Self {
        self.poly_degree = poly_degree;
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Check the run parameters, returning the validated degree.
    pub fn validate(&self) -> Result<PolyDegree, StackError> {
        if self.stack.is_empty() {
            return Err(StackError::InvalidParameter("input stack name is empty".to_string()));
        }
        if self.output_stack().is_empty() {
            return Err(StackError::InvalidParameter("output stack name is empty".to_string()));
        }
        if let (Some(min_z), Some(max_z)) = (self.min_z, self.max_z) {
            if min_z > max_z {
                return Err(StackError::InvalidParameter(format!(
                    "min z {} is greater than max z {}",
                    min_z, max_z
                )));
            }
        }
        for bound in [self.min_z, self.max_z].into_iter().flatten() {
            if bound.is_nan() {
                return Err(StackError::InvalidParameter("z bound is NaN".to_string()));
            }
        }
        Ok(PolyDegree::new(self.poly_degree)?)
    }

    /// Pick the sections to process out of those available in the stack.
    ///
    /// Requested sections the stack does not have are skipped with a warning.
    pub fn select_sections(&self, available: &[f64]) -> Vec<f64> {
        let in_bounds = |z: f64| {
            self.min_z.map_or(true, |min_z| z >= min_z)
                && self.max_z.map_or(true, |max_z| z <= max_z)
        };

        if let Some(requested) = &self.sections {
            for z in requested {
                if !available.contains(z) {
                    log::warn!("section z={} is not in stack '{}'", z, self.stack);
                }
            }
        }

        available
            .iter()
            .copied()
            .filter(|z| in_bounds(*z))
            .filter(|z| self.sections.as_ref().map_or(true, |requested| requested.contains(z)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::TransformError;

    #[test]
    fn test_stack_context_defaults() {
        let ctx = StackContext::new("montage");
        assert_eq!(ctx.stack(), "montage");
        assert_eq!(ctx.output_stack(), "montage_CONS");
        assert_eq!(ctx.pool_size(), 10);
        assert!(ctx.range().is_full());
        assert!(!ctx.is_fail_fast());
        assert_eq!(ctx.validate().unwrap(), PolyDegree::AFFINE);
    }

    #[test]
    fn test_stack_context_output_stack() {
        assert_eq!(StackContext::new("a").with_postfix("_X").output_stack(), "a_X");
        assert_eq!(StackContext::new("a").with_output_stack("b").output_stack(), "b");
    }

    #[test]
    fn test_stack_context_from_config() {
        let config = ConsolidateConfig {
            postfix: "_M".to_string(),
            transforms_slice: "1:".to_string(),
            pool_size: 3,
            poly_degree: 2,
            fail_fast: true,
        };
        let ctx = StackContext::from_config("s", &config).unwrap();
        assert_eq!(ctx.output_stack(), "s_M");
        assert_eq!(*ctx.range(), TransformRange::new(Some(1), None));
        assert_eq!(ctx.pool_size(), 3);
        assert_eq!(ctx.validate().unwrap().get(), 2);
        assert!(ctx.is_fail_fast());
    }

    #[test]
    fn test_stack_context_from_config_bad_slice() {
        let config =
            ConsolidateConfig { transforms_slice: "a:b".to_string(), ..Default::default() };
        assert!(matches!(
            StackContext::from_config("s", &config),
            Err(StackError::Transform(TransformError::InvalidRange(_)))
        ));
    }

    #[test]
    fn test_validate_rejects_negative_degree() {
        let ctx = StackContext::new("s").with_poly_degree(-1);
        assert!(matches!(
            ctx.validate(),
            Err(StackError::Transform(TransformError::InvalidDegree(-1)))
        ));
    }

    #[test]
    fn test_validate_rejects_degree_above_limit() {
        let huge = i64::from(u32::MAX);
        let ctx = StackContext::new("s").with_poly_degree(huge);
        assert!(matches!(
            ctx.validate(),
            Err(StackError::Transform(TransformError::InvalidDegree(d))) if d == huge
        ));
        assert!(StackContext::new("s").with_poly_degree(64).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let ctx = StackContext::new("s").with_z_bounds(Some(5.0), Some(2.0));
        assert!(matches!(ctx.validate(), Err(StackError::InvalidParameter(_))));
    }

    #[test]
    fn test_validate_rejects_empty_stack() {
        assert!(matches!(StackContext::new("").validate(), Err(StackError::InvalidParameter(_))));
    }

    #[test]
    fn test_select_sections_bounds() {
        let available = [1.0, 2.0, 3.0, 4.0];
        let ctx = StackContext::new("s").with_z_bounds(Some(2.0), None);
        assert_eq!(ctx.select_sections(&available), vec![2.0, 3.0, 4.0]);

        let ctx = StackContext::new("s").with_z_bounds(None, Some(2.5));
        assert_eq!(ctx.select_sections(&available), vec![1.0, 2.0]);

        let ctx = StackContext::new("s");
        assert_eq!(ctx.select_sections(&available), available.to_vec());
    }

    #[test]
    fn test_select_sections_explicit() {
        let available = [1.0, 2.0, 3.0];
        let ctx = StackContext::new("s").with_sections(vec![3.0, 1.0, 9.0]);
        assert_eq!(ctx.select_sections(&available), vec![1.0, 3.0]);
    }
}

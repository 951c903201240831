//! Transform index ranges
//!
//! Selects the part of a tile's transform list that takes part in
//! consolidation, written with slice syntax: `":"`, `"1:"`, `":-1"`, `"1:3"`.
//! A bare index `"n"` means `":n"`. Negative indices count from the end and
//! out-of-range bounds are clamped.

use std::fmt;
use std::str::FromStr;

use super::types::TransformError;

/// A contiguous `start:end` selection of a transform list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransformRange {
    start: Option<isize>,
    end: Option<isize>,
}

impl TransformRange {
    pub fn new(start: Option<isize>, end: Option<isize>) -> Self {
        Self { start, end }
    }

    /// The whole list.
    pub fn full() -> Self {
        Self::default()
    }

    /// Whether the range selects every transform of any list.
    pub fn is_full(&self) -> bool {
        matches!(self.start, None | Some(0)) && self.end.is_none()
    }

    /// Concrete `(start, end)` bounds for a list of `len` transforms, with
    /// `start <= end <= len`.
    pub fn bounds(&self, len: usize) -> (usize, usize) {
        let clamp = |index: isize| -> usize {
            if index < 0 {
                len.saturating_sub(index.unsigned_abs())
            } else {
                (index as usize).min(len)
            }
        };
        let start = self.start.map(clamp).unwrap_or(0);
        let end = self.end.map(clamp).unwrap_or(len).max(start);
        (start, end)
    }
}

fn parse_bound(field: &str, text: &str) -> Result<Option<isize>, TransformError> {
    let field = field.trim();
    if field.is_empty() {
        return Ok(None);
    }
    field.parse::<isize>().map(Some).map_err(|_| TransformError::InvalidRange(text.to_string()))
}

impl FromStr for TransformRange {
    type Err = TransformError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = text.split(':').collect();
        match fields.as_slice() {
            [end] => Ok(Self::new(None, parse_bound(end, text)?)),
            [start, end] => Ok(Self::new(parse_bound(start, text)?, parse_bound(end, text)?)),
            // Only unit steps keep the selection contiguous.
            [start, end, step] => match parse_bound(step, text)? {
                None | Some(1) => {
                    Ok(Self::new(parse_bound(start, text)?, parse_bound(end, text)?))
                }
                Some(_) => Err(TransformError::InvalidRange(text.to_string())),
            },
            _ => Err(TransformError::InvalidRange(text.to_string())),
        }
    }
}

impl fmt::Display for TransformRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = self.start {
            write!(f, "{}", start)?;
        }
        write!(f, ":")?;
        if let Some(end) = self.end {
            write!(f, "{}", end)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> TransformRange {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(parse(":"), TransformRange::full());
        assert_eq!(parse("1:"), TransformRange::new(Some(1), None));
        assert_eq!(parse(":-1"), TransformRange::new(None, Some(-1)));
        assert_eq!(parse(" 1 : 3 "), TransformRange::new(Some(1), Some(3)));
        assert_eq!(parse("2"), TransformRange::new(None, Some(2)));
        assert_eq!(parse("1:3:1"), TransformRange::new(Some(1), Some(3)));
    }

    #[test]
    fn test_parse_rejects() {
        assert!("a:".parse::<TransformRange>().is_err());
        assert!("::2".parse::<TransformRange>().is_err());
        assert!("1:2:3:4".parse::<TransformRange>().is_err());
    }

    #[test]
    fn test_bounds_python_semantics() {
        assert_eq!(parse(":").bounds(4), (0, 4));
        assert_eq!(parse("1:").bounds(4), (1, 4));
        assert_eq!(parse(":-1").bounds(4), (0, 3));
        assert_eq!(parse("-2:").bounds(4), (2, 4));
        assert_eq!(parse("1:10").bounds(4), (1, 4));
        assert_eq!(parse("-10:2").bounds(4), (0, 2));
        assert_eq!(parse("3:1").bounds(4), (3, 3));
        assert_eq!(parse("5:").bounds(4), (4, 4));
    }

    #[test]
    fn test_is_full() {
        assert!(parse(":").is_full());
        assert!(parse("0:").is_full());
        assert!(!parse("1:").is_full());
        assert!(!parse(":3").is_full());
    }

    #[test]
    fn test_display() {
        assert_eq!(parse(":").to_string(), ":");
        assert_eq!(parse("1:").to_string(), "1:");
        assert_eq!(parse("-2:5").to_string(), "-2:5");
    }
}

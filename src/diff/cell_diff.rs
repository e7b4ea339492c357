//! Cell-level comparison logic

use serde::{Deserialize, Serialize};

use crate::model::CellValue;

/// Null-safe cell comparator with configurable relaxations
///
/// Whatever the relaxations, a null only ever equals another null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellComparator {
    pub ignore_case: bool,
    pub ignore_whitespace: bool,
    pub numeric_tolerance: Option<f64>,
}

impl CellComparator {
    /// Create a new cell comparator
    pub fn new(ignore_case: bool, ignore_whitespace: bool, numeric_tolerance: Option<f64>) -> Self {
        Self {
            ignore_case,
            ignore_whitespace,
            numeric_tolerance,
        }
    }

    /// Exact null-safe equality
    pub fn exact() -> Self {
        Self::default()
    }

    /// True if the comparator is plain null-safe equality
    pub fn is_exact(&self) -> bool {
        !self.ignore_case && !self.ignore_whitespace && self.numeric_tolerance.is_none()
    }

    /// Compare two cell values for equality
    pub fn equal(&self, a: &CellValue, b: &CellValue) -> bool {
        if a == b {
            return true;
        }
        if self.is_exact() || a.is_null() || b.is_null() {
            return false;
        }

        if let Some(tolerance) = self.numeric_tolerance {
            if a.equals_with_tolerance(b, tolerance) {
                return true;
            }
        }

        match (a.as_str(), b.as_str()) {
            (Some(x), Some(y)) if self.ignore_case || self.ignore_whitespace => {
                let (x, y) = if self.ignore_whitespace {
                    (x.trim(), y.trim())
                } else {
                    (x, y)
                };
                if self.ignore_case {
                    x.eq_ignore_ascii_case(y)
                } else {
                    x == y
                }
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_equality() {
        let comparator = CellComparator::exact();

        assert!(comparator.equal(&CellValue::Int(42), &CellValue::Int(42)));
        assert!(!comparator.equal(&CellValue::Int(42), &CellValue::Int(43)));
        assert!(comparator.equal(&"hello".into(), &"hello".into()));
        assert!(!comparator.equal(&"hello".into(), &"Hello".into()));
        assert!(comparator.is_exact());
    }

    #[test]
    fn test_nulls() {
        let relaxed = CellComparator::new(true, true, Some(100.0));
        for comparator in [CellComparator::exact(), relaxed] {
            assert!(comparator.equal(&CellValue::Null, &CellValue::Null));
            assert!(!comparator.equal(&CellValue::Null, &CellValue::Int(0)));
            assert!(!comparator.equal(&"".into(), &CellValue::Null));
        }
    }

    #[test]
    fn test_case_insensitive() {
        let comparator = CellComparator::new(true, false, None);
        assert!(comparator.equal(&"Hello".into(), &"hello".into()));
        assert!(!comparator.equal(&"Hello ".into(), &"hello".into()));
    }

    #[test]
    fn test_case_and_whitespace_combined() {
        let comparator = CellComparator::new(true, true, None);
        assert!(comparator.equal(&" Hello".into(), &"hELLO  ".into()));
    }

    #[test]
    fn test_numeric_tolerance() {
        let comparator = CellComparator::new(false, false, Some(0.01));
        assert!(comparator.equal(&CellValue::Float(1.0), &CellValue::Float(1.005)));
        assert!(!comparator.equal(&CellValue::Float(1.0), &CellValue::Float(1.02)));

        let comparator = CellComparator::new(false, false, Some(2.0));
        assert!(comparator.equal(&CellValue::Int(10), &CellValue::Int(12)));
        assert!(!comparator.equal(&CellValue::Int(10), &CellValue::Int(13)));
    }
}

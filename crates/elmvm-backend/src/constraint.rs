use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ElmvmError;
use crate::types::{ElmVersion, ParsedVersion};

static LOWER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\S+?)\s*(<=|>=|<|>)\s*v\b").expect("lower bound pattern is a valid regex")
});

static UPPER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bv\s*(<=|>=|<|>)\s*(\S+)\s*$").expect("upper bound pattern is a valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl Comparator {
    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "<" => Some(Self::Less),
            "<=" => Some(Self::LessOrEqual),
            ">" => Some(Self::Greater),
            ">=" => Some(Self::GreaterOrEqual),
            _ => None,
        }
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
        }
    }

    /// Whether `ordering` (left operand compared to right operand) satisfies
    /// this comparator.
    #[must_use]
    pub fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Less => ordering == Ordering::Less,
            Self::LessOrEqual => ordering != Ordering::Greater,
            Self::Greater => ordering == Ordering::Greater,
            Self::GreaterOrEqual => ordering != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    /// `<literal> <op> v`
    Lower,
    /// `v <op> <literal>`
    Upper,
}

/// One side of a range. A literal that failed to parse leaves `literal`
/// empty and the bound rejects every version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    side: Side,
    comparator: Comparator,
    text: String,
    literal: Option<ParsedVersion>,
}

impl Bound {
    fn new(side: Side, comparator: Comparator, text: &str) -> Self {
        let literal = match ElmVersion::parse(text) {
            Ok(version) => Some(*version.parsed()),
            Err(e) => {
                log::warn!("Constraint literal {text:?} is not a version, bound matches nothing: {e}");
                None
            }
        };
        Self {
            side,
            comparator,
            text: text.to_string(),
            literal,
        }
    }

    #[must_use]
    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    #[must_use]
    pub fn literal(&self) -> Option<&ParsedVersion> {
        self.literal.as_ref()
    }

    #[must_use]
    pub fn holds(&self, version: &ParsedVersion) -> bool {
        let Some(literal) = &self.literal else {
            return false;
        };
        let ordering = match self.side {
            Side::Lower => literal.cmp(version),
            Side::Upper => version.cmp(literal),
        };
        self.comparator.accepts(ordering)
    }
}

/// A two-sided range such as `0.19.0 <= v < 0.20.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    lower: Bound,
    upper: Bound,
}

impl Constraint {
    /// Parse a declared range.
    ///
    /// Both the `<literal> <op> v` and the `v <op> <literal>` halves must be
    /// present; a one-sided expression is rejected rather than treated as
    /// open-ended.
    ///
    /// # Errors
    /// Returns [`ElmvmError::ParseConstraint`] when either half is missing.
    pub fn parse(input: &str) -> Result<Self, ElmvmError> {
        let failed = || ElmvmError::ParseConstraint {
            constraint: input.to_string(),
        };

        let lower = LOWER_RE.captures(input).ok_or_else(failed)?;
        let upper = UPPER_RE.captures(input).ok_or_else(failed)?;

        let lower_op = Comparator::from_symbol(&lower[2]).ok_or_else(failed)?;
        let upper_op = Comparator::from_symbol(&upper[1]).ok_or_else(failed)?;

        Ok(Self {
            lower: Bound::new(Side::Lower, lower_op, &lower[1]),
            upper: Bound::new(Side::Upper, upper_op, &upper[2]),
        })
    }

    #[must_use]
    pub fn lower(&self) -> &Bound {
        &self.lower
    }

    #[must_use]
    pub fn upper(&self) -> &Bound {
        &self.upper
    }

    #[must_use]
    pub fn matches(&self, version: &ParsedVersion) -> bool {
        self.lower.holds(version) && self.upper.holds(version)
    }

    #[must_use]
    pub fn matches_version(&self, version: &ElmVersion) -> bool {
        self.matches(version.parsed())
    }
}

impl FromStr for Constraint {
    type Err = ElmvmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} v {} {}",
            self.lower.text,
            self.lower.comparator.symbol(),
            self.upper.comparator.symbol(),
            self.upper.text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(s: &str) -> ParsedVersion {
        *ElmVersion::parse(s).unwrap().parsed()
    }

    #[test]
    fn half_open_range_matches_expected_versions() {
        let constraint = Constraint::parse("0.18.0 <= v < 0.19.0").unwrap();

        assert!(constraint.matches(&parsed("0.18.0")));
        assert!(constraint.matches(&parsed("0.18.5")));
        assert!(!constraint.matches(&parsed("0.17.9")));
        assert!(!constraint.matches(&parsed("0.19.0")));
    }

    #[test]
    fn prerelease_of_upper_bound_falls_inside_exclusive_range() {
        let constraint = Constraint::parse("0.18.0 <= v < 0.19.0").unwrap();
        assert!(constraint.matches(&parsed("0.19.0-beta")));
    }

    #[test]
    fn inclusive_upper_and_exclusive_lower() {
        let constraint = Constraint::parse("0.18.0 < v <= 0.19.0").unwrap();

        assert!(!constraint.matches(&parsed("0.18.0")));
        assert!(constraint.matches(&parsed("0.18.1")));
        assert!(constraint.matches(&parsed("0.19.0")));
    }

    #[test]
    fn operators_are_oriented_per_side() {
        // "0.20.0 > v" means v below 0.20.0; "v >= 0.19.0" means v at least 0.19.0.
        let constraint = Constraint::parse("0.20.0 > v >= 0.19.0").unwrap();

        assert!(constraint.matches(&parsed("0.19.1")));
        assert!(!constraint.matches(&parsed("0.20.0")));
        assert!(!constraint.matches(&parsed("0.18.0")));
    }

    #[test]
    fn spacing_is_optional() {
        let constraint = Constraint::parse("0.19.0<=v<0.20.0").unwrap();
        assert!(constraint.matches(&parsed("0.19.1")));
    }

    #[test]
    fn one_sided_expressions_fail_to_parse() {
        assert!(matches!(
            Constraint::parse("0.18.0 <= v"),
            Err(ElmvmError::ParseConstraint { .. })
        ));
        assert!(matches!(
            Constraint::parse("v < 0.19.0"),
            Err(ElmvmError::ParseConstraint { .. })
        ));
    }

    #[test]
    fn malformed_input_fails_to_parse() {
        for input in ["", "0.19.1", "anything", "0.18.0 == v == 0.19.0"] {
            let result = Constraint::parse(input);
            assert!(
                matches!(result, Err(ElmvmError::ParseConstraint { ref constraint }) if constraint == input),
                "{input:?} should fail, got {result:?}"
            );
        }
    }

    #[test]
    fn unparseable_literal_degrades_side_to_never_matching() {
        let constraint = Constraint::parse("banana <= v < 0.19.0").unwrap();

        assert!(constraint.lower().literal().is_none());
        assert!(!constraint.matches(&parsed("0.18.0")));
        assert!(!constraint.matches(&parsed("0.0.1")));
    }

    #[test]
    fn display_renders_normalized_expression() {
        let constraint = Constraint::parse("  0.19.0<=v<0.20.0 ").unwrap();
        assert_eq!(constraint.to_string(), "0.19.0 <= v < 0.20.0");
    }

    #[test]
    fn comparator_accepts_orderings() {
        assert!(Comparator::LessOrEqual.accepts(Ordering::Equal));
        assert!(!Comparator::Less.accepts(Ordering::Equal));
        assert!(Comparator::GreaterOrEqual.accepts(Ordering::Greater));
        assert!(!Comparator::Greater.accepts(Ordering::Less));
    }
}

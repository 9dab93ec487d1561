use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:-([^\d.\-\s]+)(\d+)?)?$")
        .expect("version pattern is a valid regex")
});

/// Precedence of a pre-release tag. Variant order is the ranking: an untagged
/// release outranks every tagged one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StageRank {
    Unknown,
    Alpha,
    Beta,
    Stable,
}

impl StageRank {
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "alpha" | "a" => Self::Alpha,
            "beta" | "b" => Self::Beta,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for StageRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Alpha => write!(f, "alpha"),
            Self::Beta => write!(f, "beta"),
            Self::Stable => write!(f, "stable"),
        }
    }
}

/// Comparable form of a version string. Field order is the comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParsedVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub stage: StageRank,
    pub increment: u64,
}

impl ParsedVersion {
    #[must_use]
    pub fn stable(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            stage: StageRank::Stable,
            increment: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionComponent {
    Major,
    Minor,
    Patch,
    Increment,
}

impl fmt::Display for VersionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Patch => write!(f, "patch"),
            Self::Increment => write!(f, "stage increment"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
    #[error("Expected major[.minor[.patch]][-stage[N]], got: {input}")]
    InvalidFormat { input: String },
    #[error("Invalid {component} version: {value}")]
    InvalidComponent {
        component: VersionComponent,
        value: String,
    },
}

/// An Elm release as it was written (`raw`) and as it is stored on disk
/// (`expanded`, every numeric component present).
///
/// Equality, hashing and ordering only look at the parsed tuple, so `0.18`
/// and `0.18.0` are the same version.
#[derive(Debug, Clone)]
pub struct ElmVersion {
    raw: String,
    expanded: String,
    parsed: ParsedVersion,
}

impl ElmVersion {
    /// Parse a version string.
    ///
    /// # Errors
    /// Returns an error when the string does not follow
    /// `major[.minor[.patch]][-stage[increment]]` or a numeric component does
    /// not fit in a `u64`.
    pub fn parse(raw: &str) -> Result<Self, VersionParseError> {
        let trimmed = raw.trim();
        let captures = VERSION_RE
            .captures(trimmed)
            .ok_or_else(|| VersionParseError::InvalidFormat {
                input: trimmed.to_string(),
            })?;

        let number = |index: usize, component: VersionComponent| -> Result<u64, VersionParseError> {
            captures.get(index).map_or(Ok(0), |m| {
                m.as_str()
                    .parse()
                    .map_err(|_| VersionParseError::InvalidComponent {
                        component,
                        value: m.as_str().to_string(),
                    })
            })
        };

        let major = number(1, VersionComponent::Major)?;
        let minor = number(2, VersionComponent::Minor)?;
        let patch = number(3, VersionComponent::Patch)?;
        let increment = number(5, VersionComponent::Increment)?;

        let (stage, suffix) = match captures.get(4) {
            Some(token) => {
                let digits = captures.get(5).map_or("", |m| m.as_str());
                (
                    StageRank::from_token(token.as_str()),
                    format!("-{}{digits}", token.as_str()),
                )
            }
            None => (StageRank::Stable, String::new()),
        };

        Ok(Self {
            raw: trimmed.to_string(),
            expanded: format!("{major}.{minor}.{patch}{suffix}"),
            parsed: ParsedVersion {
                major,
                minor,
                patch,
                stage,
                increment,
            },
        })
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn expanded(&self) -> &str {
        &self.expanded
    }

    #[must_use]
    pub fn parsed(&self) -> &ParsedVersion {
        &self.parsed
    }

    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.parsed.stage == StageRank::Stable
    }
}

impl FromStr for ElmVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for ElmVersion {
    fn eq(&self, other: &Self) -> bool {
        self.parsed == other.parsed
    }
}

impl Eq for ElmVersion {}

impl Hash for ElmVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parsed.hash(state);
    }
}

impl Ord for ElmVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parsed.cmp(&other.parsed)
    }
}

impl PartialOrd for ElmVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ElmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expanded)
    }
}

/// Known versions, newest first. Index 0 is what `latest` resolves to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionPool {
    versions: Vec<ElmVersion>,
}

impl VersionPool {
    #[must_use]
    pub fn new(newest_first: Vec<ElmVersion>) -> Self {
        Self {
            versions: newest_first,
        }
    }

    /// Build a pool from a listing ordered oldest to newest.
    #[must_use]
    pub fn from_oldest_first(mut oldest_first: Vec<ElmVersion>) -> Self {
        oldest_first.reverse();
        Self::new(oldest_first)
    }

    /// Build a pool from newest-first strings, skipping anything that does not
    /// parse.
    pub fn from_expanded<I, S>(strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(
            strings
                .into_iter()
                .filter_map(|s| ElmVersion::parse(s.as_ref()).ok())
                .collect(),
        )
    }

    #[must_use]
    pub fn latest(&self) -> Option<&ElmVersion> {
        self.versions.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ElmVersion> {
        self.versions.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    #[must_use]
    pub fn expanded_strings(&self) -> Vec<String> {
        self.versions
            .iter()
            .map(|v| v.expanded().to_string())
            .collect()
    }
}

impl<'a> IntoIterator for &'a VersionPool {
    type Item = &'a ElmVersion;
    type IntoIter = std::slice::Iter<'a, ElmVersion>;

    fn into_iter(self) -> Self::IntoIter {
        self.versions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> ElmVersion {
        s.parse().unwrap()
    }

    #[test]
    fn abbreviated_version_expands_to_stable_tuple() {
        let version = v("0.18");
        assert_eq!(version.raw(), "0.18");
        assert_eq!(version.expanded(), "0.18.0");
        assert_eq!(*version.parsed(), ParsedVersion::stable(0, 18, 0));
    }

    #[test]
    fn major_only_defaults_minor_and_patch() {
        let version = v("1");
        assert_eq!(version.expanded(), "1.0.0");
        assert_eq!(*version.parsed(), ParsedVersion::stable(1, 0, 0));
    }

    #[test]
    fn stage_and_increment_are_parsed() {
        let version = v("0.17.0-alpha2");
        assert_eq!(
            *version.parsed(),
            ParsedVersion {
                major: 0,
                minor: 17,
                patch: 0,
                stage: StageRank::Alpha,
                increment: 2,
            }
        );
        assert_eq!(version.expanded(), "0.17.0-alpha2");
    }

    #[test]
    fn abbreviated_prerelease_keeps_suffix_in_expanded_form() {
        assert_eq!(v("0.19-beta").expanded(), "0.19.0-beta");
        assert_eq!(v("0.19.0-bugfix6").parsed().stage, StageRank::Unknown);
        assert_eq!(v("0.19.0-bugfix6").parsed().increment, 6);
    }

    #[test]
    fn whitespace_is_trimmed() {
        assert_eq!(v("  0.19.1 \n").expanded(), "0.19.1");
    }

    #[test]
    fn invalid_strings_are_rejected() {
        for input in ["", "v0.19.0", "latest", "0.19.0.1", "0.19.1-5", "1.0.0-beta.2", ".1"] {
            assert!(
                ElmVersion::parse(input).is_err(),
                "{input:?} should not parse"
            );
        }
    }

    #[test]
    fn overflowing_component_reports_which_one() {
        let err = ElmVersion::parse("0.99999999999999999999999").unwrap_err();
        assert!(matches!(
            err,
            VersionParseError::InvalidComponent {
                component: VersionComponent::Minor,
                ..
            }
        ));
    }

    #[test]
    fn stable_outranks_every_stage() {
        assert!(v("1.0.0") > v("1.0.0-beta"));
        assert!(v("1.0.0-beta") > v("1.0.0-alpha"));
        assert!(v("1.0.0-alpha") > v("1.0.0-rc1"));
        assert!(v("1.0.0") > v("1.0.0-beta9"));
    }

    #[test]
    fn stage_ranking_is_case_insensitive_and_accepts_short_tokens() {
        assert_eq!(StageRank::from_token("BETA"), StageRank::Beta);
        assert_eq!(StageRank::from_token("b"), StageRank::Beta);
        assert_eq!(StageRank::from_token("a"), StageRank::Alpha);
        assert_eq!(StageRank::from_token("rc"), StageRank::Unknown);
    }

    #[test]
    fn increment_orders_within_a_stage() {
        assert!(v("0.17.0-alpha2") > v("0.17.0-alpha1"));
        assert!(v("0.17.0-alpha1") > v("0.17.0-alpha"));
    }

    #[test]
    fn numeric_components_order_before_stage() {
        assert!(v("0.18.1-alpha") > v("0.18.0"));
        assert!(v("0.19.0") > v("0.18.9"));
        assert!(v("1.0.0") > v("0.99.99"));
    }

    #[test]
    fn abbreviated_and_full_forms_are_equal() {
        assert_eq!(v("0.18"), v("0.18.0"));
        assert_eq!(v("0.18").cmp(&v("0.18.0")), Ordering::Equal);
    }

    #[test]
    fn pool_from_oldest_first_reverses_order() {
        let pool = VersionPool::from_oldest_first(vec![v("0.17.0"), v("0.18.0"), v("0.19.0")]);
        assert_eq!(pool.expanded_strings(), vec!["0.19.0", "0.18.0", "0.17.0"]);
        assert_eq!(pool.latest().map(ElmVersion::expanded), Some("0.19.0"));
    }

    #[test]
    fn pool_from_expanded_skips_invalid_entries() {
        let pool = VersionPool::from_expanded(["0.19.1", "garbage", "0.19.0"]);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.expanded_strings(), vec!["0.19.1", "0.19.0"]);
    }

    #[test]
    fn empty_pool_has_no_latest() {
        assert!(VersionPool::default().latest().is_none());
        assert!(VersionPool::default().is_empty());
    }
}

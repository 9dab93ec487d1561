use crate::constraint::Constraint;
use crate::error::ElmvmError;
use crate::types::{ElmVersion, VersionPool};

pub const LATEST_ALIAS: &str = "latest";

/// Resolve a user-typed request (`latest`, `0.19.1`, `0.19`) against a pool.
///
/// Pool order is the tie-break: a prefix request picks the first, i.e.
/// newest, release that carries the prefix. A request that is neither an
/// exact nor a prefix match is expanded (`0.19-beta` to `0.19.0-beta`) and
/// compared once more.
#[must_use]
pub fn find_suitable<'a>(requested: &str, pool: &'a VersionPool) -> Option<&'a ElmVersion> {
    let requested = requested.trim();

    if requested == LATEST_ALIAS {
        return pool.latest();
    }

    if let Some(exact) = pool.iter().find(|v| v.expanded() == requested) {
        return Some(exact);
    }

    let prefix = format!("{requested}.");
    if let Some(newest) = pool.iter().find(|v| v.expanded().starts_with(&prefix)) {
        return Some(newest);
    }

    let expanded = ElmVersion::parse(requested).ok()?;
    pool.iter().find(|v| v.expanded() == expanded.expanded())
}

/// Pick the newest pool entry inside `constraint`.
///
/// # Errors
/// Returns [`ElmvmError::NoMatchingVersion`] when nothing in the pool
/// satisfies both bounds.
pub fn select_best<'a>(
    pool: &'a VersionPool,
    constraint: &Constraint,
) -> Result<&'a ElmVersion, ElmvmError> {
    pool.iter()
        .find(|v| constraint.matches_version(v))
        .ok_or_else(|| ElmvmError::no_matching_version(constraint.to_string()))
}

//! Version resolution logic.
//!
//! Pure decision logic: given the triggering build event, the parent
//! repository's latest tag and the tracked repository's latest tag, compute
//! either "no new version" or a concrete new version string. Total over its
//! inputs and free of side effects, so re-running with identical inputs
//! always yields the same result.

use regex::Regex;

use crate::context::BuildEvent;

/// Outcome of a resolution step.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The version to publish, or `None` for a no-op run.
    pub new_version: Option<String>,
    /// Human-readable status line for the step report.
    pub title: String,
}

impl Resolution {
    fn publish(version: String, title: String) -> Self {
        Resolution {
            new_version: Some(version),
            title,
        }
    }

    fn skip(title: impl Into<String>) -> Self {
        Resolution {
            new_version: None,
            title: title.into(),
        }
    }
}

/// Resolves the version to publish for one pipeline run.
///
/// Two disjoint branches selected by `event`:
///
/// - push / pull_request / rollback: append or bump a numeric `-<N>` suffix
///   on the parent's own latest tag; the tracked version is never inspected.
/// - tag: compare the parent's latest tag (increment suffix stripped) against
///   the tracked repository's tag and publish the tracked version when the
///   tracked repository has moved ahead.
///
/// Any other event resolves to a no-op. Malformed version strings degrade to
/// increment `0` rather than failing.
pub fn resolve(
    event: &BuildEvent,
    parent_slug: &str,
    parent_version: Option<&str>,
    tracked_version: Option<&str>,
) -> Resolution {
    if event.is_incremental() {
        return resolve_incremental(event, parent_version);
    }

    match event {
        BuildEvent::Tag => resolve_tag_comparison(parent_slug, parent_version, tracked_version),
        other => Resolution::skip(format!("Nothing to do for build event \"{}\".", other)),
    }
}

fn resolve_incremental(event: &BuildEvent, parent_version: Option<&str>) -> Resolution {
    let Some(parent) = parent_version else {
        return Resolution::skip(
            "Parent repository has no published tag yet. Nothing to increment.",
        );
    };

    let increment = match trailing_increment(parent) {
        Some(n) => n + 1,
        None => 0,
    };
    let new_version = format!("{}-{}", strip_increment(parent), increment);

    Resolution::publish(
        new_version.clone(),
        format!(
            "New release with {} should be published (triggered by {}).",
            new_version, event
        ),
    )
}

fn resolve_tag_comparison(
    parent_slug: &str,
    parent_version: Option<&str>,
    tracked_version: Option<&str>,
) -> Resolution {
    let Some(tracked) = tracked_version else {
        return Resolution::skip("Tracked repository version is unknown.");
    };

    // The increment suffix was applied by this plugin on a prior run and must
    // not affect the equality comparison.
    let parent = parent_version.map(strip_increment);

    // Best-effort string comparison; semver can not be assumed because some
    // tracked repositories do not apply it.
    let equivalent = match parent.as_deref() {
        Some(parent) => {
            parent == tracked
                || format!("v{}", parent) == tracked
                || parent == format!("v{}", tracked)
        }
        None => false,
    };

    if equivalent {
        return Resolution::skip("No need to publish a new version.");
    }

    // Known quirk carried over from the original plugin: whether the "v"
    // prefix is added depends on the parent repository identifier, not on the
    // tracked tag itself.
    let new_version = if parent_slug.starts_with('v') {
        tracked.to_string()
    } else {
        format!("v{}", tracked)
    };

    Resolution::publish(
        new_version.clone(),
        format!("A new version with {} should be published.", new_version),
    )
}

/// Parses the numeric value of a trailing `-<N>` suffix, if present.
fn trailing_increment(version: &str) -> Option<u64> {
    let re = Regex::new(r"-([0-9]+)$").ok()?;
    re.captures(version)?.get(1)?.as_str().parse().ok()
}

/// Strips a trailing `-<digits>` suffix (including a bare trailing `-`).
fn strip_increment(version: &str) -> String {
    match Regex::new(r"-[0-9]*$") {
        Ok(re) => re.replace(version, "").into_owned(),
        Err(_) => version.to_string(),
    }
}

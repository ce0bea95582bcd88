use crate::config::Config;

/// Role a repository plays in a run.
///
/// The domain has exactly two roles, so they are modeled as named variants
/// rather than string keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepoRole {
    /// The repository running this pipeline step.
    Parent,
    /// The repository whose releases are watched for updates.
    Tracked,
}

impl RepoRole {
    /// Human-readable name used in step titles and errors.
    pub fn display_name(&self) -> &'static str {
        match self {
            RepoRole::Parent => "parent repository",
            RepoRole::Tracked => "tracked repository",
        }
    }
}

/// One tracked repository, resolved from configuration at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct RepoRef {
    pub role: RepoRole,
    /// Stable identifier, e.g. "owner/name".
    pub slug: String,
}

impl RepoRef {
    pub fn new(role: RepoRole, slug: impl Into<String>) -> Self {
        RepoRef {
            role,
            slug: slug.into(),
        }
    }

    /// Builds the (parent, tracked) pair from configuration.
    pub fn pair(config: &Config) -> (RepoRef, RepoRef) {
        (
            RepoRef::new(RepoRole::Parent, config.this_repo.clone()),
            RepoRef::new(RepoRole::Tracked, config.track_repo.clone()),
        )
    }

    /// Query URL for this repository's latest release.
    pub fn latest_release_url(&self, api_url: &str) -> String {
        format!("{}/repos/{}/releases/latest", api_url, self.slug)
    }

    /// URL for creating a release on this repository.
    pub fn releases_url(&self, api_url: &str) -> String {
        format!("{}/repos/{}/releases", api_url, self.slug)
    }
}

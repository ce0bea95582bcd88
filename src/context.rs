use std::env;
use std::fmt;

/// Kind of build event that triggered the pipeline run.
///
/// Supplied by the invoking CI environment; read-only input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    Push,
    PullRequest,
    Rollback,
    Tag,
    /// Any event kind this plugin does not act on.
    Other(String),
}

impl BuildEvent {
    pub fn parse(value: &str) -> Self {
        match value {
            "push" => BuildEvent::Push,
            "pull_request" => BuildEvent::PullRequest,
            "rollback" => BuildEvent::Rollback,
            "tag" => BuildEvent::Tag,
            other => BuildEvent::Other(other.to_string()),
        }
    }

    /// Events that publish an incremental pre-release of the parent's own tag.
    pub fn is_incremental(&self) -> bool {
        matches!(
            self,
            BuildEvent::Push | BuildEvent::PullRequest | BuildEvent::Rollback
        )
    }
}

impl fmt::Display for BuildEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildEvent::Push => write!(f, "push"),
            BuildEvent::PullRequest => write!(f, "pull_request"),
            BuildEvent::Rollback => write!(f, "rollback"),
            BuildEvent::Tag => write!(f, "tag"),
            BuildEvent::Other(other) => write!(f, "{}", other),
        }
    }
}

/// Signals read from the triggering CI environment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Trigger {
    /// Absent when run outside a CI pipeline invocation.
    pub event: Option<BuildEvent>,
    /// Target branch of the triggering build, when provided.
    pub branch: Option<String>,
}

impl Trigger {
    pub fn from_env() -> Self {
        let event = match env::var("DRONE_BUILD_EVENT") {
            Ok(value) if !value.is_empty() => Some(BuildEvent::parse(&value)),
            _ => None,
        };
        let branch = env::var("DRONE_BRANCH").ok().filter(|b| !b.is_empty());

        Trigger { event, branch }
    }
}

/// Mutable state threaded through one pipeline run.
///
/// Created empty at pipeline start, populated incrementally by steps and
/// discarded at process exit. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunContext {
    pub parent_version: Option<String>,
    pub tracked_version: Option<String>,
    new_version: Option<String>,
}

impl RunContext {
    pub fn new() -> Self {
        RunContext::default()
    }

    /// Records the resolved version.
    ///
    /// Once set, the value is final: later calls keep the first value so that
    /// publish steps all observe the same version.
    pub fn record_new_version(&mut self, version: String) {
        if self.new_version.is_none() {
            self.new_version = Some(version);
        }
    }

    pub fn new_version(&self) -> Option<&str> {
        self.new_version.as_deref()
    }
}

//! Release registry access.
//!
//! The [ReleaseRegistry] trait abstracts the hosted release API so the
//! pipeline can be exercised against [MockRegistry] in tests, while
//! [RegistryClient] talks to the real API over HTTP.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::context::{BuildEvent, Trigger};
use crate::error::{Result, TrackRepoError};
use crate::repo::{RepoRef, RepoRole};
use crate::ui;

/// Latest-release response body; only the tag name matters here.
#[derive(Debug, Deserialize)]
struct LatestRelease {
    tag_name: Option<String>,
}

/// Request body for creating a hosted release.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseRequest {
    pub tag_name: String,
    pub target_commitish: String,
    pub name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
}

impl ReleaseRequest {
    /// Builds the release request for a resolved version.
    ///
    /// The body message depends on the event kind: a tag-triggered release
    /// references the tracked repository, anything else is an independent
    /// incremental update.
    pub fn for_event(
        new_version: &str,
        event: Option<&BuildEvent>,
        trigger: &Trigger,
        config: &Config,
    ) -> Self {
        let body = if event == Some(&BuildEvent::Tag) {
            format!(
                "Autoupdated repository tracking the parent repository update on \"{}\".",
                config.track_repo
            )
        } else {
            "Incremental update independent of the parent repository.".to_string()
        };

        ReleaseRequest {
            tag_name: new_version.to_string(),
            target_commitish: trigger.branch.clone().unwrap_or_default(),
            name: new_version.to_string(),
            body,
            draft: false,
            prerelease: false,
        }
    }
}

/// Contract the pipeline depends on for version fetching and release creation.
///
/// Implementors must be safe to call concurrently for both repository refs;
/// the only shared state written is each fetch's own result in the run
/// context, after the concurrent group joins.
#[async_trait]
pub trait ReleaseRegistry: Send + Sync {
    /// Fetches the latest published tag name for one repository.
    ///
    /// Returns `Ok(None)` when the parent repository has no release yet (a
    /// legitimate first run). A missing tag on the tracked repository is an
    /// error: its version is mandatory for every decision this plugin makes.
    async fn latest_tag(&self, repo: &RepoRef) -> Result<Option<String>>;

    /// Creates a hosted release; anything other than HTTP 201 is a failure.
    async fn create_release(&self, repo: &RepoRef, request: &ReleaseRequest) -> Result<()>;
}

/// HTTP-backed implementation of [ReleaseRegistry].
pub struct RegistryClient {
    http: reqwest::Client,
    api_url: String,
}

impl RegistryClient {
    /// Builds the client with the plugin's default headers.
    ///
    /// When git credentials are configured the token doubles as the bearer
    /// token for the release API.
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("track-repo"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        if config.has_credentials() {
            if let Some(token) = &config.git_token {
                let value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|_| TrackRepoError::config("Invalid characters in git token"))?;
                headers.insert(AUTHORIZATION, value);
            }
        }

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(RegistryClient {
            http,
            api_url: config.api_url.clone(),
        })
    }
}

#[async_trait]
impl ReleaseRegistry for RegistryClient {
    async fn latest_tag(&self, repo: &RepoRef) -> Result<Option<String>> {
        let url = repo.latest_release_url(&self.api_url);
        ui::display_debug(&format!("Will try to get \"{}\".", url));

        let response = self.http.get(&url).send().await.map_err(|e| {
            TrackRepoError::fetch(format!(
                "Request for the latest tag of {} failed: {}",
                repo.role.display_name(),
                e
            ))
        })?;

        if !response.status().is_success() {
            return Err(TrackRepoError::fetch(format!(
                "Request for the latest tag of {} failed with status {}",
                repo.role.display_name(),
                response.status()
            )));
        }

        let release: LatestRelease = response.json().await.map_err(|e| {
            TrackRepoError::fetch(format!(
                "Invalid latest-release response for {}: {}",
                repo.role.display_name(),
                e
            ))
        })?;

        match release.tag_name {
            Some(tag) => Ok(Some(tag)),
            None if repo.role == RepoRole::Tracked => Err(TrackRepoError::fetch(format!(
                "Can not parse the version of {}.",
                repo.role.display_name()
            ))),
            None => Ok(None),
        }
    }

    async fn create_release(&self, repo: &RepoRef, request: &ReleaseRequest) -> Result<()> {
        let url = repo.releases_url(&self.api_url);
        ui::display_debug(&format!("Will try to post for new release at \"{}\".", url));

        let response = self.http.post(&url).json(request).send().await?;
        let status = response.status();

        ui::display_debug(&response.text().await.unwrap_or_default());

        if status != StatusCode::CREATED {
            return Err(TrackRepoError::publish(format!(
                "There was an error publishing new release (status {}).",
                status
            )));
        }

        Ok(())
    }
}

/// In-memory registry for testing without network access.
#[derive(Default)]
pub struct MockRegistry {
    parent_tag: Option<String>,
    tracked_tag: Option<String>,
    fail_fetch_for: Option<RepoRole>,
    fail_release: bool,
    created: std::sync::Mutex<Vec<ReleaseRequest>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        MockRegistry::default()
    }

    /// Sets the latest tag returned for one role.
    pub fn set_tag(&mut self, role: RepoRole, tag: Option<&str>) {
        let tag = tag.map(|t| t.to_string());
        match role {
            RepoRole::Parent => self.parent_tag = tag,
            RepoRole::Tracked => self.tracked_tag = tag,
        }
    }

    /// Makes the fetch for one role fail.
    pub fn fail_fetch_for(&mut self, role: RepoRole) {
        self.fail_fetch_for = Some(role);
    }

    /// Makes release creation fail.
    pub fn fail_release(&mut self) {
        self.fail_release = true;
    }

    /// Releases created during the run, in order.
    pub fn created_releases(&self) -> Vec<ReleaseRequest> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReleaseRegistry for MockRegistry {
    async fn latest_tag(&self, repo: &RepoRef) -> Result<Option<String>> {
        if self.fail_fetch_for == Some(repo.role) {
            return Err(TrackRepoError::fetch(format!(
                "Request for the latest tag of {} failed",
                repo.role.display_name()
            )));
        }

        let tag = match repo.role {
            RepoRole::Parent => self.parent_tag.clone(),
            RepoRole::Tracked => self.tracked_tag.clone(),
        };

        match tag {
            Some(tag) => Ok(Some(tag)),
            None if repo.role == RepoRole::Tracked => Err(TrackRepoError::fetch(format!(
                "Can not parse the version of {}.",
                repo.role.display_name()
            ))),
            None => Ok(None),
        }
    }

    async fn create_release(&self, _repo: &RepoRef, request: &ReleaseRequest) -> Result<()> {
        if self.fail_release {
            return Err(TrackRepoError::publish(
                "There was an error publishing new release.",
            ));
        }

        self.created.lock().unwrap().push(request.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_request_body_for_tag_event() {
        let config = test_config();
        let trigger = Trigger {
            event: Some(BuildEvent::Tag),
            branch: Some("main".to_string()),
        };

        let request =
            ReleaseRequest::for_event("v2.0.0", trigger.event.as_ref(), &trigger, &config);
        assert_eq!(request.tag_name, "v2.0.0");
        assert_eq!(request.name, "v2.0.0");
        assert_eq!(request.target_commitish, "main");
        assert!(request.body.contains("owner/tracked"));
        assert!(!request.draft);
        assert!(!request.prerelease);
    }

    #[test]
    fn test_release_request_body_for_incremental_event() {
        let config = test_config();
        let trigger = Trigger {
            event: Some(BuildEvent::Push),
            branch: None,
        };

        let request =
            ReleaseRequest::for_event("1.2.3-0", trigger.event.as_ref(), &trigger, &config);
        assert_eq!(request.target_commitish, "");
        assert_eq!(
            request.body,
            "Incremental update independent of the parent repository."
        );
    }

    #[test]
    fn test_release_request_serializes_expected_fields() {
        let request = ReleaseRequest {
            tag_name: "v1.0.0".to_string(),
            target_commitish: "main".to_string(),
            name: "v1.0.0".to_string(),
            body: "body".to_string(),
            draft: false,
            prerelease: false,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["tag_name"], "v1.0.0");
        assert_eq!(json["target_commitish"], "main");
        assert_eq!(json["draft"], false);
        assert_eq!(json["prerelease"], false);
    }

    #[test]
    fn test_latest_release_parsing() {
        let release: LatestRelease = serde_json::from_str(r#"{"tag_name":"v1.2.3"}"#).unwrap();
        assert_eq!(release.tag_name.as_deref(), Some("v1.2.3"));

        let release: LatestRelease = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert_eq!(release.tag_name, None);
    }

    #[tokio::test]
    async fn test_mock_escalates_missing_tracked_tag() {
        let mock = MockRegistry::new();
        let tracked = RepoRef::new(RepoRole::Tracked, "owner/tracked");
        let parent = RepoRef::new(RepoRole::Parent, "owner/parent");

        assert!(mock.latest_tag(&tracked).await.is_err());
        assert_eq!(mock.latest_tag(&parent).await.unwrap(), None);
    }

    fn test_config() -> Config {
        Config {
            api_url: "https://api.github.com".to_string(),
            this_repo: "owner/parent".to_string(),
            track_repo: "owner/tracked".to_string(),
            release_file: None,
            environment_variable: None,
            do_tag: false,
            do_release: false,
            git_username: None,
            git_token: None,
        }
    }
}

use git2::{Cred, PushOptions, RemoteCallbacks, Repository};

use crate::error::{Result, TrackRepoError};

/// Wrapper around a git2 Repository for the tag-publishing sink.
///
/// Pushes authenticate with the configured username/token over HTTPS, the
/// same credentials the release registry uses.
pub struct GitPublisher {
    repo: Repository,
    username: String,
    token: String,
}

impl GitPublisher {
    /// Opens the repository containing the current working directory.
    ///
    /// # Arguments
    /// * `username` - Git username for pushes and committer identity
    /// * `token` - Access token used as the push password
    ///
    /// # Returns
    /// * `Ok(GitPublisher)` - Successfully initialized repository wrapper
    /// * `Err` - If not in a git repository
    pub fn open(username: String, token: String) -> Result<Self> {
        let repo = Repository::discover(".")
            .map_err(|e| TrackRepoError::publish(format!("Not in a git repository: {}", e)))?;
        Ok(GitPublisher {
            repo,
            username,
            token,
        })
    }

    /// Writes the committer identity into the repository configuration.
    ///
    /// Equivalent of the login step: later tag objects and pushes act as the
    /// configured plugin user.
    pub fn ensure_identity(&self) -> Result<()> {
        let mut config = self.repo.config()?;
        config.set_str("user.name", &self.username)?;
        Ok(())
    }

    /// Creates a lightweight tag at the current HEAD commit.
    ///
    /// # Arguments
    /// * `name` - Name for the new tag (the resolved version string)
    ///
    /// # Returns
    /// * `Ok(())` - Tag created
    /// * `Err` - If HEAD is unborn or the tag already exists
    pub fn create_tag(&self, name: &str) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;
        self.repo.tag_lightweight(name, head.as_object(), false)?;
        Ok(())
    }

    /// Pushes a tag to the `origin` remote.
    ///
    /// Authentication uses plaintext username/token credentials; SSH is not
    /// supported because CI invocations only carry an HTTPS token.
    pub fn push_tag(&self, name: &str) -> Result<()> {
        let mut remote = self
            .repo
            .find_remote("origin")
            .map_err(|_| TrackRepoError::publish("Remote 'origin' not found"))?;

        let mut callbacks = RemoteCallbacks::new();
        let username = self.username.clone();
        let token = self.token.clone();
        callbacks.credentials(move |_url, _username_from_url, _allowed_types| {
            Cred::userpass_plaintext(&username, &token)
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let refspec = format!("refs/tags/{}", name);
        remote.push(&[&refspec], Some(&mut push_options))?;
        Ok(())
    }
}

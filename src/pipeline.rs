//! Pipeline orchestration.
//!
//! Declares the fixed step order, evaluates each step's enablement predicate
//! against the accumulated run context, and stops the whole run on the first
//! step failure. The two version fetches are the only concurrent group; every
//! other step runs strictly in declaration order.

use crate::config::Config;
use crate::context::{BuildEvent, RunContext, Trigger};
use crate::error::{Result, TrackRepoError};
use crate::git_ops::GitPublisher;
use crate::publish;
use crate::registry::{ReleaseRegistry, ReleaseRequest};
use crate::repo::RepoRef;
use crate::resolver;
use crate::ui;

/// One named unit of work in the fixed step order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    GuardBuildEvent,
    FetchLatestTags,
    ResolveIncremental,
    ResolveTagComparison,
    WriteReleaseFile,
    ExportEnvironment,
    GitLogin,
    PushTag,
    CreateRelease,
}

impl StepKind {
    fn title(&self) -> &'static str {
        match self {
            StepKind::GuardBuildEvent => "Checking build event",
            StepKind::FetchLatestTags => "Getting the latest tags",
            StepKind::ResolveIncremental => "Resolving incremental release",
            StepKind::ResolveTagComparison => "Checking whether a new release should be published",
            StepKind::WriteReleaseFile => "Writing to file",
            StepKind::ExportEnvironment => "Writing to environment variable",
            StepKind::GitLogin => "Login to GIT",
            StepKind::PushTag => "Publishing GIT tag",
            StepKind::CreateRelease => "Publishing GIT release",
        }
    }
}

/// Run states; `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    NotStarted,
    FetchingVersions,
    Resolving,
    Publishing,
    Completed,
    Failed,
}

/// Orchestrates one pipeline run; one instance serves exactly one run.
pub struct Pipeline<'a, R: ReleaseRegistry> {
    config: &'a Config,
    trigger: &'a Trigger,
    registry: &'a R,
    parent: RepoRef,
    tracked: RepoRef,
    state: PipelineState,
    git: Option<GitPublisher>,
}

const STEPS: [StepKind; 9] = [
    StepKind::GuardBuildEvent,
    StepKind::FetchLatestTags,
    StepKind::ResolveIncremental,
    StepKind::ResolveTagComparison,
    StepKind::WriteReleaseFile,
    StepKind::ExportEnvironment,
    StepKind::GitLogin,
    StepKind::PushTag,
    StepKind::CreateRelease,
];

impl<'a, R: ReleaseRegistry> Pipeline<'a, R> {
    pub fn new(config: &'a Config, trigger: &'a Trigger, registry: &'a R) -> Self {
        let (parent, tracked) = RepoRef::pair(config);
        Pipeline {
            config,
            trigger,
            registry,
            parent,
            tracked,
            state: PipelineState::NotStarted,
            git: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Runs every enabled step in declaration order, fail-fast.
    ///
    /// Already-applied sinks are not rolled back when a later sink fails.
    pub async fn run(&mut self) -> Result<RunContext> {
        if self.state != PipelineState::NotStarted {
            return Err(TrackRepoError::pipeline(
                "Pipeline instance has already run",
            ));
        }

        let mut ctx = RunContext::new();

        for step in STEPS {
            if !self.enabled(step, &ctx) {
                ui::display_skip(step.title());
                continue;
            }

            self.transition(step);
            if let Err(e) = self.execute(step, &mut ctx).await {
                self.state = PipelineState::Failed;
                return Err(e);
            }
        }

        self.state = PipelineState::Completed;
        Ok(ctx)
    }

    fn transition(&mut self, step: StepKind) {
        self.state = match step {
            StepKind::GuardBuildEvent => PipelineState::NotStarted,
            StepKind::FetchLatestTags => PipelineState::FetchingVersions,
            StepKind::ResolveIncremental | StepKind::ResolveTagComparison => {
                PipelineState::Resolving
            }
            _ => PipelineState::Publishing,
        };
    }

    fn enabled(&self, step: StepKind, ctx: &RunContext) -> bool {
        let resolved = ctx.new_version().is_some();
        let event = self.trigger.event.as_ref();

        match step {
            StepKind::GuardBuildEvent => event.is_none(),
            StepKind::FetchLatestTags => true,
            StepKind::ResolveIncremental => event.is_some_and(|e| e.is_incremental()),
            StepKind::ResolveTagComparison => event.is_some_and(|e| *e == BuildEvent::Tag),
            StepKind::WriteReleaseFile => resolved && self.config.release_file.is_some(),
            StepKind::ExportEnvironment => resolved && self.config.environment_variable.is_some(),
            StepKind::GitLogin => resolved && (self.config.do_tag || self.config.do_release),
            StepKind::PushTag => resolved && self.config.do_tag,
            StepKind::CreateRelease => resolved && self.config.do_release,
        }
    }

    async fn execute(&mut self, step: StepKind, ctx: &mut RunContext) -> Result<()> {
        match step {
            StepKind::GuardBuildEvent => Err(TrackRepoError::pipeline(
                "No DRONE_BUILD_EVENT found. Is this outdated or running outside a CI environment?",
            )),

            StepKind::FetchLatestTags => {
                let (parent_tag, tracked_tag) = tokio::try_join!(
                    self.registry.latest_tag(&self.parent),
                    self.registry.latest_tag(&self.tracked)
                )?;

                ui::display_status(&format!(
                    "Current version of {}: {}",
                    self.parent.role.display_name(),
                    parent_tag.as_deref().unwrap_or("none")
                ));
                ui::display_status(&format!(
                    "Current version of {}: {}",
                    self.tracked.role.display_name(),
                    tracked_tag.as_deref().unwrap_or("none")
                ));

                ctx.parent_version = parent_tag;
                ctx.tracked_version = tracked_tag;
                Ok(())
            }

            StepKind::ResolveIncremental | StepKind::ResolveTagComparison => {
                // enabled() guarantees the event is present here
                let Some(event) = self.trigger.event.as_ref() else {
                    return Err(TrackRepoError::pipeline("Build event disappeared mid-run"));
                };

                let resolution = resolver::resolve(
                    event,
                    &self.parent.slug,
                    ctx.parent_version.as_deref(),
                    ctx.tracked_version.as_deref(),
                );

                match resolution.new_version {
                    Some(version) => {
                        ctx.record_new_version(version);
                        ui::display_success(&resolution.title);
                    }
                    None => ui::display_status(&resolution.title),
                }
                Ok(())
            }

            StepKind::WriteReleaseFile => {
                let (Some(path), Some(version)) =
                    (self.config.release_file.as_deref(), ctx.new_version())
                else {
                    return Ok(());
                };

                publish::write_release_file(path, version)?;
                ui::display_success(&format!("Wrote file \"{}\".", path));
                Ok(())
            }

            StepKind::ExportEnvironment => {
                let (Some(name), Some(version)) = (
                    self.config.environment_variable.as_deref(),
                    ctx.new_version(),
                ) else {
                    return Ok(());
                };

                publish::export_environment(name, version);
                ui::display_success(&format!("Exported environment variable \"{}\".", name));
                Ok(())
            }

            StepKind::GitLogin => {
                if !self.config.has_credentials() {
                    return Err(TrackRepoError::publish(
                        "GIT username and GIT token must be set to enable this functionality.",
                    ));
                }

                // The tag sink needs a repository handle; the release sink
                // authenticates through the registry client instead.
                if self.config.do_tag {
                    let username = self.config.git_username.clone().unwrap_or_default();
                    let token = self.config.git_token.clone().unwrap_or_default();
                    let git = GitPublisher::open(username, token)?;
                    git.ensure_identity()?;
                    self.git = Some(git);
                }
                Ok(())
            }

            StepKind::PushTag => {
                let Some(version) = ctx.new_version() else {
                    return Ok(());
                };
                let Some(git) = self.git.as_ref() else {
                    return Err(TrackRepoError::pipeline("GIT login step did not run"));
                };

                git.create_tag(version)?;
                git.push_tag(version)?;
                ui::display_success("Published a new GIT tag.");
                Ok(())
            }

            StepKind::CreateRelease => {
                let Some(version) = ctx.new_version() else {
                    return Ok(());
                };

                let request = ReleaseRequest::for_event(
                    version,
                    self.trigger.event.as_ref(),
                    self.trigger,
                    self.config,
                );
                self.registry.create_release(&self.parent, &request).await?;
                ui::display_success("Published a new GIT release.");
                Ok(())
            }
        }
    }
}

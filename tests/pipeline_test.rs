// tests/pipeline_test.rs
use serial_test::serial;
use tempfile::TempDir;

use track_repo::config::Config;
use track_repo::context::{BuildEvent, Trigger};
use track_repo::pipeline::{Pipeline, PipelineState};
use track_repo::registry::MockRegistry;
use track_repo::repo::RepoRole;

fn base_config() -> Config {
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

fn trigger(event: BuildEvent) -> Trigger {
    Trigger {
        event: Some(event),
        branch: Some("main".to_string()),
    }
}

#[tokio::test]
async fn test_all_sinks_disabled_still_completes_with_resolved_version() {
    let config = base_config();
    let trigger = trigger(BuildEvent::Push);
    let mut registry = MockRegistry::new();
    registry.set_tag(RepoRole::Parent, Some("1.2.3-4"));
    registry.set_tag(RepoRole::Tracked, Some("2.0.0"));

    let mut pipeline = Pipeline::new(&config, &trigger, &registry);
    let ctx = pipeline.run().await.unwrap();

    assert_eq!(pipeline.state(), PipelineState::Completed);
    assert_eq!(ctx.new_version(), Some("1.2.3-5"));
    assert!(registry.created_releases().is_empty());
}

#[tokio::test]
async fn test_tracked_fetch_failure_fails_before_resolution() {
    let config = base_config();
    let trigger = trigger(BuildEvent::Push);
    let mut registry = MockRegistry::new();
    registry.set_tag(RepoRole::Parent, Some("1.2.3"));
    registry.fail_fetch_for(RepoRole::Tracked);

    let mut pipeline = Pipeline::new(&config, &trigger, &registry);
    let err = pipeline.run().await.unwrap_err();

    assert!(err.to_string().starts_with("Fetch error"));
    assert_eq!(pipeline.state(), PipelineState::Failed);
}

#[tokio::test]
async fn test_missing_tracked_tag_fails_the_run() {
    let config = base_config();
    let trigger = trigger(BuildEvent::Tag);
    let mut registry = MockRegistry::new();
    registry.set_tag(RepoRole::Parent, Some("1.2.3"));
    registry.set_tag(RepoRole::Tracked, None);

    let mut pipeline = Pipeline::new(&config, &trigger, &registry);
    let err = pipeline.run().await.unwrap_err();
    assert!(err.to_string().contains("tracked repository"));
}

#[tokio::test]
async fn test_missing_parent_tag_is_tolerated() {
    let config = base_config();
    let trigger = trigger(BuildEvent::Tag);
    let mut registry = MockRegistry::new();
    registry.set_tag(RepoRole::Parent, None);
    registry.set_tag(RepoRole::Tracked, Some("2.0.0"));

    let mut pipeline = Pipeline::new(&config, &trigger, &registry);
    let ctx = pipeline.run().await.unwrap();
    assert_eq!(ctx.new_version(), Some("v2.0.0"));
}

#[tokio::test]
async fn test_unknown_event_runs_no_sinks() {
    let dir = TempDir::new().unwrap();
    let file_path = dir.path().join(".version");

    let mut config = base_config();
    config.release_file = Some(file_path.to_str().unwrap().to_string());
    config.do_release = true;
    config.git_username = Some("bot".to_string());
    config.git_token = Some("secret".to_string());

    let trigger = trigger(BuildEvent::Other("cron".to_string()));
    let mut registry = MockRegistry::new();
    registry.set_tag(RepoRole::Parent, Some("1.2.3"));
    registry.set_tag(RepoRole::Tracked, Some("2.0.0"));

    let mut pipeline = Pipeline::new(&config, &trigger, &registry);
    let ctx = pipeline.run().await.unwrap();

    assert_eq!(pipeline.state(), PipelineState::Completed);
    assert_eq!(ctx.new_version(), None);
    assert!(!file_path.exists());
    assert!(registry.created_releases().is_empty());
}

#[tokio::test]
async fn test_file_sink_writes_resolved_version() {
    let dir = TempDir::new().unwrap();
    let file_path = dir.path().join(".version");

    let mut config = base_config();
    config.release_file = Some(file_path.to_str().unwrap().to_string());

    let trigger = trigger(BuildEvent::Rollback);
    let mut registry = MockRegistry::new();
    registry.set_tag(RepoRole::Parent, Some("3.1.4"));
    registry.set_tag(RepoRole::Tracked, Some("3.1.4"));

    let mut pipeline = Pipeline::new(&config, &trigger, &registry);
    pipeline.run().await.unwrap();

    assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "3.1.4-0");
}

#[tokio::test]
#[serial]
async fn test_environment_sink_exports_resolved_version() {
    let mut config = base_config();
    config.environment_variable = Some("NEW_RELEASE_VERSION".to_string());

    let trigger = trigger(BuildEvent::Push);
    let mut registry = MockRegistry::new();
    registry.set_tag(RepoRole::Parent, Some("1.0.0"));
    registry.set_tag(RepoRole::Tracked, Some("1.0.0"));

    let mut pipeline = Pipeline::new(&config, &trigger, &registry);
    pipeline.run().await.unwrap();

    assert_eq!(std::env::var("NEW_RELEASE_VERSION").unwrap(), "1.0.0-0");
    std::env::remove_var("NEW_RELEASE_VERSION");
}

#[tokio::test]
async fn test_release_sink_posts_release_for_tag_event() {
    let mut config = base_config();
    config.do_release = true;
    config.git_username = Some("bot".to_string());
    config.git_token = Some("secret".to_string());

    let trigger = trigger(BuildEvent::Tag);
    let mut registry = MockRegistry::new();
    registry.set_tag(RepoRole::Parent, Some("1.0.0"));
    registry.set_tag(RepoRole::Tracked, Some("2.0.0"));

    let mut pipeline = Pipeline::new(&config, &trigger, &registry);
    let ctx = pipeline.run().await.unwrap();
    assert_eq!(ctx.new_version(), Some("v2.0.0"));

    let releases = registry.created_releases();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].tag_name, "v2.0.0");
    assert_eq!(releases[0].name, "v2.0.0");
    assert_eq!(releases[0].target_commitish, "main");
    assert!(releases[0].body.contains("owner/tracked"));
}

#[tokio::test]
async fn test_release_failure_fails_run_without_rollback() {
    let dir = TempDir::new().unwrap();
    let file_path = dir.path().join(".version");

    let mut config = base_config();
    config.release_file = Some(file_path.to_str().unwrap().to_string());
    config.do_release = true;
    config.git_username = Some("bot".to_string());
    config.git_token = Some("secret".to_string());

    let trigger = trigger(BuildEvent::Push);
    let mut registry = MockRegistry::new();
    registry.set_tag(RepoRole::Parent, Some("1.0.0"));
    registry.set_tag(RepoRole::Tracked, Some("1.0.0"));
    registry.fail_release();

    let mut pipeline = Pipeline::new(&config, &trigger, &registry);
    let err = pipeline.run().await.unwrap_err();

    assert!(err.to_string().starts_with("Publish error"));
    assert_eq!(pipeline.state(), PipelineState::Failed);
    // The earlier file sink already ran and is not undone
    assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "1.0.0-0");
}

#[tokio::test]
async fn test_tag_event_equivalence_skips_publishing() {
    let dir = TempDir::new().unwrap();
    let file_path = dir.path().join(".version");

    let mut config = base_config();
    config.release_file = Some(file_path.to_str().unwrap().to_string());

    let trigger = trigger(BuildEvent::Tag);
    let mut registry = MockRegistry::new();
    registry.set_tag(RepoRole::Parent, Some("1.2.3-7"));
    registry.set_tag(RepoRole::Tracked, Some("1.2.3"));

    let mut pipeline = Pipeline::new(&config, &trigger, &registry);
    let ctx = pipeline.run().await.unwrap();

    assert_eq!(pipeline.state(), PipelineState::Completed);
    assert_eq!(ctx.new_version(), None);
    assert!(!file_path.exists());
}

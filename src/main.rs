use clap::Parser;
use std::path::Path;

use track_repo::config::Config;
use track_repo::context::Trigger;
use track_repo::pipeline::Pipeline;
use track_repo::registry::RegistryClient;
use track_repo::ui;

#[derive(clap::Parser)]
#[command(
    name = "track-repo",
    about = "Publish version tags and releases tracking a second repository's releases"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(long, help = "Enable debug output and skip the CI workspace chdir")]
    debug: bool,

    #[arg(short, long, help = "Print version information")]
    version: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if args.version {
        println!("track-repo {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if args.debug {
        std::env::set_var("PLUGIN_LOGLEVEL", "debug");
    } else if Path::new("/drone/src").exists() {
        // CI clones the repository here; git operations expect to run inside it
        if let Err(e) = std::env::set_current_dir("/drone/src") {
            ui::display_error(&format!("Could not enter CI workspace: {}", e));
            std::process::exit(1);
        }
    }

    ui::display_banner();

    // Load configuration; a missing required identifier must not start the pipeline
    let config = match Config::load(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&e.to_string());
            ui::display_error("Can not proceed further.");
            std::process::exit(e.exit_code());
        }
    };

    let trigger = Trigger::from_env();

    let registry = match RegistryClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            ui::display_error(&e.to_string());
            std::process::exit(e.exit_code());
        }
    };

    let mut pipeline = Pipeline::new(&config, &trigger, &registry);
    match pipeline.run().await {
        Ok(ctx) => match ctx.new_version() {
            Some(version) => ui::display_success(&format!("Run finished for version {}.", version)),
            None => ui::display_status("Run finished; no new version to publish."),
        },
        Err(e) => {
            ui::display_error(&e.to_string());
            std::process::exit(e.exit_code());
        }
    }
}

use std::env;

pub fn display_error(message: &str) {
    eprintln!("\x1b[31mERROR:\x1b[0m {}", message); // Red color
}

pub fn display_success(message: &str) {
    println!("\x1b[32m✓\x1b[0m {}", message); // Green color
}

pub fn display_status(message: &str) {
    println!("\x1b[33m→\x1b[0m {}", message); // Yellow color
}

pub fn display_skip(step: &str) {
    println!("\x1b[90m-\x1b[0m {} [skipped]", step); // Gray color
}

/// Debug lines, shown only when PLUGIN_LOGLEVEL=debug.
pub fn display_debug(message: &str) {
    if env::var("PLUGIN_LOGLEVEL").as_deref() == Ok("debug") {
        eprintln!("\x1b[36mDEBUG:\x1b[0m {}", message); // Cyan color
    }
}

pub fn display_banner() {
    println!("\n\x1b[1mtrack-repo\x1b[0m {}", env!("CARGO_PKG_VERSION"));
    println!("Tracks a second repository's releases and publishes matching version tags.\n");
}

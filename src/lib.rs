pub mod config;
pub mod context;
pub mod error;
pub mod git_ops;
pub mod pipeline;
pub mod publish;
pub mod registry;
pub mod repo;
pub mod resolver;
pub mod ui;

pub use error::{Result, TrackRepoError};

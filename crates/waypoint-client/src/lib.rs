//! # waypoint-client
//!
//! Blocking client for the HashiCorp Waypoint HTTP API.
//!
//! This crate provides:
//! - Request/response types for projects, applications, auth methods,
//!   runner profiles and config sources
//! - The [`Waypoint`] trait, the boundary everything else programs against
//! - [`HttpBackend`], which talks to a real server with a bearer token
//! - [`MemoryBackend`], an in-memory server for tests
//!
//! ## Example
//!
//! ```no_run
//! use waypoint_client::{ClientConfig, HttpBackend, Project, Waypoint};
//!
//! let config = ClientConfig::new("localhost:9702", "token");
//! let client = HttpBackend::new(&config).expect("invalid settings");
//!
//! client.upsert_project(&Project::new("web")).expect("upsert failed");
//! match client.get_project("api") {
//!     Ok(project) => println!("found {}", project.name),
//!     Err(e) if e.is_not_found() => println!("no such project"),
//!     Err(e) => eprintln!("{}: {e}", e.category()),
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod config;
pub mod error;
pub mod types;

pub use backend::http::HttpBackend;
pub use backend::{MemoryBackend, Waypoint};
pub use config::{ClientConfig, DEFAULT_TIMEOUT};
pub use error::{Error, ErrorCategory, Result};
pub use types::{
    Application, AuthMethod, ConfigFormat, ConfigSource, DataSource, Git, GitAuth, OidcConfig,
    Poll, Project, ProjectRef, RunnerProfile, TargetRunner, Variable, VariableValue, VersionInfo,
};

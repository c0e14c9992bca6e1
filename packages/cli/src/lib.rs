//! # resfs-cli
//!
//! The `resfs` command line tool.
//!
//! ## Usage
//!
//! ```bash
//! # Build files.json for a project directory
//! resfs manifest web/res
//!
//! # Provision the persistent store for localhost:3000
//! resfs provision --base-url http://localhost:3000/
//!
//! # Inspect the result
//! resfs ls textures
//! resfs cat scene.gltf
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

pub use commands::{run, Command, StoreArgs};
pub use config::CliConfig;
pub use error::{CliError, Result};

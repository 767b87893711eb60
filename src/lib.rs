//! A navigable in-memory model of a directory hierarchy for line-oriented
//! file browsers.
//!
//! The [`Tree`] owns one opened root directory and exposes navigation,
//! selection and filesystem mutations. Every operation borrows a [`Host`]
//! for cursor state, prompts and rendering.

pub mod config;
pub mod error;
pub mod fs;
pub mod host;

pub use config::{AppConfig, TreeSettings};
pub use error::{Result, TreeError};
pub use fs::node::{Directory, File, Node, NodeRef};
pub use fs::tree::Tree;
pub use host::Host;

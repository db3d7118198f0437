//! Packages the built worker artifacts and uploads them to a branch on the tick host.
//!
//! The build itself happens elsewhere; this crate starts from the directory of built artifacts,
//! resolves the target server from a unified credentials file, enforces the host's total code size
//! ceiling, and hands the bundle to an [`Uploader`](upload/trait.Uploader.html).

#![deny(bare_trait_objects)]

pub mod artifact;
pub mod config;
pub mod deploy;
pub mod error;
pub mod upload;

pub use crate::artifact::{CodeBundle, CodeUsage, ModuleSource, SizeLimit};
pub use crate::config::{DeployConfig, ServerTarget};
pub use crate::deploy::{run, DeployOptions, DeployReport};
pub use crate::error::Error;
pub use crate::upload::{DryRun, PayloadWriter, Uploader};

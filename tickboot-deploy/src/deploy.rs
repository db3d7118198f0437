use crate::artifact::{CodeBundle, CodeUsage, SizeLimit};
use crate::config::{DeployConfig, ServerTarget, DEFAULT_CONFIG_PATH};
use crate::error::Error;
use crate::upload::{DryRun, PayloadWriter, Uploader};
use log::info;
use std::path::PathBuf;

pub const DEFAULT_DIST_DIR: &str = "dist";
pub const DEFAULT_PAYLOAD_PATH: &str = "upload.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployOptions {
    pub server: String,
    pub dryrun: bool,
    pub config_path: PathBuf,
    pub dist_dir: PathBuf,
    pub size_limit: SizeLimit,
    pub payload_out: PathBuf,
}

impl DeployOptions {
    /// Options for deploying to `server` with every other setting at its default.
    pub fn new(server: &str) -> Self {
        DeployOptions {
            server: server.to_owned(),
            dryrun: false,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            dist_dir: PathBuf::from(DEFAULT_DIST_DIR),
            size_limit: SizeLimit::default(),
            payload_out: PathBuf::from(DEFAULT_PAYLOAD_PATH),
        }
    }
}

/// What a deploy did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployReport {
    pub target: ServerTarget,
    pub usage: CodeUsage,
    pub module_count: usize,
    pub uploaded: bool,
}

impl std::fmt::Display for DeployReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.uploaded {
            write!(
                f,
                "Deployed {} modules to {} branch {}; using {}",
                self.module_count, self.target.name, self.target.branch, self.usage
            )
        } else {
            write!(
                f,
                "Dry run for {} branch {}; would use {}",
                self.target.name, self.target.branch, self.usage
            )
        }
    }
}

/// Resolve the target, load and check the bundle, and upload it (unless this is a dry run).
pub fn run(opts: &DeployOptions) -> Result<DeployReport, Error> {
    let config = DeployConfig::from_file(&opts.config_path)?;
    let target = config.resolve(&opts.server)?;
    info!(
        "deploying to {} branch {} (minify: {}, extra build options: {:?})",
        target.name, target.branch, target.minify, target.extra_build_options
    );

    let bundle = CodeBundle::load(&opts.dist_dir)?;
    let usage = bundle.check_size(opts.size_limit)?;

    let mut uploader: Box<dyn Uploader> = if opts.dryrun {
        Box::new(DryRun)
    } else {
        Box::new(PayloadWriter::new(&opts.payload_out))
    };
    uploader.upload(&target.branch, &bundle, &usage)?;

    Ok(DeployReport {
        target,
        usage,
        module_count: bundle.modules().len(),
        uploaded: !opts.dryrun,
    })
}

//! Where a checked bundle goes.
//!
//! Talking to the host's code API is left to an external transport. [`PayloadWriter`] produces
//! the exact request body that transport sends.

use crate::artifact::{CodeBundle, CodeUsage, ModuleSource};
use crate::error::Error;
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub trait Uploader {
    fn upload(
        &mut self,
        branch: &str,
        bundle: &CodeBundle,
        usage: &CodeUsage,
    ) -> Result<(), Error>;
}

/// The body of a code upload request.
#[derive(Debug, Serialize)]
pub struct UploadPayload<'a> {
    pub branch: &'a str,
    pub modules: &'a BTreeMap<String, ModuleSource>,
}

/// Does everything except uploading.
#[derive(Clone, Copy, Debug, Default)]
pub struct DryRun;

impl Uploader for DryRun {
    fn upload(
        &mut self,
        _branch: &str,
        _bundle: &CodeBundle,
        usage: &CodeUsage,
    ) -> Result<(), Error> {
        info!("Not uploading due to --dryrun; would use {}", usage);
        Ok(())
    }
}

/// Writes the upload request body as JSON.
#[derive(Clone, Debug)]
pub struct PayloadWriter {
    path: PathBuf,
}

impl PayloadWriter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        PayloadWriter {
            path: path.as_ref().to_owned(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Uploader for PayloadWriter {
    fn upload(
        &mut self,
        branch: &str,
        bundle: &CodeBundle,
        usage: &CodeUsage,
    ) -> Result<(), Error> {
        info!("Uploading to branch {}; using {}", branch, usage);
        let payload = UploadPayload {
            branch,
            modules: bundle.modules(),
        };
        let file = File::create(&self.path).map_err(|e| Error::write(&self.path, e))?;
        let mut w = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut w, &payload).map_err(|source| Error::Payload {
            path: self.path.clone(),
            source,
        })?;
        // dropping a BufWriter discards flush errors
        w.flush().map_err(|e| Error::write(&self.path, e))?;
        info!("upload payload written to {}", self.path.display());
        Ok(())
    }
}

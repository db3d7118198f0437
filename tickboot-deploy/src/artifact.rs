//! Loading the built artifacts and accounting for the host's code size ceiling.

use crate::error::Error;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const MIB: f64 = 1024.0 * 1024.0;

/// The host's ceiling on the total size of uploaded code. (default: 5 MiB)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeLimit(u64);

impl SizeLimit {
    pub const DEFAULT: SizeLimit = SizeLimit(5 * 1024 * 1024);

    pub const fn new(bytes: u64) -> Self {
        SizeLimit(bytes)
    }

    pub fn bytes(&self) -> u64 {
        self.0
    }
}

impl Default for SizeLimit {
    fn default() -> Self {
        SizeLimit::DEFAULT
    }
}

/// How much of the size limit a bundle uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodeUsage {
    pub used_bytes: u64,
    pub limit_bytes: u64,
}

impl CodeUsage {
    pub fn used_mib(&self) -> f64 {
        self.used_bytes as f64 / MIB
    }

    pub fn limit_mib(&self) -> f64 {
        self.limit_bytes as f64 / MIB
    }

    pub fn used_percent(&self) -> f64 {
        if self.limit_bytes == 0 {
            return 100.0;
        }
        100.0 * self.used_bytes as f64 / self.limit_bytes as f64
    }

    pub fn exceeds_limit(&self) -> bool {
        self.used_bytes > self.limit_bytes
    }
}

impl std::fmt::Display for CodeUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.2} MiB of {:.2} MiB code size limit ({:.2}%)",
            self.used_mib(),
            self.limit_mib(),
            self.used_percent()
        )
    }
}

/// One uploaded module, in the shape the host's code API expects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ModuleSource {
    Text(String),
    /// Base64-encoded binary.
    Binary { binary: String },
}

impl ModuleSource {
    /// Bytes this module counts against the size limit.
    pub fn counted_len(&self) -> u64 {
        match self {
            ModuleSource::Text(text) => text.len() as u64,
            ModuleSource::Binary { binary } => binary.len() as u64,
        }
    }
}

/// The contents of a built-artifact directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeBundle {
    modules: BTreeMap<String, ModuleSource>,
    used_bytes: u64,
}

impl CodeBundle {
    /// Read every regular file in `dist_dir`, in file name order.
    ///
    /// `.wasm` files become binary modules named by their stem. Anything else is a text module,
    /// named by its file name with any `.js` suffix removed.
    pub fn load<P: AsRef<Path>>(dist_dir: P) -> Result<Self, Error> {
        let dist_dir = dist_dir.as_ref();
        let mut paths = std::fs::read_dir(dist_dir)
            .map_err(|e| Error::io(dist_dir, e))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<PathBuf>, _>>()
            .map_err(|e| Error::io(dist_dir, e))?;
        paths.retain(|p| p.is_file());
        paths.sort();

        let mut bundle = CodeBundle {
            modules: BTreeMap::new(),
            used_bytes: 0,
        };
        for path in paths {
            let (name, module) = Self::load_module(&path)?;
            log::debug!("{}: {} bytes as module `{}`", path.display(), module.counted_len(), name);
            bundle.insert(name, module);
        }

        if bundle.modules.is_empty() {
            return Err(Error::EmptyBundle(dist_dir.to_owned()));
        }
        Ok(bundle)
    }

    fn load_module(path: &Path) -> Result<(String, ModuleSource), Error> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let data = std::fs::read(path).map_err(|e| Error::io(path, e))?;

        if let Some(stem) = file_name.strip_suffix(".wasm") {
            let binary = base64::encode(&data);
            return Ok((stem.to_owned(), ModuleSource::Binary { binary }));
        }

        let text = String::from_utf8(data).map_err(|source| Error::NotUtf8 {
            path: path.to_owned(),
            source,
        })?;
        let name = file_name.strip_suffix(".js").unwrap_or(&file_name);
        Ok((name.to_owned(), ModuleSource::Text(text)))
    }

    fn insert(&mut self, name: String, module: ModuleSource) {
        self.used_bytes += module.counted_len();
        if let Some(prev) = self.modules.insert(name, module) {
            self.used_bytes -= prev.counted_len();
        }
    }

    pub fn modules(&self) -> &BTreeMap<String, ModuleSource> {
        &self.modules
    }

    pub fn used_bytes(&self) -> u64 {
        self.used_bytes
    }

    pub fn usage(&self, limit: SizeLimit) -> CodeUsage {
        CodeUsage {
            used_bytes: self.used_bytes,
            limit_bytes: limit.bytes(),
        }
    }

    /// Check the bundle against `limit`, returning its usage if it fits.
    pub fn check_size(&self, limit: SizeLimit) -> Result<CodeUsage, Error> {
        let usage = self.usage(limit);
        if usage.exceeds_limit() {
            return Err(Error::SizeLimitExceeded(usage));
        }
        Ok(usage)
    }
}

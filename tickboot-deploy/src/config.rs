//! The unified credentials file.
//!
//! ```yaml
//! servers:
//!   main:
//!     host: screeps.com
//!     secure: true
//!     token: "..."
//!     branch: default
//! configs:
//!   terser:
//!     "*": false
//!     main: true
//!   wasm-pack-options:
//!     "*": ["--no-typescript"]
//!     main: ["--features", "mmo"]
//! ```
//!
//! Only `servers` is required. Per-tool settings under `configs` have a `"*"` entry that applies
//! to every server, and per-server entries that refine it.

use crate::error::Error;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = ".screeps.yaml";
pub const DEFAULT_BRANCH: &str = "default";

const ALL_SERVERS: &str = "*";

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct DeployConfig {
    #[serde(default)]
    pub servers: BTreeMap<String, ServerConfig>,
    #[serde(default)]
    pub configs: ToolConfigs,
}

/// Connection settings for one server.
///
/// Only `branch` is used for deploying; the rest is carried for the upload transport.
#[derive(Clone, Default, PartialEq, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub secure: Option<bool>,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub branch: Option<String>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redact(secret: &Option<String>) -> Option<&'static str> {
            secret.as_ref().map(|_| "<redacted>")
        }
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("token", &redact(&self.token))
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("branch", &self.branch)
            .finish()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ToolConfigs {
    /// Whether to minify the bundled JavaScript.
    #[serde(default)]
    pub terser: BTreeMap<String, bool>,
    /// Extra arguments for the wasm build.
    #[serde(default, rename = "wasm-pack-options")]
    pub wasm_pack_options: BTreeMap<String, Vec<String>>,
}

/// Everything resolved for a single deploy target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerTarget {
    pub name: String,
    pub branch: String,
    pub minify: bool,
    pub extra_build_options: Vec<String>,
}

impl DeployConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&contents).map_err(|source| Error::Config {
            path: path.to_owned(),
            source,
        })
    }

    pub fn parse(yaml: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(yaml)
    }

    /// Resolve the settings for `server`.
    ///
    /// The server's own `configs` entries win over the `"*"` entry for flags; build options are
    /// the `"*"` list followed by the server's list.
    pub fn resolve(&self, server: &str) -> Result<ServerTarget, Error> {
        let server_config = self
            .servers
            .get(server)
            .ok_or_else(|| Error::UnknownServer(server.to_owned()))?;

        let branch = server_config
            .branch
            .clone()
            .unwrap_or_else(|| DEFAULT_BRANCH.to_owned());

        let terser = &self.configs.terser;
        let minify = terser
            .get(server)
            .or_else(|| terser.get(ALL_SERVERS))
            .copied()
            .unwrap_or(false);

        let extra_build_options = [ALL_SERVERS, server]
            .iter()
            .filter_map(|key| self.configs.wasm_pack_options.get(*key))
            .flatten()
            .cloned()
            .collect();

        Ok(ServerTarget {
            name: server.to_owned(),
            branch,
            minify,
            extra_build_options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
servers:
  main:
    host: screeps.com
    secure: true
    token: abc123
    branch: tickboot
  ptr:
    host: screeps.com
    path: /ptr
    token: abc123
configs:
  terser:
    "*": true
    ptr: false
  wasm-pack-options:
    "*": ["--no-typescript"]
    main: ["--features", "mmo"]
"#;

    #[test]
    fn server_settings_override_wildcard() {
        let config = DeployConfig::parse(CONFIG).unwrap();

        let main = config.resolve("main").unwrap();
        assert_eq!(
            main,
            ServerTarget {
                name: "main".to_owned(),
                branch: "tickboot".to_owned(),
                minify: true,
                extra_build_options: vec![
                    "--no-typescript".to_owned(),
                    "--features".to_owned(),
                    "mmo".to_owned()
                ],
            }
        );

        let ptr = config.resolve("ptr").unwrap();
        assert_eq!(ptr.branch, DEFAULT_BRANCH);
        assert!(!ptr.minify);
        assert_eq!(ptr.extra_build_options, vec!["--no-typescript".to_owned()]);
    }

    #[test]
    fn configs_section_is_optional() {
        let config = DeployConfig::parse("servers:\n  local:\n    host: localhost\n").unwrap();
        let local = config.resolve("local").unwrap();
        assert!(!local.minify);
        assert!(local.extra_build_options.is_empty());
    }

    #[test]
    fn unknown_server() {
        let config = DeployConfig::parse(CONFIG).unwrap();
        match config.resolve("season") {
            Err(Error::UnknownServer(name)) => assert_eq!(name, "season"),
            res => panic!("unexpected result: {:?}", res),
        }
    }

    #[test]
    fn secrets_are_not_debug_printed() {
        let config = DeployConfig::parse(CONFIG).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("abc123"));
        assert!(debug.contains("<redacted>"));
    }
}

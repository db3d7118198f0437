use anyhow::Error;
use clap::{Arg, ArgMatches};
use std::path::PathBuf;
use tickboot_deploy::config::DEFAULT_CONFIG_PATH;
use tickboot_deploy::deploy::{DEFAULT_DIST_DIR, DEFAULT_PAYLOAD_PATH};
use tickboot_deploy::{DeployOptions, SizeLimit};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorStyle {
    Human,
    Json,
}

impl Default for ErrorStyle {
    fn default() -> Self {
        ErrorStyle::Human
    }
}

fn parse_humansized(desc: &str) -> Result<u64, Error> {
    use human_size::{Byte, ParsingError, Size, SpecificSize};
    match desc.parse::<Size>() {
        Ok(s) => {
            let bytes: SpecificSize<Byte> = s.into();
            Ok(bytes.value() as u64)
        }
        Err(ParsingError::MissingMultiple) => Ok(desc.parse::<u64>()?),
        Err(e) => Err(e)?,
    }
}

fn humansized(bytes: u64) -> String {
    use human_size::{Byte, Mebibyte, SpecificSize};
    let bytes = SpecificSize::new(bytes as f64, Byte).expect("bytes");
    let mb: SpecificSize<Mebibyte> = bytes.into();
    mb.to_string()
}

#[derive(Debug)]
pub struct Options {
    pub deploy: DeployOptions,
    pub error_style: ErrorStyle,
}

impl Options {
    pub fn from_args(m: &ArgMatches<'_>) -> Result<Self, Error> {
        let server = m.value_of("server").unwrap_or_default();
        let mut deploy = DeployOptions::new(server);

        deploy.dryrun = m.is_present("dryrun");

        if let Some(config) = m.value_of("config") {
            deploy.config_path = PathBuf::from(config);
        }

        if let Some(dist) = m.value_of("dist") {
            deploy.dist_dir = PathBuf::from(dist);
        }

        if let Some(size_limit) = m.value_of("size_limit") {
            deploy.size_limit = SizeLimit::new(parse_humansized(size_limit)?);
        }

        if let Some(payload_out) = m.value_of("payload_out") {
            deploy.payload_out = PathBuf::from(payload_out);
        }

        let error_style = match m.value_of("error_style") {
            None => ErrorStyle::default(),
            Some("human") => ErrorStyle::Human,
            Some("json") => ErrorStyle::Json,
            Some(_) => panic!("unknown value for error-style"),
        };

        Ok(Options {
            deploy,
            error_style,
        })
    }

    pub fn get() -> Result<Self, Error> {
        let _ = include_str!("../Cargo.toml");
        let m = app_from_crate!()
            .arg(
                Arg::with_name("server")
                    .long("server")
                    .takes_value(true)
                    .required(true)
                    .help("server to deploy to; must be defined in the servers section of the config file"),
            )
            .arg(
                Arg::with_name("dryrun")
                    .long("dryrun")
                    .takes_value(false)
                    .help("do everything except the upload of the built code"),
            )
            .arg(
                Arg::with_name("config")
                    .long("config")
                    .takes_value(true)
                    .help(&format!("path to the credentials file (default: {})", DEFAULT_CONFIG_PATH)),
            )
            .arg(
                Arg::with_name("dist")
                    .long("dist")
                    .takes_value(true)
                    .help(&format!("directory of built artifacts (default: {})", DEFAULT_DIST_DIR)),
            )
            .arg(
                Arg::with_name("size_limit")
                    .long("size-limit")
                    .takes_value(true)
                    .help(&format!(
                        "total code size allowed by the host. default: {}",
                        humansized(SizeLimit::DEFAULT.bytes())
                    )),
            )
            .arg(
                Arg::with_name("payload_out")
                    .long("payload-out")
                    .takes_value(true)
                    .help(&format!(
                        "where to write the upload request body (default: {})",
                        DEFAULT_PAYLOAD_PATH
                    )),
            )
            .arg(
                Arg::with_name("error_style")
                    .long("error-style")
                    .takes_value(true)
                    .possible_values(&["human", "json"])
                    .help("Style of error reporting (default: human)"),
            )
            .get_matches();

        Self::from_args(&m)
    }
}

mod options;

#[macro_use]
extern crate clap;

use crate::options::{ErrorStyle, Options};
use anyhow::Error;
use log::info;
use serde::Serialize;
use std::process;

#[derive(Clone, Debug, Serialize)]
pub struct SerializedDeployError {
    error: String,
}

impl From<&Error> for SerializedDeployError {
    fn from(e: &Error) -> Self {
        SerializedDeployError {
            error: format!("{:#}", e),
        }
    }
}

fn main() {
    env_logger::init();

    let opts = match Options::get() {
        Ok(opts) => opts,
        Err(err) => {
            eprintln!("Error: {}\n", err);
            process::exit(1);
        }
    };

    if let Err(err) = run(&opts) {
        match opts.error_style {
            ErrorStyle::Human => {
                eprintln!("Error: {:#}\n", err);
            }
            ErrorStyle::Json => {
                let errs: Vec<SerializedDeployError> = vec![(&err).into()];
                match serde_json::to_string(&errs) {
                    Ok(json) => eprintln!("{}", json),
                    Err(_) => eprintln!("Error: {:#}\n", err),
                }
            }
        }
        process::exit(1);
    }
}

pub fn run(opts: &Options) -> Result<(), Error> {
    info!("tickboot-deploy {:?}", opts);
    let report = tickboot_deploy::run(&opts.deploy)?;
    println!("{}", report);
    Ok(())
}

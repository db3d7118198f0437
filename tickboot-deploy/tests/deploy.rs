use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tickboot_deploy::{run, DeployOptions, Error, SizeLimit};

const CONFIG: &str = r#"
servers:
  main:
    host: screeps.com
    secure: true
    token: abc123
    branch: tickboot
  local:
    host: localhost
    port: 21025
    username: dev
    password: hunter2
configs:
  terser:
    "*": true
"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        fs::write(dir.path().join(".screeps.yaml"), CONFIG).expect("write config");
        let dist = dir.path().join("dist");
        fs::create_dir(&dist).expect("create dist");
        fs::write(dist.join("main.js"), "module.exports.loop = function() {};\n")
            .expect("write main.js");
        fs::write(dist.join("tickboot.wasm"), b"\0asm\x01\0\0\0").expect("write wasm");
        Workspace { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn options(&self, server: &str) -> DeployOptions {
        let mut opts = DeployOptions::new(server);
        opts.config_path = self.path().join(".screeps.yaml");
        opts.dist_dir = self.path().join("dist");
        opts.payload_out = self.path().join("upload.json");
        opts
    }
}

#[test]
fn dry_run_writes_nothing() {
    let ws = Workspace::new();
    let mut opts = ws.options("main");
    opts.dryrun = true;

    let report = run(&opts).expect("dry run succeeds");
    assert!(!report.uploaded);
    assert_eq!(report.target.branch, "tickboot");
    assert!(report.target.minify);
    assert_eq!(report.module_count, 2);
    assert!(!opts.payload_out.exists());
    assert!(report.to_string().starts_with("Dry run for main branch tickboot; would use "));
}

#[test]
fn payload_has_text_and_binary_modules() {
    let ws = Workspace::new();
    let opts = ws.options("local");

    let report = run(&opts).expect("deploy succeeds");
    assert!(report.uploaded);
    assert_eq!(report.target.branch, "default");

    let payload: Value =
        serde_json::from_str(&fs::read_to_string(&opts.payload_out).unwrap()).unwrap();
    assert_eq!(payload["branch"], "default");
    assert_eq!(
        payload["modules"]["main"],
        "module.exports.loop = function() {};\n"
    );
    assert_eq!(payload["modules"]["tickboot"]["binary"], "AGFzbQEAAAA=");
    assert_eq!(report.usage.used_bytes, 37 + 12);
}

#[test]
fn oversized_bundle_is_not_uploaded() {
    let ws = Workspace::new();
    let mut opts = ws.options("main");
    opts.size_limit = SizeLimit::new(16);

    match run(&opts) {
        Err(Error::SizeLimitExceeded(usage)) => {
            assert_eq!(usage.limit_bytes, 16);
            assert!(usage.used_percent() > 100.0);
        }
        res => panic!("unexpected result: {:?}", res),
    }
    assert!(!opts.payload_out.exists());
}

#[test]
fn unknown_server_is_reported() {
    let ws = Workspace::new();
    match run(&ws.options("season")) {
        Err(Error::UnknownServer(server)) => assert_eq!(server, "season"),
        res => panic!("unexpected result: {:?}", res),
    }
}

#[test]
fn missing_config_file() {
    let ws = Workspace::new();
    let mut opts = ws.options("main");
    opts.config_path = ws.path().join("missing.yaml");
    match run(&opts) {
        Err(Error::Io { path, .. }) => assert_eq!(path, opts.config_path),
        res => panic!("unexpected result: {:?}", res),
    }
}

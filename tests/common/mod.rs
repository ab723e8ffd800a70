// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use cellar::hash::sha256_file;
use cellar::recipe::kitchen::{CommandOutput, CommandRunner, CommandSpec};
use cellar::recipe::{parse_formula_file, Formula};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Site directory used instead of asking a real interpreter
pub const SITE_PACKAGES: &str = "lib/python3.9/site-packages";

type Responder = Box<dyn Fn(&CommandSpec) -> CommandOutput + Send + Sync>;

/// Runner that records every command instead of spawning it.
///
/// The responder decides the output and may create files to stand in for
/// what the real command would have installed.
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    responder: Responder,
}

impl RecordingRunner {
    /// Every command succeeds with empty output
    pub fn succeeding() -> Self {
        Self::with(|_| ok(""))
    }

    pub fn with<F>(responder: F) -> Self
    where
        F: Fn(&CommandSpec) -> CommandOutput + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> cellar::Result<CommandOutput> {
        self.calls.lock().unwrap().push(spec.clone());
        Ok((self.responder)(spec))
    }
}

pub fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn failed(code: i32, stderr: &str) -> CommandOutput {
    CommandOutput {
        code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

/// Build `<dir>/<name>` as a gzipped tarball holding `files` under `top/`.
///
/// Each entry is (relative path, contents, mode).
pub fn build_tarball(dir: &Path, name: &str, top: &str, files: &[(&str, &str, u32)]) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).unwrap();
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (rel, contents, mode) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(*mode);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{}/{}", top, rel), contents.as_bytes())
            .unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap();
    path
}

pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

pub fn checksum_of(path: &Path) -> String {
    format!("sha256:{}", sha256_file(path).unwrap())
}

/// The notmuch formula shipped in `formulae/`
pub fn notmuch_formula() -> Formula {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("formulae/notmuch.toml");
    parse_formula_file(&path).unwrap()
}

/// Files of a stand-in notmuch source tree
pub const NOTMUCH_TREE: &[(&str, &str, u32)] = &[
    ("configure", "#!/bin/sh\nexit 0\n", 0o755),
    ("Makefile", "all:\n", 0o644),
    ("emacs/notmuch.el", ";; notmuch\n", 0o644),
    ("emacs/notmuch-lib.el", ";; notmuch-lib\n", 0o644),
    ("completion/notmuch-completion.bash", "# completion\n", 0o644),
    ("vim/notmuch.vim", "\" plugin\n", 0o644),
    ("vim/notmuch.txt", "*notmuch.txt*\n", 0o644),
    ("vim/syntax/notmuch-show.vim", "\" syntax\n", 0o644),
    ("bindings/python/setup.py", "# setup\n", 0o644),
    ("bindings/python-cffi/setup.py", "# setup\n", 0o644),
];

/// Point the formula's source and resources at local fixture archives
pub fn localize(formula: &mut Formula, dir: &Path) {
    let archive = build_tarball(dir, "notmuch-0.36.tar.gz", "notmuch-0.36", NOTMUCH_TREE);
    formula.source.url = file_url(&archive);
    formula.source.checksum = checksum_of(&archive);

    for resource in &mut formula.resources {
        let name = format!("{}.tar.gz", resource.name);
        let setup = format!("# {}\n", resource.name);
        let archive = build_tarball(
            dir,
            &name,
            &resource.name,
            &[("setup.py", setup.as_str(), 0o644)],
        );
        resource.url = file_url(&archive);
        resource.checksum = checksum_of(&archive);
    }
}

/// Responder standing in for the notmuch build: `setup.py install`
/// writes the legacy binding's globals.py into the keg
pub fn notmuch_responder(spec: &CommandSpec) -> CommandOutput {
    if spec.args.iter().any(|a| a == "--single-version-externally-managed") {
        let prefix = spec
            .args
            .iter()
            .find_map(|a| a.strip_prefix("--prefix="))
            .unwrap();
        let dir = Path::new(prefix).join(SITE_PACKAGES).join("notmuch");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("globals.py"),
            "nmlib = CDLL(\"libnotmuch.{0:s}.dylib\".format(SOVERSION))\n",
        )
        .unwrap();
    }
    ok("")
}

// tests/cook.rs

//! Cooking the notmuch formula against a recording runner.
//!
//! Sources and resources are local fixture archives; no compiler or
//! interpreter runs, so these tests observe exactly which commands a cook
//! issues and what lands in the keg.

mod common;

use cellar::platform::{Arch, OsFamily, Platform};
use cellar::recipe::kitchen::{DependencyResolver, OptResolver};
use cellar::recipe::receipt::{BuiltFrom, InstallReceipt};
use cellar::recipe::{
    BindingTarget, CookOptions, DepKind, Dependency, Formula, InstallStep, Kitchen, KitchenConfig,
};
use cellar::Error;
use common::{RecordingRunner, SITE_PACKAGES};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn linux() -> Platform {
    Platform::new(OsFamily::Linux, Arch::X86_64)
}

struct Setup {
    _dir: TempDir,
    root: PathBuf,
    formula: Formula,
}

fn setup() -> Setup {
    let dir = tempfile::tempdir().unwrap();
    let fixtures = dir.path().join("fixtures");
    fs::create_dir_all(&fixtures).unwrap();

    let mut formula = common::notmuch_formula();
    common::localize(&mut formula, &fixtures);

    Setup {
        root: dir.path().join("root"),
        _dir: dir,
        formula,
    }
}

fn kitchen(root: &Path, runner: &Arc<RecordingRunner>) -> Kitchen {
    let mut config = KitchenConfig::with_root(root);
    config.site_packages = Some(SITE_PACKAGES.to_string());
    config.jobs = 2;
    Kitchen::with_runner(config, runner.clone())
}

/// Create an opt directory for every dependency
fn install_deps(root: &Path, formula: &Formula) {
    for dep in &formula.dependencies {
        fs::create_dir_all(root.join("opt").join(&dep.name)).unwrap();
    }
}

fn options() -> CookOptions {
    CookOptions::for_platform(linux())
}

fn skip_deps() -> CookOptions {
    CookOptions {
        skip_deps: true,
        ..options()
    }
}

#[test]
fn test_cook_runs_commands_in_order() {
    let s = setup();
    install_deps(&s.root, &s.formula);
    let runner = Arc::new(RecordingRunner::with(common::notmuch_responder));
    let kitchen = kitchen(&s.root, &runner);

    let result = kitchen.cook(&s.formula, &options()).unwrap();
    let prefix = s.root.join("Cellar/notmuch/0.36_1");
    assert_eq!(result.prefix, prefix);
    assert_eq!(result.pkg_version, "0.36_1");

    let calls = runner.calls();
    let pip = prefix.join("libexec/bin/pip").display().to_string();
    let programs: Vec<&str> = calls.iter().map(|c| c.program.as_str()).collect();
    assert_eq!(programs.len(), 6);
    assert!(programs[0].ends_with("/configure"));
    assert_eq!(
        programs[1..],
        ["make", "python3", "python3", pip.as_str(), pip.as_str()]
    );

    let configure = &calls[0];
    assert!(configure.args.contains(&format!("--prefix={}", prefix.display())));
    assert!(configure.args.contains(&format!(
        "--emacslispdir={}",
        prefix.join("share/emacs/site-lisp/notmuch").display()
    )));
    assert!(configure.args.contains(&"--without-ruby".to_string()));
    assert_eq!(configure.env.get("CXXFLAGS").map(String::as_str), Some("-std=c++11"));
    assert_eq!(configure.env.get("MAKEFLAGS").map(String::as_str), Some("-j2"));

    // env_path ran before configure
    let sphinx_site = s.root.join("opt/sphinx-doc/libexec").join(SITE_PACKAGES);
    assert!(
        configure.env["PYTHONPATH"].ends_with(&sphinx_site.display().to_string()),
        "PYTHONPATH was {}",
        configure.env["PYTHONPATH"]
    );

    assert_eq!(calls[1].args, ["V=1", "install"]);

    let setup_py = &calls[2];
    assert!(setup_py.cwd.ends_with("bindings/python"));
    assert!(setup_py.args.contains(&"--single-version-externally-managed".to_string()));
    let shared_site = prefix.join(SITE_PACKAGES).display().to_string();
    assert!(setup_py.env["PYTHONPATH"].contains(&shared_site));

    let venv = &calls[3];
    assert_eq!(venv.args[..2], ["-m", "venv"]);
    assert_eq!(venv.args[2], prefix.join("libexec").display().to_string());

    // Resources first, in declared order, then the package
    let resources = &calls[4].args;
    let cffi = resources.iter().position(|a| a.ends_with("cffi.tar.gz")).unwrap();
    let pycparser = resources.iter().position(|a| a.ends_with("pycparser.tar.gz")).unwrap();
    assert!(cffi < pycparser);
    assert!(calls[5].args.last().unwrap().ends_with("bindings/python-cffi"));
}

#[test]
fn test_cook_produces_keg_layout() {
    let s = setup();
    let runner = Arc::new(RecordingRunner::with(common::notmuch_responder));
    let kitchen = kitchen(&s.root, &runner);

    let result = kitchen.cook(&s.formula, &skip_deps()).unwrap();
    let layout = &result.layout;

    for path in [
        "share/emacs/site-lisp/notmuch/notmuch.el",
        "share/emacs/site-lisp/notmuch/notmuch-lib.el",
        "etc/bash_completion.d/notmuch-completion.bash",
        "vim/plugin/notmuch.vim",
        "vim/doc/notmuch.txt",
        "vim/syntax/notmuch-show.vim",
        "lib/python3.9/site-packages/notmuch/globals.py",
        "INSTALL_RECEIPT.json",
    ] {
        assert!(layout.contains(path), "missing {}", path);
    }

    let globals = fs::read_to_string(
        result
            .prefix
            .join("lib/python3.9/site-packages/notmuch/globals.py"),
    )
    .unwrap();
    let opt_lib = s.root.join("opt/notmuch/lib");
    assert!(globals.contains(&format!("{}/libnotmuch.{{0:s}}.dylib", opt_lib.display())));
    assert!(!globals.contains("CDLL(\"libnotmuch"));
}

#[test]
fn test_cook_records_bindings_and_receipt() {
    let s = setup();
    let runner = Arc::new(RecordingRunner::with(common::notmuch_responder));
    let kitchen = kitchen(&s.root, &runner);

    let result = kitchen.cook(&s.formula, &skip_deps()).unwrap();
    let prefix = &result.prefix;

    assert_eq!(
        result.bindings,
        [
            BindingTarget::shared(prefix, SITE_PACKAGES),
            BindingTarget::isolated(&prefix.join("libexec"), SITE_PACKAGES),
        ]
    );
    assert_eq!(result.bindings[0].search_path(), None);
    assert_eq!(
        result.bindings[1].search_path(),
        Some(prefix.join("libexec").join(SITE_PACKAGES).as_path())
    );

    let caveats = result.caveats.as_deref().unwrap();
    let expected = s.root.join("opt/notmuch/libexec").join(SITE_PACKAGES);
    assert!(caveats.contains(&expected.display().to_string()));
    assert!(caveats.contains("notmuch2"));

    let receipt = InstallReceipt::read(prefix).unwrap();
    assert_eq!(receipt.name, "notmuch");
    assert_eq!(receipt.pkg_version, "0.36_1");
    assert_eq!(receipt.platform, "x86_64_linux");
    assert_eq!(receipt.bindings, result.bindings);
    match receipt.built_from {
        BuiltFrom::Source { checksum, .. } => assert_eq!(checksum, s.formula.source.checksum),
        other => panic!("unexpected origin {:?}", other),
    }
}

#[test]
fn test_cook_links_opt_prefix() {
    let s = setup();
    let runner = Arc::new(RecordingRunner::with(common::notmuch_responder));
    let kitchen = kitchen(&s.root, &runner);

    let result = kitchen.cook(&s.formula, &skip_deps()).unwrap();
    let opt = s.root.join("opt/notmuch");
    assert_eq!(result.opt_prefix, opt);
    assert_eq!(fs::read_link(&opt).unwrap(), result.prefix);

    // The inreplaced library path now resolves through the link
    assert!(opt.join("lib/python3.9/site-packages/notmuch/globals.py").exists());

    // Later cooks that depend on notmuch find it
    let dep = Dependency {
        name: "notmuch".to_string(),
        kind: DepKind::Runtime,
        uses_from_macos: false,
        since: None,
    };
    assert_eq!(OptResolver::new(&s.root).locate(&dep).unwrap(), Some(opt));
}

#[test]
fn test_step_target_outside_keg_rejected() {
    let mut s = setup();
    s.formula.install.insert(
        0,
        InstallStep::InstallFiles {
            files: vec!["vim/notmuch.vim".to_string()],
            into: "%(prefix)s/../../../../outside".to_string(),
            rename: None,
        },
    );
    let runner = Arc::new(RecordingRunner::with(common::notmuch_responder));
    let kitchen = kitchen(&s.root, &runner);

    let err = kitchen.cook(&s.formula, &skip_deps()).unwrap_err();
    assert!(matches!(err, Error::ValidationError(_)), "got {:?}", err);

    // <root>/Cellar/notmuch/0.36_1/../../../.. is the directory holding root
    let escaped = s.root.parent().unwrap().join("outside");
    assert!(!escaped.exists());
    assert!(runner.calls().is_empty());
}

#[test]
fn test_caveats_with_configured_site_packages() {
    let s = setup();
    let runner = Arc::new(RecordingRunner::succeeding());
    let kitchen = kitchen(&s.root, &runner);

    let text = kitchen.caveats(&s.formula, false).unwrap().unwrap();
    let expected = s.root.join("opt/notmuch/libexec").join(SITE_PACKAGES);
    assert!(text.contains(&expected.display().to_string()));

    // No interpreter was asked
    assert!(runner.calls().is_empty());
}

#[test]
fn test_keep_builddir_survives_cook() {
    let s = setup();
    let runner = Arc::new(RecordingRunner::with(common::notmuch_responder));
    let mut config = KitchenConfig::with_root(&s.root);
    config.site_packages = Some(SITE_PACKAGES.to_string());
    config.keep_builddir = true;
    let kitchen = Kitchen::with_runner(config, runner.clone());

    let result = kitchen.cook(&s.formula, &skip_deps()).unwrap();
    let kept = result.build_dir.unwrap();
    assert!(kept.is_dir());
    assert!(Path::new(&runner.calls()[0].program).starts_with(&kept));
    fs::remove_dir_all(kept).unwrap();

    let result = crate::kitchen(&s.root, &runner).cook(&s.formula, &skip_deps()).unwrap();
    assert!(result.build_dir.is_none());
}

#[test]
fn test_recook_is_idempotent() {
    let s = setup();
    let runner = Arc::new(RecordingRunner::with(common::notmuch_responder));
    let kitchen = kitchen(&s.root, &runner);

    let first = kitchen.cook(&s.formula, &skip_deps()).unwrap();

    // Leftovers from an earlier install do not survive a re-cook
    fs::write(first.prefix.join("stale.txt"), "old").unwrap();

    let second = kitchen.cook(&s.formula, &skip_deps()).unwrap();
    assert!(!second.layout.contains("stale.txt"));
    assert_eq!(first.layout.digest(), second.layout.digest());
    assert_eq!(first.layout.len(), second.layout.len());
}

#[test]
fn test_failed_step_aborts_cook() {
    let s = setup();
    let runner = Arc::new(RecordingRunner::with(|spec| {
        if spec.program == "make" {
            common::failed(2, "make: *** No rule to make target 'install'.")
        } else {
            common::notmuch_responder(spec)
        }
    }));
    let kitchen = kitchen(&s.root, &runner);

    let err = kitchen.cook(&s.formula, &skip_deps()).unwrap_err();
    match err {
        Error::BuildFailed {
            step, kind, stderr, ..
        } => {
            assert_eq!(step, 3);
            assert_eq!(kind, "make");
            assert!(stderr.contains("No rule"));
        }
        other => panic!("unexpected error {:?}", other),
    }

    // Nothing after make ran
    assert_eq!(runner.calls().len(), 2);
    assert!(!s.root.join("Cellar/notmuch/0.36_1").join("INSTALL_RECEIPT.json").exists());
}

#[test]
fn test_missing_dependencies_abort_before_fetch() {
    let s = setup();
    let runner = Arc::new(RecordingRunner::succeeding());
    let kitchen = kitchen(&s.root, &runner);

    let err = kitchen.cook(&s.formula, &options()).unwrap_err();
    match err {
        Error::MissingDependency(missing) => {
            for name in ["glib", "gmime", "python@3.9", "talloc", "xapian", "zlib"] {
                assert!(missing.contains(&name.to_string()), "{} not reported", name);
            }
        }
        other => panic!("unexpected error {:?}", other),
    }

    assert!(runner.calls().is_empty());
    assert!(!s.root.join("Cellar").exists());
}

#[test]
fn test_checksum_mismatch_aborts_cook() {
    let mut s = setup();
    s.formula.source.checksum = format!("sha256:{}", "0".repeat(64));
    let runner = Arc::new(RecordingRunner::succeeding());
    let kitchen = kitchen(&s.root, &runner);

    let err = kitchen.cook(&s.formula, &skip_deps()).unwrap_err();
    assert!(matches!(err, Error::ChecksumMismatch { .. }), "got {:?}", err);

    assert!(runner.calls().is_empty());
    assert!(!s.root.join("Cellar/notmuch").exists());
    let cached: Vec<_> = fs::read_dir(s.root.join("cache/sources")).unwrap().collect();
    assert!(cached.is_empty());
}

#[test]
fn test_head_cook_clones_branch() {
    let s = setup();
    let runner = Arc::new(RecordingRunner::with(|spec| {
        if spec.program == "git" {
            let source = spec.cwd.join("source");
            for (rel, contents, _) in common::NOTMUCH_TREE {
                let path = source.join(rel);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(path, contents).unwrap();
            }
            return common::ok("");
        }
        common::notmuch_responder(spec)
    }));
    let kitchen = kitchen(&s.root, &runner);

    let options = CookOptions {
        head: true,
        ..skip_deps()
    };
    let stable = kitchen.cook(&s.formula, &skip_deps()).unwrap();
    let opt = s.root.join("opt/notmuch");
    assert_eq!(fs::read_link(&opt).unwrap(), stable.prefix);
    let cooked = runner.calls().len();

    let result = kitchen.cook(&s.formula, &options).unwrap();
    assert_eq!(result.prefix, s.root.join("Cellar/notmuch/HEAD"));
    assert!(result.from_head);
    assert_eq!(fs::read_link(&opt).unwrap(), result.prefix);

    let clone = &runner.calls()[cooked];
    assert_eq!(clone.program, "git");
    assert_eq!(
        clone.args,
        [
            "clone",
            "--depth",
            "1",
            "--branch",
            "master",
            "https://git.notmuchmail.org/git/notmuch",
            "source",
        ]
    );

    let receipt = InstallReceipt::read(&result.prefix).unwrap();
    assert_eq!(
        receipt.built_from,
        BuiltFrom::Head {
            url: "https://git.notmuchmail.org/git/notmuch".to_string(),
            branch: "master".to_string(),
        }
    );
}

#[test]
fn test_taste_after_cook() {
    let s = setup();
    let runner = Arc::new(RecordingRunner::with(|spec| {
        if spec.program.ends_with("/bin/notmuch") {
            let config = fs::read_to_string(spec.cwd.join(".notmuch-config")).unwrap();
            let mail = spec.cwd.join("Mail");
            assert_eq!(config, format!("[database]\npath={}\n", mail.display()));
            assert!(mail.is_dir());
            return common::ok("Found 0 total files (that's not much mail).\n");
        }
        common::notmuch_responder(spec)
    }));
    let kitchen = kitchen(&s.root, &runner);

    let result = kitchen.cook(&s.formula, &skip_deps()).unwrap();
    let cooked = runner.calls().len();

    let report = kitchen.taste(&s.formula, false).unwrap();
    assert_eq!(report.len(), 5);

    let calls = runner.calls();
    let checks = &calls[cooked..];
    assert_eq!(checks.len(), 3);
    assert_eq!(checks[0].program, result.prefix.join("bin/notmuch").display().to_string());
    assert_eq!(checks[0].args, ["new"]);

    // Only the notmuch2 import sees the isolated site directory
    assert_eq!(checks[1].args, ["-c", "import notmuch"]);
    assert!(!checks[1].env.contains_key("PYTHONPATH"));
    assert_eq!(checks[1].unset, ["PYTHONPATH"]);
    assert_eq!(checks[2].args, ["-c", "import notmuch2"]);
    assert!(checks[2].unset.is_empty());
    assert_eq!(
        checks[2].env["PYTHONPATH"],
        result.prefix.join("libexec").join(SITE_PACKAGES).display().to_string()
    );
}

#[test]
fn test_taste_requires_zero_total() {
    let s = setup();
    let runner = Arc::new(RecordingRunner::with(|spec| {
        if spec.program.ends_with("/bin/notmuch") {
            return common::ok("Found 3 total files.\n");
        }
        common::notmuch_responder(spec)
    }));
    let kitchen = kitchen(&s.root, &runner);
    kitchen.cook(&s.formula, &skip_deps()).unwrap();

    let err = kitchen.taste(&s.formula, false).unwrap_err();
    match err {
        Error::TestFailed { index, reason } => {
            assert_eq!(index, 3);
            assert!(reason.contains("0 total"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_fetch_then_offline() {
    let s = setup();
    let runner = Arc::new(RecordingRunner::succeeding());
    let kitchen = kitchen(&s.root, &runner);

    assert!(!kitchen.sources_cached(&s.formula));
    let fetched = kitchen.fetch(&s.formula).unwrap();
    assert_eq!(fetched.len(), 3);
    assert!(kitchen.sources_cached(&s.formula));
}

// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: formula file
fn formula_arg() -> Arg {
    Arg::new("formula")
        .required(true)
        .help("Path to the formula file")
}

/// Common argument: build or test the head keg
fn head_arg() -> Arg {
    Arg::new("head")
        .long("head")
        .action(ArgAction::SetTrue)
        .help("Use the development head instead of the release")
}

fn python_arg() -> Arg {
    Arg::new("python")
        .long("python")
        .value_name("PATH")
        .help("Python interpreter for binding steps and tests")
}

fn site_packages_arg() -> Arg {
    Arg::new("site_packages")
        .long("site-packages")
        .value_name("DIR")
        .help("Relative site-packages directory (skips asking the interpreter)")
}

fn build_cli() -> Command {
    Command::new("cellar")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Cellar Contributors")
        .about("Cook, verify and inspect source formulas")
        .subcommand_required(true)
        .arg(
            Arg::new("root")
                .long("root")
                .global(true)
                .default_value("/opt/cellar")
                .help("Root holding Cellar/ and opt/"),
        )
        .arg(
            Arg::new("cache")
                .long("cache")
                .global(true)
                .help("Directory for downloaded sources"),
        )
        .subcommand(
            Command::new("cook")
                .about("Build a formula from source and install it into its keg")
                .arg(formula_arg())
                .arg(head_arg())
                .arg(
                    Arg::new("jobs")
                        .short('j')
                        .long("jobs")
                        .help("Number of parallel build jobs"),
                )
                .arg(
                    Arg::new("keep_builddir")
                        .long("keep-builddir")
                        .action(ArgAction::SetTrue)
                        .help("Keep build directory after completion"),
                )
                .arg(
                    Arg::new("skip_deps")
                        .long("skip-deps")
                        .action(ArgAction::SetTrue)
                        .help("Do not check that dependencies are installed"),
                )
                .arg(python_arg())
                .arg(site_packages_arg())
                .arg(
                    Arg::new("no_test")
                        .long("no-test")
                        .action(ArgAction::SetTrue)
                        .help("Skip the smoke test after installing"),
                ),
        )
        .subcommand(
            Command::new("fetch")
                .about("Download and verify sources without building")
                .arg(formula_arg()),
        )
        .subcommand(
            Command::new("check")
                .about("Parse and validate a formula")
                .arg(formula_arg()),
        )
        .subcommand(
            Command::new("taste")
                .about("Run a formula's smoke test against its installed keg")
                .arg(formula_arg())
                .arg(head_arg())
                .arg(python_arg())
                .arg(site_packages_arg()),
        )
        .subcommand(
            Command::new("bottle")
                .about("Show the bottle published for a platform")
                .arg(formula_arg())
                .arg(
                    Arg::new("tag")
                        .long("tag")
                        .help("Platform tag (default: this machine)"),
                ),
        )
        .subcommand(
            Command::new("livecheck")
                .about("Check upstream for newer releases")
                .arg(formula_arg()),
        )
        .subcommand(
            Command::new("info")
                .about("Show formula details and install state")
                .arg(formula_arg()),
        )
        .subcommand(
            Command::new("caveats")
                .about("Print a formula's post-install notes")
                .arg(formula_arg())
                .arg(python_arg())
                .arg(site_packages_arg()),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("cellar.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}

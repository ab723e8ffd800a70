// src/recipe/paths.rs

//! Keg layout: where a cooked formula lands on disk
//!
//! ```text
//! <root>/
//! ├── Cellar/<name>/<pkg_version>/   # the keg (prefix)
//! │   ├── bin/  lib/  libexec/
//! │   ├── share/man/
//! │   ├── share/emacs/site-lisp/<name>/
//! │   ├── share/zsh/site-functions/
//! │   └── etc/bash_completion.d/
//! └── opt/<name>                     # stable location of the active keg
//! ```

use crate::recipe::format::Formula;
use crate::recipe::vars::Variables;
use std::path::{Component, Path, PathBuf};

/// All paths derived from the root and a formula
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPaths {
    pub root: PathBuf,
    pub prefix: PathBuf,
    pub bin: PathBuf,
    pub lib: PathBuf,
    pub libexec: PathBuf,
    pub share: PathBuf,
    pub etc: PathBuf,
    pub man: PathBuf,
    pub elisp: PathBuf,
    pub bash_completion: PathBuf,
    pub zsh_completion: PathBuf,
    pub opt_prefix: PathBuf,
    pub opt_lib: PathBuf,
    pub opt_libexec: PathBuf,
}

impl InstallPaths {
    /// Layout for a release build of `formula`
    pub fn new(root: &Path, formula: &Formula) -> Self {
        Self::with_version(root, &formula.package.name, &formula.pkg_version())
    }

    /// Layout for a head build of `formula`
    pub fn for_head(root: &Path, formula: &Formula) -> Self {
        Self::with_version(root, &formula.package.name, "HEAD")
    }

    fn with_version(root: &Path, name: &str, pkg_version: &str) -> Self {
        let prefix = root.join("Cellar").join(name).join(pkg_version);
        let share = prefix.join("share");
        let opt_prefix = Self::opt_prefix_for(root, name);

        Self {
            root: root.to_path_buf(),
            bin: prefix.join("bin"),
            lib: prefix.join("lib"),
            libexec: prefix.join("libexec"),
            etc: prefix.join("etc"),
            man: share.join("man"),
            elisp: share.join("emacs/site-lisp").join(name),
            bash_completion: prefix.join("etc/bash_completion.d"),
            zsh_completion: share.join("zsh/site-functions"),
            share,
            opt_lib: opt_prefix.join("lib"),
            opt_libexec: opt_prefix.join("libexec"),
            opt_prefix,
            prefix,
        }
    }

    /// Stable opt location of any formula under `root`
    pub fn opt_prefix_for(root: &Path, name: &str) -> PathBuf {
        root.join("opt").join(name)
    }

    /// Whether `path` lies inside the keg
    ///
    /// `..` components are rejected outright, since `starts_with` compares
    /// components without resolving them.
    pub fn contains(&self, path: &Path) -> bool {
        !path.components().any(|c| c == Component::ParentDir) && path.starts_with(&self.prefix)
    }

    /// Keg paths as interpolation variables
    pub fn variables(&self) -> Variables {
        let mut vars = Variables::new();
        vars.set_path("root", &self.root);
        vars.set_path("prefix", &self.prefix);
        vars.set_path("bin", &self.bin);
        vars.set_path("lib", &self.lib);
        vars.set_path("libexec", &self.libexec);
        vars.set_path("share", &self.share);
        vars.set_path("etc", &self.etc);
        vars.set_path("man", &self.man);
        vars.set_path("elisp", &self.elisp);
        vars.set_path("bash_completion", &self.bash_completion);
        vars.set_path("zsh_completion", &self.zsh_completion);
        vars.set_path("opt_prefix", &self.opt_prefix);
        vars.set_path("opt_lib", &self.opt_lib);
        vars.set_path("opt_libexec", &self.opt_libexec);
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::parser::parse_formula;

    fn formula() -> Formula {
        parse_formula(
            r#"
[package]
name = "notmuch"
version = "0.36"
revision = 1

[source]
url = "https://notmuchmail.org/releases/notmuch-%(version)s.tar.xz"
checksum = "sha256:130231b830fd980efbd2aab12214392b8841f5d2a5a361aa8c79a79a6035ce40"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_keg_layout() {
        let paths = InstallPaths::new(Path::new("/opt/cellar"), &formula());
        assert_eq!(paths.prefix, PathBuf::from("/opt/cellar/Cellar/notmuch/0.36_1"));
        assert_eq!(paths.man, PathBuf::from("/opt/cellar/Cellar/notmuch/0.36_1/share/man"));
        assert_eq!(
            paths.elisp,
            PathBuf::from("/opt/cellar/Cellar/notmuch/0.36_1/share/emacs/site-lisp/notmuch")
        );
        assert_eq!(
            paths.bash_completion,
            PathBuf::from("/opt/cellar/Cellar/notmuch/0.36_1/etc/bash_completion.d")
        );
        assert_eq!(
            paths.zsh_completion,
            PathBuf::from("/opt/cellar/Cellar/notmuch/0.36_1/share/zsh/site-functions")
        );
        assert_eq!(paths.opt_lib, PathBuf::from("/opt/cellar/opt/notmuch/lib"));
    }

    #[test]
    fn test_head_layout() {
        let paths = InstallPaths::for_head(Path::new("/opt/cellar"), &formula());
        assert_eq!(paths.prefix, PathBuf::from("/opt/cellar/Cellar/notmuch/HEAD"));
        // opt location does not depend on the version
        assert_eq!(paths.opt_prefix, PathBuf::from("/opt/cellar/opt/notmuch"));
    }

    #[test]
    fn test_contains() {
        let paths = InstallPaths::new(Path::new("/opt/cellar"), &formula());
        assert!(paths.contains(&paths.elisp));
        assert!(!paths.contains(Path::new("/opt/cellar/opt/notmuch")));
        assert!(!paths.contains(Path::new("/etc")));
    }

    #[test]
    fn test_contains_rejects_parent_components() {
        let paths = InstallPaths::new(Path::new("/opt/cellar"), &formula());
        assert!(!paths.contains(&paths.prefix.join("../../../../outside")));
        assert!(!paths.contains(&paths.prefix.join("share/../../0.35/bin")));
        assert!(paths.contains(&paths.prefix.join("./share")));
    }

    #[test]
    fn test_variables() {
        let paths = InstallPaths::new(Path::new("/opt/cellar"), &formula());
        let vars = paths.variables();
        assert_eq!(
            vars.expand("--mandir=%(man)s").unwrap(),
            "--mandir=/opt/cellar/Cellar/notmuch/0.36_1/share/man"
        );
        assert_eq!(
            vars.expand("%(opt_lib)s/libnotmuch.{0:s}.dylib").unwrap(),
            "/opt/cellar/opt/notmuch/lib/libnotmuch.{0:s}.dylib"
        );
    }
}

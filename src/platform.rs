// src/platform.rs

//! Target platform detection and bottle tags
//!
//! The platform is resolved once per cook and passed around by value.
//! Everything that differs between operating systems (bottle selection,
//! `uses_from_macos` dependencies, compiler flags) keys off [`Platform`]
//! instead of probing the host again.

use crate::error::{Error, Result};
use std::fmt;
use std::process::Command;
use std::str::FromStr;
use tracing::debug;

/// CPU architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    Arm64,
    X86_64,
}

impl Arch {
    /// Architecture of the running binary
    pub fn current() -> Result<Self> {
        match std::env::consts::ARCH {
            "aarch64" => Ok(Arch::Arm64),
            "x86_64" => Ok(Arch::X86_64),
            other => Err(Error::UnsupportedPlatform(format!("architecture {}", other))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Arm64 => "arm64",
            Arch::X86_64 => "x86_64",
        }
    }
}

/// macOS releases that bottles are tagged with, oldest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MacOsRelease {
    Sierra,
    HighSierra,
    Mojave,
    Catalina,
    BigSur,
    Monterey,
    Ventura,
    Sonoma,
    Sequoia,
}

impl MacOsRelease {
    const ALL: [MacOsRelease; 9] = [
        MacOsRelease::Sierra,
        MacOsRelease::HighSierra,
        MacOsRelease::Mojave,
        MacOsRelease::Catalina,
        MacOsRelease::BigSur,
        MacOsRelease::Monterey,
        MacOsRelease::Ventura,
        MacOsRelease::Sonoma,
        MacOsRelease::Sequoia,
    ];

    /// Tag name as used in bottle tables
    pub fn as_str(&self) -> &'static str {
        match self {
            MacOsRelease::Sierra => "sierra",
            MacOsRelease::HighSierra => "high_sierra",
            MacOsRelease::Mojave => "mojave",
            MacOsRelease::Catalina => "catalina",
            MacOsRelease::BigSur => "big_sur",
            MacOsRelease::Monterey => "monterey",
            MacOsRelease::Ventura => "ventura",
            MacOsRelease::Sonoma => "sonoma",
            MacOsRelease::Sequoia => "sequoia",
        }
    }

    /// Map a `sw_vers -productVersion` string to a release
    ///
    /// Versions newer than the newest known release map to the newest.
    pub fn from_product_version(version: &str) -> Result<Self> {
        let mut parts = version.trim().split('.').map(|p| p.parse::<u32>());
        let major = match parts.next() {
            Some(Ok(m)) => m,
            _ => {
                return Err(Error::UnsupportedPlatform(format!(
                    "unparseable macOS version '{}'",
                    version
                )));
            }
        };
        let minor = parts.next().and_then(|p| p.ok()).unwrap_or(0);

        let release = match (major, minor) {
            (10, 12) => MacOsRelease::Sierra,
            (10, 13) => MacOsRelease::HighSierra,
            (10, 14) => MacOsRelease::Mojave,
            (10, 15) => MacOsRelease::Catalina,
            (11, _) => MacOsRelease::BigSur,
            (12, _) => MacOsRelease::Monterey,
            (13, _) => MacOsRelease::Ventura,
            (14, _) => MacOsRelease::Sonoma,
            (m, _) if m >= 15 => MacOsRelease::Sequoia,
            _ => {
                return Err(Error::UnsupportedPlatform(format!(
                    "macOS {} is older than sierra",
                    version
                )));
            }
        };
        Ok(release)
    }
}

impl FromStr for MacOsRelease {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| Error::UnsupportedPlatform(format!("unknown macOS release '{}'", s)))
    }
}

impl fmt::Display for MacOsRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating system family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    MacOs(MacOsRelease),
    Linux,
}

/// The platform a formula is being cooked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: OsFamily,
    pub arch: Arch,
}

impl Platform {
    pub fn new(os: OsFamily, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Detect the host platform
    pub fn detect() -> Result<Self> {
        let arch = Arch::current()?;
        let os = match std::env::consts::OS {
            "linux" => OsFamily::Linux,
            "macos" => OsFamily::MacOs(detect_macos_release()?),
            other => return Err(Error::UnsupportedPlatform(other.to_string())),
        };
        let platform = Self { os, arch };
        debug!("Detected platform: {}", platform);
        Ok(platform)
    }

    pub fn is_linux(&self) -> bool {
        matches!(self.os, OsFamily::Linux)
    }

    pub fn is_macos(&self) -> bool {
        matches!(self.os, OsFamily::MacOs(_))
    }

    /// Bottle tag for this platform
    ///
    /// Intel macOS bottles carry the bare release name; every other
    /// platform is prefixed with its architecture.
    pub fn bottle_tag(&self) -> String {
        match (self.os, self.arch) {
            (OsFamily::MacOs(release), Arch::X86_64) => release.as_str().to_string(),
            (OsFamily::MacOs(release), Arch::Arm64) => format!("arm64_{}", release),
            (OsFamily::Linux, arch) => format!("{}_linux", arch.as_str()),
        }
    }

    /// Parse a bottle tag back into a platform
    pub fn from_bottle_tag(tag: &str) -> Result<Self> {
        if let Some(arch) = tag.strip_suffix("_linux") {
            let arch = match arch {
                "x86_64" => Arch::X86_64,
                "arm64" => Arch::Arm64,
                _ => return Err(Error::UnsupportedPlatform(format!("bottle tag '{}'", tag))),
            };
            return Ok(Self::new(OsFamily::Linux, arch));
        }

        if let Some(release) = tag.strip_prefix("arm64_") {
            return Ok(Self::new(OsFamily::MacOs(release.parse()?), Arch::Arm64));
        }

        Ok(Self::new(OsFamily::MacOs(tag.parse()?), Arch::X86_64))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.bottle_tag())
    }
}

fn detect_macos_release() -> Result<MacOsRelease> {
    let output = Command::new("sw_vers")
        .arg("-productVersion")
        .output()
        .map_err(|e| Error::UnsupportedPlatform(format!("sw_vers failed: {}", e)))?;

    if !output.status.success() {
        return Err(Error::UnsupportedPlatform(
            "sw_vers -productVersion failed".to_string(),
        ));
    }

    MacOsRelease::from_product_version(&String::from_utf8_lossy(&output.stdout))
}

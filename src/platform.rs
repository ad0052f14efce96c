//! Runtime platform detection, library rule evaluation and native classifier
//! selection.

use crate::manifest::{Artifact, Rule};
use std::collections::HashMap;

/// Operating system names as they appear in manifest rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsType {
    Windows,
    MacOS,
    Linux,
}

impl OsType {
    /// Detect the current OS.
    pub fn current() -> Self {
        #[cfg(target_os = "windows")]
        return OsType::Windows;

        #[cfg(target_os = "macos")]
        return OsType::MacOS;

        #[cfg(target_os = "linux")]
        return OsType::Linux;

        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        compile_error!("Unsupported operating system");
    }

    /// Get the OS name as a string (for rule matching)
    pub fn as_str(&self) -> &'static str {
        match self {
            OsType::Windows => "windows",
            OsType::MacOS => "osx",
            OsType::Linux => "linux",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X64,
    Arm64,
}

impl Arch {
    /// Detect the current architecture.
    pub fn current() -> Self {
        #[cfg(target_arch = "aarch64")]
        return Arch::Arm64;

        #[cfg(not(target_arch = "aarch64"))]
        return Arch::X64;
    }

    /// Value substituted for `${arch}` in classifier templates.
    pub fn bits(&self) -> &'static str {
        "64"
    }

    /// Whether a manifest `os.arch` rule value names this architecture.
    fn matches(&self, rule_arch: &str) -> bool {
        match self {
            Arch::X64 => matches!(rule_arch, "x86" | "x86_64" | "x64"),
            Arch::Arm64 => matches!(rule_arch, "arm64" | "aarch64"),
        }
    }
}

/// Fold the rule list in order; the last rule whose `os` constraint matches
/// the current platform wins. An absent list means unconditionally allowed.
pub fn rules_allow(rules: Option<&[Rule]>, os: OsType, arch: Arch) -> bool {
    let Some(rules) = rules else {
        return true;
    };
    if rules.is_empty() {
        return true;
    }

    let mut allowed = false;
    for rule in rules {
        let applies = match &rule.os {
            None => true,
            Some(os_rule) => {
                let name_matches = os_rule
                    .name
                    .as_deref()
                    .map_or(true, |name| name == os.as_str());
                let arch_matches = os_rule
                    .arch
                    .as_deref()
                    .map_or(true, |rule_arch| arch.matches(rule_arch));
                name_matches && arch_matches
            }
        };
        if applies {
            allowed = rule.action == "allow";
        }
    }
    allowed
}

/// Resolve the native classifier key for the current OS and architecture.
///
/// The `natives` map gives the per-OS template (with `${arch}` substituted);
/// on arm64 a classifier whose key names the architecture is preferred when
/// the classifiers map carries one, since the plain key usually addresses
/// x86_64 artifacts.
pub fn resolve_native_classifier(
    natives: Option<&HashMap<String, String>>,
    classifiers: Option<&HashMap<String, Artifact>>,
    os: OsType,
    arch: Arch,
) -> Option<String> {
    let template = natives.and_then(|map| map.get(os.as_str()))?;
    let base = template.replace("${arch}", arch.bits());

    if arch == Arch::Arm64 {
        if let Some(classifiers) = classifiers {
            let mut arm_keys: Vec<&String> = classifiers
                .keys()
                .filter(|key| key.starts_with(&base) && key.contains("arm64"))
                .collect();
            arm_keys.sort();
            if let Some(key) = arm_keys.first() {
                return Some((*key).clone());
            }
        }
    }

    Some(base)
}

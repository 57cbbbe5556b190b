//! Machine resources and module references.
//!
//! A [`MachineSpec`] is an absolute capacity when a resource provider posts
//! it and a minimum requirement when a job creator does. All quantities are
//! fixed-point sub-units so no floating point enters matching.

use serde::{Deserialize, Serialize};

use crate::ModuleId;

/// Compute resources in fixed-point sub-units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MachineSpec {
    /// Milli-GPU (1000 = one whole GPU).
    pub gpu: u64,
    /// Milli-CPU (1000 = one core).
    pub cpu: u64,
    /// Megabytes of RAM.
    pub ram: u64,
}

impl MachineSpec {
    #[must_use]
    pub fn new(gpu: u64, cpu: u64, ram: u64) -> Self {
        Self { gpu, cpu, ram }
    }

    /// Component-wise `self >= required`. No partial credit: one short
    /// component fails the whole check.
    #[must_use]
    pub fn satisfies(&self, required: &MachineSpec) -> bool {
        self.gpu >= required.gpu && self.cpu >= required.cpu && self.ram >= required.ram
    }

    /// Names of the components where `self` falls short of `required`.
    #[must_use]
    pub fn shortfall(&self, required: &MachineSpec) -> Vec<&'static str> {
        let mut short = Vec::new();
        if self.gpu < required.gpu {
            short.push("gpu");
        }
        if self.cpu < required.cpu {
            short.push("cpu");
        }
        if self.ram < required.ram {
            short.push("ram");
        }
        short
    }
}

impl std::fmt::Display for MachineSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gpu={}m cpu={}m ram={}MB", self.gpu, self.cpu, self.ram)
    }
}

/// Pins a workload template in a git repository.
///
/// `name`/`version` are optional shortcuts resolved elsewhere; the
/// identity of the module is the `(repo, hash, path)` triple.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    /// HTTP URL of a git repository cloneable without credentials.
    pub repo: String,
    /// Commit hash to check out.
    pub hash: String,
    /// Path of the template inside the repository.
    pub path: String,
}

impl ModuleConfig {
    #[must_use]
    pub fn new(repo: impl Into<String>, hash: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            version: String::new(),
            repo: repo.into(),
            hash: hash.into(),
            path: path.into(),
        }
    }

    /// `repo@hash:path`
    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        ModuleId(format!("{}@{}:{}", self.repo, self.hash, self.path))
    }

    /// Whether the triple is complete enough to be fetched reproducibly.
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        !self.repo.trim().is_empty() && !self.hash.trim().is_empty() && !self.path.trim().is_empty()
    }
}

/// A loaded workload template. Not resolved by the solver itself; carried
/// for executors that fetch the module and hoist its `machine` onto offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Minimum machine the module needs.
    pub machine: MachineSpec,
    /// Opaque job specification for the execution backend.
    pub job: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_capacity_satisfies() {
        let offered = MachineSpec::new(1000, 2000, 4096);
        assert!(offered.satisfies(&MachineSpec::new(1000, 2000, 4096)));
    }

    #[test]
    fn one_megabyte_short_fails() {
        let offered = MachineSpec::new(1000, 2000, 4096);
        let required = MachineSpec::new(1000, 2000, 4097);
        assert!(!offered.satisfies(&required));
        assert_eq!(offered.shortfall(&required), vec!["ram"]);
    }

    #[test]
    fn surplus_in_one_does_not_offset_another() {
        let offered = MachineSpec::new(8000, 100, 1_000_000);
        let required = MachineSpec::new(0, 500, 1);
        assert!(!offered.satisfies(&required));
        assert_eq!(offered.shortfall(&required), vec!["cpu"]);
    }

    #[test]
    fn module_id_from_triple() {
        let m = ModuleConfig::new("https://github.com/org/mods", "abc123", "cowsay.tmpl");
        assert_eq!(
            m.module_id(),
            ModuleId::new("https://github.com/org/mods@abc123:cowsay.tmpl")
        );
        assert!(m.is_pinned());
        assert!(!ModuleConfig::default().is_pinned());
    }
}

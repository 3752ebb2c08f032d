//! The build environment a grammar tree is evaluated against.

use serde::{Deserialize, Serialize};

/// Host architecture, target architecture and platform of one build.
///
/// Supplied by the caller for each evaluation; the grammar never inspects
/// the machine it runs on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Environment {
    /// Architecture the build runs on (`on` clauses).
    pub host_arch: String,

    /// Architecture the build produces artifacts for (`to` clauses).
    pub target_arch: String,

    /// Platform name being built (`for` clauses).
    pub platform: String,
}

impl Environment {
    pub fn new(
        host_arch: impl Into<String>,
        target_arch: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            host_arch: host_arch.into(),
            target_arch: target_arch.into(),
            platform: platform.into(),
        }
    }

    /// A native build: host and target are the same architecture and the
    /// platform is named after it.
    pub fn native(arch: impl Into<String>) -> Self {
        let arch = arch.into();
        Self::new(arch.clone(), arch.clone(), arch)
    }

    /// Replace the target architecture.
    pub fn with_target_arch(mut self, target_arch: impl Into<String>) -> Self {
        self.target_arch = target_arch.into();
        self
    }

    /// Replace the platform.
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native() {
        let env = Environment::native("amd64");
        assert_eq!(env.host_arch, "amd64");
        assert_eq!(env.target_arch, "amd64");
        assert_eq!(env.platform, "amd64");
    }

    #[test]
    fn test_builders() {
        let env = Environment::native("amd64")
            .with_target_arch("riscv64")
            .with_platform("jammy");
        assert_eq!(env, Environment::new("amd64", "riscv64", "jammy"));
    }
}

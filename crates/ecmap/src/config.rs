use serde::Deserialize;

/// Options of a [`Db`](crate::Db) handle.
///
/// Deserializable so hosts can read it from their own configuration files;
/// every field is optional there.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schema update acceptance policy.
    pub policy: Policy,

    /// Reject any schema update that increases a major version.
    pub disallow_major_upgrade: bool,
}

/// Which schema updates are accepted on top of the compatibility rules.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Policy {
    #[default]
    Unrestricted,

    /// For databases whose changes are merged across replicas: no new
    /// columns or shared column slots in tables that already exist.
    ChangesetMergeCompatible,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn disallow_major_upgrade(mut self, disallow: bool) -> Self {
        self.disallow_major_upgrade = disallow;
        self
    }
}

impl Policy {
    pub fn is_changeset_merge_compatible(self) -> bool {
        self == Policy::ChangesetMergeCompatible
    }
}

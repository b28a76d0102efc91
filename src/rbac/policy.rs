/// Role → module permission table
///
/// Built once at startup (from configuration or the built-in school matrix)
/// and never mutated afterwards. Roles without an entry get nothing.

use std::collections::{HashMap, HashSet};

use crate::auth::Role;
use crate::error::{AppError, ConfigError};
use crate::rbac::modules;

/// What a single role may touch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleGrant {
    /// The `"all"` sentinel
    All,
    Only(HashSet<String>),
}

impl ModuleGrant {
    /// A list containing `"all"` collapses to `All`
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: HashSet<String> = names.into_iter().map(Into::into).collect();
        if names.contains(modules::ALL) {
            ModuleGrant::All
        } else {
            ModuleGrant::Only(names)
        }
    }

    pub fn allows(&self, module: &str) -> bool {
        match self {
            ModuleGrant::All => true,
            ModuleGrant::Only(names) => names.contains(module),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RolePermissionTable {
    grants: HashMap<Role, ModuleGrant>,
}

impl RolePermissionTable {
    /// Empty table: every check is denied
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role<I, S>(mut self, role: Role, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grants.insert(role, ModuleGrant::from_names(modules));
        self
    }

    /// Admin holds everything, teachers and students hold fixed module lists,
    /// and the registration pseudo-role holds nothing.
    pub fn school_default() -> Self {
        Self::new()
            .with_role(Role::Admin, [modules::ALL])
            .with_role(Role::Guru, modules::GURU_MODULES.iter().copied())
            .with_role(Role::Murid, modules::MURID_MODULES.iter().copied())
    }

    /// Builds the table from the `permissions` configuration section
    ///
    /// # Errors
    /// Returns a config error when a key is not a known role name
    pub fn from_config(section: &HashMap<String, Vec<String>>) -> Result<Self, AppError> {
        let mut table = Self::new();
        for (role_name, module_names) in section {
            let role = role_name.parse::<Role>().map_err(|e| {
                ConfigError::InvalidValue(format!("permissions: {}", e))
            })?;
            table = table.with_role(role, module_names.iter().cloned());
        }
        Ok(table)
    }

    pub fn grant(&self, role: Role) -> Option<&ModuleGrant> {
        self.grants.get(&role)
    }

    pub fn allows(&self, role: Role, module: &str) -> bool {
        self.grant(role).map_or(false, |grant| grant.allows(module))
    }

    pub fn has_full_access(&self, role: Role) -> bool {
        matches!(self.grant(role), Some(ModuleGrant::All))
    }
}

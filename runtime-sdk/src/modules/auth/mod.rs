//! Auth module.
//!
//! Holds the module account configuration: which modules own an account and which privileged
//! operations (minting, burning) each of them may perform.
use std::{collections::BTreeMap, sync::Arc};

use crate::types::address::Address;


/// Unique module name.
pub const MODULE_NAME: &str = "auth";

/// Permission to mint new coins.
pub const MINTER: &str = "minter";
/// Permission to burn coins.
pub const BURNER: &str = "burner";
/// Permission to stake coins.
pub const STAKING: &str = "staking";

/// An account owned by a module.
#[derive(Clone, Debug, PartialEq, Eq, cbor::Encode, cbor::Decode)]
pub struct ModuleAccount {
    pub name: String,
    pub address: Address,
    pub permissions: Vec<String>,
}

impl ModuleAccount {
    /// Create a new module account with the given permissions.
    pub fn new(name: &str, permissions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            address: Address::from_module(name),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Whether the account has the given permission.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Interface that can be called from other modules.
pub trait API {
    /// Address of the given module account, if it is configured.
    fn get_module_address(&self, name: &str) -> Option<Address>;

    /// The given module account, if it is configured.
    fn get_module_account(&self, name: &str) -> Option<ModuleAccount>;

    /// Permissions of all configured module accounts.
    fn get_module_permissions(&self) -> BTreeMap<String, Vec<String>>;
}

/// Keeper of the auth module.
#[derive(Clone, Debug, Default)]
pub struct Keeper {
    module_accounts: Arc<BTreeMap<String, ModuleAccount>>,
}

impl Keeper {
    /// Create a new keeper from a map of module names to their permissions.
    pub fn new(permissions: BTreeMap<String, Vec<String>>) -> Self {
        let module_accounts = permissions
            .into_iter()
            .map(|(name, permissions)| {
                let account = ModuleAccount {
                    address: Address::from_module(&name),
                    name: name.clone(),
                    permissions,
                };
                (name, account)
            })
            .collect();

        Self {
            module_accounts: Arc::new(module_accounts),
        }
    }

    /// Addresses of all configured module accounts.
    pub fn module_addresses(&self) -> impl Iterator<Item = Address> + '_ {
        self.module_accounts.values().map(|acc| acc.address)
    }
}

impl API for Keeper {
    fn get_module_address(&self, name: &str) -> Option<Address> {
        self.module_accounts.get(name).map(|acc| acc.address)
    }

    fn get_module_account(&self, name: &str) -> Option<ModuleAccount> {
        self.module_accounts.get(name).cloned()
    }

    fn get_module_permissions(&self) -> BTreeMap<String, Vec<String>> {
        self.module_accounts
            .iter()
            .map(|(name, acc)| (name.clone(), acc.permissions.clone()))
            .collect()
    }
}

//! Mock chain state for use in tests.
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    modules::{
        auth::{self, API as _},
        bank,
    },
    state::State,
    storage::MemoryStore,
    types::address::Address,
};

/// Name of the fee collector module account.
pub const FEE_COLLECTOR: &str = "fee_collector";
/// Name of the mint module account.
pub const MINT: &str = "mint";
/// Name of the EVM module account.
pub const EVM: &str = "evm";
/// Name of the IBC transfer module account.
pub const TRANSFER: &str = "transfer";
/// Name of the community pool module account.
pub const COMMUNITY: &str = "community";

/// Module account permissions used by the mock chain.
pub fn module_permissions() -> BTreeMap<String, Vec<String>> {
    let minter_burner = vec![auth::MINTER.to_string(), auth::BURNER.to_string()];
    BTreeMap::from([
        (FEE_COLLECTOR.to_string(), vec![]),
        (MINT.to_string(), vec![auth::MINTER.to_string()]),
        (EVM.to_string(), minter_burner.clone()),
        (TRANSFER.to_string(), minter_burner),
        (COMMUNITY.to_string(), vec![]),
    ])
}

/// Mock chain with the auth and bank modules.
pub struct Mock {
    pub state: State,
    pub auth: auth::Keeper,
    pub bank: bank::Keeper<auth::Keeper>,
}

impl Mock {
    /// Create a new mock chain with the default module accounts.
    pub fn new() -> Self {
        Self::with_modules(BTreeMap::new())
    }

    /// Create a new mock chain with additional module accounts.
    ///
    /// All module accounts are blocked from receiving funds from other modules.
    pub fn with_modules(extra: BTreeMap<String, Vec<String>>) -> Self {
        let mut permissions = module_permissions();
        permissions.extend(extra);

        let auth = auth::Keeper::new(permissions);
        let blocked: BTreeSet<Address> = auth.module_addresses().collect();
        let bank = bank::Keeper::new(auth.clone(), blocked);

        Self {
            state: State::new(MemoryStore::new()),
            auth,
            bank,
        }
    }

    /// Address of the given module account.
    pub fn auth_address(&self, module: &str) -> Address {
        self.auth
            .get_module_address(module)
            .unwrap_or_else(|| panic!("unknown module account: {}", module))
    }
}

impl Default for Mock {
    fn default() -> Self {
        Self::new()
    }
}

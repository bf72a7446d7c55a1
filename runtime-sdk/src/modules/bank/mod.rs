//! Bank module.
//!
//! The native bank holds per-account balances and per-denomination supplies. All amounts are
//! kept in whole units of each denomination.
use std::{
    collections::{BTreeMap, BTreeSet},
    convert::TryFrom,
    sync::Arc,
};

use thiserror::Error;

use crate::{
    logger::get_logger,
    module::{format_invariant, InvariantRegistry},
    modules::auth,
    state::State,
    storage,
    types::{
        address::Address,
        token::{Coin, Coins, Int},
    },
};

#[cfg(test)]
mod test;
pub mod types;

/// Unique module name.
pub const MODULE_NAME: &str = "bank";

/// Codespace of errors shared with the rest of the chain.
pub const ROOT_CODESPACE: &str = "sdk";

/// Errors emitted by the bank module.
#[derive(Error, Debug, Clone, PartialEq, Eq, evm_runtime_sdk_macros::Error)]
#[sdk_error(codespace = "ROOT_CODESPACE")]
pub enum Error {
    #[error("{0}: unauthorized")]
    #[sdk_error(code = 4)]
    Unauthorized(String),

    #[error("spendable balance {spendable} is smaller than {required}: insufficient funds")]
    #[sdk_error(code = 5)]
    InsufficientFunds { spendable: String, required: String },

    #[error("locked amount exceeds account balance funds: {locked} > {balance}: insufficient funds")]
    #[sdk_error(code = 5)]
    LockedExceedsBalance { locked: String, balance: String },

    #[error("{0}: unknown address")]
    #[sdk_error(code = 9)]
    UnknownAddress(String),

    #[error("{0}: invalid coins")]
    #[sdk_error(code = 10)]
    InvalidCoins(String),

    #[error("{0}: invalid request")]
    #[sdk_error(code = 18)]
    InvalidRequest(String),
}

/// Events emitted by the bank module.
#[derive(Clone, Debug, cbor::Encode, evm_runtime_sdk_macros::Event)]
#[cbor(untagged)]
pub enum Event {
    #[sdk_event(code = 1)]
    Transfer {
        recipient: Address,
        sender: Address,
        amount: Coins,
    },

    #[sdk_event(code = 2)]
    CoinSpent { spender: Address, amount: Coins },

    #[sdk_event(code = 3)]
    CoinReceived { receiver: Address, amount: Coins },

    #[sdk_event(code = 4)]
    Coinbase { minter: Address, amount: Coins },

    #[sdk_event(code = 5)]
    Burn { burner: Address, amount: Coins },
}

/// Interface that can be called from other modules.
///
/// Amounts passed to the mutating methods are validated as a whole before any state is touched
/// and every mutation is atomic: on error no state changes remain.
pub trait API {
    /// Balance of the given account in the given denomination.
    fn get_balance(&self, state: &mut State, addr: Address, denom: &str) -> Coin;

    /// All non-zero balances of the given account.
    fn get_all_balances(&self, state: &mut State, addr: Address) -> Coins;

    /// Balance of the given account that is not locked.
    fn spendable_coin(&self, state: &mut State, addr: Address, denom: &str) -> Coin;

    /// Total supply of the given denomination.
    fn get_supply(&self, state: &mut State, denom: &str) -> Coin;

    /// Iterate over all balances of the given account until the callback returns `true`.
    fn iterate_account_balances<F: FnMut(Coin) -> bool>(
        &self,
        state: &mut State,
        addr: Address,
        cb: F,
    );

    /// Iterate over all balances of all accounts until the callback returns `true`.
    fn iterate_all_balances<F: FnMut(Address, Coin) -> bool>(&self, state: &mut State, cb: F);

    /// Whether the given address may not receive funds from module accounts.
    fn blocked_addr(&self, addr: &Address) -> bool;

    /// Metadata of the given denomination.
    fn get_denom_metadata(&self, state: &mut State, denom: &str) -> Option<types::Metadata>;

    /// Sets metadata of a denomination.
    fn set_denom_metadata(&self, state: &mut State, metadata: types::Metadata);

    /// Create new coins and credit them to the given module account.
    ///
    /// # Panics
    ///
    /// This method will panic if the module account does not exist or lacks the minter
    /// permission.
    fn mint_coins(&self, state: &mut State, module: &str, amount: &Coins) -> Result<(), Error>;

    /// Destroy coins held by the given module account.
    ///
    /// # Panics
    ///
    /// This method will panic if the module account does not exist or lacks the burner
    /// permission.
    fn burn_coins(&self, state: &mut State, module: &str, amount: &Coins) -> Result<(), Error>;

    /// Transfer coins between two accounts.
    fn send_coins(
        &self,
        state: &mut State,
        from: Address,
        to: Address,
        amount: &Coins,
    ) -> Result<(), Error>;

    /// Transfer coins from a module account to a non-blocked account.
    fn send_coins_from_module_to_account(
        &self,
        state: &mut State,
        sender_module: &str,
        recipient: Address,
        amount: &Coins,
    ) -> Result<(), Error>;

    /// Transfer coins from an account to a module account.
    fn send_coins_from_account_to_module(
        &self,
        state: &mut State,
        sender: Address,
        recipient_module: &str,
        amount: &Coins,
    ) -> Result<(), Error>;

    /// Transfer coins between two module accounts.
    fn send_coins_from_module_to_module(
        &self,
        state: &mut State,
        sender_module: &str,
        recipient_module: &str,
        amount: &Coins,
    ) -> Result<(), Error>;
}

/// State schema constants.
pub mod state {
    /// Map of account addresses to map of denominations to balances.
    pub const BALANCES: &[u8] = &[0x02];
    /// Map of total supplies (per denomination).
    pub const SUPPLY: &[u8] = &[0x03];
    /// Map of denominations to their metadata.
    pub const DENOM_METADATA: &[u8] = &[0x04];
    /// Map of account addresses to locked coins.
    pub const LOCKED: &[u8] = &[0x05];
}

/// This is needed to properly iterate over the BALANCES map.
#[derive(Clone, PartialEq, PartialOrd, Eq, Ord)]
struct AddressWithDenomination(Address, String);

#[derive(Error, Debug)]
enum AWDError {
    #[error("malformed address")]
    MalformedAddress,

    #[error("malformed denomination")]
    MalformedDenomination,
}

impl TryFrom<&[u8]> for AddressWithDenomination {
    type Error = AWDError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() < Address::SIZE {
            return Err(AWDError::MalformedAddress);
        }
        let address =
            Address::try_from(&bytes[..Address::SIZE]).map_err(|_| AWDError::MalformedAddress)?;
        let denomination = String::from_utf8(bytes[Address::SIZE..].to_vec())
            .map_err(|_| AWDError::MalformedDenomination)?;
        Ok(AddressWithDenomination(address, denomination))
    }
}

/// A denomination used as a storage key.
struct DenomKey(String);

impl TryFrom<&[u8]> for DenomKey {
    type Error = AWDError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        String::from_utf8(bytes.to_vec())
            .map(DenomKey)
            .map_err(|_| AWDError::MalformedDenomination)
    }
}

/// Fetch an account's balance of the given denomination.
fn get_balance_amount(state: &mut State, addr: Address, denom: &str) -> Int {
    let store = storage::PrefixStore::new(state.store(), &MODULE_NAME);
    let balances = storage::PrefixStore::new(store, &state::BALANCES);
    let account = storage::TypedStore::new(storage::PrefixStore::new(balances, &addr));
    account.get(denom).unwrap_or_default()
}

/// Sets an account's balance of the given denomination, removing zero balances.
fn set_balance_amount(state: &mut State, addr: Address, denom: &str, amount: Int) {
    let store = storage::PrefixStore::new(state.store(), &MODULE_NAME);
    let balances = storage::PrefixStore::new(store, &state::BALANCES);
    let mut account = storage::TypedStore::new(storage::PrefixStore::new(balances, &addr));
    if amount.is_zero() {
        account.remove(denom);
    } else {
        account.insert(denom, amount);
    }
}

/// Fetch the total supply of the given denomination.
fn get_supply_amount(state: &mut State, denom: &str) -> Int {
    let store = storage::PrefixStore::new(state.store(), &MODULE_NAME);
    let supplies = storage::TypedStore::new(storage::PrefixStore::new(store, &state::SUPPLY));
    supplies.get(denom).unwrap_or_default()
}

/// Sets the total supply of the given denomination, removing zero supplies.
fn set_supply_amount(state: &mut State, denom: &str, amount: Int) {
    let store = storage::PrefixStore::new(state.store(), &MODULE_NAME);
    let mut supplies = storage::TypedStore::new(storage::PrefixStore::new(store, &state::SUPPLY));
    if amount.is_zero() {
        supplies.remove(denom);
    } else {
        supplies.insert(denom, amount);
    }
}

/// Fetch total supplies of all denominations.
pub fn get_total_supplies(state: &mut State) -> BTreeMap<String, Int> {
    let store = storage::PrefixStore::new(state.store(), &MODULE_NAME);
    let supplies = storage::TypedStore::new(storage::PrefixStore::new(store, &state::SUPPLY));
    let supplies = supplies
        .iter::<DenomKey, Int>()
        .map(|(denom, amount)| (denom.0, amount))
        .collect();
    supplies
}

/// Fetch all balances of all accounts.
pub fn get_address_balances(state: &mut State) -> BTreeMap<Address, Coins> {
    let store = storage::PrefixStore::new(state.store(), &MODULE_NAME);
    let balances = storage::TypedStore::new(storage::PrefixStore::new(store, &state::BALANCES));

    let mut result: BTreeMap<Address, Vec<Coin>> = BTreeMap::new();
    for (AddressWithDenomination(addr, denom), amount) in
        balances.iter::<AddressWithDenomination, Int>()
    {
        result.entry(addr).or_default().push(Coin { denom, amount });
    }

    result
        .into_iter()
        .map(|(addr, coins)| (addr, Coins::new(coins)))
        .collect()
}

/// Total supply invariant.
///
/// All account balances should sum up to the total supply for their corresponding denominations.
pub fn total_supply_invariant(state: &mut State) -> (String, bool) {
    let mut computed: BTreeMap<String, Int> = BTreeMap::new();
    for coins in get_address_balances(state).into_values() {
        for coin in coins {
            *computed.entry(coin.denom).or_default() += coin.amount;
        }
    }
    let supplies = get_total_supplies(state);

    let broken = computed != supplies;
    let msg = format!(
        "\tsum of accounts coins: {}\n\tsupply: {}\n",
        Coins::new(
            computed
                .into_iter()
                .map(|(denom, amount)| Coin { denom, amount })
                .collect()
        ),
        Coins::new(
            supplies
                .into_iter()
                .map(|(denom, amount)| Coin { denom, amount })
                .collect()
        ),
    );

    (format_invariant(MODULE_NAME, "total supply", &msg), broken)
}

/// Keeper of the bank module.
#[derive(Clone)]
pub struct Keeper<A: auth::API> {
    ak: A,
    blocked_addrs: Arc<BTreeSet<Address>>,
    logger: slog::Logger,
}

impl<A: auth::API> Keeper<A> {
    /// Create a new bank keeper.
    pub fn new(ak: A, blocked_addrs: BTreeSet<Address>) -> Self {
        Self {
            ak,
            blocked_addrs: Arc::new(blocked_addrs),
            logger: get_logger(MODULE_NAME),
        }
    }

    /// The auth keeper used to resolve module accounts.
    pub fn auth(&self) -> &A {
        &self.ak
    }

    /// Coins of the given account that cannot be spent.
    pub fn locked_coins(&self, state: &mut State, addr: Address) -> Coins {
        let store = storage::PrefixStore::new(state.store(), &MODULE_NAME);
        let locked = storage::TypedStore::new(storage::PrefixStore::new(store, &state::LOCKED));
        locked.get(addr).unwrap_or_default()
    }

    /// Sets coins of the given account that cannot be spent.
    pub fn set_locked_coins(&self, state: &mut State, addr: Address, coins: Coins) {
        let store = storage::PrefixStore::new(state.store(), &MODULE_NAME);
        let mut locked =
            storage::TypedStore::new(storage::PrefixStore::new(store, &state::LOCKED));
        if coins.is_empty() {
            locked.remove(addr);
        } else {
            locked.insert(addr, coins);
        }
    }

    /// Sets an account's balance of the given denomination.
    ///
    /// # Warning
    ///
    /// This method is dangerous as it can result in invariant violations.
    pub fn set_balance(&self, state: &mut State, addr: Address, coin: &Coin) {
        set_balance_amount(state, addr, &coin.denom, coin.amount.clone());
    }

    /// Sets the total supply for the given denomination.
    ///
    /// # Warning
    ///
    /// This method is dangerous as it can result in invariant violations.
    pub fn set_supply(&self, state: &mut State, coin: &Coin) {
        set_supply_amount(state, &coin.denom, coin.amount.clone());
    }

    /// Handle a user-initiated transfer.
    pub fn msg_send(
        &self,
        state: &mut State,
        from: Address,
        to: Address,
        amount: &Coins,
    ) -> Result<(), Error> {
        if !amount.is_valid() || amount.is_empty() {
            return Err(Error::InvalidCoins(amount.to_string()));
        }
        if self.blocked_addr(&to) {
            return Err(Error::Unauthorized(format!(
                "{} is not allowed to receive funds",
                to
            )));
        }

        self.send_coins(state, from, to, amount)
    }

    /// Initialize state from genesis.
    ///
    /// # Panics
    ///
    /// This method will panic when the declared supply does not match the balances.
    pub fn init_genesis(&self, state: &mut State, genesis: types::Genesis) {
        // Create balances.
        let mut computed_total_supply: BTreeMap<String, Int> = BTreeMap::new();
        for (address, coins) in genesis.balances {
            assert!(coins.is_valid(), "invalid genesis balance of {}: {}", address, coins);
            for coin in coins {
                *computed_total_supply.entry(coin.denom.clone()).or_default() += &coin.amount;
                set_balance_amount(state, address, &coin.denom, coin.amount);
            }
        }

        // Validate and set total supply.
        for coin in genesis.supply {
            let computed = computed_total_supply
                .remove(&coin.denom)
                .expect("unexpected total supply");
            assert!(
                computed == coin.amount,
                "unexpected total supply (expected: {} got: {})",
                coin.amount,
                computed
            );

            set_supply_amount(state, &coin.denom, coin.amount);
        }
        if let Some((denom, total_supply)) = computed_total_supply.iter().next() {
            panic!("missing expected total supply: {} {}", total_supply, denom);
        }

        for metadata in genesis.denom_metadata {
            self.set_denom_metadata(state, metadata);
        }
    }

    /// Export state as genesis.
    pub fn export_genesis(&self, state: &mut State) -> types::Genesis {
        let supply = Coins::new(
            get_total_supplies(state)
                .into_iter()
                .map(|(denom, amount)| Coin { denom, amount })
                .collect(),
        );

        let store = storage::PrefixStore::new(state.store(), &MODULE_NAME);
        let metadata =
            storage::TypedStore::new(storage::PrefixStore::new(store, &state::DENOM_METADATA));
        let denom_metadata = metadata
            .iter::<DenomKey, types::Metadata>()
            .map(|(_, m)| m)
            .collect();

        types::Genesis {
            balances: get_address_balances(state),
            supply,
            denom_metadata,
        }
    }

    /// Register the invariants of the bank module.
    pub fn register_invariants(&self, registry: &mut InvariantRegistry) {
        registry.register_route(MODULE_NAME, "total-supply", Box::new(total_supply_invariant));
    }

    fn get_module_account_or_panic(&self, module: &str) -> auth::ModuleAccount {
        self.ak.get_module_account(module).unwrap_or_else(|| {
            panic!(
                "{}",
                Error::UnknownAddress(format!("module account {} does not exist", module))
            )
        })
    }

    fn spendable_amount(&self, state: &mut State, addr: Address, denom: &str) -> Int {
        let balance = get_balance_amount(state, addr, denom);
        let locked = self.locked_coins(state, addr).amount_of(denom);
        let spendable = balance - locked;
        if spendable.is_negative() {
            Int::zero()
        } else {
            spendable
        }
    }

    /// Credit the given coins to an account.
    fn add_coins(&self, state: &mut State, addr: Address, amount: &Coins) -> Result<(), Error> {
        if !amount.is_valid() {
            return Err(Error::InvalidCoins(amount.to_string()));
        }

        for coin in amount {
            let balance = get_balance_amount(state, addr, &coin.denom);
            set_balance_amount(state, addr, &coin.denom, balance + &coin.amount);
        }

        state.emit_event(Event::CoinReceived {
            receiver: addr,
            amount: amount.clone(),
        });

        Ok(())
    }

    /// Debit the given coins from an account, failing if they are not spendable.
    fn sub_unlocked_coins(
        &self,
        state: &mut State,
        addr: Address,
        amount: &Coins,
    ) -> Result<(), Error> {
        if !amount.is_valid() {
            return Err(Error::InvalidCoins(amount.to_string()));
        }

        let locked = self.locked_coins(state, addr);
        for coin in amount {
            let balance = get_balance_amount(state, addr, &coin.denom);
            let locked_amount = locked.amount_of(&coin.denom);

            let spendable = &balance - &locked_amount;
            if spendable.is_negative() {
                return Err(Error::LockedExceedsBalance {
                    locked: Coin::new(&coin.denom, locked_amount).to_string(),
                    balance: Coin::new(&coin.denom, balance).to_string(),
                });
            }
            if spendable < coin.amount {
                return Err(Error::InsufficientFunds {
                    spendable: Coins::from(Coin::new(&coin.denom, spendable)).to_string(),
                    required: coin.to_string(),
                });
            }

            set_balance_amount(state, addr, &coin.denom, balance - &coin.amount);
        }

        state.emit_event(Event::CoinSpent {
            spender: addr,
            amount: amount.clone(),
        });

        Ok(())
    }
}

impl<A: auth::API> API for Keeper<A> {
    fn get_balance(&self, state: &mut State, addr: Address, denom: &str) -> Coin {
        Coin::new(denom, get_balance_amount(state, addr, denom))
    }

    fn get_all_balances(&self, state: &mut State, addr: Address) -> Coins {
        let mut coins = Vec::new();
        self.iterate_account_balances(state, addr, |coin| {
            coins.push(coin);
            false
        });
        Coins::new(coins)
    }

    fn spendable_coin(&self, state: &mut State, addr: Address, denom: &str) -> Coin {
        Coin::new(denom, self.spendable_amount(state, addr, denom))
    }

    fn get_supply(&self, state: &mut State, denom: &str) -> Coin {
        Coin::new(denom, get_supply_amount(state, denom))
    }

    fn iterate_account_balances<F: FnMut(Coin) -> bool>(
        &self,
        state: &mut State,
        addr: Address,
        mut cb: F,
    ) {
        let store = storage::PrefixStore::new(state.store(), &MODULE_NAME);
        let balances = storage::PrefixStore::new(store, &state::BALANCES);
        let account = storage::TypedStore::new(storage::PrefixStore::new(balances, &addr));
        for (denom, amount) in account.iter::<DenomKey, Int>() {
            if cb(Coin {
                denom: denom.0,
                amount,
            }) {
                break;
            }
        }
    }

    fn iterate_all_balances<F: FnMut(Address, Coin) -> bool>(&self, state: &mut State, mut cb: F) {
        let store = storage::PrefixStore::new(state.store(), &MODULE_NAME);
        let balances = storage::TypedStore::new(storage::PrefixStore::new(store, &state::BALANCES));
        for (AddressWithDenomination(addr, denom), amount) in
            balances.iter::<AddressWithDenomination, Int>()
        {
            if cb(addr, Coin { denom, amount }) {
                break;
            }
        }
    }

    fn blocked_addr(&self, addr: &Address) -> bool {
        self.blocked_addrs.contains(addr)
    }

    fn get_denom_metadata(&self, state: &mut State, denom: &str) -> Option<types::Metadata> {
        let store = storage::PrefixStore::new(state.store(), &MODULE_NAME);
        let metadata =
            storage::TypedStore::new(storage::PrefixStore::new(store, &state::DENOM_METADATA));
        metadata.get(denom)
    }

    fn set_denom_metadata(&self, state: &mut State, metadata: types::Metadata) {
        let store = storage::PrefixStore::new(state.store(), &MODULE_NAME);
        let mut store =
            storage::TypedStore::new(storage::PrefixStore::new(store, &state::DENOM_METADATA));
        store.insert(metadata.base.clone(), metadata);
    }

    fn mint_coins(&self, state: &mut State, module: &str, amount: &Coins) -> Result<(), Error> {
        let acc = self.get_module_account_or_panic(module);
        if !acc.has_permission(auth::MINTER) {
            panic!(
                "{}",
                Error::Unauthorized(format!(
                    "module account {} does not have permissions to mint tokens",
                    module
                ))
            );
        }
        if !amount.is_valid() {
            return Err(Error::InvalidCoins(amount.to_string()));
        }

        state.with_transaction(|state| -> Result<(), Error> {
            self.add_coins(state, acc.address, amount)?;

            // Increase total supply.
            for coin in amount {
                let supply = get_supply_amount(state, &coin.denom);
                set_supply_amount(state, &coin.denom, supply + &coin.amount);
            }

            slog::debug!(self.logger, "minted coins from module account";
                "amount" => amount.to_string(),
                "module" => module,
            );

            state.emit_event(Event::Coinbase {
                minter: acc.address,
                amount: amount.clone(),
            });

            Ok(())
        })
    }

    fn burn_coins(&self, state: &mut State, module: &str, amount: &Coins) -> Result<(), Error> {
        let acc = self.get_module_account_or_panic(module);
        if !acc.has_permission(auth::BURNER) {
            panic!(
                "{}",
                Error::Unauthorized(format!(
                    "module account {} does not have permissions to burn tokens",
                    module
                ))
            );
        }
        if !amount.is_valid() {
            return Err(Error::InvalidCoins(amount.to_string()));
        }

        state.with_transaction(|state| -> Result<(), Error> {
            for coin in amount {
                let spendable = self.spendable_amount(state, acc.address, &coin.denom);
                if spendable < coin.amount {
                    return Err(Error::InsufficientFunds {
                        spendable: Coin::new(&coin.denom, spendable).to_string(),
                        required: coin.to_string(),
                    });
                }
            }

            self.sub_unlocked_coins(state, acc.address, amount)?;

            // Decrease total supply.
            for coin in amount {
                let supply = get_supply_amount(state, &coin.denom);
                let supply = supply - &coin.amount;
                assert!(
                    !supply.is_negative(),
                    "target account had enough balance so total supply should not underflow"
                );
                set_supply_amount(state, &coin.denom, supply);
            }

            slog::debug!(self.logger, "burned coins from module account";
                "amount" => amount.to_string(),
                "module" => module,
            );

            state.emit_event(Event::Burn {
                burner: acc.address,
                amount: amount.clone(),
            });

            Ok(())
        })
    }

    fn send_coins(
        &self,
        state: &mut State,
        from: Address,
        to: Address,
        amount: &Coins,
    ) -> Result<(), Error> {
        state.with_transaction(|state| -> Result<(), Error> {
            self.sub_unlocked_coins(state, from, amount)?;
            self.add_coins(state, to, amount)?;

            state.emit_event(Event::Transfer {
                recipient: to,
                sender: from,
                amount: amount.clone(),
            });

            Ok(())
        })
    }

    fn send_coins_from_module_to_account(
        &self,
        state: &mut State,
        sender_module: &str,
        recipient: Address,
        amount: &Coins,
    ) -> Result<(), Error> {
        let sender = self.ak.get_module_address(sender_module).unwrap_or_else(|| {
            panic!(
                "{}",
                Error::UnknownAddress(format!("module account {} does not exist", sender_module))
            )
        });

        if self.blocked_addr(&recipient) {
            return Err(Error::Unauthorized(format!(
                "{} is not allowed to receive funds",
                recipient
            )));
        }

        self.send_coins(state, sender, recipient, amount)
    }

    fn send_coins_from_account_to_module(
        &self,
        state: &mut State,
        sender: Address,
        recipient_module: &str,
        amount: &Coins,
    ) -> Result<(), Error> {
        let recipient = self.get_module_account_or_panic(recipient_module);

        self.send_coins(state, sender, recipient.address, amount)
    }

    fn send_coins_from_module_to_module(
        &self,
        state: &mut State,
        sender_module: &str,
        recipient_module: &str,
        amount: &Coins,
    ) -> Result<(), Error> {
        let sender = self.ak.get_module_address(sender_module).unwrap_or_else(|| {
            panic!(
                "{}",
                Error::UnknownAddress(format!("module account {} does not exist", sender_module))
            )
        });
        let recipient = self.get_module_account_or_panic(recipient_module);

        self.send_coins(state, sender, recipient.address, amount)
    }
}

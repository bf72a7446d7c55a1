//! Precise bank module.
//!
//! Extends the integer denomination of the native bank with an extended denomination of higher
//! precision. Each account's extended balance is its integer balance scaled by the conversion
//! factor plus a fractional balance kept by this module. The module account's integer balance
//! (the reserve) backs the sum of all fractional balances and the remainder at all times.
#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

use thiserror::Error;

use evm_runtime_sdk::{
    logger::get_logger,
    modules::{auth, bank},
    state::State,
    types::{
        address::Address,
        token::{Coin, Coins, Int},
    },
};

mod burn;
pub mod config;
mod genesis;
pub mod invariants;
#[cfg(any(test, feature = "test"))]
pub mod mock;
mod mint;
mod query;
mod send;
pub mod state;
pub mod types;
mod view;

pub use config::{CoinInfo, CoinInfoResolver};

/// Unique module name.
pub const MODULE_NAME: &str = "precisebank";

/// Errors emitted by the precise bank module.
#[derive(Error, Debug, evm_runtime_sdk::Error)]
pub enum Error {
    #[error("non-positive amount {0}")]
    #[sdk_error(code = 1)]
    NonPositiveAmount(Int),

    #[error("amount {amount} exceeds max of {max}")]
    #[sdk_error(code = 2)]
    AmountExceedsMax { amount: Int, max: Int },

    #[error("invalid fractional balance for {0}: {1}")]
    #[sdk_error(code = 3)]
    InvalidBalance(Address, Box<Error>),

    #[error("duplicate address {0}")]
    #[sdk_error(code = 4)]
    DuplicateAddress(Address),

    #[error("negative remainder amount {0}")]
    #[sdk_error(code = 5)]
    NegativeRemainder(Int),

    #[error("sum of fractional balances {sum} and remainder {remainder} is not a multiple of {conversion_factor}")]
    #[sdk_error(code = 6)]
    UnbalancedTotal {
        sum: Int,
        remainder: Int,
        conversion_factor: Int,
    },
}

/// Events emitted by the precise bank module.
#[derive(Clone, Debug, cbor::Encode, evm_runtime_sdk::Event)]
#[cbor(untagged)]
pub enum Event {
    #[sdk_event(code = 1)]
    FractionalBalanceChange { address: Address, delta: Int },
}

/// Keeper of the precise bank module.
///
/// The keeper implements [`bank::API`] so it can be used wherever the native bank is expected.
/// Amounts of the extended denomination are reconciled against the fractional store and the
/// reserve while all other denominations pass through to the native bank unchanged.
#[derive(Clone)]
pub struct Keeper<B: bank::API, A: auth::API> {
    bk: B,
    ak: A,
    coin_info: CoinInfoResolver,
    logger: slog::Logger,
}

impl<B: bank::API, A: auth::API> Keeper<B, A> {
    /// Create a new precise bank keeper on top of the given native bank.
    pub fn new(bk: B, ak: A, coin_info: CoinInfoResolver) -> Self {
        Self {
            bk,
            ak,
            coin_info,
            logger: get_logger(MODULE_NAME),
        }
    }

    /// Coin information used by the keeper.
    pub fn coin_info(&self) -> &CoinInfoResolver {
        &self.coin_info
    }

    /// The underlying native bank.
    pub fn bank(&self) -> &B {
        &self.bk
    }

    /// Address of the reserve, i.e. the module account.
    ///
    /// # Panics
    ///
    /// This method will panic if the module account does not exist.
    pub fn reserve_address(&self) -> Address {
        self.ak.get_module_address(MODULE_NAME).unwrap_or_else(|| {
            panic!(
                "{}",
                bank::Error::UnknownAddress(format!(
                    "module account {} does not exist",
                    MODULE_NAME
                ))
            )
        })
    }

    /// Fractional balance of an account, zero when not present.
    pub fn get_fractional_balance(&self, state: &mut State, addr: Address) -> Int {
        state::get_fractional_balance(state, addr)
    }

    /// Sets the fractional balance of an account, removing it when zero.
    ///
    /// # Panics
    ///
    /// This method will panic if the amount is not within `[0, conversion_factor)`.
    pub fn set_fractional_balance(&self, state: &mut State, addr: Address, amount: Int) {
        state::set_fractional_balance(state, addr, amount, &self.coin_info.conversion_factor())
    }

    /// Removes the fractional balance of an account.
    pub fn delete_fractional_balance(&self, state: &mut State, addr: Address) {
        state::delete_fractional_balance(state, addr)
    }

    /// Iterate over all fractional balances until the callback returns `true`.
    pub fn iterate_fractional_balances<F: FnMut(Address, Int) -> bool>(
        &self,
        state: &mut State,
        cb: F,
    ) {
        state::iterate_fractional_balances(state, cb)
    }

    /// Sum of all fractional balances.
    pub fn get_total_sum_fractional_balances(&self, state: &mut State) -> Int {
        state::get_total_sum_fractional_balances(state)
    }

    /// Current remainder, zero when not present.
    pub fn get_remainder_amount(&self, state: &mut State) -> Int {
        state::get_remainder_amount(state)
    }

    /// Sets the remainder, removing it when zero.
    ///
    /// # Panics
    ///
    /// This method will panic if the amount is not within `[0, conversion_factor)`.
    pub fn set_remainder_amount(&self, state: &mut State, amount: Int) {
        state::set_remainder_amount(state, amount, &self.coin_info.conversion_factor())
    }

    /// Removes the remainder.
    pub fn delete_remainder_amount(&self, state: &mut State) {
        state::delete_remainder_amount(state)
    }

    /// Split the given coins into coins handled by the native bank and the amount of the
    /// extended denomination.
    ///
    /// Returns `None` when the coins contain no extended denomination, in which case they can be
    /// passed to the native bank as they are.
    fn split_coins(&self, amount: &Coins) -> Option<(Coins, Int)> {
        if self.coin_info.is_same_denom() {
            return None;
        }

        let extended_denom = self.coin_info.extended_denom();
        let extended = amount.amount_of(extended_denom);
        if !extended.is_positive() {
            return None;
        }

        let passthrough = Coins::from_unchecked(
            amount
                .iter()
                .filter(|coin| coin.denom != extended_denom)
                .cloned()
                .collect(),
        );

        Some((passthrough, extended))
    }

    /// Whether the coins contain a denomination backed by the reserve.
    fn holds_reserve_denom(&self, amount: &Coins) -> bool {
        !amount.amount_of(self.coin_info.integer_denom()).is_zero()
            || !amount.amount_of(self.coin_info.extended_denom()).is_zero()
    }

    /// Coins of the given amount of the integer denomination.
    fn integer_coins<T: Into<Int>>(&self, amount: T) -> Coins {
        Coins::from(Coin::new(self.coin_info.integer_denom(), amount))
    }

    /// Coins of the given amount of the extended denomination.
    fn extended_coins<T: Into<Int>>(&self, amount: T) -> Coins {
        Coins::from(Coin::new(self.coin_info.extended_denom(), amount))
    }

    fn get_module_account_or_panic(&self, module: &str) -> auth::ModuleAccount {
        self.ak.get_module_account(module).unwrap_or_else(|| {
            panic!(
                "{}",
                bank::Error::UnknownAddress(format!("module account {} does not exist", module))
            )
        })
    }
}

impl<B: bank::API, A: auth::API> bank::API for Keeper<B, A> {
    fn get_balance(&self, state: &mut State, addr: Address, denom: &str) -> Coin {
        self.view_balance(state, addr, denom)
    }

    fn get_all_balances(&self, state: &mut State, addr: Address) -> Coins {
        self.view_all_balances(state, addr)
    }

    fn spendable_coin(&self, state: &mut State, addr: Address, denom: &str) -> Coin {
        self.view_spendable_coin(state, addr, denom)
    }

    fn get_supply(&self, state: &mut State, denom: &str) -> Coin {
        self.view_supply(state, denom)
    }

    fn iterate_account_balances<F: FnMut(Coin) -> bool>(
        &self,
        state: &mut State,
        addr: Address,
        cb: F,
    ) {
        self.bk.iterate_account_balances(state, addr, cb)
    }

    fn iterate_all_balances<F: FnMut(Address, Coin) -> bool>(&self, state: &mut State, cb: F) {
        self.bk.iterate_all_balances(state, cb)
    }

    fn blocked_addr(&self, addr: &Address) -> bool {
        self.bk.blocked_addr(addr)
    }

    fn get_denom_metadata(&self, state: &mut State, denom: &str) -> Option<bank::types::Metadata> {
        self.bk.get_denom_metadata(state, denom)
    }

    fn set_denom_metadata(&self, state: &mut State, metadata: bank::types::Metadata) {
        self.bk.set_denom_metadata(state, metadata)
    }

    fn mint_coins(
        &self,
        state: &mut State,
        module: &str,
        amount: &Coins,
    ) -> Result<(), bank::Error> {
        self.mint(state, module, amount)
    }

    fn burn_coins(
        &self,
        state: &mut State,
        module: &str,
        amount: &Coins,
    ) -> Result<(), bank::Error> {
        self.burn(state, module, amount)
    }

    fn send_coins(
        &self,
        state: &mut State,
        from: Address,
        to: Address,
        amount: &Coins,
    ) -> Result<(), bank::Error> {
        self.send(state, from, to, amount)
    }

    fn send_coins_from_module_to_account(
        &self,
        state: &mut State,
        sender_module: &str,
        recipient: Address,
        amount: &Coins,
    ) -> Result<(), bank::Error> {
        let sender = self.ak.get_module_address(sender_module).unwrap_or_else(|| {
            panic!(
                "{}",
                bank::Error::UnknownAddress(format!(
                    "module account {} does not exist",
                    sender_module
                ))
            )
        });

        if self.bk.blocked_addr(&recipient) {
            return Err(bank::Error::Unauthorized(format!(
                "{} is not allowed to receive funds",
                recipient
            )));
        }

        self.send(state, sender, recipient, amount)
    }

    fn send_coins_from_account_to_module(
        &self,
        state: &mut State,
        sender: Address,
        recipient_module: &str,
        amount: &Coins,
    ) -> Result<(), bank::Error> {
        let recipient = self.get_module_account_or_panic(recipient_module);

        self.send(state, sender, recipient.address, amount)
    }

    fn send_coins_from_module_to_module(
        &self,
        state: &mut State,
        sender_module: &str,
        recipient_module: &str,
        amount: &Coins,
    ) -> Result<(), bank::Error> {
        let sender = self.get_module_account_or_panic(sender_module);
        let recipient = self.get_module_account_or_panic(recipient_module);

        self.send(state, sender.address, recipient.address, amount)
    }
}

//! State schema and accessors.
use evm_runtime_sdk::{
    state::State,
    storage,
    types::{address::Address, token::Int},
};

use crate::{types, Event, MODULE_NAME};

/// Map of account addresses to fractional balances.
pub const FRACTIONAL_BALANCES: &[u8] = &[0x01];
/// Fractional amount backed by the reserve but not owned by any account.
pub const REMAINDER: &[u8] = &[0x02];

/// Fractional balance of the given account, zero when not present.
pub fn get_fractional_balance(state: &mut State, addr: Address) -> Int {
    let store = storage::PrefixStore::new(state.store(), &MODULE_NAME);
    let balances =
        storage::TypedStore::new(storage::PrefixStore::new(store, &FRACTIONAL_BALANCES));
    balances.get(addr).unwrap_or_default()
}

/// Sets the fractional balance of the given account.
///
/// A zero amount removes the entry. A change emits a `FractionalBalanceChange` event.
///
/// # Panics
///
/// This method will panic if the amount is not a valid fractional amount.
pub fn set_fractional_balance(
    state: &mut State,
    addr: Address,
    amount: Int,
    conversion_factor: &Int,
) {
    if !amount.is_zero() {
        if let Err(err) = types::validate_fractional_amount(&amount, conversion_factor) {
            panic!("invalid fractional amount: {}", err);
        }
    }

    let previous = get_fractional_balance(state, addr);
    if previous == amount {
        return;
    }

    let delta = &amount - &previous;
    {
        let store = storage::PrefixStore::new(state.store(), &MODULE_NAME);
        let mut balances =
            storage::TypedStore::new(storage::PrefixStore::new(store, &FRACTIONAL_BALANCES));
        if amount.is_zero() {
            balances.remove(addr);
        } else {
            balances.insert(addr, amount);
        }
    }

    state.emit_event(Event::FractionalBalanceChange {
        address: addr,
        delta,
    });
}

/// Removes the fractional balance of the given account.
pub fn delete_fractional_balance(state: &mut State, addr: Address) {
    let previous = get_fractional_balance(state, addr);
    if previous.is_zero() {
        return;
    }

    let store = storage::PrefixStore::new(state.store(), &MODULE_NAME);
    let mut balances =
        storage::TypedStore::new(storage::PrefixStore::new(store, &FRACTIONAL_BALANCES));
    balances.remove(addr);

    state.emit_event(Event::FractionalBalanceChange {
        address: addr,
        delta: -previous,
    });
}

/// Iterate over all fractional balances until the callback returns `true`.
///
/// Every call starts from the first account.
pub fn iterate_fractional_balances<F: FnMut(Address, Int) -> bool>(state: &mut State, mut cb: F) {
    let store = storage::PrefixStore::new(state.store(), &MODULE_NAME);
    let balances =
        storage::TypedStore::new(storage::PrefixStore::new(store, &FRACTIONAL_BALANCES));
    for (addr, amount) in balances.iter::<Address, Int>() {
        if cb(addr, amount) {
            break;
        }
    }
}

/// All fractional balances.
pub fn get_fractional_balances(state: &mut State) -> Vec<types::FractionalBalance> {
    let mut balances = Vec::new();
    iterate_fractional_balances(state, |address, amount| {
        balances.push(types::FractionalBalance { address, amount });
        false
    });
    balances
}

/// Sum of all fractional balances.
pub fn get_total_sum_fractional_balances(state: &mut State) -> Int {
    let mut sum = Int::zero();
    iterate_fractional_balances(state, |_, amount| {
        sum += amount;
        false
    });
    sum
}

/// Current remainder, zero when not present.
pub fn get_remainder_amount(state: &mut State) -> Int {
    let store = storage::PrefixStore::new(state.store(), &MODULE_NAME);
    let store = storage::TypedStore::new(store);
    store.get(REMAINDER).unwrap_or_default()
}

/// Sets the remainder. A zero amount removes the entry.
///
/// # Panics
///
/// This method will panic if the amount is not within `[0, conversion_factor)`.
pub fn set_remainder_amount(state: &mut State, amount: Int, conversion_factor: &Int) {
    if !amount.is_zero() {
        if let Err(err) = types::validate_fractional_amount(&amount, conversion_factor) {
            panic!("invalid remainder amount: {}", err);
        }
    }

    let store = storage::PrefixStore::new(state.store(), &MODULE_NAME);
    let mut store = storage::TypedStore::new(store);
    if amount.is_zero() {
        store.remove(REMAINDER);
    } else {
        store.insert(REMAINDER, amount);
    }
}

/// Removes the remainder.
pub fn delete_remainder_amount(state: &mut State) {
    let store = storage::PrefixStore::new(state.store(), &MODULE_NAME);
    let mut store = storage::TypedStore::new(store);
    store.remove(REMAINDER);
}

//! Invariants of the precise bank module.
//!
//! Each invariant returns a formatted message and whether it is broken.
use evm_runtime_sdk::{
    module::{format_invariant, InvariantRegistry},
    modules::{auth, bank},
    state::State,
    types::token::Int,
};

use crate::{types, Keeper, MODULE_NAME};

/// Register all invariants of the precise bank module.
pub fn register_invariants<B, A>(registry: &mut InvariantRegistry, keeper: &Keeper<B, A>)
where
    B: bank::API + Clone + 'static,
    A: auth::API + Clone + 'static,
{
    macro_rules! register {
        ($route:expr, $invariant:ident) => {{
            let keeper = keeper.clone();
            registry.register_route(
                MODULE_NAME,
                $route,
                Box::new(move |state: &mut State| $invariant(&keeper, state)),
            );
        }};
    }

    register!("reserve-backs-fractions", reserve_backs_fractions);
    register!("balance-remainder-total", balanced_fractional_total);
    register!("valid-fractional-balances", valid_fractional_amounts);
    register!("valid-remainder-amount", valid_remainder_amount);
    register!("fractional-denom-not-in-bank", fractional_denom_not_in_bank);
    register!("total-supply", total_supply);
}

/// Run all invariants in order, stopping at the first broken one.
pub fn all_invariants<B: bank::API, A: auth::API>(
    keeper: &Keeper<B, A>,
    state: &mut State,
) -> (String, bool) {
    let invariants: [fn(&Keeper<B, A>, &mut State) -> (String, bool); 6] = [
        reserve_backs_fractions,
        balanced_fractional_total,
        valid_fractional_amounts,
        valid_remainder_amount,
        fractional_denom_not_in_bank,
        total_supply,
    ];
    for invariant in invariants {
        let (msg, broken) = invariant(keeper, state);
        if broken {
            return (msg, broken);
        }
    }
    (String::new(), false)
}

/// The reserve must hold exactly the integer units backing all fractional balances and the
/// remainder.
pub fn reserve_backs_fractions<B: bank::API, A: auth::API>(
    keeper: &Keeper<B, A>,
    state: &mut State,
) -> (String, bool) {
    let fractional_sum = keeper.get_total_sum_fractional_balances(state);
    let remainder = keeper.get_remainder_amount(state);

    let reserve_balance = keeper
        .bk
        .get_balance(
            state,
            keeper.reserve_address(),
            keeper.coin_info.integer_denom(),
        )
        .amount;
    let reserve_extended = reserve_balance * keeper.coin_info.conversion_factor();
    let required = &fractional_sum + &remainder;

    let broken = reserve_extended != required;
    let msg = format!(
        "{} reserve balance {} mismatches {} (fractional balances {} + remainder {})\n",
        keeper.coin_info.extended_denom(),
        reserve_extended,
        required,
        fractional_sum,
        remainder,
    );

    (
        format_invariant(
            MODULE_NAME,
            "module reserve backing total fractional balances",
            &msg,
        ),
        broken,
    )
}

/// Every stored fractional balance must be within `(0, conversion_factor)`.
pub fn valid_fractional_amounts<B: bank::API, A: auth::API>(
    keeper: &Keeper<B, A>,
    state: &mut State,
) -> (String, bool) {
    let cf = keeper.coin_info.conversion_factor();
    let mut count = 0;
    let mut msg = String::new();
    keeper.iterate_fractional_balances(state, |addr, amount| {
        if types::validate_fractional_amount(&amount, &cf).is_err() {
            count += 1;
            msg += &format!("\t{} has an invalid fractional amount of {}\n", addr, amount);
        }
        false
    });

    (
        format_invariant(
            MODULE_NAME,
            "valid-fractional-balances",
            &format!("amount of invalid fractional balances found {}\n{}", count, msg),
        ),
        count != 0,
    )
}

/// The remainder must be within `[0, conversion_factor)`.
pub fn valid_remainder_amount<B: bank::API, A: auth::API>(
    keeper: &Keeper<B, A>,
    state: &mut State,
) -> (String, bool) {
    let remainder = keeper.get_remainder_amount(state);

    let mut msg = String::new();
    let mut broken = false;
    if !remainder.is_zero() {
        if let Err(err) =
            types::validate_fractional_amount(&remainder, &keeper.coin_info.conversion_factor())
        {
            broken = true;
            msg = format!("remainder amount is invalid: {}", err);
        }
    }

    (
        format_invariant(MODULE_NAME, "valid-remainder-amount", &msg),
        broken,
    )
}

/// The sum of all fractional balances and the remainder must be a multiple of the conversion
/// factor.
pub fn balanced_fractional_total<B: bank::API, A: auth::API>(
    keeper: &Keeper<B, A>,
    state: &mut State,
) -> (String, bool) {
    let total =
        keeper.get_total_sum_fractional_balances(state) + keeper.get_remainder_amount(state);
    let leftover = total % keeper.coin_info.conversion_factor();

    let mut msg = String::new();
    let broken = !leftover.is_zero();
    if broken {
        msg = format!(
            "(sum(FractionalBalances) + remainder) % conversionFactor should be 0 but got {}",
            leftover
        );
    }

    (
        format_invariant(MODULE_NAME, "balance-remainder-total", &msg),
        broken,
    )
}

/// The native bank must not hold any coins of the extended denomination.
pub fn fractional_denom_not_in_bank<B: bank::API, A: auth::API>(
    keeper: &Keeper<B, A>,
    state: &mut State,
) -> (String, bool) {
    let mut msg = String::new();
    let mut broken = false;
    if !keeper.coin_info.is_same_denom() {
        let extended_denom = keeper.coin_info.extended_denom();
        let supply = keeper.bk.get_supply(state, extended_denom);
        if !supply.is_zero() {
            broken = true;
            msg = format!(
                "bank should not hold any {} but has supply of {}",
                extended_denom, supply
            );
        }
    }

    (
        format_invariant(MODULE_NAME, "fractional-denom-not-in-bank", &msg),
        broken,
    )
}

/// Integer balances outside the reserve plus all fractional amounts must equal the integer supply,
/// all in extended units.
pub fn total_supply<B: bank::API, A: auth::API>(
    keeper: &Keeper<B, A>,
    state: &mut State,
) -> (String, bool) {
    let cf = keeper.coin_info.conversion_factor();
    let integer_denom = keeper.coin_info.integer_denom();
    let reserve = keeper.reserve_address();

    let mut extended_supply =
        keeper.get_total_sum_fractional_balances(state) + keeper.get_remainder_amount(state);
    let mut integer_held = Int::zero();
    keeper.bk.iterate_all_balances(state, |addr, coin| {
        if addr != reserve && coin.denom == integer_denom {
            integer_held += coin.amount;
        }
        false
    });
    extended_supply += integer_held * &cf;

    let integer_supply = keeper.bk.get_supply(state, integer_denom).amount * &cf;

    let mut msg = String::new();
    let broken = extended_supply != integer_supply;
    if broken {
        msg = format!(
            "total supply {} does not match integer total supply {}",
            extended_supply, integer_supply
        );
    }

    (format_invariant(MODULE_NAME, "total-supply", &msg), broken)
}

use evm_runtime_sdk::{
    modules::{auth, bank},
    state::State,
    types::{
        address::Address,
        token::{Coin, Coins, Int},
    },
};

use crate::Keeper;

impl<B: bank::API, A: auth::API> Keeper<B, A> {
    /// Whether the denomination needs to be composed from the integer and fractional balances.
    fn is_extended(&self, denom: &str) -> bool {
        !self.coin_info.is_same_denom() && denom == self.coin_info.extended_denom()
    }

    /// Full extended balance of an account, including locked coins.
    pub(crate) fn extended_amount(&self, state: &mut State, addr: Address) -> Int {
        let integer = self
            .bk
            .get_balance(state, addr, self.coin_info.integer_denom())
            .amount;
        integer * self.coin_info.conversion_factor() + self.get_fractional_balance(state, addr)
    }

    /// Spendable extended balance of an account.
    pub(crate) fn spendable_extended_amount(&self, state: &mut State, addr: Address) -> Int {
        let integer = self
            .bk
            .spendable_coin(state, addr, self.coin_info.integer_denom())
            .amount;
        integer * self.coin_info.conversion_factor() + self.get_fractional_balance(state, addr)
    }

    pub(crate) fn view_balance(&self, state: &mut State, addr: Address, denom: &str) -> Coin {
        if !self.is_extended(denom) {
            return self.bk.get_balance(state, addr, denom);
        }
        // Reserve coins back the fractional balances and must not be counted twice.
        if addr == self.reserve_address() {
            return Coin::new(denom, Int::zero());
        }

        Coin::new(denom, self.extended_amount(state, addr))
    }

    pub(crate) fn view_spendable_coin(
        &self,
        state: &mut State,
        addr: Address,
        denom: &str,
    ) -> Coin {
        if !self.is_extended(denom) {
            return self.bk.spendable_coin(state, addr, denom);
        }
        if addr == self.reserve_address() {
            return Coin::new(denom, Int::zero());
        }

        Coin::new(denom, self.spendable_extended_amount(state, addr))
    }

    /// All balances of an account with the integer denomination replaced by the extended one.
    pub(crate) fn view_all_balances(&self, state: &mut State, addr: Address) -> Coins {
        let balances = self.bk.get_all_balances(state, addr);
        if self.coin_info.is_same_denom() || addr == self.reserve_address() {
            return balances;
        }

        let integer_denom = self.coin_info.integer_denom();
        let mut coins: Vec<Coin> = balances
            .into_iter()
            .filter(|coin| coin.denom != integer_denom)
            .collect();
        coins.push(Coin::new(
            self.coin_info.extended_denom(),
            self.extended_amount(state, addr),
        ));

        Coins::new(coins)
    }

    /// Total supply of a denomination.
    ///
    /// The extended supply counts all integer coins and fractional balances held by accounts,
    /// which excludes the remainder.
    pub(crate) fn view_supply(&self, state: &mut State, denom: &str) -> Coin {
        if !self.is_extended(denom) {
            return self.bk.get_supply(state, denom);
        }

        let integer = self
            .bk
            .get_supply(state, self.coin_info.integer_denom())
            .amount;
        Coin::new(
            denom,
            integer * self.coin_info.conversion_factor() - self.get_remainder_amount(state),
        )
    }
}

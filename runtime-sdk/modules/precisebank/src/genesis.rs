use evm_runtime_sdk::{
    modules::{auth, bank},
    state::State,
};

use crate::{types, Keeper, MODULE_NAME};

impl<B: bank::API, A: auth::API> Keeper<B, A> {
    /// Initialize state from genesis.
    ///
    /// The native bank genesis must be initialized first since the reserve balance is checked
    /// against the imported fractional balances.
    ///
    /// # Panics
    ///
    /// This method will panic if the genesis state is invalid, the module account does not exist
    /// or the reserve does not back the imported fractional balances.
    pub fn init_genesis(&self, state: &mut State, genesis: types::Genesis) {
        let cf = self.coin_info.conversion_factor();
        if let Err(err) = genesis.validate(&cf) {
            panic!("failed to validate {} genesis state: {}", MODULE_NAME, err);
        }

        let reserve = self
            .ak
            .get_module_address(MODULE_NAME)
            .unwrap_or_else(|| panic!("{} module account has not been set", MODULE_NAME));

        let required = (genesis.total_amount() + &genesis.remainder) / &cf;
        for balance in genesis.balances {
            self.set_fractional_balance(state, balance.address, balance.amount);
        }
        self.set_remainder_amount(state, genesis.remainder);

        let reserve_balance = self
            .bk
            .get_balance(state, reserve, self.coin_info.integer_denom());
        if reserve_balance.amount != required {
            panic!(
                "reserve balance {} does not match the required {}{} backing fractional balances and remainder",
                reserve_balance,
                required,
                self.coin_info.integer_denom(),
            );
        }

        slog::info!(self.logger, "initialized genesis";
            "reserve" => reserve_balance.amount,
        );
    }

    /// Export state as genesis.
    pub fn export_genesis(&self, state: &mut State) -> types::Genesis {
        types::Genesis {
            balances: crate::state::get_fractional_balances(state),
            remainder: self.get_remainder_amount(state),
        }
    }
}

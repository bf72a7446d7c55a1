use evm_runtime_sdk::{
    modules::{auth, bank},
    state::{Options, State},
    types::{
        address::Address,
        token::{Coin, Coins, Int},
    },
};

use crate::{Keeper, MODULE_NAME};

impl<B: bank::API, A: auth::API> Keeper<B, A> {
    /// Destroy coins held by the given module account.
    ///
    /// # Panics
    ///
    /// This method will panic if the module account is the reserve, does not exist or lacks the
    /// burner permission.
    pub(crate) fn burn(
        &self,
        state: &mut State,
        module: &str,
        amount: &Coins,
    ) -> Result<(), bank::Error> {
        if module == MODULE_NAME {
            panic!(
                "{}",
                bank::Error::Unauthorized(format!(
                    "module account {} cannot be burned from",
                    module
                ))
            );
        }

        let acc = self.get_module_account_or_panic(module);
        if !acc.has_permission(auth::BURNER) {
            panic!(
                "{}",
                bank::Error::Unauthorized(format!(
                    "module account {} does not have permissions to burn tokens",
                    module
                ))
            );
        }
        if !amount.is_valid() {
            return Err(bank::Error::InvalidCoins(amount.to_string()));
        }

        let (passthrough, extended) = match self.split_coins(amount) {
            Some(split) => split,
            None => return self.bk.burn_coins(state, module, amount),
        };

        state.with_transaction(|state| -> Result<(), bank::Error> {
            if !passthrough.is_empty() {
                self.bk.burn_coins(state, module, &passthrough)?;
            }

            self.burn_extended(state, module, acc.address, &extended)?;

            let burned = self.extended_coins(extended.clone());
            state.emit_event(bank::Event::CoinSpent {
                spender: acc.address,
                amount: burned.clone(),
            });
            state.emit_event(bank::Event::Burn {
                burner: acc.address,
                amount: burned,
            });

            Ok(())
        })
    }

    /// Burn an amount of the extended denomination from the given module account.
    ///
    /// Whole units are burned through the native bank. The fractional part is debited from the
    /// account's fractional balance and credited to the remainder. An account underflowing zero
    /// pays one whole unit into the reserve (borrow) and a remainder overflowing one whole unit
    /// is settled by burning one unit from the reserve.
    fn burn_extended(
        &self,
        state: &mut State,
        module: &str,
        addr: Address,
        amount: &Int,
    ) -> Result<(), bank::Error> {
        let spendable = self.spendable_extended_amount(state, addr);
        if &spendable < amount {
            return Err(bank::Error::InsufficientFunds {
                spendable: Coin::new(self.coin_info.extended_denom(), spendable).to_string(),
                required: Coin::new(self.coin_info.extended_denom(), amount.clone()).to_string(),
            });
        }

        let cf = self.coin_info.conversion_factor();
        let mut integer_amount = amount / &cf;
        let fractional_amount = amount % &cf;

        let mut new_fractional = self.get_fractional_balance(state, addr) - &fractional_amount;
        let borrow = new_fractional.is_negative();
        if borrow {
            new_fractional += &cf;
        }

        let mut new_remainder = self.get_remainder_amount(state) + &fractional_amount;
        let reserve_burn = new_remainder >= cf;
        if reserve_burn {
            new_remainder -= &cf;
        }

        state.with_transaction_opts(
            Options::new().with_silenced_events(),
            |state| -> Result<(), bank::Error> {
                match (borrow, reserve_burn) {
                    (true, true) => {
                        // The borrowed unit would be burned from the reserve right away.
                        integer_amount += Int::one();
                    }
                    (true, false) => {
                        slog::debug!(self.logger, "borrowing integer unit into reserve";
                            "address" => addr,
                        );
                        self.bk.send_coins_from_module_to_module(
                            state,
                            module,
                            MODULE_NAME,
                            &self.integer_coins(1u8),
                        )?;
                    }
                    (false, true) => {
                        slog::debug!(self.logger, "burning from reserve to settle remainder";
                            "address" => addr,
                        );
                        self.bk
                            .burn_coins(state, MODULE_NAME, &self.integer_coins(1u8))?;
                    }
                    (false, false) => {}
                }

                if integer_amount.is_positive() {
                    self.bk
                        .burn_coins(state, module, &self.integer_coins(integer_amount.clone()))?;
                }

                Ok(())
            },
        )?;

        self.set_fractional_balance(state, addr, new_fractional);
        self.set_remainder_amount(state, new_remainder);

        Ok(())
    }
}

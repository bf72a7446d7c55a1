use evm_runtime_sdk::{
    modules::{auth, bank},
    state::{Options, State},
    types::{
        address::Address,
        token::{Coins, Int},
    },
};

use crate::{Keeper, MODULE_NAME};

impl<B: bank::API, A: auth::API> Keeper<B, A> {
    /// Create new coins and credit them to the given module account.
    ///
    /// # Panics
    ///
    /// This method will panic if the module account is the reserve, does not exist or lacks the
    /// minter permission.
    pub(crate) fn mint(
        &self,
        state: &mut State,
        module: &str,
        amount: &Coins,
    ) -> Result<(), bank::Error> {
        if module == MODULE_NAME {
            panic!(
                "{}",
                bank::Error::Unauthorized(format!(
                    "module account {} cannot be minted to",
                    module
                ))
            );
        }

        let acc = self.get_module_account_or_panic(module);
        if !acc.has_permission(auth::MINTER) {
            panic!(
                "{}",
                bank::Error::Unauthorized(format!(
                    "module account {} does not have permissions to mint tokens",
                    module
                ))
            );
        }
        if !amount.is_valid() {
            return Err(bank::Error::InvalidCoins(amount.to_string()));
        }

        let (passthrough, extended) = match self.split_coins(amount) {
            Some(split) => split,
            None => return self.bk.mint_coins(state, module, amount),
        };

        state.with_transaction(|state| -> Result<(), bank::Error> {
            if !passthrough.is_empty() {
                self.bk.mint_coins(state, module, &passthrough)?;
            }

            self.mint_extended(state, module, acc.address, &extended)?;

            let minted = self.extended_coins(extended.clone());
            state.emit_event(bank::Event::CoinReceived {
                receiver: acc.address,
                amount: minted.clone(),
            });
            state.emit_event(bank::Event::Coinbase {
                minter: acc.address,
                amount: minted,
            });

            Ok(())
        })
    }

    /// Mint an amount of the extended denomination to the given module account.
    ///
    /// Whole units are minted through the native bank. The fractional part is credited to the
    /// account's fractional balance and debited from the remainder. An account overflowing one
    /// whole unit receives it from the reserve (carry) and a remainder underflowing zero is
    /// refilled by minting one unit to the reserve.
    fn mint_extended(
        &self,
        state: &mut State,
        module: &str,
        addr: Address,
        amount: &Int,
    ) -> Result<(), bank::Error> {
        let cf = self.coin_info.conversion_factor();
        let mut integer_amount = amount / &cf;
        let fractional_amount = amount % &cf;

        let mut new_fractional = self.get_fractional_balance(state, addr) + &fractional_amount;
        let carry = new_fractional >= cf;
        if carry {
            new_fractional -= &cf;
        }

        let mut new_remainder = self.get_remainder_amount(state) - &fractional_amount;
        let reserve_mint = new_remainder.is_negative();
        if reserve_mint {
            new_remainder += &cf;
        }

        state.with_transaction_opts(
            Options::new().with_silenced_events(),
            |state| -> Result<(), bank::Error> {
                match (carry, reserve_mint) {
                    (true, true) => {
                        // The unit that would leave the reserve is replaced by a freshly minted
                        // one, so it goes to the account directly.
                        integer_amount += Int::one();
                    }
                    (true, false) => {
                        slog::debug!(self.logger, "carrying fractional balance from reserve";
                            "address" => addr,
                        );
                        self.bk.send_coins_from_module_to_module(
                            state,
                            MODULE_NAME,
                            module,
                            &self.integer_coins(1u8),
                        )?;
                    }
                    (false, true) => {
                        slog::debug!(self.logger, "minting to reserve to cover remainder";
                            "address" => addr,
                        );
                        self.bk
                            .mint_coins(state, MODULE_NAME, &self.integer_coins(1u8))?;
                    }
                    (false, false) => {}
                }

                if integer_amount.is_positive() {
                    self.bk
                        .mint_coins(state, module, &self.integer_coins(integer_amount.clone()))?;
                }

                Ok(())
            },
        )?;

        self.set_fractional_balance(state, addr, new_fractional);
        self.set_remainder_amount(state, new_remainder);

        Ok(())
    }
}

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
    /// Transfer coins between two accounts.
    ///
    /// # Panics
    ///
    /// This method will panic if the sender is the reserve and the coins contain the integer or
    /// extended denomination.
    pub(crate) fn send(
        &self,
        state: &mut State,
        from: Address,
        to: Address,
        amount: &Coins,
    ) -> Result<(), bank::Error> {
        let reserve = self.reserve_address();
        if from == reserve && self.holds_reserve_denom(amount) {
            panic!(
                "{}",
                bank::Error::Unauthorized(format!(
                    "module account {} cannot send coins",
                    MODULE_NAME
                ))
            );
        }
        if !amount.is_valid() {
            return Err(bank::Error::InvalidCoins(amount.to_string()));
        }
        if to == reserve {
            return Err(bank::Error::Unauthorized(format!(
                "{} is not allowed to receive funds",
                to
            )));
        }

        let (passthrough, extended) = match self.split_coins(amount) {
            Some(split) => split,
            None => return self.bk.send_coins(state, from, to, amount),
        };

        state.with_transaction(|state| -> Result<(), bank::Error> {
            if !passthrough.is_empty() {
                self.bk.send_coins(state, from, to, &passthrough)?;
            }

            self.send_extended(state, from, to, &extended)?;

            let sent = self.extended_coins(extended.clone());
            state.emit_event(bank::Event::CoinSpent {
                spender: from,
                amount: sent.clone(),
            });
            state.emit_event(bank::Event::CoinReceived {
                receiver: to,
                amount: sent.clone(),
            });
            state.emit_event(bank::Event::Transfer {
                recipient: to,
                sender: from,
                amount: sent,
            });

            Ok(())
        })
    }

    /// Transfer an amount of the extended denomination between two accounts.
    ///
    /// Whole units move through the native bank. A sender whose fractional balance underflows
    /// pays one whole unit into the reserve (borrow) and a recipient whose fractional balance
    /// overflows receives one whole unit from the reserve (carry). The remainder is unchanged.
    fn send_extended(
        &self,
        state: &mut State,
        from: Address,
        to: Address,
        amount: &Int,
    ) -> Result<(), bank::Error> {
        let spendable = self.spendable_extended_amount(state, from);
        if &spendable < amount {
            return Err(bank::Error::InsufficientFunds {
                spendable: Coins::from(Coin::new(self.coin_info.extended_denom(), spendable))
                    .to_string(),
                required: Coin::new(self.coin_info.extended_denom(), amount.clone()).to_string(),
            });
        }

        let cf = self.coin_info.conversion_factor();
        let reserve = self.reserve_address();
        let mut integer_amount = amount / &cf;
        let fractional_amount = amount % &cf;

        let mut sender_fractional = self.get_fractional_balance(state, from) - &fractional_amount;
        let borrow = sender_fractional.is_negative();
        if borrow {
            sender_fractional += &cf;
        }
        // The sender is updated before the recipient is read so sending to self stays balanced.
        self.set_fractional_balance(state, from, sender_fractional);

        let mut recipient_fractional = self.get_fractional_balance(state, to) + &fractional_amount;
        let carry = recipient_fractional >= cf;
        if carry {
            recipient_fractional -= &cf;
        }

        state.with_transaction_opts(
            Options::new().with_silenced_events(),
            |state| -> Result<(), bank::Error> {
                match (borrow, carry) {
                    (true, true) => {
                        // The unit borrowed by the sender is the one carried to the recipient.
                        integer_amount += Int::one();
                    }
                    (true, false) => {
                        slog::debug!(self.logger, "borrowing integer unit into reserve";
                            "address" => from,
                        );
                        self.bk
                            .send_coins(state, from, reserve, &self.integer_coins(1u8))?;
                    }
                    (false, true) => {
                        slog::debug!(self.logger, "carrying fractional balance from reserve";
                            "address" => to,
                        );
                        self.bk
                            .send_coins(state, reserve, to, &self.integer_coins(1u8))?;
                    }
                    (false, false) => {}
                }

                if integer_amount.is_positive() {
                    self.bk.send_coins(
                        state,
                        from,
                        to,
                        &self.integer_coins(integer_amount.clone()),
                    )?;
                }

                Ok(())
            },
        )?;

        self.set_fractional_balance(state, to, recipient_fractional);

        Ok(())
    }
}

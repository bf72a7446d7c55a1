use anyhow::anyhow;

use evm_runtime_sdk::{
    module::MethodRegistry,
    modules::{auth, bank, core::Error as CoreError},
    state::State,
    types::{address::Address, token::Coin},
};

use crate::{types, Keeper};

impl<B: bank::API, A: auth::API> Keeper<B, A> {
    /// Remainder held by the module.
    pub fn query_remainder(&self, state: &mut State) -> types::RemainderResponse {
        types::RemainderResponse {
            remainder: Coin::new(
                self.coin_info.extended_denom(),
                self.get_remainder_amount(state),
            ),
        }
    }

    /// Fractional balance of the given account.
    pub fn query_fractional_balance(
        &self,
        state: &mut State,
        args: types::FractionalBalanceQuery,
    ) -> Result<types::FractionalBalanceResponse, CoreError> {
        let address = Address::from_bech32(&args.address).map_err(|err| {
            CoreError::InvalidArgument(anyhow!("address {}: {}", args.address, err))
        })?;

        Ok(types::FractionalBalanceResponse {
            fractional_balance: Coin::new(
                self.coin_info.extended_denom(),
                self.get_fractional_balance(state, address),
            ),
        })
    }
}

impl<B, A> Keeper<B, A>
where
    B: bank::API + Clone + 'static,
    A: auth::API + Clone + 'static,
{
    /// Register the query methods of the precise bank module.
    pub fn register_queries(&self, registry: &mut MethodRegistry) {
        let keeper = self.clone();
        registry.register_query(
            "precisebank.Remainder",
            Box::new(move |state: &mut State, _args: cbor::Value| {
                Ok(cbor::to_value(keeper.query_remainder(state)))
            }),
        );

        let keeper = self.clone();
        registry.register_query(
            "precisebank.FractionalBalance",
            Box::new(move |state: &mut State, args: cbor::Value| {
                let args = cbor::from_value(args)
                    .map_err(|err| CoreError::InvalidArgument(err.into()))?;
                let response = keeper.query_fractional_balance(state, args)?;
                Ok(cbor::to_value(response))
            }),
        );
    }
}

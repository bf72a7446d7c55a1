//! Mock functionality for use during testing.
use std::collections::BTreeMap;

use evm_runtime_sdk::{
    modules::{auth, bank, bank::API as _},
    testing::mock::{self, Mock},
    types::{
        address::Address,
        token::{Coin, Coins, Int},
    },
};

use crate::{invariants, CoinInfo, CoinInfoResolver, Keeper, MODULE_NAME};

/// Integer denomination used by the mock chain.
pub const INTEGER_DENOM: &str = "uatom";
/// Extended denomination used by the mock chain.
pub const EXTENDED_DENOM: &str = "aatom";

/// Precise bank keeper as wired by the mock chain.
pub type MockKeeper = Keeper<bank::Keeper<auth::Keeper>, auth::Keeper>;

/// Mock chain with the precise bank wrapping the native bank.
pub struct PreciseMock {
    pub mock: Mock,
    pub keeper: MockKeeper,
}

impl PreciseMock {
    /// Create a mock chain whose integer denomination has the given number of decimals.
    ///
    /// The extended denomination always has 18 decimals.
    pub fn new(decimals: u32) -> Self {
        Self::with_coin_info(CoinInfo {
            denom: INTEGER_DENOM.to_string(),
            extended_denom: EXTENDED_DENOM.to_string(),
            decimals,
            extended_decimals: 18,
        })
    }

    /// Create a mock chain with the given coin information.
    pub fn with_coin_info(info: CoinInfo) -> Self {
        let mock = Mock::with_modules(BTreeMap::from([(
            MODULE_NAME.to_string(),
            vec![auth::MINTER.to_string(), auth::BURNER.to_string()],
        )]));
        let coin_info =
            CoinInfoResolver::with_coin_info(info).expect("coin info should be valid");
        let keeper = Keeper::new(mock.bank.clone(), mock.auth.clone(), coin_info);

        Self { mock, keeper }
    }

    /// Number of extended units in one integer unit.
    pub fn conversion_factor(&self) -> Int {
        self.keeper.coin_info().conversion_factor()
    }

    /// Address of the given module account.
    pub fn module_address(&self, module: &str) -> Address {
        self.mock.auth_address(module)
    }

    /// Address of the reserve.
    pub fn reserve(&self) -> Address {
        self.keeper.reserve_address()
    }

    /// Mint the given amount of the extended denomination to the given module.
    pub fn mint_extended<T: Into<Int>>(&mut self, module: &str, amount: T) {
        let amount = extended_coins(amount);
        self.keeper
            .mint_coins(&mut self.mock.state, module, &amount)
            .expect("minting should succeed");
    }

    /// Fund an account with the given amount of the extended denomination by minting it to a
    /// minter module and sending it over.
    pub fn fund<T: Into<Int>>(&mut self, addr: Address, amount: T) {
        let amount = extended_coins(amount);
        self.keeper
            .mint_coins(&mut self.mock.state, mock::EVM, &amount)
            .expect("minting should succeed");
        self.keeper
            .send_coins_from_module_to_account(&mut self.mock.state, mock::EVM, addr, &amount)
            .expect("funding should succeed");
    }

    /// Extended balance of an account as seen through the precise bank.
    pub fn extended_balance(&mut self, addr: Address) -> Int {
        self.keeper
            .get_balance(&mut self.mock.state, addr, EXTENDED_DENOM)
            .amount
    }

    /// Integer balance of an account as held by the native bank.
    pub fn integer_balance(&mut self, addr: Address) -> Int {
        self.mock
            .bank
            .get_balance(&mut self.mock.state, addr, INTEGER_DENOM)
            .amount
    }

    /// Fractional balance of an account.
    pub fn fractional_balance(&mut self, addr: Address) -> Int {
        self.keeper.get_fractional_balance(&mut self.mock.state, addr)
    }

    /// Current remainder.
    pub fn remainder(&mut self) -> Int {
        self.keeper.get_remainder_amount(&mut self.mock.state)
    }

    /// Run all invariants and panic with their message if any is broken.
    pub fn assert_invariants(&mut self) {
        let (msg, broken) = invariants::all_invariants(&self.keeper, &mut self.mock.state);
        assert!(!broken, "invariant broken: {}", msg);
    }
}

/// Coins of the given amount of the extended denomination.
pub fn extended_coins<T: Into<Int>>(amount: T) -> Coins {
    Coins::from(Coin::new(EXTENDED_DENOM, amount))
}

/// Coins of the given amount of the integer denomination.
pub fn integer_coins<T: Into<Int>>(amount: T) -> Coins {
    Coins::from(Coin::new(INTEGER_DENOM, amount))
}

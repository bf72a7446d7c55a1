use std::collections::BTreeMap;

use crate::{
    error::Error as _,
    event::Event as _,
    module::InvariantRegistry,
    testing::{keys, mock},
    types::{
        address::Address,
        token::{Coin, Coins},
    },
};

use super::{types, Error, Event, API as _};

fn coins(s: &str) -> Coins {
    s.parse().unwrap()
}

fn fund_module(mock: &mut mock::Mock, module: &str, amount: &str) {
    mock.bank
        .mint_coins(&mut mock.state, module, &coins(amount))
        .expect("minting should succeed");
}

#[test]
fn test_mint_coins() {
    let mut mock = mock::Mock::new();
    let evm = mock.auth_address(mock::EVM);

    mock.bank
        .mint_coins(&mut mock.state, mock::EVM, &coins("100uatom,5ausdc"))
        .expect("minting should succeed");

    assert_eq!(
        mock.bank.get_balance(&mut mock.state, evm, "uatom"),
        Coin::new("uatom", 100u64)
    );
    assert_eq!(
        mock.bank.get_supply(&mut mock.state, "ausdc"),
        Coin::new("ausdc", 5u64)
    );
    assert_eq!(
        mock.bank.get_all_balances(&mut mock.state, evm),
        coins("5ausdc,100uatom")
    );

    let events = mock.state.take_events();
    assert_eq!(events.len(), 2, "mint should emit received and coinbase events");
    assert_eq!(
        events[0],
        Event::CoinReceived {
            receiver: evm,
            amount: coins("100uatom,5ausdc"),
        }
        .into_event_tag()
    );
    assert_eq!(
        events[1],
        Event::Coinbase {
            minter: evm,
            amount: coins("100uatom,5ausdc"),
        }
        .into_event_tag()
    );
}

#[test]
#[should_panic(expected = "module account unknown does not exist: unknown address")]
fn test_mint_coins_unknown_module() {
    let mut mock = mock::Mock::new();
    let _ = mock
        .bank
        .mint_coins(&mut mock.state, "unknown", &coins("1uatom"));
}

#[test]
#[should_panic(
    expected = "module account fee_collector does not have permissions to mint tokens: unauthorized"
)]
fn test_mint_coins_without_permission() {
    let mut mock = mock::Mock::new();
    let _ = mock
        .bank
        .mint_coins(&mut mock.state, mock::FEE_COLLECTOR, &coins("1uatom"));
}

#[test]
#[should_panic(
    expected = "module account mint does not have permissions to burn tokens: unauthorized"
)]
fn test_burn_coins_without_permission() {
    let mut mock = mock::Mock::new();
    let _ = mock
        .bank
        .burn_coins(&mut mock.state, mock::MINT, &coins("1uatom"));
}

#[test]
fn test_mint_coins_invalid() {
    let mut mock = mock::Mock::new();
    let amount = Coins::from_unchecked(vec![Coin::new("uatom", -5i64)]);

    let err = mock
        .bank
        .mint_coins(&mut mock.state, mock::EVM, &amount)
        .unwrap_err();
    assert_eq!(err.to_string(), "-5uatom: invalid coins");
    assert_eq!(err.codespace(), "sdk");
    assert_eq!(err.code(), 10);
    assert!(mock.state.events().is_empty());
}

#[test]
fn test_burn_coins() {
    let mut mock = mock::Mock::new();
    let evm = mock.auth_address(mock::EVM);
    fund_module(&mut mock, mock::EVM, "100uatom");

    mock.bank
        .burn_coins(&mut mock.state, mock::EVM, &coins("40uatom"))
        .expect("burning should succeed");
    assert_eq!(
        mock.bank.get_balance(&mut mock.state, evm, "uatom"),
        Coin::new("uatom", 60u64)
    );
    assert_eq!(
        mock.bank.get_supply(&mut mock.state, "uatom"),
        Coin::new("uatom", 60u64)
    );

    // Burning everything removes the balance and the supply entries.
    mock.bank
        .burn_coins(&mut mock.state, mock::EVM, &coins("60uatom"))
        .expect("burning should succeed");
    assert!(mock.bank.get_all_balances(&mut mock.state, evm).is_empty());
    assert!(super::get_total_supplies(&mut mock.state).is_empty());
}

#[test]
fn test_burn_coins_insufficient() {
    let mut mock = mock::Mock::new();

    let err = mock
        .bank
        .burn_coins(&mut mock.state, mock::EVM, &coins("10uatom"))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "spendable balance 0uatom is smaller than 10uatom: insufficient funds"
    );
    assert_eq!(err.code(), 5);
}

#[test]
fn test_send_coins() {
    let mut mock = mock::Mock::new();
    let evm = mock.auth_address(mock::EVM);
    fund_module(&mut mock, mock::EVM, "100uatom");
    mock.state.take_events();

    mock.bank
        .send_coins_from_module_to_account(
            &mut mock.state,
            mock::EVM,
            keys::alice::address(),
            &coins("30uatom"),
        )
        .expect("transfer should succeed");
    mock.bank
        .send_coins(
            &mut mock.state,
            keys::alice::address(),
            keys::bob::address(),
            &coins("10uatom"),
        )
        .expect("transfer should succeed");

    let balance = |mock: &mut mock::Mock, addr: Address| {
        mock.bank
            .get_balance(&mut mock.state, addr, "uatom")
            .amount
            .to_u128()
            .unwrap()
    };
    assert_eq!(balance(&mut mock, evm), 70);
    assert_eq!(balance(&mut mock, keys::alice::address()), 20);
    assert_eq!(balance(&mut mock, keys::bob::address()), 10);
    assert_eq!(
        mock.bank.get_supply(&mut mock.state, "uatom"),
        Coin::new("uatom", 100u64)
    );

    let events = mock.state.take_events();
    assert_eq!(events.len(), 6);
    assert_eq!(
        events[5],
        Event::Transfer {
            recipient: keys::bob::address(),
            sender: keys::alice::address(),
            amount: coins("10uatom"),
        }
        .into_event_tag()
    );
}

#[test]
fn test_send_coins_insufficient() {
    let mut mock = mock::Mock::new();

    let err = mock
        .bank
        .send_coins(
            &mut mock.state,
            keys::alice::address(),
            keys::bob::address(),
            &coins("1000aatom"),
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "spendable balance  is smaller than 1000aatom: insufficient funds"
    );

    fund_module(&mut mock, mock::EVM, "10aatom,50ausdc");
    mock.bank
        .send_coins_from_module_to_account(
            &mut mock.state,
            mock::EVM,
            keys::alice::address(),
            &coins("10aatom,50ausdc"),
        )
        .expect("transfer should succeed");

    let err = mock
        .bank
        .send_coins(
            &mut mock.state,
            keys::alice::address(),
            keys::bob::address(),
            &coins("1000aatom"),
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "spendable balance 10aatom is smaller than 1000aatom: insufficient funds"
    );
}

#[test]
fn test_send_coins_atomic() {
    let mut mock = mock::Mock::new();
    fund_module(&mut mock, mock::EVM, "10aatom");
    mock.bank
        .send_coins_from_module_to_account(
            &mut mock.state,
            mock::EVM,
            keys::alice::address(),
            &coins("10aatom"),
        )
        .expect("transfer should succeed");
    mock.state.take_events();

    // The first denomination can be paid, the second cannot.
    let err = mock
        .bank
        .send_coins(
            &mut mock.state,
            keys::alice::address(),
            keys::bob::address(),
            &coins("5aatom,1ausdc"),
        )
        .unwrap_err();
    assert!(matches!(err, Error::InsufficientFunds { .. }));

    assert_eq!(
        mock.bank
            .get_all_balances(&mut mock.state, keys::alice::address()),
        coins("10aatom")
    );
    assert!(mock
        .bank
        .get_all_balances(&mut mock.state, keys::bob::address())
        .is_empty());
    assert!(mock.state.events().is_empty());
}

#[test]
fn test_locked_coins() {
    let mut mock = mock::Mock::new();
    let alice = keys::alice::address();
    fund_module(&mut mock, mock::EVM, "100uatom");
    mock.bank
        .send_coins_from_module_to_account(&mut mock.state, mock::EVM, alice, &coins("100uatom"))
        .expect("transfer should succeed");

    mock.bank
        .set_locked_coins(&mut mock.state, alice, coins("70uatom"));
    assert_eq!(
        mock.bank.spendable_coin(&mut mock.state, alice, "uatom"),
        Coin::new("uatom", 30u64)
    );

    let err = mock
        .bank
        .send_coins(
            &mut mock.state,
            alice,
            keys::bob::address(),
            &coins("31uatom"),
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "spendable balance 30uatom is smaller than 31uatom: insufficient funds"
    );

    mock.bank
        .set_locked_coins(&mut mock.state, alice, coins("150uatom"));
    let err = mock
        .bank
        .send_coins(&mut mock.state, alice, keys::bob::address(), &coins("1uatom"))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "locked amount exceeds account balance funds: 150uatom > 100uatom: insufficient funds"
    );
    assert_eq!(
        mock.bank.spendable_coin(&mut mock.state, alice, "uatom"),
        Coin::new("uatom", 0u64)
    );
}

#[test]
fn test_blocked_recipient() {
    let mut mock = mock::Mock::new();
    let community = mock.auth_address(mock::COMMUNITY);
    fund_module(&mut mock, mock::EVM, "100uatom");

    let err = mock
        .bank
        .send_coins_from_module_to_account(&mut mock.state, mock::EVM, community, &coins("1uatom"))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("{} is not allowed to receive funds: unauthorized", community)
    );
    assert_eq!(err.code(), 4);

    // Module to module transfers are not subject to the blocklist.
    mock.bank
        .send_coins_from_module_to_module(
            &mut mock.state,
            mock::EVM,
            mock::COMMUNITY,
            &coins("1uatom"),
        )
        .expect("transfer should succeed");
}

#[test]
fn test_msg_send() {
    let mut mock = mock::Mock::new();
    let alice = keys::alice::address();
    fund_module(&mut mock, mock::EVM, "100uatom");
    mock.bank
        .send_coins_from_module_to_account(&mut mock.state, mock::EVM, alice, &coins("100uatom"))
        .expect("transfer should succeed");

    let err = mock
        .bank
        .msg_send(&mut mock.state, alice, keys::bob::address(), &Coins::default())
        .unwrap_err();
    assert_eq!(err.to_string(), ": invalid coins");

    let fee_collector = mock.auth_address(mock::FEE_COLLECTOR);
    let err = mock
        .bank
        .msg_send(&mut mock.state, alice, fee_collector, &coins("1uatom"))
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));

    mock.bank
        .msg_send(&mut mock.state, alice, keys::bob::address(), &coins("1uatom"))
        .expect("transfer should succeed");
}

#[test]
fn test_iterate_balances() {
    let mut mock = mock::Mock::new();
    fund_module(&mut mock, mock::EVM, "100uatom,3ausdc");
    for addr in [keys::alice::address(), keys::bob::address()] {
        mock.bank
            .send_coins_from_module_to_account(
                &mut mock.state,
                mock::EVM,
                addr,
                &coins("10uatom,1ausdc"),
            )
            .expect("transfer should succeed");
    }

    let mut seen = Vec::new();
    mock.bank.iterate_all_balances(&mut mock.state, |addr, coin| {
        seen.push((addr, coin));
        false
    });
    assert_eq!(seen.len(), 6);

    // Stopping early.
    let mut count = 0;
    mock.bank
        .iterate_account_balances(&mut mock.state, keys::alice::address(), |_| {
            count += 1;
            true
        });
    assert_eq!(count, 1);
}

#[test]
fn test_denom_metadata() {
    let mut mock = mock::Mock::new();
    let metadata = types::Metadata {
        description: "The native staking token".to_string(),
        denom_units: vec![
            types::DenomUnit {
                denom: "uatom".to_string(),
                exponent: 0,
                aliases: vec!["microatom".to_string()],
            },
            types::DenomUnit {
                denom: "atom".to_string(),
                exponent: 6,
                aliases: vec![],
            },
        ],
        base: "uatom".to_string(),
        display: "atom".to_string(),
        ..Default::default()
    };

    assert!(mock
        .bank
        .get_denom_metadata(&mut mock.state, "uatom")
        .is_none());
    mock.bank
        .set_denom_metadata(&mut mock.state, metadata.clone());
    let stored = mock
        .bank
        .get_denom_metadata(&mut mock.state, "uatom")
        .expect("metadata should be stored");
    assert_eq!(stored, metadata);
    assert_eq!(stored.exponent_of("atom"), Some(6));
}

#[test]
fn test_genesis() {
    let mut mock = mock::Mock::new();
    let genesis = types::Genesis {
        balances: BTreeMap::from([
            (keys::alice::address(), coins("10uatom,5ausdc")),
            (keys::bob::address(), coins("7uatom")),
        ]),
        supply: coins("17uatom,5ausdc"),
        denom_metadata: vec![],
    };
    mock.bank.init_genesis(&mut mock.state, genesis.clone());

    let exported = mock.bank.export_genesis(&mut mock.state);
    assert_eq!(exported, genesis);

    let (msg, broken) = super::total_supply_invariant(&mut mock.state);
    assert!(!broken, "{}", msg);
}

#[test]
#[should_panic(expected = "unexpected total supply (expected: 18 got: 17)")]
fn test_genesis_supply_mismatch() {
    let mut mock = mock::Mock::new();
    let genesis = types::Genesis {
        balances: BTreeMap::from([(keys::alice::address(), coins("17uatom"))]),
        supply: coins("18uatom"),
        denom_metadata: vec![],
    };
    mock.bank.init_genesis(&mut mock.state, genesis);
}

#[test]
fn test_total_supply_invariant() {
    let mut mock = mock::Mock::new();
    let mut registry = InvariantRegistry::new();
    mock.bank.register_invariants(&mut registry);
    fund_module(&mut mock, mock::EVM, "100uatom");

    let (_, broken) = registry
        .check_route(&mut mock.state, "bank", "total-supply")
        .expect("route should be registered");
    assert!(!broken);

    mock.bank.set_balance(
        &mut mock.state,
        keys::alice::address(),
        &Coin::new("uatom", 1u64),
    );
    let (msg, broken) = registry
        .check_route(&mut mock.state, "bank", "total-supply")
        .expect("route should be registered");
    assert!(broken);
    assert_eq!(
        msg,
        "bank: total supply invariant\n\tsum of accounts coins: 101uatom\n\tsupply: 100uatom\n\n"
    );
    assert!(registry.assert_invariants(&mut mock.state).is_err());
}

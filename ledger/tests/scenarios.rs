use payescrow_core::{Address, Encoding, EscrowError, Method, ReturnValue, Transaction, TxnType};
use payescrow_ledger::config::app_call;
use payescrow_ledger::{Ledger, LedgerError, FIRST_APP_ID};
use proptest::prelude::*;

const APP: u64 = FIRST_APP_ID;

fn owner() -> Address {
    Address([1u8; 32])
}

fn recipient() -> Address {
    Address([2u8; 32])
}

fn depositor() -> Address {
    Address([3u8; 32])
}

fn stranger() -> Address {
    Address([4u8; 32])
}

fn app_address() -> Address {
    Address::for_application(APP)
}

fn assert_rejected<T: std::fmt::Debug>(res: payescrow_ledger::Result<T>, expected: EscrowError) {
    match res {
        Err(e) => assert_eq!(e.escrow_error(), Some(&expected), "got {e}"),
        Ok(v) => panic!("Expected rejection, got {v:?}"),
    }
}

fn deposit_group(sender: Address, amount: u64) -> Vec<Transaction> {
    vec![
        Transaction::Payment {
            sender,
            receiver: app_address(),
            amount,
            note: Vec::new(),
        },
        app_call(sender, APP, &Method::Deposit, Encoding::Named).unwrap(),
    ]
}

fn pay(sender: Address, amount: u64, encoding: Encoding) -> Transaction {
    let method = Method::Pay {
        recipient: recipient(),
        amount,
        note: "x".into(),
    };
    app_call(sender, APP, &method, encoding).unwrap()
}

fn withdraw(sender: Address, amount: u64) -> Transaction {
    app_call(sender, APP, &Method::Withdraw { amount }, Encoding::Selector).unwrap()
}

/// Ledger with a created escrow and a funded depositor.
fn deployed() -> Ledger {
    let mut ledger = Ledger::new();
    ledger.fund(depositor(), 1_000_000).unwrap();
    ledger.fund(stranger(), 1_000).unwrap();
    let receipt = ledger
        .submit_group(&[app_call(owner(), 0, &Method::Create, Encoding::Named).unwrap()])
        .unwrap();
    assert_eq!(receipt.created_app, Some(APP));
    ledger
}

fn escrowed(ledger: &Ledger) -> u64 {
    match ledger.read_only(APP, stranger(), &Method::Balance).unwrap() {
        Some(ReturnValue::Uint(total)) => total,
        other => panic!("unexpected return {other:?}"),
    }
}

#[test]
fn deposit_pay_and_rejections() {
    let mut ledger = deployed();

    // create, then deposit 1000
    ledger.submit_group(&deposit_group(depositor(), 1000)).unwrap();
    assert_eq!(escrowed(&ledger), 1000);
    assert_eq!(ledger.balance(&app_address()), 1000);

    // owner pays 400 to the recipient
    let receipt = ledger
        .submit_group(&[pay(owner(), 400, Encoding::Selector)])
        .unwrap();
    let outcome = receipt.entries[0].outcome.as_ref().unwrap();
    assert_eq!(outcome.inner_payments.len(), 1);
    assert_eq!(outcome.inner_payments[0].note, b"x".to_vec());
    assert_eq!(ledger.balance(&recipient()), 400);
    assert_eq!(escrowed(&ledger), 600);
    assert_eq!(ledger.balance(&app_address()), 600);

    // over-withdraw is rejected and nothing moves
    let before = ledger.clone();
    assert_rejected(
        ledger.submit_group(&[withdraw(owner(), 1000)]),
        EscrowError::InsufficientEscrow {
            available: 600,
            requested: 1000,
        },
    );
    assert_eq!(ledger, before);

    // a non-owner cannot pay out
    assert_rejected(
        ledger.submit_group(&[pay(stranger(), 1, Encoding::Named)]),
        EscrowError::NotOwner { caller: stranger() },
    );
    assert_eq!(ledger, before);
    assert_eq!(ledger.balance(&recipient()), 400);
}

#[test]
fn owner_query_matches_creator() {
    let ledger = deployed();
    assert_eq!(
        ledger.read_only(APP, stranger(), &Method::GetOwner).unwrap(),
        Some(ReturnValue::Address(owner()))
    );
    assert_eq!(ledger.application(APP).unwrap().creator, owner());
}

#[test]
fn second_create_is_rejected() {
    let mut ledger = deployed();
    let before = ledger.clone();
    let recreate = app_call(stranger(), APP, &Method::Create, Encoding::Selector).unwrap();
    assert_rejected(
        ledger.submit_group(&[recreate]),
        EscrowError::AlreadyInitialized,
    );
    assert_eq!(ledger, before);
}

#[test]
fn create_and_deposit_in_one_group() {
    let mut ledger = Ledger::new();
    ledger.fund(depositor(), 500).unwrap();

    let mut group = vec![app_call(owner(), 0, &Method::Create, Encoding::Named).unwrap()];
    group.extend(deposit_group(depositor(), 500));
    let receipt = ledger.submit_group(&group).unwrap();

    assert_eq!(receipt.created_app, Some(APP));
    assert_eq!(receipt.entries[1].txn_type, TxnType::Payment);
    assert_eq!(escrowed(&ledger), 500);
    assert_eq!(ledger.balance(&depositor()), 0);
}

#[test]
fn malformed_deposit_groups_are_rejected() {
    let mut ledger = deployed();
    ledger.submit_group(&deposit_group(depositor(), 50)).unwrap();
    let before = ledger.clone();

    let call = app_call(depositor(), APP, &Method::Deposit, Encoding::Selector).unwrap();

    assert_rejected(
        ledger.submit_group(&[call.clone()]),
        EscrowError::MissingGroupedTransfer,
    );

    let query = app_call(depositor(), APP, &Method::Balance, Encoding::Named).unwrap();
    assert_rejected(
        ledger.submit_group(&[query, call.clone()]),
        EscrowError::WrongTransactionType(TxnType::AppCall),
    );

    let misdirected = Transaction::Payment {
        sender: depositor(),
        receiver: recipient(),
        amount: 10,
        note: Vec::new(),
    };
    assert_rejected(
        ledger.submit_group(&[misdirected, call]),
        EscrowError::WrongReceiver {
            expected: app_address(),
            found: recipient(),
        },
    );

    assert_rejected(
        ledger.submit_group(&deposit_group(depositor(), 0)),
        EscrowError::ZeroAmount,
    );

    assert_eq!(ledger, before);
    assert_eq!(escrowed(&ledger), 50);
}

#[test]
fn later_failure_unwinds_earlier_deposit() {
    let mut ledger = deployed();
    let before = ledger.clone();

    let mut group = deposit_group(depositor(), 300);
    group.push(Transaction::Payment {
        sender: stranger(),
        receiver: owner(),
        amount: 5_000,
        note: Vec::new(),
    });

    let err = ledger.submit_group(&group).unwrap_err();
    assert!(matches!(err, LedgerError::Overdraft { index: 2, .. }));
    assert_eq!(ledger, before);
    assert_eq!(escrowed(&ledger), 0);
}

#[test]
fn withdraw_in_group_after_deposit() {
    let mut ledger = deployed();

    let mut group = deposit_group(depositor(), 700);
    group.push(withdraw(owner(), 700));
    let receipt = ledger.submit_group(&group).unwrap();

    assert_eq!(receipt.entries.len(), 3);
    assert_eq!(ledger.balance(&owner()), 700);
    assert_eq!(ledger.balance(&app_address()), 0);
    assert_eq!(escrowed(&ledger), 0);
}

#[test]
fn application_account_cannot_be_spent_directly() {
    let mut ledger = deployed();
    ledger.submit_group(&deposit_group(depositor(), 1000)).unwrap();
    let before = ledger.clone();

    let thief = Address([9u8; 32]);
    let drain = Transaction::Payment {
        sender: app_address(),
        receiver: thief,
        amount: 1000,
        note: Vec::new(),
    };
    assert_eq!(
        ledger.submit_group(&[drain]),
        Err(LedgerError::UnauthorizedSender {
            index: 0,
            account: app_address(),
        })
    );

    assert_eq!(ledger, before);
    assert_eq!(ledger.balance(&thief), 0);
    assert_eq!(ledger.balance(&app_address()), 1000);
    assert_eq!(escrowed(&ledger), 1000);
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Deposit(u64),
    Pay(u64),
    Withdraw(u64),
    StrangerPay(u64),
    Drain(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u64..500).prop_map(Op::Deposit),
        (0u64..800).prop_map(Op::Pay),
        (0u64..800).prop_map(Op::Withdraw),
        (1u64..100).prop_map(Op::StrangerPay),
        (1u64..800).prop_map(Op::Drain),
    ]
}

proptest! {
    /// The escrowed total always equals accepted deposits minus accepted
    /// payouts, and the application account always covers it.
    #[test]
    fn total_tracks_accepted_flows(ops in prop::collection::vec(op(), 1..40)) {
        let mut ledger = deployed();
        let mut expected = 0u64;

        for op in ops {
            let (group, accepted) = match op {
                Op::Deposit(a) => (deposit_group(depositor(), a), a > 0),
                Op::Pay(a) => (vec![pay(owner(), a, Encoding::Named)], a > 0 && a <= expected),
                Op::Withdraw(a) => (vec![withdraw(owner(), a)], a > 0 && a <= expected),
                Op::StrangerPay(a) => (vec![pay(stranger(), a, Encoding::Selector)], false),
                Op::Drain(a) => {
                    let drain = Transaction::Payment {
                        sender: app_address(),
                        receiver: stranger(),
                        amount: a,
                        note: Vec::new(),
                    };
                    (vec![drain], false)
                }
            };

            let res = ledger.submit_group(&group);
            prop_assert_eq!(res.is_ok(), accepted, "{:?} -> {:?}", op, res);

            if accepted {
                match op {
                    Op::Deposit(a) => expected += a,
                    Op::Pay(a) | Op::Withdraw(a) => expected -= a,
                    Op::StrangerPay(_) | Op::Drain(_) => {}
                }
            }

            prop_assert_eq!(escrowed(&ledger), expected);
            prop_assert!(ledger.balance(&app_address()) >= expected);
        }
    }
}

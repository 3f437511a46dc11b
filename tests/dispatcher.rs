mod common;

use alloy::consensus::Transaction;
use alloy::primitives::{Address, U256};
use std::sync::Arc;
use std::time::Duration;

use balance_relay::error::{DispatchError, ForwarderError};
use balance_relay::transfer::{build_native_transfer, DispatchResult, Dispatcher, UnsignedTransaction, Wallet};
use common::*;

fn native_tx(nonce: u64) -> UnsignedTransaction {
    build_native_transfer(sender(), receiver(), dec("0.01"), nonce, 1_000_000_000, 21_000, 59141).unwrap()
}

fn setup(pending_nonce: u64) -> (Arc<MockChainClient>, Dispatcher, Wallet) {
    let client = Arc::new(MockChainClient::new().with_pending_nonce(pending_nonce));
    let dispatcher = Dispatcher::new(client.clone());
    let wallet = Wallet::from_private_key(DEV_KEY).unwrap();
    (client, dispatcher, wallet)
}

#[tokio::test]
async fn test_confirmed_dispatch() {
    let (client, dispatcher, wallet) = setup(3);

    let nonce = dispatcher.reserve_nonce(wallet.address()).await.unwrap();
    assert_eq!(nonce, 3);

    let result = dispatcher
        .send(native_tx(nonce), &wallet, Duration::from_secs(5))
        .await
        .unwrap();
    assert!(result.is_confirmed());

    let sent = client.sent_transactions();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].nonce(), 3);
    assert_eq!(sent[0].to(), Some(receiver()));
    assert_eq!(sent[0].value(), U256::from(10_000_000_000_000_000u64));
    assert_eq!(sent[0].chain_id(), Some(59141));
    match result {
        DispatchResult::Confirmed { hash } => assert_eq!(hash, *sent[0].tx_hash()),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_reserved_nonces_are_never_handed_out_twice() {
    let (_client, dispatcher, wallet) = setup(5);

    // The chain count stays at 5 because nothing is submitted
    assert_eq!(dispatcher.reserve_nonce(wallet.address()).await.unwrap(), 5);
    assert_eq!(dispatcher.reserve_nonce(wallet.address()).await.unwrap(), 6);
    assert_eq!(dispatcher.reserve_nonce(wallet.address()).await.unwrap(), 7);
}

#[tokio::test]
async fn test_rejected_submission_releases_nonce() {
    let (client, dispatcher, wallet) = setup(5);
    client.set_submit_error(Some("replacement transaction underpriced"));

    let nonce = dispatcher.reserve_nonce(wallet.address()).await.unwrap();
    let result = dispatcher
        .send(native_tx(nonce), &wallet, Duration::from_secs(5))
        .await
        .unwrap();
    assert!(matches!(
        result,
        DispatchResult::SubmissionFailed { ref reason } if reason.contains("underpriced")
    ));

    client.set_submit_error(None);
    let next = dispatcher.reserve_nonce(wallet.address()).await.unwrap();
    assert_eq!(next, 5);
    assert!(dispatcher
        .send(native_tx(next), &wallet, Duration::from_secs(5))
        .await
        .unwrap()
        .is_confirmed());
}

#[tokio::test]
async fn test_insufficient_funds_does_not_stall_later_forwards() {
    let (client, dispatcher, wallet) = setup(0);
    client.set_submit_error(Some("insufficient funds for gas * price + value"));

    let nonce = dispatcher.reserve_nonce(wallet.address()).await.unwrap();
    let result = dispatcher
        .send(native_tx(nonce), &wallet, Duration::from_secs(5))
        .await
        .unwrap();
    assert!(matches!(result, DispatchResult::InsufficientFunds { .. }));

    assert_eq!(
        dispatcher.reserve_nonce(wallet.address()).await.unwrap(),
        client.pending_nonce()
    );
}

#[tokio::test]
async fn test_dropped_submission_keeps_nonce_burned() {
    let (client, dispatcher, wallet) = setup(5);
    client.set_submit_dropped(true);

    let nonce = dispatcher.reserve_nonce(wallet.address()).await.unwrap();
    let result = dispatcher
        .send(native_tx(nonce), &wallet, Duration::from_secs(5))
        .await
        .unwrap();
    assert!(matches!(result, DispatchResult::SubmissionFailed { .. }));

    // The node may hold nonce 5, so it is not handed out again
    client.set_submit_dropped(false);
    assert_eq!(dispatcher.reserve_nonce(wallet.address()).await.unwrap(), 6);
}

#[tokio::test]
async fn test_used_nonce_is_refused_without_contacting_node() {
    let (client, dispatcher, wallet) = setup(0);

    let first = dispatcher
        .send(native_tx(0), &wallet, Duration::from_secs(5))
        .await
        .unwrap();
    assert!(first.is_confirmed());
    assert_eq!(client.sent_count(), 1);

    let second = dispatcher
        .send(native_tx(0), &wallet, Duration::from_secs(5))
        .await
        .unwrap();
    assert!(matches!(
        second,
        DispatchResult::SubmissionFailed { ref reason } if reason.contains("already used")
    ));
    assert_eq!(client.sent_count(), 1);
}

#[tokio::test]
async fn test_insufficient_funds_reports_both_figures() {
    let (client, dispatcher, wallet) = setup(0);
    client.set_submit_error(Some(
        "insufficient funds for gas * price + value: address 0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266 have 1000 want 10021000000000000",
    ));
    client.push_balance(U256::from(1_000u64));

    let result = dispatcher
        .send(native_tx(0), &wallet, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(
        result,
        DispatchResult::InsufficientFunds {
            required: Some(U256::from(10_021_000_000_000_000u64)),
            available: Some(U256::from(1_000u64)),
        }
    );
}

#[tokio::test]
async fn test_insufficient_funds_without_figures() {
    let (client, dispatcher, wallet) = setup(0);
    client.set_submit_error(Some("Insufficient funds"));
    client.push_balance_error();

    let result = dispatcher
        .send(native_tx(0), &wallet, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(
        result,
        DispatchResult::InsufficientFunds {
            required: None,
            available: None,
        }
    );
}

#[tokio::test]
async fn test_confirmation_timeout_carries_hash() {
    let (client, dispatcher, wallet) = setup(0);
    client.set_receipt_mode(ReceiptMode::Timeout);

    let result = dispatcher
        .send(native_tx(0), &wallet, Duration::from_secs(120))
        .await;

    let sent_hash = *client.sent_transactions()[0].tx_hash();
    match result {
        Err(ForwarderError::Dispatch(DispatchError::ConfirmationTimeout { hash, seconds })) => {
            assert_eq!(hash, sent_hash);
            assert_eq!(seconds, 120);
        }
        other => panic!("expected confirmation timeout, got {:?}", other),
    }
    assert_eq!(client.sent_count(), 1);
}

#[tokio::test]
async fn test_reverted_transaction() {
    let (client, dispatcher, wallet) = setup(0);
    client.set_receipt_mode(ReceiptMode::Revert);

    let result = dispatcher
        .send(native_tx(0), &wallet, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(
        result,
        DispatchResult::SubmissionFailed {
            reason: "reverted in block 7".to_string()
        }
    );
}

#[tokio::test]
async fn test_transaction_from_another_account_is_not_signed() {
    let (client, dispatcher, wallet) = setup(0);

    let mut tx = native_tx(0);
    tx.from = Address::repeat_byte(9);

    let result = dispatcher.send(tx, &wallet, Duration::from_secs(5)).await;
    assert!(matches!(result, Err(ForwarderError::Dispatch(DispatchError::Signing(_)))));
    assert_eq!(client.sent_count(), 0);
}

mod common;

use common::*;
use rideline::db::repo;
use rideline::domain::{PaymentMethod, PaymentStatus, TransactionType};
use rideline::error::AppError;
use tokio_test::assert_ok;

#[tokio::test]
async fn test_wallet_settlement_moves_funds() {
    let (app, _temp) = setup().await;
    let (trip_id, passenger) = create_searching_trip(&app).await;
    let driver_user = complete_trip(&app, &trip_id).await;

    let payer_wallet = seed_wallet(&app.repo, &passenger, 10_000).await;
    let driver_wallet = seed_wallet(&app.repo, &driver_user, 0).await;

    // Fare is 5.30: platform fee 1.06, driver 4.24, tax 0.64.
    let payment = app
        .settlement
        .settle(&trip_id, &passenger, PaymentMethod::Wallet)
        .await
        .expect("settlement failed");

    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.amount, money("5.3"));
    assert_eq!(payment.platform_fee, money("1.06"));
    assert_eq!(payment.driver_amount, money("4.24"));
    assert_eq!(payment.tax_amount, money("0.64"));
    assert_eq!(payment.platform_fee + payment.driver_amount, payment.amount);

    let mut conn = app.repo.acquire().await.unwrap();
    assert_eq!(
        repo::wallets::balance_cents(&mut conn, &payer_wallet)
            .await
            .unwrap(),
        10_000 - 530
    );
    assert_eq!(
        repo::wallets::balance_cents(&mut conn, &driver_wallet)
            .await
            .unwrap(),
        424
    );

    // One signed row per movement, both referencing the payment.
    let payer_txs = repo::wallets::transactions_for(&mut conn, &payer_wallet, 10)
        .await
        .unwrap();
    assert_eq!(payer_txs.len(), 1);
    assert_eq!(payer_txs[0].amount, -money("5.3"));
    assert_eq!(payer_txs[0].tx_type, TransactionType::Payment);
    assert_eq!(payer_txs[0].reference_id, Some(payment.id.clone()));

    let driver_txs = repo::wallets::transactions_for(&mut conn, &driver_wallet, 10)
        .await
        .unwrap();
    assert_eq!(driver_txs.len(), 1);
    assert_eq!(driver_txs[0].amount, money("4.24"));
    assert_eq!(driver_txs[0].tx_type, TransactionType::TripEarning);
}

#[tokio::test]
async fn test_settle_requires_completed_trip() {
    let (app, _temp) = setup().await;
    let (trip_id, passenger) = create_searching_trip(&app).await;
    seed_wallet(&app.repo, &passenger, 10_000).await;

    let result = app
        .settlement
        .settle(&trip_id, &passenger, PaymentMethod::Cash)
        .await;

    match result {
        Err(AppError::Conflict(msg)) => {
            assert!(msg.contains("SEARCHING"), "message was: {}", msg);
            assert!(msg.contains("COMPLETED"), "message was: {}", msg);
        }
        other => panic!("expected Conflict, got {:?}", other.map(|p| p.status)),
    }
}

#[tokio::test]
async fn test_settle_rejects_non_passenger() {
    let (app, _temp) = setup().await;
    let (trip_id, _passenger) = create_searching_trip(&app).await;
    complete_trip(&app, &trip_id).await;
    let outsider = seed_passenger(&app.repo).await;

    let result = app
        .settlement
        .settle(&trip_id, &outsider, PaymentMethod::Cash)
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_settle_twice_is_rejected_once_applied() {
    let (app, _temp) = setup().await;
    let (trip_id, passenger) = create_searching_trip(&app).await;
    let driver_user = complete_trip(&app, &trip_id).await;

    let payer_wallet = seed_wallet(&app.repo, &passenger, 10_000).await;
    seed_wallet(&app.repo, &driver_user, 0).await;

    app.settlement
        .settle(&trip_id, &passenger, PaymentMethod::Wallet)
        .await
        .expect("first settlement failed");

    let result = app
        .settlement
        .settle(&trip_id, &passenger, PaymentMethod::Wallet)
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    // Exactly one settlement's worth of movement.
    let mut conn = app.repo.acquire().await.unwrap();
    assert_eq!(
        repo::wallets::balance_cents(&mut conn, &payer_wallet)
            .await
            .unwrap(),
        10_000 - 530
    );
    let txs = repo::wallets::transactions_for(&mut conn, &payer_wallet, 10)
        .await
        .unwrap();
    assert_eq!(txs.len(), 1);
}

#[tokio::test]
async fn test_insufficient_funds_leaves_no_trace() {
    let (app, _temp) = setup().await;
    let (trip_id, passenger) = create_searching_trip(&app).await;
    complete_trip(&app, &trip_id).await;

    // 1.00 in the wallet, fare is 5.30.
    let wallet_id = seed_wallet(&app.repo, &passenger, 100).await;

    let result = app
        .settlement
        .settle(&trip_id, &passenger, PaymentMethod::Wallet)
        .await;
    assert!(matches!(result, Err(AppError::InsufficientFunds { .. })));

    // All-or-nothing: no payment row, no balance change, no ledger row.
    let mut conn = app.repo.acquire().await.unwrap();
    assert!(repo::payments::get_by_trip(&mut conn, &trip_id)
        .await
        .unwrap()
        .is_none());
    assert_eq!(
        repo::wallets::balance_cents(&mut conn, &wallet_id)
            .await
            .unwrap(),
        100
    );
    assert!(repo::wallets::transactions_for(&mut conn, &wallet_id, 10)
        .await
        .unwrap()
        .is_empty());

    // A later cash settlement still goes through.
    tokio_test::assert_ok!(
        app.settlement
            .settle(&trip_id, &passenger, PaymentMethod::Cash)
            .await
    );
}

#[tokio::test]
async fn test_cash_settlement_skips_wallets() {
    let (app, _temp) = setup().await;
    let (trip_id, passenger) = create_searching_trip(&app).await;
    let driver_user = complete_trip(&app, &trip_id).await;

    let payer_wallet = seed_wallet(&app.repo, &passenger, 10_000).await;
    let driver_wallet = seed_wallet(&app.repo, &driver_user, 0).await;

    let payment = app
        .settlement
        .settle(&trip_id, &passenger, PaymentMethod::Cash)
        .await
        .expect("settlement failed");

    assert_eq!(payment.status, PaymentStatus::Completed);

    let mut conn = app.repo.acquire().await.unwrap();
    assert_eq!(
        repo::wallets::balance_cents(&mut conn, &payer_wallet)
            .await
            .unwrap(),
        10_000
    );
    assert_eq!(
        repo::wallets::balance_cents(&mut conn, &driver_wallet)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_settle_without_wallet_is_not_found() {
    let (app, _temp) = setup().await;
    let (trip_id, passenger) = create_searching_trip(&app).await;
    complete_trip(&app, &trip_id).await;

    let result = app
        .settlement
        .settle(&trip_id, &passenger, PaymentMethod::Wallet)
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_deposit_and_withdraw_pair_with_ledger_rows() {
    let (app, _temp) = setup().await;
    let user = seed_passenger(&app.repo).await;
    let wallet_id = seed_wallet(&app.repo, &user, 0).await;

    let (wallet, tx) = app
        .settlement
        .deposit(&user, money("50"), None)
        .await
        .expect("deposit failed");
    assert_eq!(wallet.balance, money("50"));
    assert_eq!(tx.amount, money("50"));
    assert_eq!(tx.balance_after, money("50"));
    assert_eq!(tx.tx_type, TransactionType::Deposit);

    let (wallet, tx) = app
        .settlement
        .withdraw(&user, money("20"), Some("cash out".to_string()))
        .await
        .expect("withdraw failed");
    assert_eq!(wallet.balance, money("30"));
    assert_eq!(tx.amount, -money("20"));
    assert_eq!(tx.balance_after, money("30"));

    let result = app.settlement.withdraw(&user, money("100"), None).await;
    assert!(matches!(result, Err(AppError::InsufficientFunds { .. })));

    let result = app.settlement.deposit(&user, money("0"), None).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let mut conn = app.repo.acquire().await.unwrap();
    let txs = repo::wallets::transactions_for(&mut conn, &wallet_id, 10)
        .await
        .unwrap();
    assert_eq!(txs.len(), 2);
}

#[tokio::test]
async fn test_balance_always_equals_transaction_sum() {
    let (app, _temp) = setup().await;
    let (trip_id, passenger) = create_searching_trip(&app).await;
    let driver_user = complete_trip(&app, &trip_id).await;

    let payer_wallet = seed_wallet(&app.repo, &passenger, 0).await;
    let driver_wallet = seed_wallet(&app.repo, &driver_user, 0).await;

    app.settlement
        .deposit(&passenger, money("40"), None)
        .await
        .unwrap();
    app.settlement
        .withdraw(&passenger, money("12.5"), None)
        .await
        .unwrap();
    app.settlement
        .settle(&trip_id, &passenger, PaymentMethod::Wallet)
        .await
        .unwrap();
    app.settlement
        .deposit(&driver_user, money("3"), None)
        .await
        .unwrap();

    let mut conn = app.repo.acquire().await.unwrap();
    for wallet_id in [&payer_wallet, &driver_wallet] {
        let balance = repo::wallets::balance_cents(&mut conn, wallet_id)
            .await
            .unwrap();
        let sum = repo::wallets::sum_amounts_cents(&mut conn, wallet_id)
            .await
            .unwrap();
        assert_eq!(balance, sum, "wallet {} diverged from its ledger", wallet_id);
    }
}

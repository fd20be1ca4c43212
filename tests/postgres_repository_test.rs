//! PostgreSQLアダプターのテスト
//!
//! DATABASE_URLでPostgreSQLに接続できる環境で
//! `cargo test -- --ignored` として実行する。

use chrono::Utc;
use rusty_lending_ddd::adapters::postgres::{
    PostgresItemRepository, PostgresReservationRepository,
};
use rusty_lending_ddd::domain::{
    DateRange, Item, ItemId, Loan, LoanEvent, LoanId, LoanStatus, NewItem, ReservationRequested,
    UserId,
    item::create_item, loan,
};
use rusty_lending_ddd::ports::{ItemRepository, ReservationRepository, ReserveOutcome};
use serial_test::serial;
use std::sync::Arc;

mod common;

use common::{cleanup_database, create_test_pool, date, owner};

fn new_item() -> Item {
    create_item(
        owner(),
        NewItem {
            title: "Pressure washer".to_string(),
            requires_approval: Some(true),
            ..NewItem::default()
        },
        Utc::now(),
    )
    .unwrap()
}

fn new_reservation(item: &Item, borrower: &str, range: DateRange) -> (Loan, ReservationRequested) {
    loan::request_reservation(item, UserId::new(borrower), range, None, Utc::now()).unwrap()
}

async fn reserve(
    repo: &PostgresReservationRepository,
    item: &Item,
    borrower: &str,
    range: DateRange,
) -> ReserveOutcome {
    let (loan, event) = new_reservation(item, borrower, range);
    repo.reserve(loan, event).await.unwrap()
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_item_round_trip_and_listing() {
    let pool = create_test_pool().await;
    cleanup_database(&pool).await;
    let repo = PostgresItemRepository::new(pool.clone());

    let item = new_item();
    repo.insert(&item).await.unwrap();

    let loaded = repo.get_by_id(item.item_id).await.unwrap().unwrap();
    assert_eq!(loaded.item_id, item.item_id);
    assert_eq!(loaded.title, "Pressure washer");
    assert!(loaded.is_listed);

    let unlisted = Item {
        is_listed: false,
        ..loaded
    };
    assert!(repo.update(&unlisted).await.unwrap());
    assert!(repo.find_listed().await.unwrap().is_empty());
    assert_eq!(repo.find_by_owner(&owner()).await.unwrap().len(), 1);

    assert!(repo.get_by_id(ItemId::new()).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_reserve_detects_overlap_and_missing_item() {
    let pool = create_test_pool().await;
    cleanup_database(&pool).await;
    let items = PostgresItemRepository::new(pool.clone());
    let repo = PostgresReservationRepository::new(pool.clone());

    let item = new_item();
    items.insert(&item).await.unwrap();

    let first = DateRange::new(date(2025, 4, 1), date(2025, 4, 10)).unwrap();
    let overlapping = DateRange::new(date(2025, 4, 10), date(2025, 4, 12)).unwrap();
    let adjacent = DateRange::new(date(2025, 4, 11), date(2025, 4, 15)).unwrap();

    assert!(matches!(
        reserve(&repo, &item, "borrower-1", first).await,
        ReserveOutcome::Reserved(_)
    ));
    assert_eq!(
        reserve(&repo, &item, "borrower-2", overlapping).await,
        ReserveOutcome::Conflict
    );
    assert!(matches!(
        reserve(&repo, &item, "borrower-2", adjacent).await,
        ReserveOutcome::Reserved(_)
    ));

    let ghost = Item {
        item_id: ItemId::new(),
        ..item.clone()
    };
    assert_eq!(
        reserve(&repo, &ghost, "borrower-3", first).await,
        ReserveOutcome::ItemNotFound
    );

    let holding = repo.find_holding_by_item(item.item_id).await.unwrap();
    let starts: Vec<_> = holding.iter().map(|l| l.reserved_start_date()).collect();
    assert_eq!(starts, vec![date(2025, 4, 1), date(2025, 4, 11)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
#[ignore]
async fn test_concurrent_reserve_only_one_commits() {
    let pool = create_test_pool().await;
    cleanup_database(&pool).await;
    let items = PostgresItemRepository::new(pool.clone());
    let repo = Arc::new(PostgresReservationRepository::new(pool.clone()));

    let item = new_item();
    items.insert(&item).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..10 {
        let repo = repo.clone();
        let item = item.clone();
        handles.push(tokio::spawn(async move {
            let range = DateRange::new(date(2025, 5, 1 + i), date(2025, 5, 12)).unwrap();
            reserve(&repo, &item, &format!("borrower-{}", i), range).await
        }));
    }

    let mut reserved = 0;
    for handle in handles {
        if let ReserveOutcome::Reserved(_) = handle.await.unwrap() {
            reserved += 1;
        }
    }

    assert_eq!(reserved, 1);
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_apply_transition_is_conditional_and_recorded() {
    let pool = create_test_pool().await;
    cleanup_database(&pool).await;
    let items = PostgresItemRepository::new(pool.clone());
    let repo = PostgresReservationRepository::new(pool.clone());

    let item = new_item();
    items.insert(&item).await.unwrap();

    let range = DateRange::new(date(2025, 7, 1), date(2025, 7, 3)).unwrap();
    let ReserveOutcome::Reserved(pending) = reserve(&repo, &item, "borrower-1", range).await
    else {
        panic!("expected reservation");
    };

    let (approved, event) = loan::approve(&pending, &item, &owner(), Utc::now()).unwrap();
    let event = LoanEvent::ReservationApproved(event);

    assert!(
        repo.apply_transition(&approved, LoanStatus::Pending, event.clone())
            .await
            .unwrap()
    );
    // 同じ期待値での2回目は適用されない
    assert!(
        !repo
            .apply_transition(&approved, LoanStatus::Pending, event)
            .await
            .unwrap()
    );

    let stored = repo.get_by_id(pending.loan_id).await.unwrap().unwrap();
    assert_eq!(stored.status, LoanStatus::Approved);
    assert!(stored.approved_at.is_some());

    let history = repo.history(pending.loan_id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].event_type(), "ReservationApproved");

    assert_eq!(
        repo.find_by_borrower(&UserId::new("borrower-1"))
            .await
            .unwrap()
            .len(),
        1
    );
    assert_eq!(repo.find_by_owner(&owner()).await.unwrap().len(), 1);
    assert!(repo.get_by_id(LoanId::new()).await.unwrap().is_none());
}

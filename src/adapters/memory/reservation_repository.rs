use crate::domain::{
    ItemId, Loan, LoanEvent, LoanId, LoanStatus, ReservationRequested, UserId,
    conflicts_with_bookings,
};
use crate::ports::reservation_repository::{ReservationRepository, ReserveOutcome, Result};
use async_trait::async_trait;

use super::InMemoryStore;

/// ReservationRepositoryのインメモリ実装
///
/// 重複確認と挿入はストアのロックを保持したまま行う。
#[derive(Debug, Clone)]
pub struct InMemoryReservationRepository {
    store: InMemoryStore,
}

impl InMemoryReservationRepository {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

fn latest_request_first(mut loans: Vec<Loan>) -> Vec<Loan> {
    loans.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
    loans
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn reserve(&self, loan: Loan, event: ReservationRequested) -> Result<ReserveOutcome> {
        let mut tables = self.store.lock().await;

        if !tables.items.contains_key(&loan.item_id) {
            return Ok(ReserveOutcome::ItemNotFound);
        }

        let bookings: Vec<_> = tables
            .loans
            .values()
            .filter(|existing| existing.item_id == loan.item_id)
            .map(Loan::booking)
            .collect();

        if conflicts_with_bookings(&loan.reserved, &bookings) {
            return Ok(ReserveOutcome::Conflict);
        }

        tables.loans.insert(loan.loan_id, loan.clone());
        tables.events.push(LoanEvent::ReservationRequested(event));

        Ok(ReserveOutcome::Reserved(loan))
    }

    async fn apply_transition(
        &self,
        loan: &Loan,
        expected: LoanStatus,
        event: LoanEvent,
    ) -> Result<bool> {
        let mut tables = self.store.lock().await;

        match tables.loans.get_mut(&loan.loan_id) {
            Some(stored) if stored.status == expected => {
                *stored = loan.clone();
            }
            _ => return Ok(false),
        }

        tables.events.push(event);
        Ok(true)
    }

    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        let tables = self.store.lock().await;
        Ok(tables.loans.get(&loan_id).cloned())
    }

    async fn find_holding_by_item(&self, item_id: ItemId) -> Result<Vec<Loan>> {
        let tables = self.store.lock().await;
        let mut loans: Vec<_> = tables
            .loans
            .values()
            .filter(|loan| loan.item_id == item_id && !loan.status.is_terminal())
            .cloned()
            .collect();
        loans.sort_by_key(|loan| loan.reserved_start_date());
        Ok(loans)
    }

    async fn find_by_borrower(&self, borrower_id: &UserId) -> Result<Vec<Loan>> {
        let tables = self.store.lock().await;
        Ok(latest_request_first(
            tables
                .loans
                .values()
                .filter(|loan| &loan.borrower_id == borrower_id)
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_owner(&self, owner_id: &UserId) -> Result<Vec<Loan>> {
        let tables = self.store.lock().await;
        Ok(latest_request_first(
            tables
                .loans
                .values()
                .filter(|loan| {
                    tables
                        .items
                        .get(&loan.item_id)
                        .is_some_and(|item| item.is_owned_by(owner_id))
                })
                .cloned()
                .collect(),
        ))
    }

    async fn history(&self, loan_id: LoanId) -> Result<Vec<LoanEvent>> {
        let tables = self.store.lock().await;
        Ok(tables
            .events
            .iter()
            .filter(|event| event.loan_id() == loan_id)
            .cloned()
            .collect())
    }
}

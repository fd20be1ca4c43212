use crate::domain::{
    Booking, DateRange, ItemId, Loan, LoanEvent, LoanId, LoanStatus, ReservationRequested,
    UserId, conflicts_with_bookings,
};
use crate::ports::reservation_repository::{
    ReservationRepository as ReservationRepositoryTrait, ReserveOutcome, Result,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use std::str::FromStr;

use super::invalid_data;

/// 排他制約違反（期間の重複）のSQLSTATE
const EXCLUSION_VIOLATION: &str = "23P01";

/// PostgreSQLの行データをLoanに変換する
fn map_row_to_loan(row: &PgRow) -> Result<Loan> {
    let status_str: &str = row.get("status");
    let status = LoanStatus::from_str(status_str).map_err(invalid_data)?;

    let start: NaiveDate = row.get("reserved_start_date");
    let end: NaiveDate = row.get("reserved_end_date");
    let reserved = DateRange::new(start, end).map_err(|e| invalid_data(e.to_string()))?;

    Ok(Loan {
        loan_id: LoanId::from_uuid(row.get("id")),
        item_id: ItemId::from_uuid(row.get("item_id")),
        borrower_id: UserId::new(row.get::<String, _>("borrower_id")),
        status,
        reserved,
        requested_at: row.get("requested_at"),
        approved_at: row.get("approved_at"),
        borrowed_at: row.get("borrowed_at"),
        returned_at: row.get("returned_at"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn map_row_to_booking(row: &PgRow) -> Result<Booking> {
    let status_str: &str = row.get("status");
    let status = LoanStatus::from_str(status_str).map_err(invalid_data)?;
    let range = DateRange::new(row.get("reserved_start_date"), row.get("reserved_end_date"))
        .map_err(|e| invalid_data(e.to_string()))?;

    Ok(Booking { status, range })
}

fn non_terminal_statuses() -> Vec<&'static str> {
    LoanStatus::NON_TERMINAL
        .iter()
        .map(LoanStatus::as_str)
        .collect()
}

fn is_exclusion_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(EXCLUSION_VIOLATION),
        _ => false,
    }
}

/// イベントを履歴テーブルに追記する
async fn append_event(tx: &mut Transaction<'_, Postgres>, event: &LoanEvent) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO loan_events (loan_id, event_type, event_data, occurred_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(event.loan_id().value())
    .bind(event.event_type())
    .bind(serde_json::to_value(event)?)
    .bind(event.occurred_at())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// ReservationRepositoryのPostgreSQL実装
///
/// 予約の作成はアイテム行をロックしたトランザクション内で重複を確認する。
/// 同じアイテムへの並行した予約は直列化され、
/// 排他制約（btree_gist）が最後の防衛線となる。
pub struct ReservationRepository {
    pool: PgPool,
}

impl ReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_reservation(
        tx: &mut Transaction<'_, Postgres>,
        loan: &Loan,
    ) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO loans (
                id,
                item_id,
                borrower_id,
                status,
                reserved_start_date,
                reserved_end_date,
                requested_at,
                approved_at,
                borrowed_at,
                returned_at,
                notes,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(loan.loan_id.value())
        .bind(loan.item_id.value())
        .bind(loan.borrower_id.as_str())
        .bind(loan.status.as_str())
        .bind(loan.reserved_start_date())
        .bind(loan.reserved_end_date())
        .bind(loan.requested_at)
        .bind(loan.approved_at)
        .bind(loan.borrowed_at)
        .bind(loan.returned_at)
        .bind(&loan.notes)
        .bind(loan.created_at)
        .bind(loan.updated_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ReservationRepositoryTrait for ReservationRepository {
    async fn reserve(&self, loan: Loan, event: ReservationRequested) -> Result<ReserveOutcome> {
        let mut tx = self.pool.begin().await?;

        // アイテム行をロックして同じアイテムへの予約作成を直列化
        let locked: Option<uuid::Uuid> =
            sqlx::query_scalar("SELECT id FROM items WHERE id = $1 FOR UPDATE")
                .bind(loan.item_id.value())
                .fetch_optional(&mut *tx)
                .await?;

        if locked.is_none() {
            tx.rollback().await?;
            return Ok(ReserveOutcome::ItemNotFound);
        }

        let rows = sqlx::query(
            r#"
            SELECT status, reserved_start_date, reserved_end_date
            FROM loans
            WHERE item_id = $1
              AND status = ANY($2)
            "#,
        )
        .bind(loan.item_id.value())
        .bind(non_terminal_statuses())
        .fetch_all(&mut *tx)
        .await?;

        let bookings = rows
            .iter()
            .map(map_row_to_booking)
            .collect::<Result<Vec<_>>>()?;

        if conflicts_with_bookings(&loan.reserved, &bookings) {
            tx.rollback().await?;
            return Ok(ReserveOutcome::Conflict);
        }

        match Self::insert_reservation(&mut tx, &loan).await {
            Ok(()) => {}
            Err(e) if is_exclusion_violation(&e) => {
                tx.rollback().await?;
                return Ok(ReserveOutcome::Conflict);
            }
            Err(e) => return Err(e.into()),
        }

        append_event(&mut tx, &LoanEvent::ReservationRequested(event)).await?;

        tx.commit().await?;
        Ok(ReserveOutcome::Reserved(loan))
    }

    async fn apply_transition(
        &self,
        loan: &Loan,
        expected: LoanStatus,
        event: LoanEvent,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE loans
            SET
                status = $2,
                reserved_end_date = $3,
                approved_at = $4,
                borrowed_at = $5,
                returned_at = $6,
                updated_at = $7
            WHERE id = $1 AND status = $8
            "#,
        )
        .bind(loan.loan_id.value())
        .bind(loan.status.as_str())
        .bind(loan.reserved_end_date())
        .bind(loan.approved_at)
        .bind(loan.borrowed_at)
        .bind(loan.returned_at)
        .bind(loan.updated_at)
        .bind(expected.as_str())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        append_event(&mut tx, &event).await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT
                id,
                item_id,
                borrower_id,
                status,
                reserved_start_date,
                reserved_end_date,
                requested_at,
                approved_at,
                borrowed_at,
                returned_at,
                notes,
                created_at,
                updated_at
            FROM loans
            WHERE id = $1
            "#,
        )
        .bind(loan_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    /// (item_id, status)のインデックスを使用
    async fn find_holding_by_item(&self, item_id: ItemId) -> Result<Vec<Loan>> {
        let rows = sqlx::query(
            r#"
            SELECT
                id,
                item_id,
                borrower_id,
                status,
                reserved_start_date,
                reserved_end_date,
                requested_at,
                approved_at,
                borrowed_at,
                returned_at,
                notes,
                created_at,
                updated_at
            FROM loans
            WHERE item_id = $1
              AND status = ANY($2)
            ORDER BY reserved_start_date ASC
            "#,
        )
        .bind(item_id.value())
        .bind(non_terminal_statuses())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_loan).collect()
    }

    async fn find_by_borrower(&self, borrower_id: &UserId) -> Result<Vec<Loan>> {
        let rows = sqlx::query(
            r#"
            SELECT
                id,
                item_id,
                borrower_id,
                status,
                reserved_start_date,
                reserved_end_date,
                requested_at,
                approved_at,
                borrowed_at,
                returned_at,
                notes,
                created_at,
                updated_at
            FROM loans
            WHERE borrower_id = $1
            ORDER BY requested_at DESC
            "#,
        )
        .bind(borrower_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_loan).collect()
    }

    async fn find_by_owner(&self, owner_id: &UserId) -> Result<Vec<Loan>> {
        let rows = sqlx::query(
            r#"
            SELECT
                l.id,
                l.item_id,
                l.borrower_id,
                l.status,
                l.reserved_start_date,
                l.reserved_end_date,
                l.requested_at,
                l.approved_at,
                l.borrowed_at,
                l.returned_at,
                l.notes,
                l.created_at,
                l.updated_at
            FROM loans l
            JOIN items i ON i.id = l.item_id
            WHERE i.owner_id = $1
            ORDER BY l.requested_at DESC
            "#,
        )
        .bind(owner_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_loan).collect()
    }

    async fn history(&self, loan_id: LoanId) -> Result<Vec<LoanEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT event_data
            FROM loan_events
            WHERE loan_id = $1
            ORDER BY sequence_number ASC
            "#,
        )
        .bind(loan_id.value())
        .fetch_all(&self.pool)
        .await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let event_data: serde_json::Value = row.get("event_data");
            let event: LoanEvent = serde_json::from_value(event_data)?;
            events.push(event);
        }

        Ok(events)
    }
}

use crate::domain::{
    self, DateRange, Item, ItemId, Loan, LoanAction, LoanEvent, LoanId, LoanParties, LoanStatus,
    UserId, commands::RequestReservation,
};
use crate::ports::*;
use std::sync::Arc;

use super::errors::{LendingApplicationError, Result};

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、純粋な関数に依存関係を渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub item_repository: Arc<dyn ItemRepository>,
    pub reservation_repository: Arc<dyn ReservationRepository>,
    pub clock: Arc<dyn Clock>,
}

/// アイテムを取得するヘルパー関数
///
/// # エラー
/// - ItemRepositoryError: 読み込み失敗
/// - ItemNotFound: 存在しない
pub(super) async fn load_item(deps: &ServiceDependencies, item_id: ItemId) -> Result<Item> {
    deps.item_repository
        .get_by_id(item_id)
        .await
        .map_err(LendingApplicationError::ItemRepositoryError)?
        .ok_or(LendingApplicationError::ItemNotFound)
}

/// 予約と対象アイテムを取得するヘルパー関数
///
/// approve, reject, cancel, mark_as_borrowed, mark_as_returnedで共通利用される。
async fn load_loan_with_item(deps: &ServiceDependencies, loan_id: LoanId) -> Result<(Loan, Item)> {
    let loan = deps
        .reservation_repository
        .get_by_id(loan_id)
        .await
        .map_err(LendingApplicationError::ReservationRepositoryError)?
        .ok_or(LendingApplicationError::LoanNotFound)?;

    let item = load_item(deps, loan.item_id).await?;

    Ok((loan, item))
}

/// 状態遷移を条件付き書き込みで保存するヘルパー関数
///
/// 読み込み時のステータスを期待値として渡す。
/// 先に他のリクエストが確定していた場合は`StaleLoanState`を返す。
async fn persist_transition(
    deps: &ServiceDependencies,
    expected: LoanStatus,
    updated: Loan,
    event: LoanEvent,
) -> Result<Loan> {
    let applied = deps
        .reservation_repository
        .apply_transition(&updated, expected, event)
        .await
        .map_err(LendingApplicationError::ReservationRepositoryError)?;

    if !applied {
        tracing::warn!(
            loan_id = %updated.loan_id.value(),
            expected = %expected,
            "Reservation changed concurrently; transition not applied"
        );
        return Err(LendingApplicationError::StaleLoanState);
    }

    tracing::info!(
        loan_id = %updated.loan_id.value(),
        from = %expected,
        to = %updated.status,
        "Reservation transitioned"
    );

    Ok(updated)
}

/// 予約を申請する
///
/// ビジネスルール：
/// - アイテムが存在すること
/// - 所有者自身の予約は不可
/// - 終了日が開始日以降であること
/// - 終端以外の既存予約と期間が重ならないこと
///
/// 重複確認と挿入はリポジトリ内で1つのトランザクションとして実行される。
///
/// # 引数
/// * `deps` - サービスの依存関係
/// * `cmd` - 予約申請コマンド
///
/// # 戻り値
/// 作成された予約（pending または reserved）
#[tracing::instrument(skip(deps))]
pub async fn create_reservation(deps: &ServiceDependencies, cmd: RequestReservation) -> Result<Loan> {
    // 1. アイテムの存在確認
    let item = load_item(deps, cmd.item_id).await?;

    // 2. 自己予約の確認
    domain::authorize(
        &cmd.borrower_id,
        LoanParties {
            owner_id: &item.owner_id,
            borrower_id: &cmd.borrower_id,
        },
        LoanAction::Create,
    )
    .map_err(|e| LendingApplicationError::Forbidden(e.to_string()))?;

    // 3. 期間の検証
    let reserved = DateRange::new(cmd.reserved_start_date, cmd.reserved_end_date)?;

    // 4. ドメイン層の純粋関数を呼び出し
    let (loan, event) = domain::loan::request_reservation(
        &item,
        cmd.borrower_id,
        reserved,
        cmd.notes,
        deps.clock.now(),
    )?;

    // 5. 重複確認と保存（原子的）
    let outcome = deps
        .reservation_repository
        .reserve(loan, event)
        .await
        .map_err(LendingApplicationError::ReservationRepositoryError)?;

    match outcome {
        ReserveOutcome::Reserved(loan) => {
            tracing::info!(
                loan_id = %loan.loan_id.value(),
                item_id = %loan.item_id.value(),
                status = %loan.status,
                "Reservation created"
            );
            Ok(loan)
        }
        ReserveOutcome::Conflict => {
            tracing::warn!(
                item_id = %cmd.item_id.value(),
                start = %reserved.start(),
                end = %reserved.end(),
                "Reservation overlaps an existing booking"
            );
            Err(LendingApplicationError::ReservationConflict)
        }
        ReserveOutcome::ItemNotFound => Err(LendingApplicationError::ItemNotFound),
    }
}

/// 予約を承認する（所有者）
#[tracing::instrument(skip(deps))]
pub async fn approve(deps: &ServiceDependencies, loan_id: LoanId, actor: &UserId) -> Result<Loan> {
    let (loan, item) = load_loan_with_item(deps, loan_id).await?;

    let (updated, event) = domain::loan::approve(&loan, &item, actor, deps.clock.now())?;

    persist_transition(
        deps,
        loan.status,
        updated,
        LoanEvent::ReservationApproved(event),
    )
    .await
}

/// 予約を却下・取り消しする（所有者）
///
/// pending の場合は rejected、approved / reserved の場合は cancelled になる。
/// どちらも終端状態で、予約期間は解放される。
#[tracing::instrument(skip(deps))]
pub async fn reject(deps: &ServiceDependencies, loan_id: LoanId, actor: &UserId) -> Result<Loan> {
    let (loan, item) = load_loan_with_item(deps, loan_id).await?;
    let now = deps.clock.now();

    let (updated, event) = match loan.status {
        LoanStatus::Approved | LoanStatus::Reserved => {
            let (updated, event) = domain::loan::cancel_approved(&loan, &item, actor, now)?;
            (updated, LoanEvent::ReservationCancelled(event))
        }
        _ => {
            let (updated, event) = domain::loan::reject_pending(&loan, &item, actor, now)?;
            (updated, LoanEvent::ReservationRejected(event))
        }
    };

    persist_transition(deps, loan.status, updated, event).await
}

/// 予約をキャンセルする（借り手）
#[tracing::instrument(skip(deps))]
pub async fn cancel(deps: &ServiceDependencies, loan_id: LoanId, actor: &UserId) -> Result<Loan> {
    let (loan, item) = load_loan_with_item(deps, loan_id).await?;

    let (updated, event) = domain::loan::cancel(&loan, &item, actor, deps.clock.now())?;

    persist_transition(
        deps,
        loan.status,
        updated,
        LoanEvent::ReservationCancelled(event),
    )
    .await
}

/// 受け渡しを記録する（借り手または所有者）
#[tracing::instrument(skip(deps))]
pub async fn mark_as_borrowed(
    deps: &ServiceDependencies,
    loan_id: LoanId,
    actor: &UserId,
) -> Result<Loan> {
    let (loan, item) = load_loan_with_item(deps, loan_id).await?;
    let now = deps.clock.now();

    let (updated, event) =
        domain::loan::mark_as_borrowed(&loan, &item, actor, now, deps.clock.today())?;

    persist_transition(deps, loan.status, updated, LoanEvent::ItemBorrowed(event)).await
}

/// 返却を記録する（借り手）
///
/// 予約終了日より前の返却では終了日が今日に切り詰められ、
/// 残りの期間は新しい予約に開放される。
#[tracing::instrument(skip(deps))]
pub async fn mark_as_returned(
    deps: &ServiceDependencies,
    loan_id: LoanId,
    actor: &UserId,
) -> Result<Loan> {
    let (loan, item) = load_loan_with_item(deps, loan_id).await?;
    let now = deps.clock.now();

    let (updated, event) =
        domain::loan::mark_as_returned(&loan, &item, actor, now, deps.clock.today())?;

    persist_transition(deps, loan.status, updated, LoanEvent::ItemReturned(event)).await
}

/// 今後の予約一覧
///
/// 開始日または終了日が今日以降の終端以外の予約を開始日順に返す。
/// 認可不要の読み取り専用操作。
pub async fn list_future_reservations(
    deps: &ServiceDependencies,
    item_id: ItemId,
) -> Result<Vec<Loan>> {
    let today = deps.clock.today();

    let loans = deps
        .reservation_repository
        .find_holding_by_item(item_id)
        .await
        .map_err(LendingApplicationError::ReservationRepositoryError)?;

    Ok(loans
        .into_iter()
        .filter(|loan| loan.is_upcoming(today))
        .collect())
}

/// 操作者の現在の予約
///
/// 期間が今日を含む、操作者自身の終端以外の予約を返す。
pub async fn current_reservation_for(
    deps: &ServiceDependencies,
    item_id: ItemId,
    actor: &UserId,
) -> Result<Option<Loan>> {
    let today = deps.clock.today();

    let loans = deps
        .reservation_repository
        .find_holding_by_item(item_id)
        .await
        .map_err(LendingApplicationError::ReservationRepositoryError)?;

    Ok(loans
        .into_iter()
        .find(|loan| &loan.borrower_id == actor && loan.reserved.contains(today)))
}

/// 予約詳細を取得する
///
/// 借り手とアイテムの所有者のみ閲覧可能。
pub async fn get_loan(deps: &ServiceDependencies, loan_id: LoanId, actor: &UserId) -> Result<Loan> {
    let (loan, item) = load_loan_with_item(deps, loan_id).await?;

    if &loan.borrower_id != actor && !item.is_owned_by(actor) {
        return Err(LendingApplicationError::Forbidden(
            "You can only view your own reservations".to_string(),
        ));
    }

    Ok(loan)
}

/// 予約のイベント履歴を取得する
///
/// 閲覧権限は`get_loan`と同じ。
pub async fn loan_history(
    deps: &ServiceDependencies,
    loan_id: LoanId,
    actor: &UserId,
) -> Result<Vec<LoanEvent>> {
    let loan = get_loan(deps, loan_id, actor).await?;

    deps.reservation_repository
        .history(loan.loan_id)
        .await
        .map_err(LendingApplicationError::ReservationRepositoryError)
}

/// 借り手としての予約一覧（申請の新しい順）
pub async fn list_loans_for_borrower(
    deps: &ServiceDependencies,
    borrower_id: &UserId,
) -> Result<Vec<Loan>> {
    deps.reservation_repository
        .find_by_borrower(borrower_id)
        .await
        .map_err(LendingApplicationError::ReservationRepositoryError)
}

/// 所有者としての予約一覧（申請の新しい順）
pub async fn list_loans_for_owner(
    deps: &ServiceDependencies,
    owner_id: &UserId,
) -> Result<Vec<Loan>> {
    deps.reservation_repository
        .find_by_owner(owner_id)
        .await
        .map_err(LendingApplicationError::ReservationRepositoryError)
}

use crate::domain::{
    ItemId, Loan, LoanEvent, LoanId, LoanStatus, ReservationRequested, UserId,
};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 予約作成の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// 保存された
    Reserved(Loan),
    /// 終端以外の既存予約と期間が重なった
    Conflict,
    /// アイテムが存在しない
    ItemNotFound,
}

/// 予約リポジトリポート
///
/// 期間重複の不変条件を並行書き込みの下でも保証する読み書きの境界。
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// 予約を作成する
    ///
    /// 重複確認と挿入は、同じアイテムの終端以外の予約全体に対して
    /// 1つの原子的な操作として実行しなければならない。
    /// 確認してから別ステップで挿入する実装は不正。
    async fn reserve(&self, loan: Loan, event: ReservationRequested) -> Result<ReserveOutcome>;

    /// 状態遷移を保存する
    ///
    /// 現在のステータスが`expected`の場合のみ更新する条件付き書き込み。
    /// 他の書き込みが先に確定していた場合は`false`を返す。
    /// イベントは同じトランザクションで履歴に追記される。
    async fn apply_transition(
        &self,
        loan: &Loan,
        expected: LoanStatus,
        event: LoanEvent,
    ) -> Result<bool>;

    /// IDで予約を取得する
    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>>;

    /// アイテムの終端以外の予約を開始日順に取得する
    async fn find_holding_by_item(&self, item_id: ItemId) -> Result<Vec<Loan>>;

    /// 借り手の全予約を申請の新しい順に取得する
    async fn find_by_borrower(&self, borrower_id: &UserId) -> Result<Vec<Loan>>;

    /// 所有者のアイテムに対する全予約を申請の新しい順に取得する
    async fn find_by_owner(&self, owner_id: &UserId) -> Result<Vec<Loan>>;

    /// 予約のイベント履歴を発生順に取得する
    async fn history(&self, loan_id: LoanId) -> Result<Vec<LoanEvent>>;
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::DateRangeError;

/// 貸出ID - 予約集約の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoanId(Uuid);

impl LoanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for LoanId {
    fn default() -> Self {
        Self::new()
    }
}

/// アイテムID - 出品物の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

/// ユーザーID - 認証基盤から渡される不透明な識別子
///
/// 貸出コンテキストは値の形式を解釈しない。比較のみに使用する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 予約期間（両端を含む日付範囲）
///
/// 不変条件：start <= end
/// コンストラクタで検証するため、不正な範囲は型として存在できない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// 新規作成
    ///
    /// # エラー
    /// 終了日が開始日より前の場合は`DateRangeError::EndBeforeStart`を返す
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if end < start {
            return Err(DateRangeError::EndBeforeStart { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// 日付が範囲内か（両端を含む）
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// 2つの範囲が重なるか
    ///
    /// [s1,e1] と [s2,e2] は s1 <= e2 かつ s2 <= e1 のとき重なる。
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// 終了日を切り詰める（早期返却用）
    ///
    /// 新しい終了日は開始日より前にならないよう開始日で下限を取る。
    /// 既存の終了日より後の日付を渡した場合は変更しない。
    pub fn truncate_end(self, day: NaiveDate) -> Self {
        if day >= self.end {
            return self;
        }
        Self {
            start: self.start,
            end: day.max(self.start),
        }
    }
}

/// 貸出ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// 承認待ち
    Pending,
    /// 承認済み
    Approved,
    /// 予約確定（承認不要のアイテム）
    Reserved,
    /// 貸出中
    Active,
    /// 返却済み
    Returned,
    /// キャンセル
    Cancelled,
    /// 却下
    Rejected,
}

impl LoanStatus {
    /// 予約枠を占有するステータス（終端以外）
    pub const NON_TERMINAL: [LoanStatus; 4] = [
        LoanStatus::Pending,
        LoanStatus::Approved,
        LoanStatus::Reserved,
        LoanStatus::Active,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Approved => "approved",
            LoanStatus::Reserved => "reserved",
            LoanStatus::Active => "active",
            LoanStatus::Returned => "returned",
            LoanStatus::Cancelled => "cancelled",
            LoanStatus::Rejected => "rejected",
        }
    }

    /// 終端状態か（これ以上遷移しない）
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LoanStatus::Returned | LoanStatus::Cancelled | LoanStatus::Rejected
        )
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LoanStatus::Pending),
            "approved" => Ok(LoanStatus::Approved),
            "reserved" => Ok(LoanStatus::Reserved),
            "active" => Ok(LoanStatus::Active),
            "returned" => Ok(LoanStatus::Returned),
            "cancelled" => Ok(LoanStatus::Cancelled),
            "rejected" => Ok(LoanStatus::Rejected),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

/// アイテムのステータス
///
/// 保存値（所有者が設定する粗いフラグ）と表示用の実効ステータスの両方で使う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Available,
    Borrowed,
    Unavailable,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Available => "available",
            ItemStatus::Borrowed => "borrowed",
            ItemStatus::Unavailable => "unavailable",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(ItemStatus::Available),
            "borrowed" => Ok(ItemStatus::Borrowed),
            "unavailable" => Ok(ItemStatus::Unavailable),
            _ => Err(format!("Invalid item status: {}", s)),
        }
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ItemId, ItemUpdate, NewItem, UserId};

/// コマンド：アイテムの予約を申請する
///
/// 日付は未検証のまま受け取り、サービス層で`DateRange`に変換する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestReservation {
    pub item_id: ItemId,
    pub borrower_id: UserId,
    pub reserved_start_date: NaiveDate,
    pub reserved_end_date: NaiveDate,
    pub notes: Option<String>,
}

/// コマンド：アイテムを出品する
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListItem {
    pub owner_id: UserId,
    pub item: NewItem,
}

/// コマンド：アイテムを更新する
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateItem {
    pub item_id: ItemId,
    pub actor: UserId,
    pub update: ItemUpdate,
}

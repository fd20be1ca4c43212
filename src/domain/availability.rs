use chrono::NaiveDate;

use super::{Booking, ItemStatus, has_active_today};

/// 純粋関数：アイテムの実効ステータスを計算する
///
/// ビジネスルール：
/// - 所有者が borrowed / unavailable を設定していればそれを優先する
/// - available の場合、今日を含む終端以外の予約があれば unavailable
///
/// 保存もキャッシュもしない。リクエストごとに再計算する。
pub fn effective_status<'a, I>(stored: ItemStatus, bookings: I, today: NaiveDate) -> ItemStatus
where
    I: IntoIterator<Item = &'a Booking>,
{
    match stored {
        ItemStatus::Borrowed | ItemStatus::Unavailable => stored,
        ItemStatus::Available => {
            if has_active_today(bookings, today) {
                ItemStatus::Unavailable
            } else {
                ItemStatus::Available
            }
        }
    }
}

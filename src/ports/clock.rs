use chrono::{DateTime, NaiveDate, Utc};

/// 時計ポート
///
/// 「今日」を暗黙のグローバルにせず、依存として注入する。
/// 日付の比較はUTCの暦日で行う。
pub trait Clock: Send + Sync {
    /// 現在時刻
    fn now(&self) -> DateTime<Utc>;

    /// 今日の日付（時刻を切り捨てた暦日）
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

use chrono::NaiveDate;

use super::{DateRange, LoanStatus};

/// 予約枠：ステータスと期間の組
///
/// 重複判定と実効ステータス計算の入力。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Booking {
    pub status: LoanStatus,
    pub range: DateRange,
}

impl Booking {
    /// 予約枠を占有しているか（終端以外）
    pub fn is_holding(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// 純粋関数：候補期間が既存の期間のいずれかと重なるか
///
/// 両端を含む重なり判定（s1 <= e2 かつ s2 <= e1）。
/// 呼び出し側は既存の期間を終端以外の予約に絞り込んで渡す。
pub fn has_conflict<'a, I>(candidate: &DateRange, existing: I) -> bool
where
    I: IntoIterator<Item = &'a DateRange>,
{
    existing.into_iter().any(|range| candidate.overlaps(range))
}

/// 純粋関数：候補期間が終端以外の予約枠と重なるか
pub fn conflicts_with_bookings<'a, I>(candidate: &DateRange, bookings: I) -> bool
where
    I: IntoIterator<Item = &'a Booking>,
{
    has_conflict(
        candidate,
        bookings
            .into_iter()
            .filter(|booking| booking.is_holding())
            .map(|booking| &booking.range),
    )
}

/// 純粋関数：今日を含む終端以外の予約枠があるか
pub fn has_active_today<'a, I>(bookings: I, today: NaiveDate) -> bool
where
    I: IntoIterator<Item = &'a Booking>,
{
    bookings
        .into_iter()
        .any(|booking| booking.is_holding() && booking.range.contains(today))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
        DateRange::new(start, end).unwrap()
    }

    #[test]
    fn test_has_conflict_empty_existing() {
        let candidate = range(date(2025, 4, 1), date(2025, 4, 3));
        let existing: Vec<DateRange> = Vec::new();
        assert!(!has_conflict(&candidate, &existing));
    }

    #[test]
    fn test_has_conflict_detects_overlap() {
        let existing = [range(date(2025, 4, 1), date(2025, 4, 10))];

        assert!(has_conflict(&range(date(2025, 4, 5), date(2025, 4, 7)), &existing));
        assert!(has_conflict(&range(date(2025, 3, 25), date(2025, 4, 1)), &existing));
        assert!(!has_conflict(&range(date(2025, 4, 11), date(2025, 4, 15)), &existing));
        assert!(!has_conflict(&range(date(2025, 3, 1), date(2025, 3, 31)), &existing));
    }

    #[test]
    fn test_terminal_bookings_do_not_conflict() {
        let r = range(date(2025, 4, 1), date(2025, 4, 10));
        let bookings = [
            Booking { status: LoanStatus::Cancelled, range: r },
            Booking { status: LoanStatus::Rejected, range: r },
            Booking { status: LoanStatus::Returned, range: r },
        ];
        assert!(!conflicts_with_bookings(&r, &bookings));

        let holding = [Booking { status: LoanStatus::Pending, range: r }];
        assert!(conflicts_with_bookings(&r, &holding));
    }

    #[test]
    fn test_has_active_today_inclusive_bounds() {
        let today = date(2025, 3, 5);
        let ends_today = [Booking {
            status: LoanStatus::Active,
            range: range(date(2025, 3, 1), today),
        }];
        let starts_today = [Booking {
            status: LoanStatus::Reserved,
            range: range(today, date(2025, 3, 9)),
        }];
        let future = [Booking {
            status: LoanStatus::Approved,
            range: range(date(2025, 3, 6), date(2025, 3, 9)),
        }];

        assert!(has_active_today(&ends_today, today));
        assert!(has_active_today(&starts_today, today));
        assert!(!has_active_today(&future, today));
    }

    #[test]
    fn test_has_active_today_ignores_terminal() {
        let today = date(2025, 3, 5);
        let bookings = [Booking {
            status: LoanStatus::Returned,
            range: range(date(2025, 3, 1), date(2025, 3, 9)),
        }];
        assert!(!has_active_today(&bookings, today));
    }
}

//! Schedule Engine
//!
//! Pure due-date arithmetic for installment sales. All dates are Unix millis
//! (UTC). Month periods are computed from `start_date` rather than by chaining
//! from the previous due date, so a sale started on the 31st keeps falling on
//! the last day of short months and returns to the 31st afterwards.

use chrono::{Days, Months};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Frequency, Sale, SaleStatus, SyncStatus};

/// Due date of installment number `periods` (0 = `start`)
pub fn due_date_for(start: i64, periods: i64, frequency: Frequency) -> AppResult<i64> {
    let overflow = || {
        AppError::new(ErrorCode::ScheduleOverflow)
            .with_detail("start", start)
            .with_detail("periods", periods)
    };

    let periods = u64::try_from(periods).map_err(|_| overflow())?;
    let start_dt = shared::util::millis_to_datetime(start).ok_or_else(overflow)?;

    let due = match frequency {
        Frequency::Daily => start_dt.checked_add_days(Days::new(periods)),
        Frequency::Weekly => periods
            .checked_mul(7)
            .and_then(|days| start_dt.checked_add_days(Days::new(days))),
        Frequency::Monthly => u32::try_from(periods)
            .ok()
            .and_then(|months| start_dt.checked_add_months(Months::new(months))),
    };

    due.map(|dt| dt.timestamp_millis()).ok_or_else(overflow)
}

/// Apply one collected installment to `sale`
///
/// Increments `emis_collected`, moves `next_due_date` one period forward and
/// completes the sale when the last installment is reached. The result is
/// marked pending. Must run exactly once per recorded payment.
pub fn advance(sale: &Sale, now: i64) -> AppResult<Sale> {
    if sale.status != SaleStatus::Active {
        return Err(AppError::with_message(
            ErrorCode::NoActiveSale,
            format!("Sale {} is {}", sale.id, sale.status.as_str()),
        ));
    }

    let emis_collected = sale.emis_collected + 1;
    let next_due_date = due_date_for(sale.start_date, emis_collected, sale.frequency)?;

    let mut next = sale.clone();
    next.emis_collected = emis_collected;
    next.next_due_date = next_due_date;
    if emis_collected >= sale.total_emis {
        next.status = SaleStatus::Completed;
    }
    next.updated_at = now;
    next.sync_status = SyncStatus::Pending;
    Ok(next)
}

/// Due predicate: active and `next_due_date <= now`
///
/// No day normalisation: a due date at midnight is due from that instant on.
pub fn is_due(sale: &Sale, now: i64) -> bool {
    sale.status == SaleStatus::Active && sale.next_due_date <= now
}

/// Sum of `emi_amount` over the due sales
pub fn due_amount<'a>(sales: impl IntoIterator<Item = &'a Sale>, now: i64) -> f64 {
    sales
        .into_iter()
        .filter(|s| is_due(s, now))
        .map(|s| s.emi_amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 86_400_000;

    fn ms(date: &str) -> i64 {
        shared::util::parse_date_millis(date).unwrap()
    }

    fn sale(frequency: Frequency, start: i64, total: i64) -> Sale {
        Sale {
            id: 1,
            owner_id: "owner-1".into(),
            village_id: 10,
            customer_id: 20,
            product_id: 30,
            down_payment: 0.0,
            emi_amount: 100.0,
            frequency,
            total_emis: total,
            emis_collected: 0,
            start_date: start,
            next_due_date: start,
            status: SaleStatus::Active,
            assigned_agent_id: None,
            created_at: start,
            updated_at: start,
            sync_status: SyncStatus::Synced,
        }
    }

    #[test]
    fn test_daily_and_weekly_periods() {
        let start = ms("2024-03-01") + 9 * 3_600_000;
        assert_eq!(due_date_for(start, 1, Frequency::Daily).unwrap(), start + DAY_MS);
        assert_eq!(due_date_for(start, 3, Frequency::Weekly).unwrap(), start + 21 * DAY_MS);
        assert_eq!(due_date_for(start, 0, Frequency::Monthly).unwrap(), start);
    }

    #[test]
    fn test_monthly_clamps_and_recovers() {
        let start = ms("2024-01-31");
        assert_eq!(due_date_for(start, 1, Frequency::Monthly).unwrap(), ms("2024-02-29"));
        assert_eq!(due_date_for(start, 2, Frequency::Monthly).unwrap(), ms("2024-03-31"));
        assert_eq!(due_date_for(start, 3, Frequency::Monthly).unwrap(), ms("2024-04-30"));
        assert_eq!(due_date_for(start, 13, Frequency::Monthly).unwrap(), ms("2025-02-28"));
    }

    #[test]
    fn test_negative_periods_rejected() {
        let err = due_date_for(0, -1, Frequency::Daily).unwrap_err();
        assert_eq!(err.code, ErrorCode::ScheduleOverflow);
    }

    #[test]
    fn test_advance_keeps_invariant() {
        for frequency in [Frequency::Daily, Frequency::Weekly, Frequency::Monthly] {
            let mut s = sale(frequency, ms("2023-12-31"), 30);
            for _ in 0..30 {
                s = advance(&s, 0).unwrap();
                let expected = due_date_for(s.start_date, s.emis_collected, frequency).unwrap();
                assert_eq!(s.next_due_date, expected);
                assert!(s.emis_collected <= s.total_emis);
                assert_eq!(
                    s.status == SaleStatus::Completed,
                    s.emis_collected >= s.total_emis
                );
            }
        }
    }

    #[test]
    fn test_advance_completion_boundary() {
        let mut s = sale(Frequency::Weekly, ms("2024-01-01"), 10);
        s.emis_collected = 8;
        let s = advance(&s, 5).unwrap();
        assert_eq!(s.status, SaleStatus::Active);
        assert_eq!(s.emis_collected, 9);
        assert_eq!(s.sync_status, SyncStatus::Pending);
        assert_eq!(s.updated_at, 5);

        let s = advance(&s, 6).unwrap();
        assert_eq!(s.status, SaleStatus::Completed);
        assert_eq!(s.emis_collected, 10);

        // completed is terminal
        assert_eq!(advance(&s, 7).unwrap_err().code, ErrorCode::NoActiveSale);
    }

    #[test]
    fn test_due_at_midnight() {
        let today = ms("2024-06-15");
        let mut s = sale(Frequency::Daily, today, 5);
        s.next_due_date = today;
        assert!(is_due(&s, today));
        assert!(is_due(&s, today + 1));
        assert!(!is_due(&s, today - 1));

        s.status = SaleStatus::Defaulted;
        assert!(!is_due(&s, today + 1));
    }

    #[test]
    fn test_due_amount_aggregation() {
        let now = ms("2024-06-15") + 12 * 3_600_000;
        let mut s1 = sale(Frequency::Daily, now - 10 * DAY_MS, 10);
        s1.next_due_date = now - DAY_MS;
        s1.emi_amount = 100.0;
        let mut s2 = sale(Frequency::Daily, now - 10 * DAY_MS, 10);
        s2.id = 2;
        s2.next_due_date = now + DAY_MS;
        s2.emi_amount = 200.0;
        assert_eq!(due_amount([&s1, &s2], now), 100.0);
    }
}

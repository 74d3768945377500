use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use crate::models::Slot;

/// Working-hours grid the slot search walks over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPolicy {
    pub workday_start: NaiveTime,
    pub workday_end: NaiveTime,
    pub slot_minutes: i64,
    pub search_days: i64,
}

impl SlotPolicy {
    pub const MAX_SLOT_MINUTES: i64 = 24 * 60;
    pub const MAX_SEARCH_DAYS: i64 = 366;

    /// First date past the search window that starts on `from`.
    pub fn search_end(&self, from: NaiveDate) -> NaiveDate {
        let days = u64::try_from(self.search_days).unwrap_or(0);
        from.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
    }
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self {
            workday_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            workday_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
            slot_minutes: 50,
            search_days: 30,
        }
    }
}

/// First weekday slot on the policy grid that starts at or after `from` and
/// does not overlap any of `booked`.
pub fn next_free_slot(booked: &[Slot], from: NaiveDateTime, policy: &SlotPolicy) -> Option<Slot> {
    if policy.slot_minutes <= 0 {
        return None;
    }
    let length = Duration::try_minutes(policy.slot_minutes)?;
    let days = u64::try_from(policy.search_days).unwrap_or(0);

    for offset in 0..days {
        let Some(date) = from.date().checked_add_days(Days::new(offset)) else {
            break;
        };
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }

        let mut start = policy.workday_start;
        loop {
            let (end, wrapped) = start.overflowing_add_signed(length);
            if wrapped != 0 || end > policy.workday_end {
                break;
            }
            if date.and_time(start) >= from && !overlaps(booked, date, start, end) {
                return Some(Slot {
                    date,
                    start_time: start,
                    end_time: end,
                });
            }
            start = end;
        }
    }

    None
}

fn overlaps(booked: &[Slot], date: NaiveDate, start: NaiveTime, end: NaiveTime) -> bool {
    booked
        .iter()
        .any(|b| b.date == date && b.start_time < end && start < b.end_time)
}

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};

use streamcal_core::YearMonth;

/// From this day of the month on, the login-time live sync already covers the
/// rest of the month's schedule reaching into next month.
pub const NEXT_MONTH_SEED_DAY: u32 = 22;

/// Months whose past broadcasts this session has already requested.
#[derive(Debug, Clone)]
pub struct MonthCache {
    months: BTreeSet<YearMonth>,
    seed_horizon: YearMonth,
}

impl MonthCache {
    /// Seeds the current month, and the next one late in the month.
    pub fn seeded(today: NaiveDate) -> Self {
        let current = YearMonth::of(today);
        let mut months = BTreeSet::from([current]);
        if let Some(next) = current.next().filter(|_| today.day() >= NEXT_MONTH_SEED_DAY) {
            months.insert(next);
        }
        Self {
            months,
            seed_horizon: horizon_on(today),
        }
    }

    pub fn contains(&self, month: YearMonth) -> bool {
        self.months.contains(&month)
    }

    pub fn insert(&mut self, month: YearMonth) -> bool {
        self.months.insert(month)
    }

    /// Latest month worth fetching as of `today`. Moves forward with the
    /// date and never drops below the horizon the session was seeded with.
    pub fn horizon(&self, today: NaiveDate) -> YearMonth {
        self.seed_horizon.max(horizon_on(today))
    }

    pub fn months(&self) -> Vec<YearMonth> {
        self.months.iter().copied().collect()
    }

    /// Buckets overlapped by `[start, end]` split into `(to_fetch, beyond_horizon)`,
    /// both excluding months already cached.
    pub fn plan(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        today: NaiveDate,
    ) -> (Vec<YearMonth>, Vec<YearMonth>) {
        let horizon = self.horizon(today);
        YearMonth::months_in_range(start, end)
            .into_iter()
            .filter(|m| !self.contains(*m))
            .partition(|m| *m <= horizon)
    }
}

/// One month past the latest month the live sync covers on `today`.
fn horizon_on(today: NaiveDate) -> YearMonth {
    let current = YearMonth::of(today);
    let step = |m: YearMonth| m.next().unwrap_or(m);
    if today.day() >= NEXT_MONTH_SEED_DAY {
        step(step(current))
    } else {
        step(current)
    }
}

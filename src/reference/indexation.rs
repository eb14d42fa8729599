//! Indexation of historical amounts (CPI or fixed annual rate)

use crate::calendar::{fractional_months_between, YearMonth};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One monthly CPI reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpiPoint {
    pub period: YearMonth,
    pub index: f64,
}

/// Monthly CPI readings, sorted by period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpiSeries {
    points: Vec<CpiPoint>,
}

impl CpiSeries {
    /// Build a series; later duplicates of a period win, non-positive readings are dropped
    pub fn new(points: Vec<CpiPoint>) -> Self {
        let mut points: Vec<CpiPoint> = points
            .into_iter()
            .filter(|p| p.index.is_finite() && p.index > 0.0)
            .collect();
        points.sort_by_key(|p| p.period);
        let mut deduped: Vec<CpiPoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.period == point.period => *last = point,
                _ => deduped.push(point),
            }
        }
        Self { points: deduped }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[CpiPoint] {
        &self.points
    }

    /// Reading in force for a month
    ///
    /// That is the latest reading at or before `period`. Months before the
    /// series starts take the first reading.
    pub fn index_at(&self, period: YearMonth) -> Option<f64> {
        let idx = self.points.partition_point(|p| p.period <= period);
        if idx == 0 {
            self.points.first().map(|p| p.index)
        } else {
            Some(self.points[idx - 1].index)
        }
    }
}

/// How historical amounts are brought forward to the eligibility date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Indexation {
    /// Amounts are taken as paid
    #[default]
    None,
    /// Compound growth at a fixed annual rate, prorated by month
    Fixed { annual_rate: f64 },
    /// Ratio of CPI readings
    Cpi(CpiSeries),
}

impl Indexation {
    /// Growth factor from `from` to `to`
    ///
    /// Identity when no time elapses. Never below 1.0: an amount is never
    /// indexed down. A fixed positive rate grows with elapsed time; a CPI
    /// series is followed as published, so a dip after a peak lowers the
    /// factor for later targets.
    pub fn factor(&self, from: NaiveDate, to: NaiveDate) -> f64 {
        if to <= from {
            return 1.0;
        }
        let raw = match self {
            Indexation::None => 1.0,
            Indexation::Fixed { annual_rate } => {
                let years = fractional_months_between(from, to) / 12.0;
                (1.0 + annual_rate).powf(years)
            }
            Indexation::Cpi(series) => {
                let base = series.index_at(YearMonth::from_date(from));
                let target = series.index_at(YearMonth::from_date(to));
                match (base, target) {
                    (Some(base), Some(target)) => target / base,
                    _ => {
                        log::warn!("CPI series is empty; indexing {} -> {} at 1.0", from, to);
                        1.0
                    }
                }
            }
        };
        if raw.is_finite() {
            raw.max(1.0)
        } else {
            1.0
        }
    }

    /// Index `amount` from `from` to `to`
    pub fn apply(&self, amount: f64, from: NaiveDate, to: NaiveDate) -> f64 {
        amount * self.factor(from, to)
    }
}

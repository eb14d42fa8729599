//! Cashflow output structures

use crate::calendar::YearMonth;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One month of the assembled cashflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowRow {
    pub month: YearMonth,
    /// First day of `month`
    pub date: NaiveDate,
    pub inflow: Decimal,
    pub outflow: Decimal,
    pub net: Decimal,

    /// Signed amount per source name (outflows negative)
    pub breakdown: BTreeMap<String, Decimal>,
}

impl CashflowRow {
    /// Empty row for a month
    pub fn new(month: YearMonth) -> Self {
        Self {
            month,
            date: month.first_day(),
            inflow: Decimal::ZERO,
            outflow: Decimal::ZERO,
            net: Decimal::ZERO,
            breakdown: BTreeMap::new(),
        }
    }
}

/// Calendar-year totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyTotal {
    pub year: i32,
    pub months: u32,
    pub inflow: Decimal,
    pub outflow: Decimal,
    pub net: Decimal,
}

/// Sum monthly rows by calendar year, in year order
pub fn yearly_totals(rows: &[CashflowRow]) -> Vec<YearlyTotal> {
    let mut years: BTreeMap<i32, YearlyTotal> = BTreeMap::new();
    for row in rows {
        let total = years.entry(row.month.year).or_insert_with(|| YearlyTotal {
            year: row.month.year,
            months: 0,
            inflow: Decimal::ZERO,
            outflow: Decimal::ZERO,
            net: Decimal::ZERO,
        });
        total.months += 1;
        total.inflow += row.inflow;
        total.outflow += row.outflow;
        total.net += row.net;
    }
    years.into_values().collect()
}

/// Assembled cashflow over a month range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashflowProjection {
    pub rows: Vec<CashflowRow>,
}

impl CashflowProjection {
    pub fn new(rows: Vec<CashflowRow>) -> Self {
        Self { rows }
    }

    /// Get summary statistics
    pub fn summary(&self) -> CashflowSummary {
        CashflowSummary {
            total_months: self.rows.len() as u32,
            first_month: self.rows.first().map(|r| r.month),
            last_month: self.rows.last().map(|r| r.month),
            total_inflow: self.rows.iter().map(|r| r.inflow).sum(),
            total_outflow: self.rows.iter().map(|r| r.outflow).sum(),
            total_net: self.rows.iter().map(|r| r.net).sum(),
            yearly: yearly_totals(&self.rows),
        }
    }
}

/// Summary statistics for a cashflow projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowSummary {
    pub total_months: u32,
    pub first_month: Option<YearMonth>,
    pub last_month: Option<YearMonth>,
    pub total_inflow: Decimal,
    pub total_outflow: Decimal,
    pub total_net: Decimal,
    pub yearly: Vec<YearlyTotal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(year: i32, month: u32, inflow: Decimal, outflow: Decimal) -> CashflowRow {
        CashflowRow {
            inflow,
            outflow,
            net: inflow - outflow,
            ..CashflowRow::new(YearMonth::new(year, month).unwrap())
        }
    }

    #[test]
    fn test_yearly_totals_are_exact() {
        let rows: Vec<CashflowRow> = (1..=12)
            .map(|m| row(2025, m, dec!(0.1), dec!(0.2)))
            .chain(std::iter::once(row(2026, 1, dec!(5), Decimal::ZERO)))
            .collect();

        let yearly = yearly_totals(&rows);
        assert_eq!(yearly.len(), 2);
        assert_eq!(yearly[0].months, 12);
        assert_eq!(yearly[0].inflow, dec!(1.2));
        assert_eq!(yearly[0].outflow, dec!(2.4));
        assert_eq!(yearly[0].net, dec!(-1.2));
        assert_eq!(yearly[1].net, dec!(5));
    }

    #[test]
    fn test_summary() {
        let projection = CashflowProjection::new(vec![
            row(2025, 11, dec!(100), dec!(40)),
            row(2025, 12, dec!(100), dec!(40)),
        ]);
        let summary = projection.summary();
        assert_eq!(summary.total_months, 2);
        assert_eq!(summary.first_month, YearMonth::new(2025, 11));
        assert_eq!(summary.last_month, YearMonth::new(2025, 12));
        assert_eq!(summary.total_net, dec!(120));
    }

    #[test]
    fn test_empty_summary() {
        let summary = CashflowProjection::new(vec![]).summary();
        assert_eq!(summary.total_months, 0);
        assert_eq!(summary.first_month, None);
        assert_eq!(summary.total_inflow, Decimal::ZERO);
        assert!(summary.yearly.is_empty());
    }
}

//! Merge cashflow sources into one month-by-month ledger

use super::rows::{CashflowProjection, CashflowRow};
use super::sources::{CashflowSource, Direction};
use crate::calendar::YearMonth;
use rust_decimal::Decimal;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CashflowError {
    #[error("invalid month range: {from} is after {to}")]
    InvalidRange { from: YearMonth, to: YearMonth },

    #[error("duplicate cashflow source name: {0}")]
    DuplicateSource(String),
}

fn assemble_month(sources: &[CashflowSource], month: YearMonth) -> CashflowRow {
    let mut row = CashflowRow::new(month);
    for source in sources {
        let amount = source.amount_for(month);
        match source.direction {
            Direction::Inflow => row.inflow += amount,
            Direction::Outflow => row.outflow += amount,
        }
        *row.breakdown.entry(source.name.clone()).or_insert(Decimal::ZERO) +=
            source.signed_amount_for(month);
    }
    row.net = row.inflow - row.outflow;
    row
}

/// Assemble one row per month from `from` to `to`, both inclusive
///
/// Every source appears in every row's breakdown, with zero outside its
/// active range, so rows are complete regardless of which sources pay.
/// Source names key the breakdown and must be unique.
pub fn assemble_cashflow(
    sources: &[CashflowSource],
    from: YearMonth,
    to: YearMonth,
) -> Result<Vec<CashflowRow>, CashflowError> {
    if from > to {
        return Err(CashflowError::InvalidRange { from, to });
    }
    let mut names = HashSet::new();
    if let Some(duplicate) = sources.iter().find(|s| !names.insert(s.name.as_str())) {
        return Err(CashflowError::DuplicateSource(duplicate.name.clone()));
    }

    let rows: Vec<CashflowRow> = YearMonth::range_inclusive(from, to)
        .map(|month| assemble_month(sources, month))
        .collect();

    debug_assert_eq!(rows.len() as i64, from.months_until(to) + 1);
    log::debug!(
        "assembled {} cashflow rows from {} sources ({} to {})",
        rows.len(),
        sources.len(),
        from,
        to
    );
    Ok(rows)
}

/// Assemble and wrap in a `CashflowProjection`
pub fn project_cashflow(
    sources: &[CashflowSource],
    from: YearMonth,
    to: YearMonth,
) -> Result<CashflowProjection, CashflowError> {
    assemble_cashflow(sources, from, to).map(CashflowProjection::new)
}

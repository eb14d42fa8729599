//! Monthly cashflow projection over severance, pension, income and assets

mod sources;
mod rows;
mod assembler;

pub use sources::{CashflowSource, Direction, Schedule, SourceKind};
pub use rows::{yearly_totals, CashflowProjection, CashflowRow, CashflowSummary, YearlyTotal};
pub use assembler::{assemble_cashflow, project_cashflow, CashflowError};

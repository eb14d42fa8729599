//! Cashflow sources and their monthly schedules

use crate::calendar::YearMonth;
use crate::fixation::FixationResult;
use crate::rounding::{round_decimal, to_money_decimal};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Whether a source adds to or draws from the client's cash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inflow,
    Outflow,
}

/// What a source represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    SeveranceRelease,
    PensionAnnuity,
    AdditionalIncome,
    CapitalAsset,
    Expense,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::SeveranceRelease => "severance_release",
            SourceKind::PensionAnnuity => "pension_annuity",
            SourceKind::AdditionalIncome => "additional_income",
            SourceKind::CapitalAsset => "capital_asset",
            SourceKind::Expense => "expense",
        }
    }
}

/// When and how much a source pays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schedule {
    /// Single payment in one month
    OneTime { month: YearMonth, amount: Decimal },

    /// Monthly stream, indexed once a year from its start month
    ///
    /// Tax is a flat rate on the indexed amount above `exempt_amount`.
    Monthly {
        start: YearMonth,
        end: Option<YearMonth>,
        amount: Decimal,
        annual_indexation: Decimal,
        tax_rate: Decimal,
        exempt_amount: Decimal,
    },

    /// Periodic return on a capital asset (annual rate paid monthly)
    AssetReturn {
        start: YearMonth,
        end: Option<YearMonth>,
        principal: Decimal,
        annual_return: Decimal,
        tax_rate: Decimal,
    },
}

fn active(month: YearMonth, start: YearMonth, end: Option<YearMonth>) -> bool {
    month >= start && end.map_or(true, |end| month <= end)
}

fn after_tax(gross: Decimal, exempt: Decimal, tax_rate: Decimal) -> Decimal {
    let taxable = (gross - exempt).max(Decimal::ZERO);
    gross - taxable * tax_rate
}

impl Schedule {
    /// Net amount paid in `month` (zero outside the active range)
    pub fn amount_for(&self, month: YearMonth) -> Decimal {
        let amount = match self {
            Schedule::OneTime { month: paid, amount } => {
                if *paid == month {
                    *amount
                } else {
                    Decimal::ZERO
                }
            }
            Schedule::Monthly {
                start,
                end,
                amount,
                annual_indexation,
                tax_rate,
                exempt_amount,
            } => {
                if !active(month, *start, *end) {
                    return Decimal::ZERO;
                }
                let years = start.months_until(month) / 12;
                let factor =
                    (0..years).fold(Decimal::ONE, |f, _| f * (Decimal::ONE + *annual_indexation));
                after_tax(*amount * factor, *exempt_amount, *tax_rate)
            }
            Schedule::AssetReturn {
                start,
                end,
                principal,
                annual_return,
                tax_rate,
            } => {
                if !active(month, *start, *end) {
                    return Decimal::ZERO;
                }
                let gross = *principal * *annual_return / Decimal::from(12);
                after_tax(gross, Decimal::ZERO, *tax_rate)
            }
        };
        round_decimal(amount.max(Decimal::ZERO))
    }
}

/// One stream contributing to the cashflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowSource {
    /// Label used as the breakdown key
    pub name: String,
    pub kind: SourceKind,
    pub direction: Direction,
    pub schedule: Schedule,
}

impl CashflowSource {
    pub fn new(name: &str, kind: SourceKind, direction: Direction, schedule: Schedule) -> Self {
        Self {
            name: name.to_string(),
            kind,
            direction,
            schedule,
        }
    }

    /// Net severance paid out in one month
    pub fn severance_release(name: &str, month: YearMonth, net_amount: Decimal) -> Self {
        Self::new(
            name,
            SourceKind::SeveranceRelease,
            Direction::Inflow,
            Schedule::OneTime { month, amount: net_amount },
        )
    }

    /// Open-ended pension annuity with an exempt monthly portion
    pub fn pension_annuity(
        name: &str,
        start: YearMonth,
        monthly_gross: Decimal,
        annual_indexation: Decimal,
        tax_rate: Decimal,
        exempt_monthly: Decimal,
    ) -> Self {
        Self::new(
            name,
            SourceKind::PensionAnnuity,
            Direction::Inflow,
            Schedule::Monthly {
                start,
                end: None,
                amount: monthly_gross,
                annual_indexation,
                tax_rate,
                exempt_amount: exempt_monthly,
            },
        )
    }

    /// Pension annuity whose exempt portion is the fixed monthly exemption
    pub fn fixed_pension(
        name: &str,
        fixation: &FixationResult,
        start: YearMonth,
        monthly_gross: Decimal,
        annual_indexation: Decimal,
        tax_rate: Decimal,
    ) -> Self {
        let exempt =
            to_money_decimal(fixation.final_remaining_monthly_exemption).min(monthly_gross);
        Self::pension_annuity(name, start, monthly_gross, annual_indexation, tax_rate, exempt)
    }

    /// Salary, rent or other income with its own indexation and tax
    pub fn additional_income(
        name: &str,
        start: YearMonth,
        end: Option<YearMonth>,
        monthly_gross: Decimal,
        annual_indexation: Decimal,
        tax_rate: Decimal,
    ) -> Self {
        Self::new(
            name,
            SourceKind::AdditionalIncome,
            Direction::Inflow,
            Schedule::Monthly {
                start,
                end,
                amount: monthly_gross,
                annual_indexation,
                tax_rate,
                exempt_amount: Decimal::ZERO,
            },
        )
    }

    /// Returns on a capital asset
    pub fn capital_asset(
        name: &str,
        start: YearMonth,
        end: Option<YearMonth>,
        principal: Decimal,
        annual_return: Decimal,
        tax_rate: Decimal,
    ) -> Self {
        Self::new(
            name,
            SourceKind::CapitalAsset,
            Direction::Inflow,
            Schedule::AssetReturn {
                start,
                end,
                principal,
                annual_return,
                tax_rate,
            },
        )
    }

    /// Recurring untaxed outflow
    pub fn expense(name: &str, start: YearMonth, end: Option<YearMonth>, monthly: Decimal) -> Self {
        Self::new(
            name,
            SourceKind::Expense,
            Direction::Outflow,
            Schedule::Monthly {
                start,
                end,
                amount: monthly,
                annual_indexation: Decimal::ZERO,
                tax_rate: Decimal::ZERO,
                exempt_amount: Decimal::ZERO,
            },
        )
    }

    /// Unsigned amount for `month`
    pub fn amount_for(&self, month: YearMonth) -> Decimal {
        self.schedule.amount_for(month)
    }

    /// Amount for `month`, negative for outflows
    pub fn signed_amount_for(&self, month: YearMonth) -> Decimal {
        match self.direction {
            Direction::Inflow => self.amount_for(month),
            Direction::Outflow => -self.amount_for(month),
        }
    }
}

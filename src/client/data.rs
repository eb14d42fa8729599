//! Client and severance grant records supplied by the surrounding system

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Gender of the client as far as the retirement-age rule is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    /// Token that matched neither list (handled by `UnknownGenderPolicy`)
    Unknown,
}

impl Gender {
    /// Parse a free-form gender token
    ///
    /// Accepts `male`/`m`/`זכר` and `female`/`f`/`נקבה`, trimmed and
    /// case-insensitive. Anything else is `Unknown`.
    pub fn parse(token: &str) -> Self {
        let token = token.trim().to_lowercase();
        match token.as_str() {
            "male" | "m" | "זכר" => Gender::Male,
            "female" | "f" | "נקבה" => Gender::Female,
            _ => Gender::Unknown,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Gender::Unknown)
    }
}

/// Client demographics used by the eligibility gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Identifier assigned by the data-access layer
    pub client_id: u32,

    pub birth_date: NaiveDate,

    pub gender: Gender,

    /// First pension payment date (None = pension not started)
    #[serde(default)]
    pub pension_start_date: Option<NaiveDate>,
}

impl Client {
    pub fn new(
        client_id: u32,
        birth_date: NaiveDate,
        gender: Gender,
        pension_start_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            client_id,
            birth_date,
            gender,
            pension_start_date,
        }
    }
}

/// One severance payment event from the client's employment history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grant {
    /// Identifier, unique within a client
    pub grant_id: u32,

    pub employer_name: String,

    /// Start of the service period the grant pays for
    #[serde(default)]
    pub work_start_date: Option<NaiveDate>,

    /// End of the service period (None = still employed / unknown)
    #[serde(default)]
    pub work_end_date: Option<NaiveDate>,

    /// Date the grant was paid
    pub grant_date: NaiveDate,

    /// Gross amount as paid
    pub grant_amount: f64,

    /// Product the grant was paid from (severance fund, employer, ...)
    #[serde(default)]
    pub product_type: Option<String>,
}

impl Grant {
    pub fn new(
        grant_id: u32,
        employer_name: impl Into<String>,
        work_start_date: Option<NaiveDate>,
        work_end_date: Option<NaiveDate>,
        grant_date: NaiveDate,
        grant_amount: f64,
    ) -> Self {
        Self {
            grant_id,
            employer_name: employer_name.into(),
            work_start_date,
            work_end_date,
            grant_date,
            grant_amount,
            product_type: None,
        }
    }

    /// Attach a product type
    pub fn with_product_type(mut self, product_type: impl Into<String>) -> Self {
        self.product_type = Some(product_type.into());
        self
    }
}

//! Load clients and grants from CSV extracts of the employment history

use super::{Client, Gender, Grant};
use chrono::NaiveDate;
use csv::Reader;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading client or grant extracts
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: invalid {field} '{value}'")]
    InvalidField {
        row: usize,
        field: &'static str,
        value: String,
    },
}

/// Raw CSV row of the grants extract
#[derive(Debug, serde::Deserialize)]
struct GrantRow {
    #[serde(rename = "ClientID", default)]
    client_id: Option<u32>,
    #[serde(rename = "GrantID")]
    grant_id: u32,
    #[serde(rename = "Employer")]
    employer: String,
    #[serde(rename = "WorkStart", default)]
    work_start: Option<String>,
    #[serde(rename = "WorkEnd", default)]
    work_end: Option<String>,
    #[serde(rename = "GrantDate")]
    grant_date: String,
    #[serde(rename = "Amount")]
    amount: f64,
    #[serde(rename = "ProductType", default)]
    product_type: Option<String>,
}

impl GrantRow {
    fn to_grant(self, row: usize) -> Result<(Option<u32>, Grant), LoadError> {
        let grant = Grant {
            grant_id: self.grant_id,
            employer_name: self.employer.trim().to_string(),
            work_start_date: parse_optional_date(self.work_start.as_deref(), row, "WorkStart")?,
            work_end_date: parse_optional_date(self.work_end.as_deref(), row, "WorkEnd")?,
            grant_date: parse_date(&self.grant_date, row, "GrantDate")?,
            grant_amount: self.amount,
            product_type: self.product_type.filter(|p| !p.trim().is_empty()),
        };
        Ok((self.client_id, grant))
    }
}

/// Raw CSV row of the clients extract
#[derive(Debug, serde::Deserialize)]
struct ClientRow {
    #[serde(rename = "ClientID")]
    client_id: u32,
    #[serde(rename = "BirthDate")]
    birth_date: String,
    #[serde(rename = "Gender")]
    gender: String,
    #[serde(rename = "PensionStart", default)]
    pension_start: Option<String>,
}

impl ClientRow {
    fn to_client(self, row: usize) -> Result<Client, LoadError> {
        Ok(Client {
            client_id: self.client_id,
            birth_date: parse_date(&self.birth_date, row, "BirthDate")?,
            gender: Gender::parse(&self.gender),
            pension_start_date: parse_optional_date(
                self.pension_start.as_deref(),
                row,
                "PensionStart",
            )?,
        })
    }
}

fn parse_date(value: &str, row: usize, field: &'static str) -> Result<NaiveDate, LoadError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| LoadError::InvalidField {
        row,
        field,
        value: value.to_string(),
    })
}

fn parse_optional_date(
    value: Option<&str>,
    row: usize,
    field: &'static str,
) -> Result<Option<NaiveDate>, LoadError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_date(v, row, field).map(Some),
    }
}

/// Load grants from a CSV file, ignoring any ClientID column
pub fn load_grants<P: AsRef<Path>>(path: P) -> Result<Vec<Grant>, LoadError> {
    let reader = Reader::from_path(path)?;
    read_grants(reader)
}

/// Load grants from any reader (e.g., string buffer, network stream)
pub fn load_grants_from_reader<R: Read>(reader: R) -> Result<Vec<Grant>, LoadError> {
    read_grants(Reader::from_reader(reader))
}

fn read_grants<R: Read>(mut reader: Reader<R>) -> Result<Vec<Grant>, LoadError> {
    let mut grants = Vec::new();
    for (idx, result) in reader.deserialize().enumerate() {
        let row: GrantRow = result?;
        let (_, grant) = row.to_grant(idx + 1)?;
        grants.push(grant);
    }
    Ok(grants)
}

/// Load grants keyed by the ClientID column
///
/// Rows without a ClientID are rejected since they can't be attributed.
pub fn load_grants_by_client<R: Read>(reader: R) -> Result<BTreeMap<u32, Vec<Grant>>, LoadError> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut grants: BTreeMap<u32, Vec<Grant>> = BTreeMap::new();

    for (idx, result) in csv_reader.deserialize().enumerate() {
        let row: GrantRow = result?;
        let (client_id, grant) = row.to_grant(idx + 1)?;
        let client_id = client_id.ok_or(LoadError::InvalidField {
            row: idx + 1,
            field: "ClientID",
            value: String::new(),
        })?;
        grants.entry(client_id).or_default().push(grant);
    }

    Ok(grants)
}

/// Load clients from a CSV file
pub fn load_clients<P: AsRef<Path>>(path: P) -> Result<Vec<Client>, LoadError> {
    let reader = Reader::from_path(path)?;
    read_clients(reader)
}

/// Load clients from any reader
pub fn load_clients_from_reader<R: Read>(reader: R) -> Result<Vec<Client>, LoadError> {
    read_clients(Reader::from_reader(reader))
}

fn read_clients<R: Read>(mut reader: Reader<R>) -> Result<Vec<Client>, LoadError> {
    let mut clients = Vec::new();
    for (idx, result) in reader.deserialize().enumerate() {
        let row: ClientRow = result?;
        clients.push(row.to_client(idx + 1)?);
    }
    Ok(clients)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRANTS_CSV: &str = "\
ClientID,GrantID,Employer,WorkStart,WorkEnd,GrantDate,Amount,ProductType
7,1,Acme Ltd,1990-01-01,2005-06-30,2005-07-15,250000,severance_fund
7,2,Beta Inc,2005-08-01,,2015-03-01,120000,
8,3,Gamma,2000-01-01,2010-01-01,2010-02-01,90000,employer
";

    #[test]
    fn test_load_grants_from_reader() {
        let grants = load_grants_from_reader(GRANTS_CSV.as_bytes()).expect("grants should load");
        assert_eq!(grants.len(), 3);

        let first = &grants[0];
        assert_eq!(first.employer_name, "Acme Ltd");
        assert_eq!(first.work_start_date, NaiveDate::from_ymd_opt(1990, 1, 1));
        assert_eq!(first.product_type.as_deref(), Some("severance_fund"));

        let second = &grants[1];
        assert_eq!(second.work_end_date, None);
        assert_eq!(second.product_type, None);
    }

    #[test]
    fn test_load_grants_by_client() {
        let by_client = load_grants_by_client(GRANTS_CSV.as_bytes()).expect("grants should load");
        assert_eq!(by_client.len(), 2);
        assert_eq!(by_client[&7].len(), 2);
        assert_eq!(by_client[&8][0].grant_id, 3);
    }

    #[test]
    fn test_invalid_date_reports_row_and_field() {
        let csv = concat!(
            "GrantID,Employer,WorkStart,WorkEnd,GrantDate,Amount\n",
            "1,Acme,2000-01-01,2010-01-01,15/02/2010,1000\n",
        );
        let err = load_grants_from_reader(csv.as_bytes()).unwrap_err();
        match err {
            LoadError::InvalidField { row, field, .. } => {
                assert_eq!(row, 1);
                assert_eq!(field, "GrantDate");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_clients_from_reader() {
        let csv = "\
ClientID,BirthDate,Gender,PensionStart
1,1955-04-10,זכר,2022-05-01
2,1960-09-01,F,
";
        let clients = load_clients_from_reader(csv.as_bytes()).expect("clients should load");
        assert_eq!(clients.len(), 2);
        assert_eq!(clients[0].gender, Gender::Male);
        assert_eq!(clients[1].gender, Gender::Female);
        assert_eq!(clients[1].pension_start_date, None);
    }
}

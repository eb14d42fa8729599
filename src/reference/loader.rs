//! CSV loaders for statutory reference tables

use super::exempt_capital::{ExemptCapitalRow, ExemptCapitalTable};
use super::indexation::{CpiPoint, CpiSeries};
use crate::calendar::YearMonth;
use crate::client::LoadError;
use csv::Reader;
use std::io::Read;
use std::path::Path;

/// Load a monthly CPI series from a `year,month,index` CSV file
pub fn load_cpi_series<P: AsRef<Path>>(path: P) -> Result<CpiSeries, LoadError> {
    read_cpi(Reader::from_path(path)?)
}

/// Load a CPI series from any reader
pub fn load_cpi_series_from_reader<R: Read>(reader: R) -> Result<CpiSeries, LoadError> {
    read_cpi(Reader::from_reader(reader))
}

fn read_cpi<R: Read>(mut reader: Reader<R>) -> Result<CpiSeries, LoadError> {
    let mut points = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        let row = idx + 1;
        let year: i32 = parse_field(&record, 0, row, "year")?;
        let month: u32 = parse_field(&record, 1, row, "month")?;
        let index: f64 = parse_field(&record, 2, row, "index")?;

        let period = YearMonth::new(year, month).ok_or(LoadError::InvalidField {
            row,
            field: "month",
            value: month.to_string(),
        })?;
        points.push(CpiPoint { period, index });
    }

    Ok(CpiSeries::new(points))
}

/// Load exempt-capital overrides from a `year,pension_ceiling,exemption_rate` CSV
///
/// Rows are layered over the statutory table.
pub fn load_exempt_capital_from_reader<R: Read>(
    reader: R,
) -> Result<ExemptCapitalTable, LoadError> {
    let mut reader = Reader::from_reader(reader);
    let mut table = ExemptCapitalTable::statutory();

    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        let row = idx + 1;
        table = table.with_row(ExemptCapitalRow {
            year: parse_field(&record, 0, row, "year")?,
            pension_ceiling: parse_field(&record, 1, row, "pension_ceiling")?,
            exemption_rate: parse_field(&record, 2, row, "exemption_rate")?,
        });
    }

    Ok(table)
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    column: usize,
    row: usize,
    field: &'static str,
) -> Result<T, LoadError> {
    let raw = record.get(column).unwrap_or("").trim();
    raw.parse().map_err(|_| LoadError::InvalidField {
        row,
        field,
        value: raw.to_string(),
    })
}

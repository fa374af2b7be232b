use crate::data::{DataPoint, FIELD_AMOUNT, FIELD_PERIOD, FIELD_SECONDARY_AMOUNT, FIELD_SECONDARY_TYPE, FIELD_TYPE};
use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use serde_json::Value;
use std::io::{self, Read};

#[derive(Debug, Clone)]
pub struct CsvData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

const CORE_FIELDS: [&str; 5] = [FIELD_PERIOD, FIELD_AMOUNT, FIELD_SECONDARY_AMOUNT, FIELD_TYPE, FIELD_SECONDARY_TYPE];

pub fn read_csv<R: Read>(input: R) -> Result<CsvData> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(input);

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|s| s.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.context("Failed to read CSV record")?;
        let row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        rows.push(row);
    }

    Ok(CsvData { headers, rows })
}

pub fn read_csv_from_stdin() -> Result<CsvData> {
    read_csv(io::stdin())
}

fn find_column(data: &CsvData, name: &str) -> Option<usize> {
    data.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

fn require_column(data: &CsvData, name: &str) -> Result<usize> {
    find_column(data, name).ok_or_else(|| {
        anyhow!(
            "Column '{}' not found. Available columns: {}",
            name,
            data.headers.join(", ")
        )
    })
}

fn cell<'a>(row: &'a [String], index: usize, row_idx: usize) -> Result<&'a str> {
    row.get(index).map(|s| s.trim()).ok_or_else(|| {
        anyhow!(
            "Row {} has only {} columns, expected at least {}",
            row_idx + 1,
            row.len(),
            index + 1
        )
    })
}

/// Empty cells are missing values; anything else must parse as a number.
fn parse_amount(value: &str, column: &str, row_idx: usize) -> Result<Option<f64>> {
    if value.is_empty() {
        return Ok(None);
    }
    let number = value.parse::<f64>().with_context(|| {
        format!(
            "Failed to parse value '{}' as number in column '{}' at row {}",
            value,
            column,
            row_idx + 1
        )
    })?;
    Ok(Some(number))
}

/// Numeric text becomes a number, everything else stays a string.
fn extra_value(value: &str) -> Value {
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => Value::from(number),
        _ => Value::String(value.to_string()),
    }
}

/// Map CSV rows onto data points. `period` and `type` columns are required.
pub fn into_data_points(data: &CsvData) -> Result<Vec<DataPoint>> {
    let period = require_column(data, FIELD_PERIOD)?;
    let kind = require_column(data, FIELD_TYPE)?;
    let amount = find_column(data, FIELD_AMOUNT);
    let secondary_amount = find_column(data, FIELD_SECONDARY_AMOUNT);
    let secondary_type = find_column(data, FIELD_SECONDARY_TYPE);

    let extras: Vec<(usize, &String)> = data
        .headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !CORE_FIELDS.iter().any(|core| h.eq_ignore_ascii_case(core)))
        .collect();

    let mut points = Vec::with_capacity(data.rows.len());
    for (row_idx, row) in data.rows.iter().enumerate() {
        let mut point = DataPoint {
            period: cell(row, period, row_idx)?.to_string(),
            kind: cell(row, kind, row_idx)?.to_string(),
            ..Default::default()
        };
        if let Some(index) = amount {
            point.amount = parse_amount(cell(row, index, row_idx)?, FIELD_AMOUNT, row_idx)?;
        }
        if let Some(index) = secondary_amount {
            point.secondary_amount = parse_amount(cell(row, index, row_idx)?, FIELD_SECONDARY_AMOUNT, row_idx)?;
        }
        if let Some(index) = secondary_type {
            point.secondary_type = cell(row, index, row_idx)?.to_string();
        }
        for (index, header) in &extras {
            let value = cell(row, *index, row_idx)?;
            if !value.is_empty() {
                point.extra.insert(header.to_string(), extra_value(value));
            }
        }
        points.push(point);
    }

    tracing::debug!(rows = points.len(), columns = data.headers.len(), "loaded CSV data");
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn points_from(content: &str) -> Result<Vec<DataPoint>> {
        into_data_points(&read_csv(content.as_bytes())?)
    }

    #[test]
    fn test_read_csv_basic() {
        let data = read_csv("period,amount\n2023-11-20,1\n2023-11-21,2\n".as_bytes()).unwrap();
        assert_eq!(data.headers, vec!["period", "amount"]);
        assert_eq!(data.rows.len(), 2);
    }

    #[test]
    fn test_read_csv_headers_only() {
        let data = read_csv("period,type\n".as_bytes()).unwrap();
        assert!(data.rows.is_empty());
        assert!(into_data_points(&data).unwrap().is_empty());
    }

    #[test]
    fn test_core_columns() {
        let points = points_from(
            "period,amount,secondaryAmount,type,secondaryType\n2023-11-20,5,1.5,Bikes,Rate\n",
        )
        .unwrap();
        assert_eq!(points, vec![DataPoint::new("2023-11-20", 5.0, 1.5, "Bikes", "Rate")]);
    }

    #[test]
    fn test_columns_case_insensitive() {
        let points = points_from("PERIOD,Amount,TYPE,SecondaryType\np1,3,A,L\n").unwrap();
        assert_eq!(points[0].period, "p1");
        assert_eq!(points[0].amount, Some(3.0));
        assert_eq!(points[0].secondary_amount, None);
        assert_eq!(points[0].secondary_type, "L");
    }

    #[test]
    fn test_empty_amount_is_missing() {
        let points = points_from("period,amount,type\np1,,A\n").unwrap();
        assert_eq!(points[0].amount, None);
    }

    #[test]
    fn test_extra_columns() {
        let points = points_from("period,type,rank,colorOverride,note\np1,A,2,#ff0000,\n").unwrap();
        assert_eq!(points[0].field("rank"), Some(json!(2.0)));
        assert_eq!(points[0].field("colorOverride"), Some(json!("#ff0000")));
        assert_eq!(points[0].field("note"), None);
    }

    #[test]
    fn test_non_numeric_amount() {
        let err = points_from("period,amount,type\np1,1,A\np2,lots,A\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to parse value 'lots' as number in column 'amount' at row 2"
        );
    }

    #[test]
    fn test_missing_required_column() {
        let err = points_from("period,amount\np1,1\n").unwrap_err();
        assert_eq!(err.to_string(), "Column 'type' not found. Available columns: period, amount");
    }

    #[test]
    fn test_read_csv_malformed() {
        // uneven record lengths are rejected by the csv reader
        assert!(read_csv("period,type\np1,A,extra\n".as_bytes()).is_err());
    }

    #[test]
    fn test_read_csv_unicode() {
        let points = points_from("period,type\n2023-11-20,Café\n").unwrap();
        assert_eq!(points[0].kind, "Café");
    }
}

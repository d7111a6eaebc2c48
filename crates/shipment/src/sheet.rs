//! Import sheet (CSV): `SKU, Variant Name, Cost, Quantity` with a header row.

use std::io::{Read, Write};

use thiserror::Error;

use crate::import::ImportRow;

pub const SHEET_HEADERS: [&str; 4] = ["SKU", "Variant Name", "Cost", "Quantity"];

const SAMPLE_ROWS: [[&str; 4]; 2] = [
    ["SAMPLE-SKU-001", "", "10000", "5"],
    ["SAMPLE-SKU-002", "Red / Large", "25000", "10"],
];

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Failed to read import file: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write import file: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse rows after the header. Rows without a SKU are skipped; an
/// unreadable cost becomes 0 and an unreadable or non-positive quantity
/// becomes 1.
pub fn parse_rows<R: Read>(reader: R) -> Result<Vec<ImportRow>, SheetError> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (idx, record) in csv.records().enumerate() {
        let record = record?;
        let sku = record.get(0).unwrap_or_default();
        if sku.is_empty() {
            continue;
        }
        let row_number = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);

        rows.push(
            ImportRow::new(
                sku,
                parse_cost(record.get(2).unwrap_or_default()),
                parse_quantity(record.get(3).unwrap_or_default()),
            )
            .with_variant(record.get(1).unwrap_or_default())
            .at_row(row_number),
        );
    }
    Ok(rows)
}

fn parse_cost(raw: &str) -> f64 {
    raw.replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|c| c.is_finite())
        .unwrap_or(0.0)
}

fn parse_quantity(raw: &str) -> u64 {
    let raw = raw.replace(',', "");
    let parsed = raw
        .parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|q| q.is_finite()).map(|q| q.trunc() as i64));
    match parsed {
        Some(q) if q > 0 => q as u64,
        _ => 1,
    }
}

/// Write the header plus two example rows (one plain, one variant).
pub fn write_sample<W: Write>(writer: W) -> Result<(), SheetError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(SHEET_HEADERS)?;
    for row in SAMPLE_ROWS {
        csv.write_record(row)?;
    }
    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_with_defaults() {
        let data = "\
SKU,Variant Name,Cost,Quantity
SKU-A,,100,2
,,5,5
SKU-B, Red ,abc,0
SKU-C,,\"1,250.5\",3.9
SKU-D
";
        let rows = parse_rows(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], ImportRow::new("SKU-A", 100.0, 2).at_row(2));
        assert_eq!(rows[1].row_number, Some(4));
        assert_eq!(rows[1].variant_name.as_deref(), Some("Red"));
        assert_eq!(rows[1].cost, 0.0);
        assert_eq!(rows[1].quantity, 1);
        assert_eq!(rows[2].cost, 1250.5);
        assert_eq!(rows[2].quantity, 3);
        assert_eq!(rows[3].quantity, 1);
        assert_eq!(rows[3].variant_name, None);
    }

    #[test]
    fn header_only_sheet_has_no_rows() {
        let rows = parse_rows("SKU,Variant Name,Cost,Quantity\n".as_bytes()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn sample_sheet_parses_back() {
        let mut buf = Vec::new();
        write_sample(&mut buf).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("SKU,Variant Name,Cost,Quantity\n"));

        let rows = parse_rows(buf.as_slice()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].sku, "SAMPLE-SKU-002");
        assert_eq!(rows[1].variant_name.as_deref(), Some("Red / Large"));
        assert_eq!(rows[1].quantity, 10);
    }
}

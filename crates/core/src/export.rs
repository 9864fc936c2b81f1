//! CSV export of a user's expenses.

use std::io::Write;

use rust_decimal::Decimal;

/// Header row of the export file.
pub const CSV_HEADER: [&str; 4] = ["User", "Name", "Price", "Category"];

/// Download file name advertised in `Content-Disposition`.
pub const CSV_FILENAME: &str = "expenses.csv";

/// One exported expense line.
#[derive(Debug, Clone)]
pub struct ExportRow {
    pub user_email: String,
    pub expense_name: String,
    pub amount: Decimal,
    pub category_name: String,
}

/// Write `rows` as CSV (with header) into `writer`.
pub fn write_expenses_csv<W: Write>(writer: W, rows: &[ExportRow]) -> Result<(), csv::Error> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;
    for row in rows {
        let mut amount = row.amount;
        amount.rescale(2);
        let amount = amount.to_string();
        csv.write_record([
            row.user_email.as_str(),
            row.expense_name.as_str(),
            amount.as_str(),
            row.category_name.as_str(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Render `rows` to an in-memory CSV document.
pub fn expenses_csv(rows: &[ExportRow]) -> Result<Vec<u8>, csv::Error> {
    let mut buf = Vec::new();
    write_expenses_csv(&mut buf, rows)?;
    Ok(buf)
}

//! Output formatting utilities

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

/// Determine the effective output format based on context
pub fn effective_format(format: OutputFormat, is_list: bool) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if is_list {
                OutputFormat::Table
            } else {
                OutputFormat::Yaml
            }
        }
        other => other,
    }
}

/// Print a serializable value as JSON or YAML
pub fn print_serialized<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        let json = serde_json::to_string_pretty(value).into_diagnostic()?;
        println!("{}", json);
    } else {
        let yaml = serde_yml::to_string(value).into_diagnostic()?;
        print!("{}", yaml);
    }
    Ok(())
}

/// Render rows as a table, CSV or TSV
pub fn render_rows(headers: &[&str], rows: &[Vec<String>], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Csv | OutputFormat::Tsv => {
            let delimiter = if format == OutputFormat::Csv { b',' } else { b'\t' };
            let mut wtr = csv::WriterBuilder::new()
                .delimiter(delimiter)
                .from_writer(Vec::new());
            wtr.write_record(headers).into_diagnostic()?;
            for row in rows {
                wtr.write_record(row).into_diagnostic()?;
            }
            let bytes = wtr.into_inner().map_err(|e| miette::miette!("{}", e))?;
            String::from_utf8(bytes).into_diagnostic()
        }
        _ => {
            let mut builder = Builder::default();
            builder.push_record(headers.iter().map(|h| h.to_string()));
            for row in rows {
                builder.push_record(row.iter().cloned());
            }
            let mut table = builder.build();
            table.with(Style::sharp());
            Ok(format!("{}\n", table))
        }
    }
}

/// Print rows as a table, CSV or TSV
pub fn print_rows(headers: &[&str], rows: &[Vec<String>], format: OutputFormat) -> Result<()> {
    print!("{}", render_rows(headers, rows, format)?);
    Ok(())
}

/// Format a native-currency amount
pub fn money(symbol: &str, amount: f64) -> String {
    format!("{}{:.2}", symbol, amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Vec<String>> {
        vec![vec!["RES SMD 10K 0603".to_string(), "acme, inc".to_string()]]
    }

    #[test]
    fn test_auto_format() {
        assert_eq!(effective_format(OutputFormat::Auto, true), OutputFormat::Table);
        assert_eq!(effective_format(OutputFormat::Auto, false), OutputFormat::Yaml);
        assert_eq!(effective_format(OutputFormat::Csv, false), OutputFormat::Csv);
    }

    #[test]
    fn test_render_csv_quotes_fields() {
        let out = render_rows(&["IDENT", "VENDOR"], &rows(), OutputFormat::Csv).unwrap();
        assert_eq!(out, "IDENT,VENDOR\nRES SMD 10K 0603,\"acme, inc\"\n");
    }

    #[test]
    fn test_render_tsv() {
        let out = render_rows(&["IDENT", "VENDOR"], &rows(), OutputFormat::Tsv).unwrap();
        assert_eq!(out, "IDENT\tVENDOR\nRES SMD 10K 0603\tacme, inc\n");
    }

    #[test]
    fn test_render_table_contains_cells() {
        let out = render_rows(&["IDENT", "VENDOR"], &rows(), OutputFormat::Table).unwrap();
        assert!(out.contains("IDENT"));
        assert!(out.contains("acme, inc"));
    }

    #[test]
    fn test_money() {
        assert_eq!(money("₹", 12.5), "₹12.50");
    }
}

//! Sourcing report - the composite order as a multi-header CSV sheet
//!
//! The sheet has three header rows (section titles, column titles, units)
//! followed by one row per order line. The selected source of a line is
//! marked with a trailing `<--`; with `include_others`, every other source
//! of the line follows on its own row.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::sourcing::error::SourcingError;
use crate::sourcing::info::SourceInfo;
use crate::sourcing::line::OrderLine;
use crate::sourcing::order::CompositeOrder;
use crate::sourcing::provider::SourcingProvider;

/// Marker appended to the selected source row
pub const SELECTED_MARKER: &str = "<--";

/// Report columns, in sheet order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Ident,
    Mapped,
    Required,
    Reserved,
    Shortage,
    BuyQty,
    Vendor,
    VendorPartNo,
    Manufacturer,
    ManufacturerPartNo,
    Description,
    VendorCurrency,
    NextBreakQty,
    NextBreakUnitPrice,
    NextBreakExtendedPrice,
    UsedBreakQty,
    UsedBreakUnitPrice,
    UsedBreakExtendedPrice,
    LowerBreakUnitPrice,
    UnitPrice,
    EffectiveUnitPrice,
    OrderQty,
    ExcessQty,
    EffectiveExtendedPrice,
    EffectiveExcessPrice,
    ExcessRationale,
}

/// Columns grouped under their section titles
pub const SECTIONS: &[(&str, &[Column])] = &[
    ("Component Details", &[Column::Ident, Column::Mapped]),
    ("Requirement", &[Column::Required, Column::Reserved, Column::Shortage]),
    ("Guideline Compliant", &[Column::BuyQty]),
    (
        "Order Details",
        &[
            Column::Vendor,
            Column::VendorPartNo,
            Column::Manufacturer,
            Column::ManufacturerPartNo,
            Column::Description,
        ],
    ),
    (
        "Vendor Pricing",
        &[
            Column::VendorCurrency,
            Column::NextBreakQty,
            Column::NextBreakUnitPrice,
            Column::NextBreakExtendedPrice,
            Column::UsedBreakQty,
            Column::UsedBreakUnitPrice,
            Column::UsedBreakExtendedPrice,
        ],
    ),
    (
        "Order Pricing",
        &[
            Column::LowerBreakUnitPrice,
            Column::UnitPrice,
            Column::EffectiveUnitPrice,
            Column::OrderQty,
            Column::ExcessQty,
            Column::EffectiveExtendedPrice,
            Column::EffectiveExcessPrice,
            Column::ExcessRationale,
        ],
    ),
];

/// Number of columns in the sheet
pub const COLUMN_COUNT: usize = 26;

enum Unit {
    None,
    Qty,
    VendorCurrency,
    Native,
}

impl Column {
    pub fn title(self) -> &'static str {
        match self {
            Column::Ident => "Ident",
            Column::Mapped => "Mapped",
            Column::Required => "Required",
            Column::Reserved => "Reserved",
            Column::Shortage => "Shortage",
            Column::BuyQty => "Buy Qty",
            Column::Vendor => "Vendor",
            Column::VendorPartNo => "Vendor Part No",
            Column::Manufacturer => "Manufacturer",
            Column::ManufacturerPartNo => "Manufacturer Part No",
            Column::Description => "Description",
            Column::VendorCurrency => "Vendor Currency",
            Column::NextBreakQty => "Next Break Qty",
            Column::NextBreakUnitPrice => "NB Unit Price",
            Column::NextBreakExtendedPrice => "NB Extended Price",
            Column::UsedBreakQty => "Used Break Qty",
            Column::UsedBreakUnitPrice => "UB Unit Price",
            Column::UsedBreakExtendedPrice => "UB Extended Price",
            Column::LowerBreakUnitPrice => "Lower Break Unit Price",
            Column::UnitPrice => "Unit Price",
            Column::EffectiveUnitPrice => "Effective Unit Price",
            Column::OrderQty => "Order Qty",
            Column::ExcessQty => "Excess Qty",
            Column::EffectiveExtendedPrice => "Effective Extended Price",
            Column::EffectiveExcessPrice => "Effective Excess Price",
            Column::ExcessRationale => "Excess Rationale",
        }
    }

    fn unit(self) -> Unit {
        match self {
            Column::Required
            | Column::Reserved
            | Column::Shortage
            | Column::BuyQty
            | Column::NextBreakQty
            | Column::UsedBreakQty
            | Column::OrderQty
            | Column::ExcessQty => Unit::Qty,
            Column::NextBreakUnitPrice
            | Column::NextBreakExtendedPrice
            | Column::UsedBreakUnitPrice
            | Column::UsedBreakExtendedPrice => Unit::VendorCurrency,
            Column::LowerBreakUnitPrice
            | Column::UnitPrice
            | Column::EffectiveUnitPrice
            | Column::EffectiveExtendedPrice
            | Column::EffectiveExcessPrice => Unit::Native,
            _ => Unit::None,
        }
    }
}

/// One sheet row under construction
struct Row(Vec<String>);

impl Row {
    fn new() -> Self {
        Row(vec![String::new(); COLUMN_COUNT])
    }

    fn set(&mut self, col: Column, value: impl ToString) {
        self.0[col as usize] = value.to_string();
    }
}

fn header_rows(native_code: &str) -> [Vec<String>; 3] {
    let mut sections = Vec::with_capacity(COLUMN_COUNT);
    let mut titles = Vec::with_capacity(COLUMN_COUNT);
    let mut units = Vec::with_capacity(COLUMN_COUNT);
    for (section, columns) in SECTIONS {
        for (i, col) in columns.iter().enumerate() {
            sections.push(if i == 0 { section.to_string() } else { String::new() });
            titles.push(col.title().to_string());
            units.push(match col.unit() {
                Unit::None => String::new(),
                Unit::Qty => "Qty".to_string(),
                Unit::VendorCurrency => "(VC)".to_string(),
                Unit::Native => native_code.to_string(),
            });
        }
    }
    [sections, titles, units]
}

impl<P: SourcingProvider + ?Sized> CompositeOrder<'_, P> {
    /// Write the sourcing report to `path`, returning the number of data rows
    pub fn dump_to_file(&self, path: &Path, include_others: bool) -> Result<usize, SourcingError> {
        let file = File::create(path)?;
        let rows = self.write_report(file, include_others)?;
        info!(path = %path.display(), rows, "Wrote sourcing report");
        Ok(rows)
    }

    /// Write the sourcing report to any writer, returning the number of data rows
    pub fn write_report<W: Write>(&self, writer: W, include_others: bool) -> Result<usize, SourcingError> {
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        for header in header_rows(&self.provider().native_currency().code) {
            wtr.write_record(&header)?;
        }

        let mut rows = 0;
        for line in self.lines() {
            let mut row = Row::new();
            row.set(Column::Ident, line.ident());
            if self.provider().is_known_ident(line.ident()) {
                row.set(Column::Mapped, "YES");
            }
            row.set(Column::Required, line.required_qty());
            row.set(Column::Reserved, line.reserved_qty());
            row.set(Column::Shortage, line.shortage());
            row.set(Column::BuyQty, line.compliant_qty());

            let record = match line.selected_source() {
                Some(source) => {
                    self.render_source(&mut row, line, source, line.shortage())?;
                    let mut record = row.0;
                    record.push(SELECTED_MARKER.to_string());
                    record
                }
                None => row.0,
            };
            wtr.write_record(&record)?;
            rows += 1;

            if include_others {
                for source in line.other_sources() {
                    let mut row = Row::new();
                    self.render_source(&mut row, line, source, source.order_qty)?;
                    wtr.write_record(&row.0)?;
                    rows += 1;
                }
            }
        }
        wtr.flush()?;
        Ok(rows)
    }

    fn render_source(
        &self,
        row: &mut Row,
        line: &OrderLine,
        source: &SourceInfo,
        base_req: u32,
    ) -> Result<(), SourcingError> {
        let vendor = self
            .provider()
            .vendor(&source.vendor)
            .ok_or_else(|| SourcingError::UnknownVendor {
                vendor: source.vendor.clone(),
                ident: line.ident().to_string(),
            })?;

        row.set(Column::Vendor, &source.vendor);
        row.set(Column::VendorPartNo, &source.vpno);
        if let Some(part) = vendor.part(&source.vpno) {
            row.set(Column::Manufacturer, part.manufacturer.as_deref().unwrap_or_default());
            row.set(Column::ManufacturerPartNo, part.mpn.as_deref().unwrap_or_default());
            row.set(Column::Description, part.description.as_deref().unwrap_or_default());
        }
        row.set(Column::VendorCurrency, &vendor.currency.symbol);

        let oqty = source.order_qty;
        let excess_qty = i64::from(oqty) - i64::from(base_req);
        row.set(Column::OrderQty, oqty);
        row.set(Column::ExcessQty, excess_qty);

        if let Some(next) = &source.next_break {
            let unit = next.unit_price().source_value();
            row.set(Column::NextBreakQty, next.moq());
            row.set(Column::NextBreakUnitPrice, format!("{:.4}", unit));
            row.set(Column::NextBreakExtendedPrice, format!("{:.4}", unit * next.moq() as f64));
        }

        let used = &source.used_break;
        let used_unit = used.unit_price().source_value();
        row.set(Column::UsedBreakQty, used.moq());
        row.set(Column::UsedBreakUnitPrice, format!("{:.4}", used_unit));
        row.set(Column::UsedBreakExtendedPrice, format!("{:.4}", used_unit * oqty as f64));
        row.set(Column::UnitPrice, format!("{:.2}", used.unit_price().native_value()));

        let effective_unit = source.effective_unit_native();
        row.set(Column::EffectiveUnitPrice, format!("{:.2}", effective_unit));
        row.set(
            Column::EffectiveExtendedPrice,
            format!("{:.2}", source.effective_extended_native()),
        );
        row.set(
            Column::EffectiveExcessPrice,
            format!("{:.2}", excess_qty as f64 * effective_unit),
        );

        if let Some(lower) = &source.lower_break {
            row.set(
                Column::LowerBreakUnitPrice,
                format!("{:.2}", lower.unit_price().native_value()),
            );
        }
        if let Some(rationale) = &source.excess_rationale {
            row.set(Column::ExcessRationale, rationale);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::CurrencyDefinition;
    use crate::entities::vendor::{Vendor, VendorPart};
    use crate::sourcing::order::tests::vendor_with;
    use crate::sourcing::provider::Catalog;
    use tempfile::tempdir;

    fn catalog() -> Catalog {
        let mut part = VendorPart::new("RES SMD 10K 0603", "RC0603-10K")
            .with_price(1, 0.10)
            .with_price(10, 0.08)
            .with_price(100, 0.01);
        part.manufacturer = Some("Yageo".to_string());
        part.mpn = Some("RC0603FR-0710KL".to_string());
        Catalog::new(vec![
            Vendor::new("acme", CurrencyDefinition::new("USD", "US$").with_exchange_rate(2.0)).with_part(part),
            vendor_with("bolt", 0.0, &[("RES SMD 10K 0603", 0.5), ("IC NE555 DIP8", 0.3)]),
            vendor_with("cobalt", 0.0, &[("RES SMD 10K 0603", 0.6), ("IC NE555 DIP8", 0.4)]),
        ])
        .unwrap()
        .with_native_currency(CurrencyDefinition::new("INR", "₹"))
    }

    fn read_rows(bytes: &[u8]) -> Vec<csv::StringRecord> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes)
            .records()
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn test_columns_follow_section_order() {
        let flat: Vec<Column> = SECTIONS.iter().flat_map(|(_, cols)| cols.iter().copied()).collect();
        assert_eq!(flat.len(), COLUMN_COUNT);
        for (idx, col) in flat.iter().enumerate() {
            assert_eq!(*col as usize, idx, "{} out of place", col.title());
        }
    }

    #[test]
    fn test_row_count_with_and_without_others() {
        let catalog = catalog();
        let mut order = CompositeOrder::new(&catalog);
        order.add("RES SMD 10K 0603", 60, 60, None);
        order.add("IC NE555 DIP8", 5, 5, None);
        order.add("IC LM358 SOIC8", 5, 5, None);

        let alternatives: usize = order.lines().iter().map(|l| l.other_sources().len()).sum();
        assert_eq!(alternatives, 3);

        let mut with_others = Vec::new();
        let rows = order.write_report(&mut with_others, true).unwrap();
        assert_eq!(rows, 3 + alternatives);
        assert_eq!(read_rows(&with_others).len(), 3 + rows);

        let mut lines_only = Vec::new();
        let rows = order.write_report(&mut lines_only, false).unwrap();
        assert_eq!(rows, 3);
        assert_eq!(read_rows(&lines_only).len(), 6);
    }

    #[test]
    fn test_header_rows() {
        let catalog = catalog();
        let order = CompositeOrder::new(&catalog);
        let mut out = Vec::new();
        order.write_report(&mut out, true).unwrap();

        let rows = read_rows(&out);
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[0][0], "Component Details");
        assert_eq!(&rows[0][1], "");
        assert_eq!(&rows[0][2], "Requirement");
        assert_eq!(&rows[1][Column::EffectiveUnitPrice as usize], "Effective Unit Price");
        assert_eq!(&rows[2][Column::EffectiveUnitPrice as usize], "INR");
        assert_eq!(&rows[2][Column::UsedBreakUnitPrice as usize], "(VC)");
        assert_eq!(&rows[2][Column::OrderQty as usize], "Qty");
    }

    #[test]
    fn test_selected_row_content() {
        let catalog = catalog();
        let mut order = CompositeOrder::new(&catalog);
        // 60 @ 0.08 = 4.80 bumps to 100 @ 0.01 = 1.00
        order.add("RES SMD 10K 0603", 80, 60, None);

        let mut out = Vec::new();
        order.write_report(&mut out, false).unwrap();
        let rows = read_rows(&out);
        let row = &rows[3];

        assert_eq!(row.len(), COLUMN_COUNT + 1);
        assert_eq!(&row[COLUMN_COUNT], SELECTED_MARKER);
        assert_eq!(&row[Column::Mapped as usize], "YES");
        assert_eq!(&row[Column::Reserved as usize], "20");
        assert_eq!(&row[Column::Vendor as usize], "acme");
        assert_eq!(&row[Column::Manufacturer as usize], "Yageo");
        assert_eq!(&row[Column::VendorCurrency as usize], "US$");
        assert_eq!(&row[Column::OrderQty as usize], "100");
        assert_eq!(&row[Column::ExcessQty as usize], "40");
        assert_eq!(&row[Column::UsedBreakUnitPrice as usize], "0.0100");
        assert_eq!(&row[Column::UnitPrice as usize], "0.02");
        assert_eq!(&row[Column::LowerBreakUnitPrice as usize], "0.16");
        assert_eq!(&row[Column::EffectiveExtendedPrice as usize], "2.00");
        assert_eq!(&row[Column::ExcessRationale as usize], "TC Increase < 40%");
    }

    #[test]
    fn test_unsourceable_row_has_no_source_columns() {
        let catalog = catalog();
        let mut order = CompositeOrder::new(&catalog);
        order.add("IC LM358 SOIC8", 5, 5, None);

        let mut out = Vec::new();
        order.write_report(&mut out, true).unwrap();
        let rows = read_rows(&out);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3].len(), COLUMN_COUNT);
        assert_eq!(&rows[3][Column::Mapped as usize], "");
        assert_eq!(&rows[3][Column::Vendor as usize], "");
    }

    #[test]
    fn test_dump_to_file() {
        let tmp = tempdir().unwrap();
        let catalog = catalog();
        let mut order = CompositeOrder::new(&catalog);
        order.add("IC NE555 DIP8", 5, 5, None);

        let path = tmp.path().join("report.csv");
        let rows = order.dump_to_file(&path, true).unwrap();
        assert_eq!(rows, 2);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 5);
    }
}

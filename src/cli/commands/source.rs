//! `tsrc source` command - Price a requirement list

use console::style;
use miette::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::helpers::{truncate_str, Workspace};
use crate::cli::output::{effective_format, money, print_rows, print_serialized};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::sourcing::{Catalog, CompositeOrder, OrderLine, RebalanceOutcome, SourcingProvider};

#[derive(clap::Args, Debug)]
pub struct SourceArgs {
    /// Requirements CSV (ident,required,shortage)
    pub requirements: PathBuf,

    /// Consolidate lines onto fewer vendors
    #[arg(long, short = 'r')]
    pub rebalance: bool,

    /// Write the full sourcing report to this CSV file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Leave alternative sources out of the report
    #[arg(long)]
    pub no_others: bool,

    /// Order reference (generated when omitted)
    #[arg(long)]
    pub order_ref: Option<String>,
}

/// One priced line, for structured output
#[derive(Debug, Serialize)]
pub struct LineSummary {
    pub ident: String,
    pub required: u32,
    pub shortage: u32,
    pub buy_qty: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpno: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_qty: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    pub alternatives: usize,
}

impl From<&OrderLine> for LineSummary {
    fn from(line: &OrderLine) -> Self {
        let source = line.selected_source();
        Self {
            ident: line.ident().to_string(),
            required: line.required_qty(),
            shortage: line.shortage(),
            buy_qty: line.compliant_qty(),
            vendor: source.map(|s| s.vendor.clone()),
            vpno: source.map(|s| s.vpno.clone()),
            order_qty: source.map(|s| s.order_qty),
            unit_price: source.map(|s| s.effective_unit_native()),
            extended_price: source.map(|s| s.effective_extended_native()),
            rationale: source.and_then(|s| s.excess_rationale.clone()),
            alternatives: line.other_sources().len(),
        }
    }
}

/// A priced order, for structured output
#[derive(Debug, Serialize)]
pub struct OrderSummary {
    pub order_ref: String,
    pub currency: String,
    pub lines: Vec<LineSummary>,
    pub vendors: Vec<String>,
    pub unsourceable: Vec<String>,
    pub total_cost: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub moved: Vec<String>,
}

impl OrderSummary {
    pub fn new(
        order: &CompositeOrder<'_, Catalog>,
        outcome: Option<&RebalanceOutcome>,
    ) -> Result<Self> {
        Ok(Self {
            order_ref: order.order_ref().unwrap_or_default().to_string(),
            currency: order.provider().native_currency().code.clone(),
            lines: order.lines().iter().map(LineSummary::from).collect(),
            vendors: order.vendors_in_use().iter().map(|v| v.to_string()).collect(),
            unsourceable: order.unsourceable().map(|l| l.ident().to_string()).collect(),
            total_cost: order.total_cost()?,
            moved: outcome
                .map(|o| {
                    o.moved
                        .iter()
                        .map(|m| format!("{}: {} -> {}", m.ident, m.from, m.to))
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

/// Run the source command
pub fn run(args: SourceArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let order_ref = ws.order_ref(args.order_ref.as_deref());
    let mut order = ws.build_order(&args.requirements, &order_ref)?;

    let outcome = if args.rebalance {
        Some(order.rebalance()?)
    } else {
        None
    };

    if let Some(path) = &args.report {
        let rows = order.dump_to_file(path, !args.no_others)?;
        eprintln!(
            "{} Wrote sourcing report ({} rows) to {}",
            style("✓").green(),
            rows,
            style(path.display()).cyan()
        );
    }

    let summary = OrderSummary::new(&order, outcome.as_ref())?;
    print_summary(&summary, global.output)
}

/// Print an order summary in the requested format
pub fn print_summary(summary: &OrderSummary, format: OutputFormat) -> Result<()> {
    let format = effective_format(format, true);
    if matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        return print_serialized(summary, format);
    }

    let headers = [
        "IDENT", "REQUIRED", "SHORTAGE", "BUY QTY", "VENDOR", "VPNO", "ORDER QTY", "UNIT", "EXTENDED", "NOTE",
    ];
    let rows: Vec<Vec<String>> = summary
        .lines
        .iter()
        .map(|l| {
            vec![
                l.ident.clone(),
                l.required.to_string(),
                l.shortage.to_string(),
                l.buy_qty.to_string(),
                l.vendor.clone().unwrap_or_else(|| "-".to_string()),
                l.vpno.as_deref().map(|v| truncate_str(v, 24)).unwrap_or_default(),
                l.order_qty.map(|q| q.to_string()).unwrap_or_default(),
                l.unit_price.map(|p| format!("{:.4}", p)).unwrap_or_default(),
                l.extended_price.map(|p| format!("{:.2}", p)).unwrap_or_default(),
                l.rationale.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_rows(&headers, &rows, format)?;

    if format == OutputFormat::Table {
        println!();
        println!("{}: {}", style("Order").bold(), summary.order_ref);
        println!(
            "{}: {}",
            style("Vendors").bold(),
            style(summary.vendors.join(", ")).yellow()
        );
        println!(
            "{}: {}",
            style("Total").bold(),
            style(money(&format!("{} ", summary.currency), summary.total_cost)).cyan()
        );
        if !summary.unsourceable.is_empty() {
            println!(
                "{} {} unsourceable: {}",
                style("!").red(),
                summary.unsourceable.len(),
                summary.unsourceable.join(", ")
            );
        }
        for moved in &summary.moved {
            println!("{} {}", style("→").dim(), moved);
        }
    }
    Ok(())
}

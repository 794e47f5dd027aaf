//! `tsrc order` command - Generate vendor orders for a requirement list

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::commands::source::{print_summary, OrderSummary};
use crate::cli::helpers::{ensure_dir, Workspace};
use crate::cli::{GlobalOpts, OutputFormat};

/// File name of the sourcing report written next to the orders
pub const REPORT_FILE: &str = "sourcing-report.csv";

#[derive(clap::Args, Debug)]
pub struct OrderArgs {
    /// Requirements CSV (ident,required,shortage)
    pub requirements: PathBuf,

    /// Directory for the order files
    #[arg(long, short = 'd', default_value = "orders")]
    pub out: PathBuf,

    /// Keep the cheapest vendor for every line instead of consolidating
    #[arg(long)]
    pub no_rebalance: bool,

    /// Order reference (generated when omitted)
    #[arg(long)]
    pub order_ref: Option<String>,
}

/// Run the order command
pub fn run(args: OrderArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let order_ref = ws.order_ref(args.order_ref.as_deref());
    let mut order = ws.build_order(&args.requirements, &order_ref)?;

    let outcome = if args.no_rebalance {
        None
    } else {
        Some(order.rebalance()?)
    };

    ensure_dir(&args.out)?;
    order.dump_to_file(&args.out.join(REPORT_FILE), true)?;
    let written = order.generate_orders(&args.out)?;

    let summary = OrderSummary::new(&order, outcome.as_ref())?;
    match global.output {
        OutputFormat::Json | OutputFormat::Yaml => print_summary(&summary, global.output)?,
        _ => {
            println!(
                "{} Order {} written to {}",
                style("✓").green(),
                style(&order_ref).cyan(),
                style(args.out.display()).yellow()
            );
            for path in &written {
                println!("   {}", path.display());
            }
            println!("   {}", args.out.join(REPORT_FILE).display());
            if !summary.unsourceable.is_empty() {
                println!(
                    "{} {} unsourceable: {}",
                    style("!").red(),
                    summary.unsourceable.len(),
                    summary.unsourceable.join(", ")
                );
            }
        }
    }
    Ok(())
}

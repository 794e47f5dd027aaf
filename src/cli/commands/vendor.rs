//! `tsrc vendor` command - Vendor price lists

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{truncate_str, Workspace};
use crate::cli::output::{effective_format, money, print_rows, print_serialized};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::vendor::Vendor;
use crate::sourcing::SourcingProvider;

#[derive(Subcommand, Debug)]
pub enum VendorCommands {
    /// List vendors in the project
    List(ListArgs),

    /// Show a vendor's details and parts
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only list vendors carrying this ident
    #[arg(long, short = 'i')]
    pub ident: Option<String>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Vendor name
    pub name: String,
}

/// Run a vendor subcommand
pub fn run(cmd: VendorCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        VendorCommands::List(args) => run_list(args, global),
        VendorCommands::Show(args) => run_show(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let allowed: Vec<&str> = ws.catalog.vendors().iter().map(|v| v.name.as_str()).collect();
    let vendors: Vec<&Vendor> = ws
        .catalog
        .all_vendors()
        .iter()
        .filter(|v| args.ident.as_deref().is_none_or(|ident| v.carries(ident)))
        .collect();

    if args.count {
        println!("{}", vendors.len());
        return Ok(());
    }

    if vendors.is_empty() {
        println!("No vendors found.");
        return Ok(());
    }

    let format = effective_format(global.output, true);
    if matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        return print_serialized(&vendors, format);
    }

    let native = &ws.config.native_currency;
    let headers = ["NAME", "DISPLAY NAME", "STATUS", "CURRENCY", "PARTS", "BASE COST", "ALLOWED"];
    let rows: Vec<Vec<String>> = vendors
        .iter()
        .map(|v| {
            vec![
                v.name.clone(),
                truncate_str(v.display_name(), 30),
                v.status.to_string(),
                v.currency.code.clone(),
                v.parts.len().to_string(),
                money(&native.symbol, v.order_base_cost()),
                if allowed.contains(&v.name.as_str()) { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    print_rows(&headers, &rows, format)
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let vendor = ws
        .catalog
        .vendor(&args.name)
        .ok_or_else(|| miette::miette!("No vendor found matching '{}'", args.name))?;

    match global.output {
        OutputFormat::Json | OutputFormat::Yaml => print_serialized(vendor, global.output),
        OutputFormat::Csv | OutputFormat::Tsv => print_rows(&PART_HEADERS, &part_rows(vendor), global.output),
        OutputFormat::Auto | OutputFormat::Table => {
            let native = &ws.config.native_currency;
            println!("{}", style("─".repeat(60)).dim());
            println!("{}: {}", style("Vendor").bold(), style(&vendor.name).cyan());
            println!("{}: {}", style("Name").bold(), style(vendor.display_name()).yellow());
            println!("{}: {}", style("Status").bold(), vendor.status);
            println!(
                "{}: {} ({}, {} {} per unit)",
                style("Currency").bold(),
                vendor.currency.code,
                vendor.currency.symbol,
                vendor.currency.exchange_rate,
                native.code
            );
            if !vendor.base_costs.is_empty() {
                println!("{}", style("Base Costs:").bold());
                for cost in &vendor.base_costs {
                    println!(
                        "  • {}: {}",
                        cost.description,
                        money(&native.symbol, vendor.base_cost_native(cost))
                    );
                }
            }
            if !vendor.additional_costs.is_empty() {
                println!("{}", style("Additional Costs:").bold());
                for cost in &vendor.additional_costs {
                    println!("  • {}: {}%", cost.description, cost.percent);
                }
            }
            if let Some(notes) = &vendor.notes {
                println!("{}: {}", style("Notes").bold(), notes);
            }
            println!("{}", style("─".repeat(60)).dim());
            if vendor.parts.is_empty() {
                println!("No parts listed.");
                Ok(())
            } else {
                print_rows(&PART_HEADERS, &part_rows(vendor), OutputFormat::Table)
            }
        }
    }
}

const PART_HEADERS: [&str; 5] = ["IDENT", "VPNO", "MANUFACTURER", "STOCK", "BREAKS"];

fn part_rows(vendor: &Vendor) -> Vec<Vec<String>> {
    vendor
        .parts
        .iter()
        .map(|p| {
            let breaks: Vec<String> = p
                .prices
                .iter()
                .map(|b| format!("{}@{}", b.unit_price, b.moq))
                .collect();
            let stock = match (p.stock, p.stock_confirmed) {
                (Some(s), true) => s.to_string(),
                (Some(s), false) => format!("{}?", s),
                (None, _) => "-".to_string(),
            };
            vec![
                p.ident.clone(),
                p.vpno.clone(),
                p.manufacturer.clone().unwrap_or_default(),
                stock,
                breaks.join(" "),
            ]
        })
        .collect()
}

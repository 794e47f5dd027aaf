//! `tsrc customs` command - Duty assessment for a vendor invoice

use console::style;
use miette::Result;
use std::path::PathBuf;
use tracing::debug;

use crate::cli::helpers::{open_project, truncate_str};
use crate::cli::output::{money, print_rows, print_serialized};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{assess, Config, InvoiceAssessment};
use crate::entities::customs::{CustomsInvoice, HsClassifier};

#[derive(clap::Args, Debug)]
pub struct CustomsArgs {
    /// Customs invoice YAML
    pub invoice: PathBuf,

    /// HS code table (defaults to the project's customs/hs_codes.yaml)
    #[arg(long)]
    pub hs_codes: Option<PathBuf>,
}

/// Run the customs command
pub fn run(args: CustomsArgs, global: &GlobalOpts) -> Result<()> {
    let hs_codes = match args.hs_codes {
        Some(path) => path,
        None => {
            let project = open_project(global)?;
            let config = Config::load(Some(&project))?;
            config.hs_codes_path(&project)
        }
    };
    debug!(path = %hs_codes.display(), "Loading HS codes");

    let classifier = HsClassifier::load(&hs_codes)?;
    let invoice = CustomsInvoice::load(&args.invoice)?;
    let assessment = assess(&invoice, &classifier);

    match global.output {
        OutputFormat::Json | OutputFormat::Yaml => print_serialized(&assessment, global.output),
        OutputFormat::Table | OutputFormat::Csv | OutputFormat::Tsv => {
            print_rows(&LINE_HEADERS, &line_rows(&assessment), global.output)
        }
        OutputFormat::Auto => {
            print_assessment(&assessment);
            Ok(())
        }
    }
}

const LINE_HEADERS: [&str; 9] = [
    "IDX", "IDENT", "VPNO", "QTY", "HS CODE", "FOB", "CIF", "ASSESSABLE", "DUTY",
];

fn line_rows(assessment: &InvoiceAssessment) -> Vec<Vec<String>> {
    assessment
        .lines
        .iter()
        .map(|l| {
            vec![
                l.idx.to_string(),
                truncate_str(&l.ident, 32),
                l.vpno.clone(),
                l.qty.to_string(),
                l.hs_code.clone().unwrap_or_else(|| "-".to_string()),
                format!("{:.2}", l.fob),
                format!("{:.2}", l.cif),
                format!("{:.2}", l.assessable),
                format!("{:.2}", l.duty_payable),
            ]
        })
        .collect()
}

fn print_assessment(a: &InvoiceAssessment) {
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{}: {} {}",
        style("Invoice").bold(),
        style(&a.invoice_no).cyan(),
        a.invoice_date.as_deref().unwrap_or("")
    );
    println!("{}: {}", style("Vendor").bold(), style(&a.vendor).yellow());
    println!(
        "{}: {} @ {}",
        style("Currency").bold(),
        a.currency,
        a.exchange_rate
    );
    println!("{}", style("─".repeat(60)).dim());

    println!("{:<12} {:>16}", "FOB", money("", a.fob_total));
    println!("{:<12} {:>16}", "Freight", money("", a.freight));
    println!("{:<12} {:>16}", "Insurance", money("", a.insurance));
    println!("{:<12} {:>16}", "CIF", money("", a.cif));
    println!("{:<12} {:>16}", "Handling", money("", a.handling));
    println!(
        "{:<12} {:>16}",
        style("Assessable").bold(),
        money("", a.assessable_total)
    );

    if !a.sections.is_empty() {
        println!();
        println!("{}", style("Sections:").bold());
        for s in &a.sections {
            let idxs: Vec<String> = s.idxs.iter().map(|i| i.to_string()).collect();
            println!(
                "  • {} {} - {} units, {} (lines {})",
                style(&s.code).cyan(),
                s.name,
                s.qty,
                money("", s.assessable),
                idxs.join(", ")
            );
        }
    }

    println!();
    println!("{}", style("Duties:").bold());
    for d in &a.duties {
        println!("  {:<10} {:>16}", d.title, money("", d.value));
    }
    println!(
        "  {:<10} {:>16}",
        style("Total").bold(),
        style(money("", a.duty_payable)).green()
    );
    println!(
        "  {:.2}% of CIF, {:.2}% of FOB",
        a.effective_rate_cif, a.effective_rate_fob
    );

    if !a.unclassified.is_empty() {
        let idxs: Vec<String> = a.unclassified.iter().map(|i| i.to_string()).collect();
        println!();
        println!(
            "{} Unclassified lines (no duty assessed): {}",
            style("!").red(),
            idxs.join(", ")
        );
    }
    println!("{}", style("─".repeat(60)).dim());
}

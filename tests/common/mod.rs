//! Shared test helpers for integration tests
//!
//! This module provides common utilities used across all test files.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to get a tsrc command
pub fn tsrc() -> Command {
    Command::new(cargo::cargo_bin!("tsrc"))
}

/// Helper to create an empty project in a temp directory
pub fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    tsrc().current_dir(tmp.path()).arg("init").assert().success();
    tmp
}

/// acme: only source for the resistor, dearer timer, 5.00 shipping
pub const ACME_YAML: &str = r#"
name: acme
display_name: ACME Components
currency:
  code: USD
  symbol: $
base_costs:
  - description: Shipping
    amount: 5
parts:
  - ident: RES SMD 10K 0603
    vpno: RC0603-10K
    prices:
      - moq: 1
        unit_price: 0.10
  - ident: IC NE555 DIP8
    vpno: NE555P
    prices:
      - moq: 1
        unit_price: 0.50
"#;

/// bolt: cheaper timer, 2.00 shipping
pub const BOLT_YAML: &str = r#"
name: bolt
currency:
  code: USD
  symbol: $
base_costs:
  - description: Courier
    amount: 2
parts:
  - ident: IC NE555 DIP8
    vpno: BOLT-555
    prices:
      - moq: 1
        unit_price: 0.40
"#;

pub const REQUIREMENTS_CSV: &str = "\
ident,required,shortage
RES SMD 10K 0603,10,10
IC NE555 DIP8,4,4
UNOBTAINIUM 1,1,
";

pub const HS_CODES_YAML: &str = r#"
sections:
  "85423900":
    name: Integrated Circuits
    devices: [IC]
    duties:
      bcd:
        rate: 10
  "85332119":
    name: Resistors
    devices: [RES SMD]
"#;

pub const INVOICE_YAML: &str = r#"
vendor: acme
invoice_no: INV-1001
invoice_date: 2024-03-05
currency:
  code: USD
  symbol: $
  exchange_rate: 2
lines:
  - ident: IC NE555 DIP8
    vpno: NE555P
    unit_price: 0.5
    qty: 100
  - ident: WIDGET GREEN
    unit_price: 1
    qty: 10
"#;

/// Helper to create a project with two vendors and a requirement list
pub fn setup_sourcing_project() -> TempDir {
    let tmp = setup_test_project();
    fs::write(tmp.path().join("vendors/acme.yaml"), ACME_YAML).unwrap();
    fs::write(tmp.path().join("vendors/bolt.yaml"), BOLT_YAML).unwrap();
    fs::write(tmp.path().join("requirements.csv"), REQUIREMENTS_CSV).unwrap();
    tmp
}

/// Helper to write the customs fixtures into a project
pub fn write_customs_fixtures(tmp: &TempDir) -> PathBuf {
    fs::write(tmp.path().join("customs/hs_codes.yaml"), HS_CODES_YAML).unwrap();
    let invoice = tmp.path().join("customs/inv-1001.yaml");
    fs::write(&invoice, INVOICE_YAML).unwrap();
    invoice
}

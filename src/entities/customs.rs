//! Customs entity types - HS tariff sections and vendor customs invoices

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use thiserror::Error;

use crate::core::currency::CurrencyDefinition;
use crate::yaml::{parse_yaml_file, YamlError};

/// Errors from customs data
#[derive(Debug, Error, miette::Diagnostic)]
pub enum CustomsError {
    #[error("Invoice line index {0} is used more than once")]
    DuplicateLine(u32),

    #[error("Invoice {0} has no lines")]
    #[diagnostic(help("List the invoice lines under `lines:`"))]
    EmptyInvoice(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),
}

/// Kinds of import duty, in the order they are levied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyKind {
    /// Basic customs duty
    Bcd,
    /// Countervailing duty
    Cvd,
    /// Education cess on CVD
    Cvdec,
    /// Secondary and higher education cess on CVD
    Cvdshec,
    /// Education cess on customs duties
    Cec,
    /// Secondary and higher education cess on customs duties
    Cshec,
    /// Additional countervailing duty (special additional duty)
    Acvd,
}

impl DutyKind {
    pub const ALL: [DutyKind; 7] = [
        DutyKind::Bcd,
        DutyKind::Cvd,
        DutyKind::Cvdec,
        DutyKind::Cvdshec,
        DutyKind::Cec,
        DutyKind::Cshec,
        DutyKind::Acvd,
    ];

    pub fn title(self) -> &'static str {
        match self {
            DutyKind::Bcd => "BCD",
            DutyKind::Cvd => "CVD",
            DutyKind::Cvdec => "CVD EC",
            DutyKind::Cvdshec => "CVD SHEC",
            DutyKind::Cec => "C EC",
            DutyKind::Cshec => "C SHEC",
            DutyKind::Acvd => "SAD",
        }
    }
}

impl std::fmt::Display for DutyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// A duty rate in percent and the notification that sets it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DutyRate {
    #[serde(default)]
    pub rate: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<String>,
}

/// Duty rates of one tariff section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Duties {
    pub bcd: DutyRate,
    pub cvd: DutyRate,
    pub acvd: DutyRate,
    pub cec: DutyRate,
    pub cshec: DutyRate,
    pub cvdec: DutyRate,
    pub cvdshec: DutyRate,
}

impl Duties {
    pub fn rate(&self, kind: DutyKind) -> &DutyRate {
        match kind {
            DutyKind::Bcd => &self.bcd,
            DutyKind::Cvd => &self.cvd,
            DutyKind::Cvdec => &self.cvdec,
            DutyKind::Cvdshec => &self.cvdshec,
            DutyKind::Cec => &self.cec,
            DutyKind::Cshec => &self.cshec,
            DutyKind::Acvd => &self.acvd,
        }
    }
}

/// An HS tariff section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HsSection {
    /// HS code; filled from the section key
    #[serde(skip)]
    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,

    /// Ident substrings that put a part in this section
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub idents: Vec<String>,

    /// Device classes (leading ident words) that put a part in this section
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<String>,

    #[serde(default)]
    pub duties: Duties,
}

impl HsSection {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.code)
    }
}

#[derive(Debug, Deserialize)]
struct HsCodesFile {
    #[serde(default)]
    sections: BTreeMap<String, HsSection>,
}

/// Classifies idents into HS sections
#[derive(Debug, Clone, Default)]
pub struct HsClassifier {
    sections: Vec<HsSection>,
}

impl HsClassifier {
    pub fn new(sections: Vec<HsSection>) -> Self {
        Self { sections }
    }

    /// Load `hs_codes.yaml`; sections are kept in code order
    pub fn load(path: &Path) -> Result<Self, CustomsError> {
        let file: HsCodesFile = parse_yaml_file(path)?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: HsCodesFile) -> Self {
        let sections = file
            .sections
            .into_iter()
            .map(|(code, mut section)| {
                section.code = code;
                section
            })
            .collect();
        Self { sections }
    }

    pub fn sections(&self) -> &[HsSection] {
        &self.sections
    }

    /// Section for an ident
    ///
    /// Ident signatures are tried first, in section order. Otherwise the
    /// longest matching device class wins.
    pub fn classify(&self, ident: &str) -> Option<&HsSection> {
        if let Some(section) = self
            .sections
            .iter()
            .find(|s| s.idents.iter().any(|sign| ident.contains(sign.as_str())))
        {
            return Some(section);
        }

        self.sections
            .iter()
            .flat_map(|s| s.devices.iter().map(move |d| (d, s)))
            .filter(|(device, _)| {
                ident
                    .strip_prefix(device.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
            })
            .fold(None, |best: Option<(&String, &HsSection)>, (device, section)| match best {
                Some((d, _)) if d.len() >= device.len() => best,
                _ => Some((device, section)),
            })
            .map(|(_, section)| section)
    }
}

/// How freight appears on an invoice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreightMode {
    /// No freight charged
    #[default]
    None,
    /// Freight is included in the invoice total
    Included,
    /// Freight is listed separately on the invoice
    Listed,
}

impl std::fmt::Display for FreightMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FreightMode::None => write!(f, "none"),
            FreightMode::Included => write!(f, "included"),
            FreightMode::Listed => write!(f, "listed"),
        }
    }
}

/// Freight charges, in the invoice currency
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Freight {
    #[serde(default)]
    pub mode: FreightMode,

    #[serde(default)]
    pub amount: f64,
}

impl Freight {
    /// Freight counted toward the assessable value
    pub fn chargeable(&self) -> f64 {
        match self.mode {
            FreightMode::None => 0.0,
            FreightMode::Included | FreightMode::Listed => self.amount,
        }
    }
}

/// One line of a customs invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Line number on the invoice; assigned when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idx: Option<u32>,

    pub ident: String,

    #[serde(default)]
    pub vpno: String,

    /// Unit price in the invoice currency
    pub unit_price: f64,

    pub qty: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

/// A vendor invoice presented for customs assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomsInvoice {
    pub vendor: String,

    pub invoice_no: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_date: Option<NaiveDate>,

    /// Invoice currency and the exchange rate applied by customs
    #[serde(default)]
    pub currency: CurrencyDefinition,

    #[serde(default)]
    pub freight: Freight,

    #[serde(default)]
    pub insurance_pc: f64,

    #[serde(default)]
    pub handling_pc: f64,

    #[serde(default)]
    pub lines: Vec<InvoiceLine>,
}

impl CustomsInvoice {
    /// Load and validate an invoice
    pub fn load(path: &Path) -> Result<Self, CustomsError> {
        let mut invoice: Self = parse_yaml_file(path)?;
        invoice.number_lines()?;
        Ok(invoice)
    }

    /// Check line indices are unique and give unnumbered lines the next free one
    pub fn number_lines(&mut self) -> Result<(), CustomsError> {
        if self.lines.is_empty() {
            return Err(CustomsError::EmptyInvoice(self.invoice_no.clone()));
        }
        let mut seen = HashSet::new();
        for idx in self.lines.iter().filter_map(|l| l.idx) {
            if !seen.insert(idx) {
                return Err(CustomsError::DuplicateLine(idx));
            }
        }
        let mut next = seen.iter().max().copied().unwrap_or(0) + 1;
        for line in self.lines.iter_mut().filter(|l| l.idx.is_none()) {
            line.idx = Some(next);
            next += 1;
        }
        Ok(())
    }
}

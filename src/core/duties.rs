//! Import duty assessment for customs invoices
//!
//! All values are in the native currency. For each invoice line:
//!
//! ```text
//! fob        = unit price x qty x exchange rate
//! freight    = invoice freight x (line fob / invoice fob)
//! insurance  = fob x insurance %
//! cif        = fob + freight + insurance
//! handling   = cif x handling %
//! assessable = cif + handling
//! ```
//!
//! Duties are levied on the assessable value in order: BCD on the assessable
//! value, CVD on assessable + BCD, the CVD cesses on CVD, the customs cesses
//! on BCD + CVD + CVD cesses, and SAD on the assessable value plus every
//! other duty.

use serde::Serialize;
use tracing::warn;

use crate::entities::customs::{CustomsInvoice, DutyKind, HsClassifier, HsSection};

/// One duty levied on a line or an invoice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DutyComponent {
    pub kind: DutyKind,
    pub title: &'static str,
    /// Rate in percent; absent on invoice totals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<String>,
    pub value: f64,
}

/// Assessment of one invoice line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineAssessment {
    pub idx: u32,
    pub ident: String,
    pub vpno: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    pub qty: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hs_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hs_name: Option<String>,
    pub fob: f64,
    pub freight: f64,
    pub insurance: f64,
    pub cif: f64,
    pub handling: f64,
    pub assessable: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duties: Vec<DutyComponent>,
    pub duty_payable: f64,
}

impl LineAssessment {
    pub fn is_classified(&self) -> bool {
        self.hs_code.is_some()
    }

    pub fn duty(&self, kind: DutyKind) -> f64 {
        self.duties
            .iter()
            .find(|d| d.kind == kind)
            .map_or(0.0, |d| d.value)
    }
}

/// Lines grouped under one HS section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionSummary {
    pub code: String,
    pub name: String,
    pub idxs: Vec<u32>,
    pub qty: u32,
    pub assessable: f64,
}

/// Assessment of a whole invoice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceAssessment {
    pub vendor: String,
    pub invoice_no: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_date: Option<String>,
    pub currency: String,
    pub exchange_rate: f64,
    pub fob_total: f64,
    pub freight: f64,
    pub insurance: f64,
    pub cif: f64,
    pub handling: f64,
    pub assessable_total: f64,
    pub lines: Vec<LineAssessment>,
    /// Sections in code order
    pub sections: Vec<SectionSummary>,
    /// Lines that matched no section and carry no duty
    pub unclassified: Vec<u32>,
    pub duties: Vec<DutyComponent>,
    pub duty_payable: f64,
    /// Duty payable as a percentage of the assessable total
    pub effective_rate_cif: f64,
    /// Duty payable as a percentage of the FOB total
    pub effective_rate_fob: f64,
}

fn percent_of(value: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        value / total * 100.0
    }
}

/// Duties on an assessable value under a section's rates, in levy order
fn levy(section: &HsSection, assessable: f64) -> Vec<DutyComponent> {
    let rate = |kind: DutyKind| section.duties.rate(kind).rate / 100.0;

    let bcd = assessable * rate(DutyKind::Bcd);
    let cvd = (assessable + bcd) * rate(DutyKind::Cvd);
    let cvdec = cvd * rate(DutyKind::Cvdec);
    let cvdshec = cvd * rate(DutyKind::Cvdshec);
    let cess_base = bcd + cvd + cvdec + cvdshec;
    let cec = cess_base * rate(DutyKind::Cec);
    let cshec = cess_base * rate(DutyKind::Cshec);
    let acvd = (assessable + bcd + cvd + cec + cshec + cvdec + cvdshec) * rate(DutyKind::Acvd);

    [
        (DutyKind::Bcd, bcd),
        (DutyKind::Cvd, cvd),
        (DutyKind::Cvdec, cvdec),
        (DutyKind::Cvdshec, cvdshec),
        (DutyKind::Cec, cec),
        (DutyKind::Cshec, cshec),
        (DutyKind::Acvd, acvd),
    ]
    .into_iter()
    .map(|(kind, value)| {
        let r = section.duties.rate(kind);
        DutyComponent {
            kind,
            title: kind.title(),
            rate: Some(r.rate),
            notification: r.notification.clone(),
            value,
        }
    })
    .collect()
}

/// Assess an invoice whose lines have been numbered
pub fn assess(invoice: &CustomsInvoice, classifier: &HsClassifier) -> InvoiceAssessment {
    let rate = invoice.currency.exchange_rate;
    let fob_total: f64 = invoice
        .lines
        .iter()
        .map(|l| l.unit_price * l.qty as f64 * rate)
        .sum();
    let freight_total = invoice.freight.chargeable() * rate;

    let mut lines = Vec::with_capacity(invoice.lines.len());
    for (pos, line) in invoice.lines.iter().enumerate() {
        let fob = line.unit_price * line.qty as f64 * rate;
        let freight = if fob_total > 0.0 {
            freight_total * fob / fob_total
        } else {
            0.0
        };
        let insurance = fob * invoice.insurance_pc / 100.0;
        let cif = fob + freight + insurance;
        let handling = cif * invoice.handling_pc / 100.0;
        let assessable = cif + handling;

        let section = classifier.classify(&line.ident);
        if section.is_none() {
            warn!(ident = %line.ident, "Could not classify invoice line");
        }
        let duties = section.map(|s| levy(s, assessable)).unwrap_or_default();
        let duty_payable = duties.iter().map(|d| d.value).sum();

        lines.push(LineAssessment {
            idx: line.idx.unwrap_or(pos as u32 + 1),
            ident: line.ident.clone(),
            vpno: line.vpno.clone(),
            desc: line.desc.clone(),
            qty: line.qty,
            hs_code: section.map(|s| s.code.clone()),
            hs_name: section.map(|s| s.name().to_string()),
            fob,
            freight,
            insurance,
            cif,
            handling,
            assessable,
            duties,
            duty_payable,
        });
    }

    let mut sections: Vec<SectionSummary> = Vec::new();
    for line in &lines {
        let (Some(code), Some(name)) = (&line.hs_code, &line.hs_name) else {
            continue;
        };
        match sections.iter_mut().find(|s| &s.code == code) {
            Some(summary) => {
                summary.idxs.push(line.idx);
                summary.qty += line.qty;
                summary.assessable += line.assessable;
            }
            None => sections.push(SectionSummary {
                code: code.clone(),
                name: name.clone(),
                idxs: vec![line.idx],
                qty: line.qty,
                assessable: line.assessable,
            }),
        }
    }
    sections.sort_by(|a, b| a.code.cmp(&b.code));

    let duties: Vec<DutyComponent> = DutyKind::ALL
        .into_iter()
        .map(|kind| DutyComponent {
            kind,
            title: kind.title(),
            rate: None,
            notification: None,
            value: lines.iter().map(|l| l.duty(kind)).sum(),
        })
        .collect();
    let duty_payable: f64 = duties.iter().map(|d| d.value).sum();
    let assessable_total: f64 = lines.iter().map(|l| l.assessable).sum();

    InvoiceAssessment {
        vendor: invoice.vendor.clone(),
        invoice_no: invoice.invoice_no.clone(),
        invoice_date: invoice.invoice_date.map(|d| d.to_string()),
        currency: invoice.currency.code.clone(),
        exchange_rate: rate,
        fob_total,
        freight: lines.iter().map(|l| l.freight).sum(),
        insurance: lines.iter().map(|l| l.insurance).sum(),
        cif: lines.iter().map(|l| l.cif).sum(),
        handling: lines.iter().map(|l| l.handling).sum(),
        assessable_total,
        unclassified: lines
            .iter()
            .filter(|l| !l.is_classified())
            .map(|l| l.idx)
            .collect(),
        sections,
        lines,
        duties,
        duty_payable,
        effective_rate_cif: percent_of(duty_payable, assessable_total),
        effective_rate_fob: percent_of(duty_payable, fob_total),
    }
}

//! Inventory quantity guidelines - rules that turn a shortage into a buy quantity

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::yaml::{parse_yaml_file, YamlError};

/// Errors from guideline application
#[derive(Debug, Error, PartialEq)]
pub enum GuidelineError {
    #[error("Excess for {ident} exceeds the guideline maximum: {oqty} ordered for {qty} needed (max excess {max_excess})")]
    ExcessOverrun {
        ident: String,
        qty: u32,
        oqty: u32,
        max_excess: u32,
    },

    #[error("Order quantity for {ident} does not fit in a u32 ({qty} needed)")]
    QtyOverflow { ident: String, qty: u32 },
}

/// A single quantity rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QtyRule {
    /// Smallest quantity to order
    pub oqty_min: u32,

    /// Order quantities step in multiples of this above the minimum
    pub oqty_multiple: u32,

    /// Minimum excess as a percentage of the requirement
    pub excess_min_pc: f64,

    /// Minimum excess in units
    pub excess_min_qty: u32,

    /// Largest tolerated excess in units (unlimited when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excess_max_qty: Option<u32>,
}

impl Default for QtyRule {
    fn default() -> Self {
        Self {
            oqty_min: 1,
            oqty_multiple: 1,
            excess_min_pc: 0.0,
            excess_min_qty: 0,
            excess_max_qty: None,
        }
    }
}

/// Quantity guidelines, most specific rule first: ident, device, default
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QtyGuidelines {
    /// Fallback rule for everything else
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<QtyRule>,

    /// Rules keyed by device class (the leading words of an ident, e.g. "RES SMD")
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub devices: BTreeMap<String, QtyRule>,

    /// Rules for specific idents
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub idents: BTreeMap<String, QtyRule>,
}

impl QtyGuidelines {
    /// Load guidelines from a YAML file
    pub fn load(path: &Path) -> Result<Self, YamlError> {
        parse_yaml_file(path)
    }

    /// The rule that governs an ident, if any
    pub fn rule_for(&self, ident: &str) -> Option<&QtyRule> {
        if let Some(rule) = self.idents.get(ident) {
            return Some(rule);
        }

        // Longest matching device class wins
        let device_rule = self
            .devices
            .iter()
            .filter(|(device, _)| {
                ident
                    .strip_prefix(device.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
            })
            .max_by_key(|(device, _)| device.len())
            .map(|(_, rule)| rule);

        device_rule.or(self.default.as_ref())
    }

    /// Quantity to buy for a shortage of `qty`
    ///
    /// The target is the shortage plus the rule's minimum excess; the result
    /// is the first quantity at or above it on the `oqty_min + n * oqty_multiple`
    /// ladder. With `strict`, an excess above the rule's maximum is an error
    /// instead of a warning.
    pub fn compliant_qty(&self, ident: &str, qty: u32, strict: bool) -> Result<u32, GuidelineError> {
        let Some(rule) = self.rule_for(ident) else {
            return Ok(qty);
        };

        let q = qty as f64;
        let target = (q * (1.0 + rule.excess_min_pc / 100.0)).max(q + rule.excess_min_qty as f64);
        let step = u64::from(rule.oqty_multiple.max(1));
        let min = u64::from(rule.oqty_min);

        // Float to int casts saturate, so a huge target still lands above u32::MAX
        let target = target.ceil() as u64;
        let oqty = if target <= min {
            min
        } else {
            min.saturating_add((target - min).div_ceil(step).saturating_mul(step))
        };
        let oqty = u32::try_from(oqty).map_err(|_| GuidelineError::QtyOverflow {
            ident: ident.to_string(),
            qty,
        })?;

        let excess = oqty.saturating_sub(qty);
        if let Some(max_excess) = rule.excess_max_qty {
            if excess > max_excess {
                warn!(
                    ident,
                    qty, oqty, max_excess, "Excess quantity exceeds the guideline maximum"
                );
                if strict {
                    return Err(GuidelineError::ExcessOverrun {
                        ident: ident.to_string(),
                        qty,
                        oqty,
                        max_excess,
                    });
                }
            }
        }
        Ok(oqty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guidelines() -> QtyGuidelines {
        let yaml = r#"
default:
  oqty_min: 1
devices:
  RES SMD:
    oqty_min: 100
    oqty_multiple: 100
  RES SMD 1%:
    oqty_min: 50
idents:
  IC LM358 SOIC8:
    oqty_min: 5
    excess_min_pc: 10
    excess_min_qty: 2
    excess_max_qty: 3
"#;
        serde_yml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_no_guidelines_passes_qty_through() {
        let gl = QtyGuidelines::default();
        assert_eq!(gl.compliant_qty("ANY THING", 7, true), Ok(7));
    }

    #[test]
    fn test_device_rule_rounds_to_multiple() {
        let gl = guidelines();
        assert_eq!(gl.compliant_qty("RES SMD 10K 0603", 30, false), Ok(100));
        assert_eq!(gl.compliant_qty("RES SMD 10K 0603", 100, false), Ok(100));
        assert_eq!(gl.compliant_qty("RES SMD 10K 0603", 101, false), Ok(200));
    }

    #[test]
    fn test_longest_device_prefix_wins() {
        let gl = guidelines();
        assert_eq!(gl.rule_for("RES SMD 1% 10K 0603").unwrap().oqty_min, 50);
        // "RES SMDX" is not the "RES SMD" device class
        assert_eq!(gl.rule_for("RES SMDX 10K").unwrap().oqty_min, 1);
    }

    #[test]
    fn test_ident_rule_applies_excess() {
        let gl = guidelines();
        // max(10 * 1.1, 10 + 2) = 12
        assert_eq!(gl.compliant_qty("IC LM358 SOIC8", 10, false), Ok(12));
        // below the minimum
        assert_eq!(gl.compliant_qty("IC LM358 SOIC8", 1, false), Ok(5));
    }

    #[test]
    fn test_excess_overrun_strict_and_lenient() {
        let gl = guidelines();
        // 1 needed, 5 ordered: excess 4 > 3
        assert_eq!(gl.compliant_qty("IC LM358 SOIC8", 1, false), Ok(5));
        assert!(matches!(
            gl.compliant_qty("IC LM358 SOIC8", 1, true),
            Err(GuidelineError::ExcessOverrun { oqty: 5, .. })
        ));
    }

    #[test]
    fn test_zero_multiple_is_treated_as_one() {
        let mut gl = QtyGuidelines::default();
        gl.default = Some(QtyRule {
            oqty_multiple: 0,
            ..QtyRule::default()
        });
        assert_eq!(gl.compliant_qty("ANY THING", 4, false), Ok(4));
    }

    #[test]
    fn test_order_qty_beyond_u32_is_an_error() {
        let mut gl = QtyGuidelines::default();
        gl.default = Some(QtyRule {
            oqty_min: 4_000_000_000,
            excess_min_pc: 10.0,
            ..QtyRule::default()
        });
        assert_eq!(
            gl.compliant_qty("ANY THING", 4_100_000_000, false),
            Err(GuidelineError::QtyOverflow {
                ident: "ANY THING".to_string(),
                qty: 4_100_000_000,
            })
        );
        // Near the top of the range but still representable
        assert_eq!(gl.compliant_qty("ANY THING", 3_000_000_000, false), Ok(4_000_000_000));
    }

    #[test]
    fn test_large_multiple_rounds_up_in_one_step() {
        let mut gl = QtyGuidelines::default();
        gl.default = Some(QtyRule {
            oqty_min: 10,
            oqty_multiple: 1_000_000,
            ..QtyRule::default()
        });
        assert_eq!(gl.compliant_qty("ANY THING", 11, false), Ok(1_000_010));
        assert_eq!(gl.compliant_qty("ANY THING", 2_000_010, false), Ok(2_000_010));
    }
}

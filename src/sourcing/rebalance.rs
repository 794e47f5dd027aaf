//! Vendor consolidation for composite orders
//!
//! Every vendor used by an order adds its fixed base cost. Rebalancing moves
//! lines off vendors whose base cost is not paid back by their price
//! advantage, without ever adding a vendor to the order.
//!
//! The pass works on a shadow list of unresolved lines:
//!
//! 1. Unsourceable lines are dropped from the shadow list.
//! 2. Accept pass: a line is resolved when its vendor is already accepted,
//!    when it has no other source (its vendor is accepted), or when its
//!    vendor has no base cost (its vendor is accepted).
//! 3. Candidate rounds: each vendor offering an alternative for a remaining
//!    line is scored as the net saving of moving those lines onto it,
//!    counting base costs of vendors the move leaves unused and the
//!    candidate's own base cost if it is new to the order. The best positive
//!    candidate is accepted, its lines moved, and the accept pass rerun.
//! 4. Settle: every line moves to its cheapest offer among the vendors the
//!    order still uses.
//!
//! Lines still in the shadow list when no candidate pays off keep their
//! selection and are reported as unresolved. Sweeps of these steps repeat,
//! each with a fresh acceptance set, until a sweep moves nothing. Every move
//! lowers the total cost, so the sweeps end, and the order they end on is
//! left unchanged by another call.

use std::collections::HashSet;
use tracing::{debug, error, info, warn};

use crate::sourcing::error::SourcingError;
use crate::sourcing::line::OrderLine;
use crate::sourcing::order::CompositeOrder;
use crate::sourcing::provider::SourcingProvider;

/// Passes spent dropping unsourceable lines
const UNSOURCEABLE_PASSES: usize = 5;

/// Iterations of each accept pass
const ACCEPT_PASSES: usize = 10;

/// Scores at or below this are not worth a move
const SCORE_EPSILON: f64 = 1e-9;

/// Sweeps made before giving up on reaching a stable order
const MAX_SWEEPS: usize = 20;

/// A line moved to another vendor
#[derive(Debug, Clone, PartialEq)]
pub struct LineMove {
    pub ident: String,
    pub from: String,
    pub to: String,
}

/// Result of a rebalance call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RebalanceOutcome {
    /// Vendors committed to, in acceptance order
    pub accepted_vendors: Vec<String>,
    /// Lines whose selected vendor changed
    pub moved: Vec<LineMove>,
    /// Idents left without an accepted vendor
    pub unresolved: Vec<String>,
    /// Shadow-list passes made, accept iterations included
    pub passes: usize,
    /// Candidate evaluation rounds that accepted a vendor
    pub rounds: usize,
}

/// Best vendor to consolidate onto in one round
#[derive(Debug)]
struct Candidate {
    vendor: String,
    score: f64,
    /// Shadow line indices that move onto the vendor
    lines: Vec<usize>,
}

impl<P: SourcingProvider + ?Sized> CompositeOrder<'_, P> {
    /// Consolidate lines onto fewer vendors
    ///
    /// Sweeps repeat until one moves nothing, so a second call leaves the
    /// order as it is. An unknown vendor aborts the call; lines moved before
    /// the failure stay moved.
    pub fn rebalance(&mut self) -> Result<RebalanceOutcome, SourcingError> {
        info!(lines = self.len(), "Attempting to rebalance order");
        let mut outcome = RebalanceOutcome::default();

        for sweep in 1..=MAX_SWEEPS {
            let moved_before = outcome.moved.len();
            self.sweep(&mut outcome)?;
            if outcome.moved.len() == moved_before {
                break;
            }
            if sweep == MAX_SWEEPS {
                warn!(sweeps = sweep, "Rebalance still moving lines, giving up");
            }
        }

        info!(
            passes = outcome.passes,
            remaining = outcome.unresolved.len(),
            vendors = self.vendors_in_use().len(),
            "Finished rebalance passes"
        );
        Ok(outcome)
    }

    /// One consolidation sweep over a fresh shadow list and acceptance set
    fn sweep(&mut self, outcome: &mut RebalanceOutcome) -> Result<(), SourcingError> {
        let mut accepted: Vec<String> = Vec::new();
        let mut shadow: Vec<usize> = (0..self.len()).collect();

        for pass in 0..UNSOURCEABLE_PASSES {
            let before = shadow.len();
            let lines = self.lines();
            shadow.retain(|&idx| {
                let keep = lines[idx].is_sourceable();
                if !keep {
                    debug!(ident = %lines[idx].ident(), pass, "Dropping unsourceable line");
                }
                keep
            });
            outcome.passes += 1;
            if shadow.len() == before {
                break;
            }
        }

        outcome.passes += self.accept_pass(&mut shadow, &mut accepted)?;

        while !shadow.is_empty() {
            let Some(best) = self.best_candidate(&shadow, &accepted)? else {
                break;
            };
            if best.score <= SCORE_EPSILON {
                debug!(vendor = %best.vendor, score = best.score, "No profitable consolidation left");
                break;
            }

            info!(vendor = %best.vendor, saving = best.score, "Accepting vendor for an estimated saving");
            if !accepted.contains(&best.vendor) {
                accepted.push(best.vendor.clone());
            }
            for idx in best.lines {
                let line = &mut self.lines_mut()[idx];
                let from = line.selected_vendor().unwrap_or_default().to_string();
                if line.select_vendor(&best.vendor) {
                    debug!(ident = %line.ident(), from = %from, to = %best.vendor, "Moved line");
                    outcome.moved.push(LineMove {
                        ident: line.ident().to_string(),
                        from,
                        to: best.vendor.clone(),
                    });
                }
            }
            outcome.rounds += 1;
            outcome.passes += self.accept_pass(&mut shadow, &mut accepted)?;
        }

        outcome.unresolved = shadow
            .iter()
            .map(|&idx| self.lines()[idx].ident().to_string())
            .collect();
        for vendor in accepted {
            if !outcome.accepted_vendors.contains(&vendor) {
                outcome.accepted_vendors.push(vendor);
            }
        }
        self.settle(outcome);
        Ok(())
    }

    /// Move every line to its cheapest offer among the vendors in use
    fn settle(&mut self, outcome: &mut RebalanceOutcome) {
        let in_use: Vec<String> = self.vendors_in_use().into_iter().map(str::to_string).collect();
        for line in self.lines_mut() {
            let Some(current) = line.selected_source() else {
                continue;
            };
            let from = current.vendor.clone();
            let current_cost = current.effective_extended_native();
            let cheaper = in_use
                .iter()
                .filter(|v| **v != from)
                .filter_map(|v| line.best_offer_from(v))
                .min_by(|a, b| {
                    a.effective_extended_native()
                        .total_cmp(&b.effective_extended_native())
                })
                .filter(|s| s.effective_extended_native() < current_cost - SCORE_EPSILON)
                .map(|s| s.vendor.clone());

            if let Some(to) = cheaper {
                if line.select_vendor(&to) {
                    debug!(ident = %line.ident(), from = %from, to = %to, "Settled line on a cheaper vendor in use");
                    outcome.moved.push(LineMove {
                        ident: line.ident().to_string(),
                        from,
                        to,
                    });
                }
            }
        }
    }

    /// Resolve shadow lines whose vendor is, or becomes, accepted
    ///
    /// Returns the number of iterations made.
    fn accept_pass(&self, shadow: &mut Vec<usize>, accepted: &mut Vec<String>) -> Result<usize, SourcingError> {
        let mut iterations = 0;
        while iterations < ACCEPT_PASSES && !shadow.is_empty() {
            iterations += 1;
            let mut resolved = HashSet::new();

            for &idx in shadow.iter() {
                let line = &self.lines()[idx];
                let Some(vendor) = line.selected_vendor() else {
                    resolved.insert(idx);
                    continue;
                };
                if accepted.iter().any(|a| a == vendor) {
                    debug!(ident = %line.ident(), vendor, "Accepting line sourced by an accepted vendor");
                    resolved.insert(idx);
                } else if line.other_sources().is_empty() {
                    info!(vendor, ident = %line.ident(), "Accepting vendor as unique source");
                    accepted.push(vendor.to_string());
                    resolved.insert(idx);
                } else if self.line_base_cost(vendor, line)?.abs() < SCORE_EPSILON {
                    info!(vendor, "Accepting vendor since its base order cost is 0");
                    accepted.push(vendor.to_string());
                    resolved.insert(idx);
                }
            }

            shadow.retain(|idx| !resolved.contains(idx));
            debug!(iteration = iterations, remaining = shadow.len(), "Accept pass");
            if resolved.is_empty() {
                break;
            }
        }
        Ok(iterations)
    }

    /// Score every alternative vendor of the shadow lines and pick the best
    fn best_candidate(&self, shadow: &[usize], accepted: &[String]) -> Result<Option<Candidate>, SourcingError> {
        let lines = self.lines();
        let in_use = self.vendors_in_use();

        let mut candidates: Vec<&str> = Vec::new();
        for &idx in shadow {
            for source in lines[idx].sorted_other_sources() {
                if !candidates.contains(&source.vendor.as_str()) {
                    candidates.push(source.vendor.as_str());
                }
            }
        }

        let mut best: Option<Candidate> = None;
        for vendor in candidates {
            let mut moves = Vec::new();
            let mut savings = 0.0;
            for &idx in shadow {
                let line = &lines[idx];
                if line.selected_vendor() == Some(vendor) {
                    continue;
                }
                if let Some(offer) = line.best_offer_from(vendor) {
                    savings -= line.excess(offer);
                    moves.push(idx);
                }
            }
            if moves.is_empty() {
                continue;
            }

            let mut released = 0.0;
            let mut frees = 0;
            for &other in in_use.iter().filter(|&&v| v != vendor) {
                if accepted.iter().any(|a| a == other) {
                    continue;
                }
                let users: Vec<usize> = (0..lines.len())
                    .filter(|&idx| lines[idx].selected_vendor() == Some(other))
                    .collect();
                if users.iter().all(|idx| moves.contains(idx)) {
                    released += self.line_base_cost(other, &lines[users[0]])?;
                    frees += 1;
                }
            }

            let is_used = in_use.contains(&vendor);
            if !is_used && frees == 0 {
                continue;
            }
            let commit = if is_used {
                0.0
            } else {
                self.line_base_cost(vendor, &lines[moves[0]])?
            };

            let score = savings + released - commit;
            debug!(vendor, savings, released, commit, score, "Scored candidate vendor");
            if best.as_ref().is_none_or(|b| score > b.score) {
                best = Some(Candidate {
                    vendor: vendor.to_string(),
                    score,
                    lines: moves,
                });
            }
        }
        Ok(best)
    }

    fn line_base_cost(&self, vendor: &str, line: &OrderLine) -> Result<f64, SourcingError> {
        match self.provider().vendor(vendor) {
            Some(v) => Ok(v.order_base_cost()),
            None => {
                error!(vendor, line = ?line, "Unknown vendor during rebalance");
                Err(SourcingError::UnknownVendor {
                    vendor: vendor.to_string(),
                    ident: line.ident().to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::CurrencyDefinition;
    use crate::entities::vendor::{Vendor, VendorPart};
    use crate::sourcing::info::SourceInfo;
    use crate::sourcing::line::tests::offer;
    use crate::sourcing::order::tests::vendor_with;
    use crate::sourcing::provider::Catalog;

    const A: &str = "IC NE555 DIP8";
    const B: &str = "RES SMD 10K 0603";
    const C: &str = "CAP SMD 100N 0402";

    /// A only at X; B and C cheaper at Y, or at X for 0.50 more per unit
    fn split_catalog(y_base: f64) -> Catalog {
        Catalog::new(vec![
            vendor_with("x", 5.0, &[(A, 1.0), (B, 1.5), (C, 1.5)]),
            vendor_with("y", y_base, &[(B, 1.0), (C, 1.0)]),
        ])
        .unwrap()
    }

    fn assignments<P: SourcingProvider + ?Sized>(order: &CompositeOrder<'_, P>) -> Vec<Option<String>> {
        order
            .lines()
            .iter()
            .map(|l| l.selected_vendor().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_consolidates_when_savings_exceed_base_cost() {
        let catalog = split_catalog(5.0);
        let mut order = CompositeOrder::new(&catalog);
        order.add(A, 1, 1, None);
        order.add(B, 2, 2, None);
        order.add(C, 2, 2, None);
        assert_eq!(order.vendors_in_use(), vec!["x", "y"]);
        let before = order.total_cost().unwrap();

        let outcome = order.rebalance().unwrap();

        assert_eq!(order.vendors_in_use(), vec!["x"]);
        assert_eq!(outcome.moved.len(), 2);
        assert_eq!(outcome.moved[0], LineMove {
            ident: B.to_string(),
            from: "y".to_string(),
            to: "x".to_string(),
        });
        assert!(outcome.unresolved.is_empty());
        // 2 extra on the lines, 5 saved on Y's base cost
        assert!((before - order.total_cost().unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_stays_split_when_penalty_exceeds_base_cost() {
        let catalog = split_catalog(5.0);
        let mut order = CompositeOrder::new(&catalog);
        order.add(A, 1, 1, None);
        order.add(B, 10, 10, None);
        order.add(C, 10, 10, None);

        let outcome = order.rebalance().unwrap();

        assert_eq!(order.vendors_in_use(), vec!["x", "y"]);
        assert!(outcome.moved.is_empty());
        assert_eq!(outcome.unresolved, vec![B.to_string(), C.to_string()]);
    }

    #[test]
    fn test_zero_base_cost_vendor_accepted_without_candidates() {
        let catalog = split_catalog(0.0);
        let mut order = CompositeOrder::new(&catalog);
        order.add(A, 1, 1, None);
        order.add(B, 2, 2, None);
        order.add(C, 2, 2, None);

        let outcome = order.rebalance().unwrap();

        assert_eq!(outcome.rounds, 0);
        assert!(outcome.moved.is_empty());
        assert!(outcome.unresolved.is_empty());
        assert_eq!(outcome.accepted_vendors, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(order.vendors_in_use(), vec!["x", "y"]);
    }

    #[test]
    fn test_unique_source_accepted_in_first_pass() {
        let catalog = split_catalog(5.0);
        let mut order = CompositeOrder::new(&catalog);
        order.add(A, 1, 1, None);

        let outcome = order.rebalance().unwrap();

        assert_eq!(outcome.accepted_vendors, vec!["x".to_string()]);
        assert_eq!(outcome.rounds, 0);
        assert_eq!(order.lines()[0].selected_vendor(), Some("x"));
    }

    #[test]
    fn test_unsourceable_lines_are_left_alone() {
        let catalog = split_catalog(5.0);
        let mut order = CompositeOrder::new(&catalog);
        order.add("IC LM358 SOIC8", 3, 3, None);
        order.add(A, 1, 1, None);
        order.add("DIODE 1N4148 SOD123", 3, 3, None);

        let outcome = order.rebalance().unwrap();

        assert!(outcome.unresolved.is_empty());
        assert_eq!(order.unsourceable().count(), 2);
    }

    #[test]
    fn test_never_adds_a_vendor() {
        // Z is dearer than Y and could only ever replace it outright
        let catalog = Catalog::new(vec![
            vendor_with("x", 5.0, &[(A, 1.0)]),
            vendor_with("y", 5.0, &[(B, 1.0), (C, 1.0)]),
            vendor_with("z", 5.0, &[(B, 1.2), (C, 1.2)]),
        ])
        .unwrap();
        let mut order = CompositeOrder::new(&catalog);
        order.add(A, 1, 1, None);
        order.add(B, 10, 10, None);
        order.add(C, 10, 10, None);
        let before = order.vendors_in_use().len();

        order.rebalance().unwrap();

        assert!(order.vendors_in_use().len() <= before);
        assert_eq!(order.vendors_in_use(), vec!["x", "y"]);
    }

    #[test]
    fn test_rebalance_is_idempotent() {
        for qty in [2, 10] {
            let catalog = split_catalog(5.0);
            let mut order = CompositeOrder::new(&catalog);
            order.add(A, 1, 1, None);
            order.add(B, qty, qty, None);
            order.add(C, qty, qty, None);

            order.rebalance().unwrap();
            let once = assignments(&order);
            let second = order.rebalance().unwrap();

            assert_eq!(assignments(&order), once);
            assert!(second.moved.is_empty());
        }
    }

    /// Small deterministic generator for catalog and order shapes
    struct XorShift(u64);

    impl XorShift {
        fn below(&mut self, n: u64) -> u64 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            self.0 = x;
            x % n
        }
    }

    #[test]
    fn test_generated_orders_keep_rebalance_invariants() {
        const BASES: [f64; 4] = [0.0, 2.0, 5.0, 8.0];
        const PRICES: [f64; 6] = [1.0, 1.25, 1.5, 2.0, 3.75, 4.5];
        let idents: Vec<String> = (0..5).map(|i| format!("PART {}", i)).collect();
        let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);

        for case in 0..2000 {
            let mut vendors = Vec::new();
            for (v, base) in BASES.iter().enumerate() {
                let mut parts: Vec<(&str, f64)> = Vec::new();
                for ident in &idents {
                    if rng.below(10) < 6 {
                        parts.push((ident.as_str(), PRICES[rng.below(6) as usize]));
                    }
                }
                vendors.push(vendor_with(&format!("v{}", v), *base, &parts));
            }
            let catalog = Catalog::new(vendors).unwrap();
            let mut order = CompositeOrder::new(&catalog);
            let line_count = 1 + rng.below(5) as usize;
            for ident in idents.iter().take(line_count) {
                let qty = 1 + rng.below(4) as u32;
                order.add(ident, qty, qty, None);
            }
            let vendors_before = order.vendors_in_use().len();
            let cost_before = order.total_cost().unwrap();

            order.rebalance().unwrap();
            let once = assignments(&order);

            assert!(
                order.vendors_in_use().len() <= vendors_before,
                "case {}: vendor count grew",
                case
            );
            assert!(
                order.total_cost().unwrap() <= cost_before + 1e-9,
                "case {}: total cost rose",
                case
            );

            let second = order.rebalance().unwrap();
            assert_eq!(assignments(&order), once, "case {}: second call moved lines", case);
            assert!(second.moved.is_empty(), "case {}", case);
        }
    }

    #[test]
    fn test_moved_line_settles_on_cheapest_vendor_in_use() {
        // Freeing v0 takes both B and D onto v1, though v2 is kept for C
        // and sells B for less than v1
        const D: &str = "DIODE 1N4148 SOD123";
        let catalog = Catalog::new(vec![
            vendor_with("v0", 8.0, &[(B, 1.0), (D, 1.0)]),
            vendor_with("v1", 2.0, &[(A, 1.0), (B, 4.5), (D, 1.5)]),
            vendor_with("v2", 5.0, &[(B, 3.75), (C, 1.0)]),
        ])
        .unwrap();
        let mut order = CompositeOrder::new(&catalog);
        order.add(A, 1, 1, None);
        order.add(B, 1, 1, None);
        order.add(C, 1, 1, None);
        order.add(D, 1, 1, None);
        let before = order.total_cost().unwrap();

        let outcome = order.rebalance().unwrap();

        assert_eq!(outcome.rounds, 1);
        assert_eq!(
            assignments(&order),
            vec![
                Some("v1".to_string()),
                Some("v2".to_string()),
                Some("v2".to_string()),
                Some("v1".to_string()),
            ]
        );
        assert_eq!(outcome.moved.last(), Some(&LineMove {
            ident: B.to_string(),
            from: "v1".to_string(),
            to: "v2".to_string(),
        }));
        // 8 of v0's base saved, 2.75 and 0.5 paid on B and D
        assert!((before - order.total_cost().unwrap() - 4.75).abs() < 1e-9);

        let once = assignments(&order);
        assert!(order.rebalance().unwrap().moved.is_empty());
        assert_eq!(assignments(&order), once);
    }

    /// Offers from a vendor the provider has never heard of
    struct GhostProvider {
        native: CurrencyDefinition,
        vendors: Vec<Vendor>,
    }

    impl SourcingProvider for GhostProvider {
        fn sourcing_information(&self, _ident: &str, qty: u32) -> Result<Vec<SourceInfo>, SourcingError> {
            Ok(vec![offer("ghost", qty, 1.0), offer("x", qty, 1.5)])
        }

        fn vendor(&self, name: &str) -> Option<&Vendor> {
            self.vendors.iter().find(|v| v.name == name)
        }

        fn vendors(&self) -> Vec<&Vendor> {
            self.vendors.iter().collect()
        }

        fn native_currency(&self) -> &CurrencyDefinition {
            &self.native
        }
    }

    #[test]
    fn test_unknown_vendor_aborts() {
        let provider = GhostProvider {
            native: CurrencyDefinition::default(),
            vendors: vec![Vendor::new("x", CurrencyDefinition::default())
                .with_base_cost("Shipping", 5.0)
                .with_part(VendorPart::new(A, "X-A").with_price(1, 1.5))],
        };
        let mut order = CompositeOrder::new(&provider);
        order.add(A, 4, 4, None);

        let result = order.rebalance();
        assert!(matches!(
            result,
            Err(SourcingError::UnknownVendor { vendor, ident }) if vendor == "ghost" && ident == A
        ));
    }
}

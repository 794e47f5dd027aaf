//! Order lines - one ident of a composite order and its candidate sources

use tracing::warn;

use crate::sourcing::info::SourceInfo;
use crate::sourcing::provider::SourcingProvider;

/// One line of a prospective purchase order
///
/// Sources are queried once, at construction. The selected source is the one
/// with the lowest effective acquisition price and may only be changed by the
/// rebalance pass of the owning order.
#[derive(Debug, Clone)]
pub struct OrderLine {
    ident: String,
    required_qty: u32,
    shortage: u32,
    compliant_qty: u32,
    sources: Vec<SourceInfo>,
    selected: Option<usize>,
}

impl OrderLine {
    /// Build a line and resolve its sources through `provider`
    ///
    /// A failing provider leaves the line unsourceable rather than erroring.
    pub fn new<P: SourcingProvider + ?Sized>(
        provider: &P,
        ident: impl Into<String>,
        required_qty: u32,
        shortage: u32,
    ) -> Self {
        let ident = ident.into();
        let compliant_qty = provider.compliant_qty(&ident, shortage);
        let sources = match provider.sourcing_information(&ident, compliant_qty) {
            Ok(sources) => sources,
            Err(e) => {
                warn!(ident = %ident, error = %e, "Sourcing lookup failed, line left unsourceable");
                Vec::new()
            }
        };
        Self::from_sources(ident, required_qty, shortage, compliant_qty, sources)
    }

    /// Build a line from already-known sources
    pub fn from_sources(
        ident: impl Into<String>,
        required_qty: u32,
        shortage: u32,
        compliant_qty: u32,
        sources: Vec<SourceInfo>,
    ) -> Self {
        let mut line = Self {
            ident: ident.into(),
            required_qty,
            shortage,
            compliant_qty,
            sources,
            selected: None,
        };
        line.selected = line.cheapest_source();
        line
    }

    fn cheapest_source(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, source) in self.sources.iter().enumerate() {
            let price = self.effective_acquisition_price(source);
            if best.is_none_or(|(_, best_price)| price < best_price) {
                best = Some((idx, price));
            }
        }
        best.map(|(idx, _)| idx)
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn required_qty(&self) -> u32 {
        self.required_qty
    }

    /// Quantity already covered by inventory or reservations
    pub fn reserved_qty(&self) -> u32 {
        self.required_qty.saturating_sub(self.shortage)
    }

    pub fn shortage(&self) -> u32 {
        self.shortage
    }

    /// Shortage adjusted by the quantity guidelines
    pub fn compliant_qty(&self) -> u32 {
        self.compliant_qty
    }

    /// Every offer, in provider order
    pub fn sources(&self) -> &[SourceInfo] {
        &self.sources
    }

    pub fn selected_source(&self) -> Option<&SourceInfo> {
        self.selected.map(|idx| &self.sources[idx])
    }

    /// Vendor key of the selected source
    pub fn selected_vendor(&self) -> Option<&str> {
        self.selected_source().map(|s| s.vendor.as_str())
    }

    pub fn is_sourceable(&self) -> bool {
        !self.sources.is_empty()
    }

    /// Offers from vendors other than the selected one
    pub fn other_sources(&self) -> Vec<&SourceInfo> {
        let Some(selected) = self.selected_vendor() else {
            return Vec::new();
        };
        self.sources
            .iter()
            .filter(|s| s.vendor != selected)
            .collect()
    }

    /// Other offers, cheapest effective extended price first
    pub fn sorted_other_sources(&self) -> Vec<&SourceInfo> {
        let mut others = self.other_sources();
        others.sort_by(|a, b| {
            a.effective_extended_native()
                .total_cmp(&b.effective_extended_native())
        });
        others
    }

    /// Extra native cost of buying from `source` instead of the selected source
    pub fn excess(&self, source: &SourceInfo) -> f64 {
        let selected = self
            .selected_source()
            .map_or(0.0, SourceInfo::effective_extended_native);
        source.effective_extended_native() - selected
    }

    /// Cost that counts half of any excess quantity, since excess stock keeps
    /// some value for later builds
    pub fn effective_acquisition_price(&self, source: &SourceInfo) -> f64 {
        let shortage = self.shortage as f64;
        let excess = source.order_qty as f64 - shortage;
        (shortage + excess / 2.0) * source.effective_unit_native()
    }

    /// Cheapest offer from `vendor` for this line, if it made one
    pub fn best_offer_from(&self, vendor: &str) -> Option<&SourceInfo> {
        self.sources
            .iter()
            .filter(|s| s.vendor == vendor)
            .min_by(|a, b| {
                a.effective_extended_native()
                    .total_cmp(&b.effective_extended_native())
            })
    }

    /// Move the selection to `vendor`'s cheapest offer
    ///
    /// Returns false and leaves the selection alone when the vendor made no offer.
    pub(crate) fn select_vendor(&mut self, vendor: &str) -> bool {
        let best = self
            .sources
            .iter()
            .enumerate()
            .filter(|(_, s)| s.vendor == vendor)
            .min_by(|(_, a), (_, b)| {
                a.effective_extended_native()
                    .total_cmp(&b.effective_extended_native())
            })
            .map(|(idx, _)| idx);
        match best {
            Some(idx) => {
                self.selected = Some(idx);
                true
            }
            None => false,
        }
    }
}

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A proposed exchange of assets and cash between two participants.
///
/// Offers are never edited. A counter-offer is a new `TradeOffer` built with
/// [`TradeOffer::countered`], where the responder becomes the proposer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TradeOffer {
    pub proposer: String,
    pub target: String,
    /// Assets the proposer hands over.
    pub give: BTreeSet<String>,
    /// Assets the proposer asks for.
    pub receive: BTreeSet<String>,
    /// Positive = proposer pays target, negative = target pays proposer.
    pub cash: i64,
}

impl TradeOffer {
    pub fn new<G, R>(
        proposer: impl Into<String>,
        target: impl Into<String>,
        give: G,
        receive: R,
        cash: i64,
    ) -> Self
    where
        G: IntoIterator,
        G::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            proposer: proposer.into(),
            target: target.into(),
            give: give.into_iter().map(Into::into).collect(),
            receive: receive.into_iter().map(Into::into).collect(),
            cash,
        }
    }

    /// Build the counter-offer sent back by this offer's target.
    ///
    /// `give`/`receive`/`cash` are from the point of view of the responder,
    /// who becomes the proposer of the returned offer.
    pub fn countered(&self, give: BTreeSet<String>, receive: BTreeSet<String>, cash: i64) -> Self {
        Self {
            proposer: self.target.clone(),
            target: self.proposer.clone(),
            give,
            receive,
            cash,
        }
    }

    /// The participant paying cash and how much, if any cash moves.
    ///
    /// `i64::MIN` saturates to `i64::MAX`, which no seat can cover.
    pub fn payer(&self) -> Option<(&str, i64)> {
        match self.cash {
            0 => None,
            c if c > 0 => Some((self.proposer.as_str(), c)),
            c => Some((self.target.as_str(), c.saturating_neg())),
        }
    }
}

fn join(set: &BTreeSet<String>) -> String {
    if set.is_empty() {
        "nothing".to_string()
    } else {
        set.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for TradeOffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} gives [{}] for [{}] from {}",
            self.proposer,
            join(&self.give),
            join(&self.receive),
            self.target
        )?;
        match self.payer() {
            Some((payer, amount)) => write!(f, ", {payer} pays ${amount}"),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer() -> TradeOffer {
        TradeOffer::new("Alice", "Bob", ["Park Place"], Vec::<String>::new(), 300)
    }

    #[test]
    fn payer_follows_cash_sign() {
        assert_eq!(offer().payer(), Some(("Alice", 300)));

        let reverse = TradeOffer::new("Alice", "Bob", ["Park Place"], ["Boardwalk"], -150);
        assert_eq!(reverse.payer(), Some(("Bob", 150)));

        let extreme = TradeOffer::new("Alice", "Bob", ["Park Place"], Vec::<String>::new(), i64::MIN);
        assert_eq!(extreme.payer(), Some(("Bob", i64::MAX)));
        assert!(extreme.to_string().ends_with(&format!("Bob pays ${}", i64::MAX)));

        let even = TradeOffer::new("Alice", "Bob", ["Park Place"], ["Boardwalk"], 0);
        assert_eq!(even.payer(), None);
    }

    #[test]
    fn countered_swaps_roles_and_leaves_original_untouched() {
        let original = offer();
        let counter = original.countered(
            ["Boardwalk".to_string()].into(),
            ["Park Place".to_string(), "Baltic Avenue".to_string()].into(),
            500,
        );

        assert_eq!(counter.proposer, "Bob");
        assert_eq!(counter.target, "Alice");
        assert!(counter.give.contains("Boardwalk"));
        assert_eq!(counter.receive.len(), 2);
        assert_eq!(counter.cash, 500);

        assert_eq!(original, offer());
    }

    #[test]
    fn display_reads_naturally() {
        assert_eq!(
            offer().to_string(),
            "Alice gives [Park Place] for [nothing] from Bob, Alice pays $300"
        );
    }

    #[test]
    fn serializes_with_sorted_asset_lists() {
        let o = TradeOffer::new("Alice", "Bob", ["Park Place", "Baltic Avenue"], ["Boardwalk"], 0);
        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["give"], serde_json::json!(["Baltic Avenue", "Park Place"]));
    }
}

use serde::{Deserialize, Serialize};

/// How many units a caller still wants from one purchase attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesiredQuantity {
    Exactly(u32),
    Unbounded,
}

impl DesiredQuantity {
    /// Quantity to put in the cart given the page-reported maximum.
    /// Never fails on short stock: a smaller max simply wins.
    pub fn clamp_to(self, available_max: u32) -> u32 {
        let max = available_max.max(1);
        match self {
            DesiredQuantity::Exactly(n) => n.clamp(1, max),
            DesiredQuantity::Unbounded => max,
        }
    }

    /// Units still wanted after `secured` have been bought.
    /// `None` once an exact target is reached; `Unbounded` stays unbounded.
    pub fn remaining_after(self, secured: u32) -> Option<DesiredQuantity> {
        match self {
            DesiredQuantity::Exactly(n) if secured >= n => None,
            DesiredQuantity::Exactly(n) => Some(DesiredQuantity::Exactly(n - secured)),
            DesiredQuantity::Unbounded => Some(DesiredQuantity::Unbounded),
        }
    }
}

/// Result of one add-to-cart + checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOutcome {
    pub quantity_secured: u32,
    /// `false` when no payment-confirmed marker was observed in time.
    pub confirmed: bool,
}

impl PurchaseOutcome {
    pub fn confirmed(quantity: u32) -> Self {
        Self {
            quantity_secured: quantity,
            confirmed: true,
        }
    }

    pub fn unconfirmed(quantity: u32) -> Self {
        Self {
            quantity_secured: quantity,
            confirmed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_to_page_max() {
        assert_eq!(DesiredQuantity::Exactly(10).clamp_to(3), 3);
        assert_eq!(DesiredQuantity::Exactly(2).clamp_to(5), 2);
        assert_eq!(DesiredQuantity::Unbounded.clamp_to(5), 5);
        assert_eq!(DesiredQuantity::Unbounded.clamp_to(0), 1);
    }

    #[test]
    fn remaining_after_exact() {
        let d = DesiredQuantity::Exactly(2);
        assert_eq!(d.remaining_after(0), Some(DesiredQuantity::Exactly(2)));
        assert_eq!(d.remaining_after(1), Some(DesiredQuantity::Exactly(1)));
        assert_eq!(d.remaining_after(2), None);
        assert_eq!(d.remaining_after(5), None);
        assert_eq!(
            DesiredQuantity::Unbounded.remaining_after(9),
            Some(DesiredQuantity::Unbounded)
        );
    }
}

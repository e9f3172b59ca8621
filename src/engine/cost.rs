//! # engine::cost
//!
//! Cost-basis arithmetic shared by the engine and the manager API.

use serde::{Deserialize, Serialize};

/// A holding reduced to quantity and weighted-average cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub qty:      f64,
    pub avg_cost: f64,
}

impl Lot {
    pub fn new(qty: f64, avg_cost: f64) -> Self {
        Self { qty, avg_cost }
    }

    pub fn total_cost(&self) -> f64 {
        self.qty * self.avg_cost
    }

    /// Weighted-average-cost recompute for an additional purchase.
    ///
    /// A combined quantity of zero yields an average of `0`.
    pub fn merge(self, purchase: Lot) -> Lot {
        let qty = self.qty + purchase.qty;
        if qty == 0.0 {
            return Lot::new(qty, 0.0);
        }
        Lot::new(qty, (self.total_cost() + purchase.total_cost()) / qty)
    }
}

/// Unrealised profit in percent of cost; `None` without a cost basis.
pub fn profit_pct(average_cost: f64, price: f64) -> Option<f64> {
    if average_cost <= 0.0 || !average_cost.is_finite() || !price.is_finite() {
        return None;
    }
    Some((price - average_cost) * 100.0 / average_cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_weights_by_quantity() {
        let merged = Lot::new(100.0, 1000.0).merge(Lot::new(50.0, 1300.0));
        assert_eq!(merged.qty, 150.0);
        assert_eq!(merged.avg_cost, 1100.0);
    }

    #[test]
    fn merge_conserves_total_cost() {
        let cases = [
            (Lot::new(10.0, 523.7), Lot::new(3.0, 611.2)),
            (Lot::new(0.0, 0.0), Lot::new(25.0, 88.8)),
            (Lot::new(1.5, 20000.0), Lot::new(0.25, 19000.0)),
            (Lot::new(300.0, 1.1), Lot::new(0.0, 999.0)),
        ];
        for (old, add) in cases {
            let merged = old.merge(add);
            let expected = old.total_cost() + add.total_cost();
            assert!(
                (merged.total_cost() - expected).abs() < 1e-6,
                "{old:?} + {add:?} -> {merged:?}"
            );
        }
    }

    #[test]
    fn merge_to_zero_quantity_defines_average_as_zero() {
        let merged = Lot::new(0.0, 0.0).merge(Lot::new(0.0, 500.0));
        assert_eq!(merged, Lot::new(0.0, 0.0));
    }

    #[test]
    fn profit_pct_guards_zero_cost() {
        assert_eq!(profit_pct(0.0, 1234.0), None);
        assert_eq!(profit_pct(1000.0, 1150.0), Some(15.0));
        assert_eq!(profit_pct(500.0, 480.0), Some(-4.0));
    }
}

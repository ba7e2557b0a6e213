use crate::direction::Direction;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// Price/direction/confidence triple from the external technical predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalPrediction {
    pub current_price: Decimal,
    pub predicted_price: Decimal,
    pub direction: Direction,
    pub confidence: f64, // 0.0 to 1.0
}

impl TechnicalPrediction {
    /// Expected move in percent, None when the current price is zero.
    pub fn expected_change_pct(&self) -> Option<f64> {
        if self.current_price.is_zero() {
            return None;
        }
        let change = (self.predicted_price - self.current_price) / self.current_price;
        (change * Decimal::ONE_HUNDRED).to_f64()
    }
}

use serde::{Deserialize, Serialize};

/// An open holding in one symbol. At most one position per symbol.
///
/// `avg_price` is a quantity-weighted mean updated only by buy fills; sell
/// fills shrink `quantity` and `invested` proportionally and leave the
/// average untouched for the remainder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: f64,
    pub avg_price: f64,
    /// Cost basis of the whole position: what was paid for the held quantity.
    pub invested: f64,
}

impl Position {
    pub fn market_value(&self, current_price: f64) -> f64 {
        self.quantity * current_price
    }

    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        self.quantity * (current_price - self.avg_price)
    }

    /// Unrealized return as a percentage of cost basis. 0.0 for a zero basis.
    pub fn return_pct(&self, current_price: f64) -> f64 {
        if self.invested == 0.0 {
            return 0.0;
        }
        self.unrealized_pnl(current_price) / self.invested * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_position() -> Position {
        Position {
            symbol: "BTCUSDT".into(),
            quantity: 0.5,
            avg_price: 40000.0,
            invested: 20000.0,
        }
    }

    #[test]
    fn market_value_and_pnl() {
        let pos = sample_position();
        assert_eq!(pos.market_value(44000.0), 22000.0);
        assert_eq!(pos.unrealized_pnl(44000.0), 2000.0);
        assert_eq!(pos.unrealized_pnl(38000.0), -1000.0);
    }

    #[test]
    fn return_pct_relative_to_basis() {
        let pos = sample_position();
        // 2000 gain on 20000 basis = 10%
        assert!((pos.return_pct(44000.0) - 10.0).abs() < 1e-10);
    }

    #[test]
    fn return_pct_zero_basis_is_zero() {
        let pos = Position {
            symbol: "X".into(),
            quantity: 1.0,
            avg_price: 0.0,
            invested: 0.0,
        };
        assert_eq!(pos.return_pct(100.0), 0.0);
    }
}

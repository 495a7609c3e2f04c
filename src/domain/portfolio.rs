//! Single-asset portfolio state.
//!
//! All-in/all-out: a buy spends as much cash as buys whole shares, a sell
//! closes the whole position. No margin, no shorting.

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub shares: u64,
    pub starting_cash: f64,
}

/// Result of an order request.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    Filled { quantity: u64, price: f64 },
    /// Nothing to do: the order sized to zero shares.
    Empty,
    Rejected(RejectReason),
}

impl OrderOutcome {
    /// Shares actually exchanged.
    pub fn quantity(&self) -> u64 {
        match self {
            OrderOutcome::Filled { quantity, .. } => *quantity,
            OrderOutcome::Empty | OrderOutcome::Rejected(_) => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    InvalidPrice { price: f64 },
    InsufficientCash { needed: f64, available: f64 },
    InsufficientShares { requested: u64, held: u64 },
}

impl Portfolio {
    pub fn new(starting_cash: f64) -> Self {
        Portfolio {
            cash: starting_cash,
            shares: 0,
            starting_cash,
        }
    }

    pub fn is_in_market(&self) -> bool {
        self.shares > 0
    }

    /// Buy as many whole shares as cash allows.
    pub fn buy(&mut self, price: f64) -> OrderOutcome {
        if !price.is_finite() || price <= 0.0 {
            return self.reject(RejectReason::InvalidPrice { price });
        }

        let quantity = (self.cash / price).floor() as u64;
        if quantity == 0 {
            return OrderOutcome::Empty;
        }

        let cost = price * quantity as f64;
        if cost > self.cash {
            return self.reject(RejectReason::InsufficientCash {
                needed: cost,
                available: self.cash,
            });
        }

        self.cash -= cost;
        self.shares += quantity;
        OrderOutcome::Filled { quantity, price }
    }

    /// Close the entire position.
    pub fn sell(&mut self, price: f64) -> OrderOutcome {
        self.sell_quantity(price, self.shares)
    }

    /// Sell `quantity` shares. Requests beyond the held position are rejected
    /// outright rather than partially filled.
    pub fn sell_quantity(&mut self, price: f64, quantity: u64) -> OrderOutcome {
        if !price.is_finite() || price < 0.0 {
            return self.reject(RejectReason::InvalidPrice { price });
        }
        if quantity > self.shares {
            return self.reject(RejectReason::InsufficientShares {
                requested: quantity,
                held: self.shares,
            });
        }
        if quantity == 0 {
            return OrderOutcome::Empty;
        }

        self.cash += price * quantity as f64;
        self.shares -= quantity;
        OrderOutcome::Filled { quantity, price }
    }

    /// Mark-to-market value at `price`.
    pub fn total_value(&self, price: f64) -> f64 {
        self.cash + self.shares as f64 * price
    }

    fn reject(&self, reason: RejectReason) -> OrderOutcome {
        tracing::warn!(
            cash = self.cash,
            shares = self.shares,
            "order rejected: {reason:?}"
        );
        OrderOutcome::Rejected(reason)
    }
}

//! Per-bar trading signals and causal crossover detection.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

/// Walk `points` forward once, handing each (previous, current) pair to
/// `decide`. Indices below `start` are always `Hold`, and `decide` only ever
/// sees the current bar and the one before it.
pub fn scan_pairs<T, F>(points: &[T], start: usize, decide: F) -> Vec<Signal>
where
    T: Copy,
    F: Fn(T, T) -> Signal,
{
    let mut signals = Vec::with_capacity(points.len());
    points
        .iter()
        .copied()
        .enumerate()
        .fold(None, |prev: Option<T>, (i, current)| {
            let signal = match prev {
                Some(prev) if i >= start => decide(prev, current),
                _ => Signal::Hold,
            };
            signals.push(signal);
            Some(current)
        });
    signals
}

/// `value` moved from at-or-below `reference` to strictly above it.
/// A touch on the previous bar counts as part of the cross.
pub fn crossed_above(prev_value: f64, prev_reference: f64, value: f64, reference: f64) -> bool {
    prev_value <= prev_reference && value > reference
}

/// `value` moved from at-or-above `reference` to strictly below it.
pub fn crossed_below(prev_value: f64, prev_reference: f64, value: f64, reference: f64) -> bool {
    prev_value >= prev_reference && value < reference
}

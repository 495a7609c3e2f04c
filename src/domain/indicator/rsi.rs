//! RSI (Relative Strength Index).
//!
//! Average gain/loss use a *simple* rolling mean over the last n price
//! changes, not Wilder's smoothing. Numeric output therefore differs from
//! textbook RSI on purpose.
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! - avg_loss == 0, avg_gain > 0: RSI = 100
//! - avg_loss == 0, avg_gain == 0: undefined (flat window)
//!
//! Warmup: the first n bars are undefined (bar 0 has no price change).

use super::sma::rolling_mean;

pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let gains: Vec<f64> = deltas.iter().map(|&d| if d > 0.0 { d } else { 0.0 }).collect();
    let losses: Vec<f64> = deltas.iter().map(|&d| if d < 0.0 { -d } else { 0.0 }).collect();

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    let mut values = Vec::with_capacity(closes.len());
    if !closes.is_empty() {
        values.push(None);
    }
    values.extend(
        avg_gain
            .into_iter()
            .zip(avg_loss)
            .map(|(gain, loss)| match (gain, loss) {
                (Some(gain), Some(loss)) => rsi_from_averages(gain, loss),
                _ => None,
            }),
    );
    values
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        return if avg_gain > 0.0 { Some(100.0) } else { None };
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_and_single() {
        assert!(rsi(&[], 14).is_empty());
        assert_eq!(rsi(&[100.0], 14), vec![None]);
    }

    #[test]
    fn warmup_is_period_bars() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + (i % 3) as f64).collect();
        let series = rsi(&closes, 14);
        assert_eq!(series.len(), 20);
        assert!(series[..14].iter().all(Option::is_none));
        assert!(series[14].is_some());
    }

    #[test]
    fn all_gains_pins_at_100() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let series = rsi(&closes, 14);
        assert!(series[14..].iter().all(|v| *v == Some(100.0)));
    }

    #[test]
    fn all_losses_is_zero() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let series = rsi(&closes, 14);
        assert!(series[14..].iter().all(|v| *v == Some(0.0)));
    }

    #[test]
    fn flat_window_is_undefined() {
        let series = rsi(&[50.0; 20], 14);
        assert!(series.iter().all(Option::is_none));
    }

    #[test]
    fn simple_average_not_wilder() {
        // changes: +2, -1, +2, -1 ; period 2
        let closes = [10.0, 12.0, 11.0, 13.0, 12.0];
        let series = rsi(&closes, 2);
        // bar 2: gains {2,0} losses {0,1} -> avg 1.0 / 0.5 -> rs 2
        assert_relative_eq!(series[2].unwrap(), 100.0 - 100.0 / 3.0);
        // bar 3: gains {0,2} losses {1,0} -> same window means
        assert_relative_eq!(series[3].unwrap(), 100.0 - 100.0 / 3.0);
        // bar 4: gains {2,0} losses {0,1}
        assert_relative_eq!(series[4].unwrap(), 100.0 - 100.0 / 3.0);
    }

    #[test]
    fn bounded_zero_to_hundred() {
        let closes = [44.0, 44.3, 44.1, 43.6, 44.3, 44.8, 45.1, 45.4, 45.8, 46.1, 45.9];
        for value in rsi(&closes, 5).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn period_zero_is_undefined() {
        assert_eq!(rsi(&[1.0, 2.0], 0), vec![None, None]);
    }
}

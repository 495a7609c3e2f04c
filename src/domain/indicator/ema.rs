//! Exponential Moving Average.
//!
//! alpha = 2/(span+1), seeded with the first value:
//! EMA[0] = x[0], EMA[t] = EMA[t-1] + alpha*(x[t] - EMA[t-1]).
//! No warmup bias correction, so every position is defined.

pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());

    if let Some((&first, rest)) = values.split_first() {
        out.push(first);
        rest.iter().fold(first, |prev, &x| {
            let next = prev + alpha * (x - prev);
            out.push(next);
            next
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn seeded_with_first_value() {
        let series = ema(&[10.0, 20.0, 30.0], 3);
        assert_eq!(series[0], 10.0);
    }

    #[test]
    fn recursive_calculation() {
        let series = ema(&[10.0, 20.0, 30.0, 40.0], 3);
        let k = 2.0 / 4.0;
        let e1 = k * 20.0 + (1.0 - k) * 10.0;
        let e2 = k * 30.0 + (1.0 - k) * e1;
        let e3 = k * 40.0 + (1.0 - k) * e2;
        assert_relative_eq!(series[1], e1, epsilon = 1e-9);
        assert_relative_eq!(series[2], e2, epsilon = 1e-9);
        assert_relative_eq!(series[3], e3, epsilon = 1e-9);
    }

    #[test]
    fn span_one_tracks_input() {
        let series = ema(&[10.0, 20.0, 5.0], 1);
        assert_eq!(series, vec![10.0, 20.0, 5.0]);
    }

    #[test]
    fn constant_input_stays_constant() {
        let series = ema(&[100.0; 10], 12);
        assert!(series.iter().all(|&v| v == 100.0));
    }

    #[test]
    fn same_length_as_input() {
        assert_eq!(ema(&[1.0, 2.0, 3.0, 4.0, 5.0], 26).len(), 5);
        assert!(ema(&[], 12).is_empty());
    }
}

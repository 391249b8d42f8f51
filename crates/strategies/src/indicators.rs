// In crates/strategies/src/indicators.rs

use rust_decimal::Decimal;

/// Simple moving average of `values` over a trailing `window`.
///
/// The output has one entry per input value. Entries without a full window of
/// history are `None`. A zero window yields all `None`.
pub fn sma(values: &[Decimal], window: usize) -> Vec<Option<Decimal>> {
    let mut out = Vec::with_capacity(values.len());
    if window == 0 {
        out.resize(values.len(), None);
        return out;
    }

    let divisor = Decimal::from(window as u64);
    let mut sum = Decimal::ZERO;
    for (i, value) in values.iter().enumerate() {
        sum += *value;
        if i >= window {
            sum -= values[i - window];
        }
        out.push((i + 1 >= window).then(|| sum / divisor));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn sma_is_none_until_window_is_full() {
        let values = [dec!(1), dec!(2), dec!(3), dec!(4)];
        assert_eq!(
            sma(&values, 3),
            vec![None, None, Some(dec!(2)), Some(dec!(3))]
        );
    }

    #[test]
    fn sma_of_window_one_is_the_series() {
        let values = [dec!(10.5), dec!(11)];
        assert_eq!(sma(&values, 1), vec![Some(dec!(10.5)), Some(dec!(11))]);
    }

    #[test]
    fn zero_window_yields_nothing() {
        assert_eq!(sma(&[dec!(1), dec!(2)], 0), vec![None, None]);
    }
}

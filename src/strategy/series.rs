//! Price series statistics
//!
//! Momentum, volatility and volatility trend over the trailing part of a
//! price series, plus the NaN guards every composite score goes through.
//! All functions accept series of any length and return a neutral value
//! below their minimum sample count.

use crate::filter::types::PricePoint;

/// Denominators smaller than this are treated as zero
pub const EPSILON: f64 = 1e-12;

/// Replace NaN and infinities with 0
#[inline]
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Sanitize, then clamp into [min, max]
#[inline]
pub fn clamp_finite(value: f64, min: f64, max: f64) -> f64 {
    sanitize(value).clamp(min, max)
}

/// Sanitize, then clamp into the 0-100 score range
#[inline]
pub fn clamp_score(value: f64) -> f64 {
    clamp_finite(value, 0.0, 100.0)
}

/// Relative change `(to - from) / from`, 0 when `from` is ~0
pub fn relative_change(from: f64, to: f64) -> f64 {
    if from.abs() < EPSILON {
        return 0.0;
    }
    sanitize((to - from) / from)
}

/// Population standard deviation, 0 for fewer than two values
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    sanitize(variance.sqrt())
}

/// Relative changes between consecutive prices
pub fn price_changes(prices: &[PricePoint]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| relative_change(w[0].price, w[1].price))
        .collect()
}

/// Momentum over the last `min(window, n)` samples: `(last - first) / first`
pub fn momentum(prices: &[PricePoint], window: usize, limit: f64) -> f64 {
    let n = window.min(prices.len());
    if n < 2 {
        return 0.0;
    }
    let slice = &prices[prices.len() - n..];
    let first = slice[0].price;
    let last = slice[n - 1].price;
    clamp_finite(relative_change(first, last), -limit, limit)
}

/// Volatility of the trailing `window` samples: standard deviation of the
/// relative price changes inside that window
pub fn volatility(prices: &[PricePoint], window: usize) -> f64 {
    let n = window.min(prices.len());
    if n < 3 {
        return 0.0;
    }
    std_dev(&price_changes(&prices[prices.len() - n..]))
}

/// Whether the trailing window holds enough samples for a volatility figure
pub fn has_volatility_sample(prices: &[PricePoint], window: usize) -> bool {
    window.min(prices.len()) >= 3
}

/// Relative change of the trailing window's volatility against the window
/// right before it. Returns 0 when either window is too short or the earlier
/// volatility is 0.
pub fn volatility_trend(prices: &[PricePoint], window: usize) -> f64 {
    if window == 0 {
        return 0.0;
    }
    let recent_len = window.min(prices.len());
    let earlier_end = prices.len() - recent_len;
    let earlier_len = window.min(earlier_end);
    if recent_len < 3 || earlier_len < 3 {
        return 0.0;
    }

    let recent = std_dev(&price_changes(&prices[earlier_end..]));
    let earlier = std_dev(&price_changes(&prices[earlier_end - earlier_len..earlier_end]));
    if earlier < EPSILON {
        return 0.0;
    }
    clamp_finite((recent - earlier) / earlier, -1.0, 1.0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    /// Build a price series with one-minute spacing
    pub(crate) fn series(prices: &[f64]) -> Vec<PricePoint> {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| PricePoint::new(start + Duration::minutes(i as i64), *p))
            .collect()
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize(f64::NAN), 0.0);
        assert_eq!(sanitize(f64::INFINITY), 0.0);
        assert_eq!(sanitize(f64::NEG_INFINITY), 0.0);
        assert_eq!(sanitize(-3.5), -3.5);
        assert_eq!(clamp_score(f64::NAN), 0.0);
        assert_eq!(clamp_score(140.0), 100.0);
    }

    #[test]
    fn test_momentum_short_series_is_neutral() {
        assert_eq!(momentum(&[], 5, 10.0), 0.0);
        assert_eq!(momentum(&series(&[1.0]), 5, 10.0), 0.0);
    }

    #[test]
    fn test_momentum_uses_trailing_window() {
        let prices = series(&[1.0, 2.0, 2.0, 2.0, 2.0, 2.0, 3.0]);
        // last 5 samples: 2.0 .. 3.0
        assert!((momentum(&prices, 5, 10.0) - 0.5).abs() < 1e-9);
        // window longer than series uses all samples
        assert!((momentum(&prices, 60, 10.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_momentum_zero_denominator_and_clamp() {
        assert_eq!(momentum(&series(&[0.0, 5.0]), 5, 10.0), 0.0);
        assert_eq!(momentum(&series(&[0.01, 5.0]), 5, 10.0), 10.0);
    }

    #[test]
    fn test_volatility_flat_series() {
        let prices = series(&[1.0; 40]);
        assert_eq!(volatility(&prices, 30), 0.0);
        assert_eq!(volatility_trend(&prices, 30), 0.0);
    }

    #[test]
    fn test_volatility_trend_compression() {
        // choppy first half, calm second half
        let mut raw = Vec::new();
        for i in 0..30 {
            raw.push(if i % 2 == 0 { 1.0 } else { 1.2 });
        }
        for i in 0..30 {
            raw.push(if i % 2 == 0 { 1.0 } else { 1.01 });
        }
        let prices = series(&raw);
        let trend = volatility_trend(&prices, 30);
        assert!(trend < -0.2, "expected compression, got {}", trend);
        assert!(trend >= -1.0);
    }

    #[test]
    fn test_volatility_trend_needs_earlier_window() {
        let prices = series(&[1.0, 1.1, 0.9, 1.2]);
        assert_eq!(volatility_trend(&prices, 30), 0.0);
    }
}

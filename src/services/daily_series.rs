use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::models::PriceCandle;

/// Close and day-over-day return for one calendar date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyPrice {
    pub close_price: f64,
    pub daily_return: Option<f64>,
}

/// Collapse a ticker's candles onto the UTC calendar-day grid.
///
/// Candles must be sorted ascending by timestamp. The date is the UTC date
/// component of the timestamp, with no timezone conversion. When several
/// candles share a date the last one wins.
///
/// `daily_return` compares against the previous available date in the
/// series, not a fixed calendar lag. It is `None` for the first date and
/// whenever the previous close is zero.
pub fn build_price_series(candles: &[PriceCandle]) -> BTreeMap<NaiveDate, DailyPrice> {
    let mut closes: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for candle in candles {
        closes.insert(candle.ts.date_naive(), candle.close);
    }

    let mut series = BTreeMap::new();
    let mut prev_close: Option<f64> = None;

    for (date, close) in closes {
        let daily_return = match prev_close {
            Some(prev) if prev != 0.0 => Some((close - prev) / prev),
            _ => None,
        };

        series.insert(
            date,
            DailyPrice {
                close_price: close,
                daily_return,
            },
        );
        prev_close = Some(close);
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candle(y: i32, m: u32, d: u32, h: u32, close: f64) -> PriceCandle {
        PriceCandle {
            ticker: "AAPL".to_string(),
            ts: Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
            source: "test".to_string(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_candles() {
        assert!(build_price_series(&[]).is_empty());
    }

    #[test]
    fn test_first_return_is_none() {
        let series = build_price_series(&[candle(2024, 1, 2, 5, 100.0), candle(2024, 1, 3, 5, 110.0)]);

        assert_eq!(series[&date(2024, 1, 2)].daily_return, None);
        let ret = series[&date(2024, 1, 3)].daily_return.unwrap();
        assert!((ret - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_gap_uses_previous_available_close() {
        // Friday then Monday: the weekend is not in the series.
        let series = build_price_series(&[candle(2024, 1, 5, 5, 200.0), candle(2024, 1, 8, 5, 190.0)]);

        assert_eq!(series.len(), 2);
        let ret = series[&date(2024, 1, 8)].daily_return.unwrap();
        assert!((ret - (-0.05)).abs() < 1e-12);
    }

    #[test]
    fn test_zero_previous_close_gives_none() {
        let series = build_price_series(&[
            candle(2024, 1, 2, 5, 0.0),
            candle(2024, 1, 3, 5, 10.0),
            candle(2024, 1, 4, 5, 12.0),
        ]);

        assert_eq!(series[&date(2024, 1, 3)].daily_return, None);
        let ret = series[&date(2024, 1, 4)].daily_return.unwrap();
        assert!((ret - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_same_date_last_candle_wins() {
        let series = build_price_series(&[
            candle(2024, 1, 2, 5, 100.0),
            candle(2024, 1, 3, 1, 50.0),
            candle(2024, 1, 3, 20, 105.0),
        ]);

        assert_eq!(series.len(), 2);
        let day = series[&date(2024, 1, 3)];
        assert_eq!(day.close_price, 105.0);
        assert!((day.daily_return.unwrap() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_date_truncates_without_conversion() {
        let series = build_price_series(&[candle(2024, 3, 1, 23, 10.0)]);
        assert!(series.contains_key(&date(2024, 3, 1)));
    }
}

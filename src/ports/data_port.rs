//! Historical price data port.

use chrono::NaiveDate;

use crate::domain::error::BacktestError;
use crate::domain::granularity::Granularity;
use crate::domain::ohlcv::PriceSeries;

pub trait DataPort {
    /// Bars for `symbol` between `start` and `end` inclusive.
    ///
    /// Implementations report a missing or unreadable source as
    /// `DataUnavailable`.
    fn fetch_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        granularity: Granularity,
    ) -> Result<PriceSeries, BacktestError>;
}

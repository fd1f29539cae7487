//! Price data access port trait.

use crate::domain::error::SwarmtraderError;
use crate::domain::price_series::PriceSeries;

pub trait PriceDataPort {
    /// Full daily history of one instrument, date-sorted.
    fn load_prices(&self) -> Result<PriceSeries, SwarmtraderError>;

    /// Human-readable origin, e.g. a file path.
    fn source(&self) -> String;
}

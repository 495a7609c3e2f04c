//! Technical indicator series.
//!
//! Every function returns exactly one value per input price. Where an
//! indicator is not yet defined (warmup, or an undefined ratio) the value is
//! `None`; downstream crossover detection treats `None` as "no signal".

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use ema::ema;
pub use macd::{MacdPoint, macd};
pub use rsi::rsi;
pub use sma::{rolling_mean, sma};

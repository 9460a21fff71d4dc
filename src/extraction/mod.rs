pub(crate) mod table;
pub mod time;
pub(crate) mod units;
pub(crate) mod wind;

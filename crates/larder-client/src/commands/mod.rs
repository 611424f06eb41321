pub(crate) mod common;
pub mod forecast;
pub mod supply;
pub mod usage;

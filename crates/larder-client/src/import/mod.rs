//! CSV table input: sales exports, the recipe matrix and shipment schedules.

pub(crate) mod input;
pub(crate) mod parse;

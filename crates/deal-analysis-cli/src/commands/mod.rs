pub mod deal;
pub mod financing;
pub mod returns;
pub mod valuation;

pub mod ltm;
pub mod multiple;

#[cfg(feature = "sensitivity")]
pub mod sensitivity;

pub use multiple::calculate_valuation;

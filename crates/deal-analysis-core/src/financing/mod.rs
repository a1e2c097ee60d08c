pub mod debt_service;

pub use debt_service::{
    amortization_schedule, calculate_debt_service, AmortizationYear, DebtServiceResult,
    MAX_TERM_YEARS,
};

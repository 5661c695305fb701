pub mod calculator;
pub mod comparison;
pub mod currency;
pub mod repayments;

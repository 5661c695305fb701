pub mod calculator;
pub mod templates;

#[cfg(feature = "comparison")]
pub mod comparison;

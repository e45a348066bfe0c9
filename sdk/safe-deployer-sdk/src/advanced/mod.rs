pub mod builders;
pub mod instructions;

pub mod billing;
pub mod receipt;
pub mod validation;

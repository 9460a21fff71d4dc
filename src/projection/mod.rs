pub mod error;
pub mod lambert;

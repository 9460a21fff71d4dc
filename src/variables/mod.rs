pub mod mapping;
pub mod variable;

pub mod magic;
pub mod tables;

// Core trading value objects
pub mod types;

pub mod input;
pub mod store;

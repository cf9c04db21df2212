pub mod core;
pub mod main;

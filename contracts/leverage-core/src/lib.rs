#![no_std]

pub mod constants;
pub mod errors;
pub mod events;
pub mod interfaces;
pub mod market;
pub mod model;
pub mod quoter;
pub mod types;

pub use errors::LeverageError;
pub use types::*;

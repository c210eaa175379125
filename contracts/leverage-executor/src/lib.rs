#![no_std]

mod contract;
mod decrease;
mod flash;
mod helpers;
mod increase;
mod settlement;
mod storage;
mod swap;
mod token_kind;

pub use contract::*;
pub use storage::VaultConfig;

#[cfg(test)]
mod test;

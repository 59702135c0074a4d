//! Scripts for deploying the protocol's contracts through the task engine.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod chain;
pub mod cli;
mod commands;
pub mod constants;
pub mod errors;
pub mod etherscan;
mod solidity;
pub mod tasks;
pub mod utils;

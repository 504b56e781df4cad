//! Contract bindings for all external contracts.
//!
//! This crate consolidates the Solidity interfaces the console talks to:
//! - ERC20 tokens
//! - Multicall3 (batched token reads)
//!
//! All bindings are generated using alloy's `sol!` macro.

pub mod multicall;
pub mod token;

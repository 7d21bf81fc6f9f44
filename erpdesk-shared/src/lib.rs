#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Shared building blocks for erpdesk: wire models for the ordering API,
//! client configuration, and the order-builder cart.

pub mod cart;
pub mod config;
pub mod models;

//! Wallet Sync - Live account updates for financial views
//!
//! This crate keeps balance, transaction and analytics views current:
//! a push channel with a polling fallback feeds a synchronous in-process
//! event bus, and consumer adapters apply deltas or refetch on signals.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;

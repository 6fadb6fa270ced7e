//! altarb - Latency-arbitrage engine for sports alt-total binary
//! prediction markets.
//!
//! # Architecture
//!
//! ```text
//! Oracle (scores) ─┐
//!                   ├─> Brain (edge evaluation) ─> Sniper (execution) ─> Shield (risk)
//! Watcher (books) ──┘
//! ```
//!
//! Agents are coupled only through the typed, bounded [`bus::EventBus`];
//! [`supervisor`] wires them together and owns the process lifecycle.
//!
//! # Features
//!
//! - `testkit` - Exposes scripted score-feed/order-book-stream/executor
//!   doubles for use from integration tests.

pub mod bus;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;

pub mod brain;
pub mod exchange;
pub mod oracle;
pub mod shield;
pub mod sniper;
pub mod supervisor;
pub mod watcher;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

//! Kalshi-shaped signed transport: the concrete REST/WS implementations
//! of the `MarketLister`, `OrderExecutor`, and `OrderBookStream` seams
//! the rest of the pipeline is built against.

pub mod rest;
pub mod signing;
pub mod ws;

pub use rest::KalshiRestClient;
pub use signing::{load_signer, RequestSigner};
pub use ws::KalshiOrderBookStream;

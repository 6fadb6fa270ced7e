//! Scripted test doubles for the exchange/score-feed seams, gated behind
//! the `testkit` feature so release builds never link them. Grounded on
//! the teacher's `testkit::stream::ScriptedStream` — pre-loaded
//! connect/subscribe results plus a fixed event queue, adapted here to
//! this crate's `OrderBookStream`/`ScoreProvider`/`OrderExecutor` seams
//! instead of `MarketDataStream`.

mod executor;
mod score;
mod stream;

pub use executor::ScriptedExecutor;
pub use score::ScriptedScoreProvider;
pub use stream::ScriptedStream;

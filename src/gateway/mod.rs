//! Remote Computation Client: requests, tagged outcomes, the HTTP gateway and
//! the per-call-site state machine that the views poll.

pub mod call;
pub mod client;
pub mod request;
pub mod response;

#[cfg(test)]
pub mod testing;

// Re-export key components
pub use call::{CallState, ComputationCall, PointCall, SeriesCall};
pub use client::{ComputationGateway, HttpGateway};
pub use request::{BlockNumber, ChainContext, ComputationRequest, HistoricalWindow, RequestKey};
pub use response::{CallError, GatewayOutcome, ModelError, SeriesItemError, SeriesResult, SeriesSample};

//! Wallet portfolio derivation: fetch Sei account data, turn it into a chart
//! series, a timeline and a gain/loss summary, or fall back to labelled
//! synthetic data when the chain cannot be reached.

pub mod fallback;
pub mod fetcher;
pub mod insights;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod series;
pub mod summary;
pub mod trade_data;
pub mod validation;

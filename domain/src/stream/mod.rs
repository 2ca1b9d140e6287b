//! Streamed completion responses.
//!
//! - [`frame`]: `data:` line framing and the strict chunk schema
//! - [`decoder`]: chunk-boundary-safe UTF-8 and line decoding
//! - [`accumulator::AccumulatedMessage`]: the running assistant text
//! - [`phase::StreamPhase`]: lifecycle of one response

pub mod accumulator;
pub mod decoder;
pub mod frame;
pub mod phase;

//! Distillation and batching pipeline for bookmark exports.
//!
//! [`distill`] maps raw export records to the canonical shape, [`batch`]
//! partitions a collection into numbered files, and [`pipeline`] ties both to
//! the JSON artifacts on disk.

pub mod batch;
pub mod distill;
pub mod pipeline;
pub mod stats;

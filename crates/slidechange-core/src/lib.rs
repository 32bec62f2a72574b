//! Detects the moments a video visibly changes, such as slide animation onsets.
//!
//! Frames are compared pairwise, the per-frame change is smoothed, and each
//! peak is traced back to the frame where its change began.

pub mod analysis;
pub mod config;
pub mod debug;
pub mod error;
pub mod grab;
pub mod pipeline;
pub mod report;
pub mod validate;
pub mod video;

//! Kernel module - job queue and generation infrastructure.

pub mod generation;
pub mod jobs;

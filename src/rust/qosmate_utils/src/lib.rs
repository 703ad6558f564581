//! Collection of utility functions shared by the QoSmate flow tools

#![warn(missing_docs)]

/// Utilities for scaling byte counts and rates to human-readable format
pub mod packet_scale;

/// Utilities dealing with wall-clock timestamps
pub mod unix_time;

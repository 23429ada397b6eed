//! Adapter implementations of the domain ports.

pub mod fs;

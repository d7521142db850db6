// src/stabilizer.rs

//! # Stabilizer Module
//!
//! This module provides the shared stabilizer interface and configuration
//! together with the roll axis implementation.

pub mod gimbal_stabilizer;
pub use gimbal_stabilizer::*;
pub mod roll;
pub use roll::*;

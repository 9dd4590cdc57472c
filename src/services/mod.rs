// src/services/mod.rs

pub mod practice;
pub mod stats;

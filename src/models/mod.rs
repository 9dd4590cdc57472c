// src/models/mod.rs

pub mod exam;
pub mod practice_session;
pub mod question;
pub mod stats;

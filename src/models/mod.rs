// src/models/mod.rs

pub mod exam;
pub mod user;

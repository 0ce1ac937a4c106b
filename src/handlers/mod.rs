// src/handlers/mod.rs
pub mod error;
pub mod market;
pub mod recommend;

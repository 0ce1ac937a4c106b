// src/services/mod.rs
pub mod classifier;
pub mod encoders;
pub mod features;
pub mod mandi;
pub mod recommend;

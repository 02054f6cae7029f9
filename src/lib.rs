// src/lib.rs

//! quakewatch library
//!
//! Fetches a seismic event feed, keeps the events tagged with one country,
//! and announces each new event exactly once.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

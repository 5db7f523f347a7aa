// src/ingest/providers/mod.rs
pub mod espn;
pub mod openliga;

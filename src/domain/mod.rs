// src/domain/mod.rs

//! Quiz rules independent of HTTP and storage.

pub mod access;
pub mod challenge;
pub mod grader;
pub mod leaderboard;

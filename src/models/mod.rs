// src/models/mod.rs

pub mod category;
pub mod challenge;
pub mod dashboard;
pub mod leaderboard;
pub mod question;
pub mod score;
pub mod user;

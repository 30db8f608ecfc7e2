// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod category;
pub mod challenge;
pub mod docs;
pub mod leaderboard;
pub mod profile;
pub mod question;

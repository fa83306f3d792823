// src/models/mod.rs

pub mod admin;
pub mod profile;
pub mod question;
pub mod result;

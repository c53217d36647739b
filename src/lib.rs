//! Kewit onboarding core — sign-up flow for a local-live-music app.

pub mod backend;
pub mod config;
pub mod error;
pub mod nav;
pub mod onboarding;

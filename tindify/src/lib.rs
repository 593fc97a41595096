//! Tindify - swipe through Spotify recommendations
//!
//! This library wraps the Spotify Web API with a rate-limit aware client,
//! builds the swipe actions (recommend, like, pass) on top of it and serves
//! them to the browser as a small JSON API.

/// Domain actions over the Spotify API
pub mod actions;
/// Client modules for interacting with Spotify
pub mod clients;
/// Environment and builder based configuration
pub mod config;
/// Browser player events and device tracking
pub mod playback;
/// HTTP API served to the browser
pub mod server;
/// Swipe session orchestration
pub mod swipe;

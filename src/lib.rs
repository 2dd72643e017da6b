//! Arena Server - authoritative multiplayer vehicle arena
//!
//! One task owns the simulation and applies every mutation in order.
//! Observers connect over WebSocket, send key transitions and mirror the
//! resulting deltas. A scripted boss plays through the same input surface.

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod mirror;
pub mod util;
pub mod ws;

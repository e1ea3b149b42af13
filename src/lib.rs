//! A small fantasy console: a host-bound frame driver presents a fixed
//! 256x192 tile-and-sprite canvas while the guest owns a per-session
//! console state and mutates it between frame advances.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interface;

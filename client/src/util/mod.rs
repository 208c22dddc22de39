//! Utility helpers shared across client modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules isolate browser/environment concerns (storage, location,
//! task spawning) from the auth state machine to improve reuse and
//! testability.

pub mod auth;
pub mod navigation;
pub mod redirect_memory;
pub mod storage;

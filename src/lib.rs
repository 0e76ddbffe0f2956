//! OSC Deck - stateful dispatch of control-surface buttons and knobs to
//! Open Sound Control over UDP.
//!
//! The [`engine::Engine`] is the host-facing entry point. It keeps the current
//! value of every OSC address in an [`state::AddressStore`], sends messages
//! through an [`osc::Transport`] and paints feedback images with the
//! [`render::FeedbackRenderer`].

pub mod actions;
pub mod config;
pub mod engine;
pub mod osc;
pub mod paths;
pub mod render;
pub mod state;

pub use engine::Engine;

//! State management module - current value per OSC address
//!
//! This module provides the address store shared by every action and by the
//! feedback renderer. Two controls bound to the same address observe and
//! mutate the same value.

mod store;

pub use store::AddressStore;

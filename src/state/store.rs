//! AddressStore - Current value per OSC address
//!
//! Every action bound to the same address string reads and mutates the same
//! entry. Unseen addresses are registered lazily with a value of 0.

use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared map of OSC address to the last value sent there
///
/// Cloning is cheap and yields a handle to the same underlying map.
#[derive(Clone, Default)]
pub struct AddressStore {
    values: Arc<DashMap<String, Decimal>>,
}

impl AddressStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current value, registering the address at 0 if unseen
    pub fn get(&self, address: &str) -> Decimal {
        if let Some(value) = self.values.get(address) {
            return *value;
        }
        *self
            .values
            .entry(address.to_string())
            .or_insert(Decimal::ZERO)
    }

    /// Overwrite the value for an address
    pub fn set(&self, address: &str, value: Decimal) {
        self.values.insert(address.to_string(), value);
    }

    /// Read-modify-write under the entry lock, returning the new value
    ///
    /// The closure receives the current value (0 when unseen).
    pub fn update<F>(&self, address: &str, f: F) -> Decimal
    where
        F: FnOnce(Decimal) -> Decimal,
    {
        let mut entry = self
            .values
            .entry(address.to_string())
            .or_insert(Decimal::ZERO);
        let next = f(*entry);
        *entry = next;
        next
    }

    /// Whether the address has been referenced yet
    pub fn contains(&self, address: &str) -> bool {
        self.values.contains_key(address)
    }

    /// Number of registered addresses
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Ordered copy of every address and its value
    pub fn snapshot(&self) -> BTreeMap<String, Decimal> {
        self.values
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }
}

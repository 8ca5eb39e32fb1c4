//! Runtime metadata, version info and decoded events.
//!
//! [`RuntimeMetadata`] is the part of the chain metadata this crate needs: for
//! each pallet its index, call indices, event names and storage items. The
//! chain-client collaborator produces it from the node's full metadata.

use std::collections::BTreeMap;

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Lookup table over the runtime's pallets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeMetadata {
    pallets: BTreeMap<String, PalletMetadata>,
}

/// Calls, events and storage items of one pallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PalletMetadata {
    pub index: u8,
    pub calls: BTreeMap<String, u8>,
    pub events: Vec<String>,
    pub storage: Vec<String>,
}

impl RuntimeMetadata {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a pallet.
    pub fn with_pallet(mut self, name: impl Into<String>, pallet: PalletMetadata) -> Self {
        self.pallets.insert(name.into(), pallet);
        self
    }

    /// Resolve `(pallet index, call index)` for a call.
    pub fn call_index(&self, pallet: &str, call: &str) -> Option<(u8, u8)> {
        let p = self.pallets.get(pallet)?;
        p.calls.get(call).map(|c| (p.index, *c))
    }

    /// Whether the runtime declares the given event.
    pub fn has_event(&self, pallet: &str, event: &str) -> bool {
        self.pallets
            .get(pallet)
            .is_some_and(|p| p.events.iter().any(|e| e == event))
    }

    /// Whether the runtime declares the given storage item.
    pub fn has_storage(&self, pallet: &str, item: &str) -> bool {
        self.pallets
            .get(pallet)
            .is_some_and(|p| p.storage.iter().any(|s| s == item))
    }

    /// True if no pallets are known.
    pub fn is_empty(&self) -> bool {
        self.pallets.is_empty()
    }
}

impl PalletMetadata {
    pub fn new(index: u8) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    pub fn call(mut self, name: impl Into<String>, index: u8) -> Self {
        self.calls.insert(name.into(), index);
        self
    }

    pub fn event(mut self, name: impl Into<String>) -> Self {
        self.events.push(name.into());
        self
    }

    pub fn storage(mut self, name: impl Into<String>) -> Self {
        self.storage.push(name.into());
        self
    }
}

/// Runtime version as reported by `state_getRuntimeVersion`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeVersion {
    pub spec_name: String,
    pub spec_version: u32,
    pub transaction_version: u32,
}

/// Chain properties as reported by `system_properties`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainProperties {
    pub token_symbol: String,
    pub token_decimals: u8,
    pub ss58_format: u16,
}

/// A fully hashed storage key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StorageKey(pub Vec<u8>);

impl StorageKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for StorageKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// When in the block an event was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum Phase {
    ApplyExtrinsic(u32),
    Finalization,
    Initialization,
}

/// One decoded entry of a block's event log.
///
/// `fields` holds the SCALE encoding of the event's fields; use
/// [`EventRecord::decode_fields`] to read a typed payload.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct EventRecord {
    pub phase: Phase,
    pub pallet: String,
    pub variant: String,
    pub fields: Vec<u8>,
}

impl EventRecord {
    pub fn new(
        phase: Phase,
        pallet: impl Into<String>,
        variant: impl Into<String>,
        fields: Vec<u8>,
    ) -> Self {
        Self {
            phase,
            pallet: pallet.into(),
            variant: variant.into(),
            fields,
        }
    }

    /// Whether this is the `pallet.variant` event.
    pub fn is(&self, pallet: &str, variant: &str) -> bool {
        self.pallet == pallet && self.variant == variant
    }

    /// Decode the event fields as `T`, requiring all bytes to be consumed.
    pub fn decode_fields<T: Decode>(&self) -> Result<T, parity_scale_codec::Error> {
        let mut input = self.fields.as_slice();
        let value = T::decode(&mut input)?;
        if !input.is_empty() {
            return Err("trailing bytes after event fields".into());
        }
        Ok(value)
    }
}

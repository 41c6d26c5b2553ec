//! Contract storage-update variants.
//!
//! The wire schema distinguishes a direct slot write from a write routed
//! through a mapping. Both travel as a tagged union; an input lacking any
//! known discriminant is a decode error, never a default.

use crate::error::ProtoError;

/// Direct write to a raw storage slot.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RawSlotUpdate {
    /// 32-byte slot address.
    #[prost(bytes = "vec", tag = "1")]
    pub slot: Vec<u8>,
    /// Value written to the slot.
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

/// Write to a mapping entry, addressed by key or by key preimage.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MappedEntryUpdate {
    /// Entry key; exactly one addressing mode is set.
    #[prost(oneof = "mapped_entry_update::Key", tags = "1, 2")]
    pub key: Option<mapped_entry_update::Key>,
    /// Value written to the entry.
    #[prost(bytes = "vec", tag = "3")]
    pub value: Vec<u8>,
}

/// Nested types for [`MappedEntryUpdate`].
pub mod mapped_entry_update {
    /// Mapping-entry addressing modes.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Key {
        /// The hashed key itself.
        #[prost(bytes = "vec", tag = "1")]
        Explicit(Vec<u8>),
        /// Preimage from which the node derives the key.
        #[prost(bytes = "vec", tag = "2")]
        Preimage(Vec<u8>),
    }
}

/// One storage update on the wire.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StorageUpdate {
    /// Update variant.
    #[prost(oneof = "storage_update::Kind", tags = "1, 2")]
    pub kind: Option<storage_update::Kind>,
}

/// Nested types for [`StorageUpdate`].
pub mod storage_update {
    /// Storage-update variants.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Kind {
        /// Direct slot write.
        #[prost(message, tag = "1")]
        RawSlot(super::RawSlotUpdate),
        /// Mapping-entry write.
        #[prost(message, tag = "2")]
        MappedEntry(super::MappedEntryUpdate),
    }
}

/// Mapping-entry key: either the key itself or the preimage it derives from.
///
/// A two-variant enum rather than two optional fields, so both-set and
/// neither-set are unrepresentable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MappingKey {
    /// The hashed key itself.
    Explicit(Vec<u8>),
    /// Preimage from which the node derives the key.
    Derived {
        /// Key preimage bytes.
        preimage: Vec<u8>,
    },
}

/// Domain-level storage write, the closed sum over the wire variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageWrite {
    /// Direct write to a raw slot.
    RawSlot {
        /// 32-byte slot address.
        slot: Vec<u8>,
        /// Value written to the slot.
        value: Vec<u8>,
    },
    /// Write to a mapping entry.
    MappedEntry {
        /// Entry addressing mode.
        key: MappingKey,
        /// Value written to the entry.
        value: Vec<u8>,
    },
}

impl StorageWrite {
    /// Encode to the wire representation.
    pub fn to_wire(&self) -> StorageUpdate {
        let kind = match self {
            StorageWrite::RawSlot { slot, value } => {
                storage_update::Kind::RawSlot(RawSlotUpdate {
                    slot: slot.clone(),
                    value: value.clone(),
                })
            }
            StorageWrite::MappedEntry { key, value } => {
                let key = match key {
                    MappingKey::Explicit(bytes) => {
                        mapped_entry_update::Key::Explicit(bytes.clone())
                    }
                    MappingKey::Derived { preimage } => {
                        mapped_entry_update::Key::Preimage(preimage.clone())
                    }
                };
                storage_update::Kind::MappedEntry(MappedEntryUpdate {
                    key: Some(key),
                    value: value.clone(),
                })
            }
        };
        StorageUpdate { kind: Some(kind) }
    }

    /// Decode from the wire representation.
    ///
    /// A missing or unrecognized discriminant fails: the schema is closed
    /// and silently defaulting a write variant would corrupt state.
    pub fn from_wire(update: &StorageUpdate) -> Result<Self, ProtoError> {
        match &update.kind {
            Some(storage_update::Kind::RawSlot(raw)) => Ok(StorageWrite::RawSlot {
                slot: raw.slot.clone(),
                value: raw.value.clone(),
            }),
            Some(storage_update::Kind::MappedEntry(entry)) => {
                let key = match &entry.key {
                    Some(mapped_entry_update::Key::Explicit(bytes)) => {
                        MappingKey::Explicit(bytes.clone())
                    }
                    Some(mapped_entry_update::Key::Preimage(preimage)) => MappingKey::Derived {
                        preimage: preimage.clone(),
                    },
                    None => {
                        return Err(ProtoError::UnknownDiscriminant {
                            field: "MappedEntryUpdate.key",
                        })
                    }
                };
                Ok(StorageWrite::MappedEntry {
                    key,
                    value: entry.value.clone(),
                })
            }
            None => Err(ProtoError::UnknownDiscriminant {
                field: "StorageUpdate.kind",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_raw_slot_roundtrip() {
        let write = StorageWrite::RawSlot {
            slot: vec![0xAA; 32],
            value: vec![1, 2, 3],
        };
        let decoded = StorageWrite::from_wire(&write.to_wire()).expect("roundtrip");
        assert_eq!(decoded, write);
    }

    #[test]
    fn test_mapped_entry_roundtrip() {
        for key in [
            MappingKey::Explicit(vec![0xBB; 32]),
            MappingKey::Derived {
                preimage: b"user:42".to_vec(),
            },
        ] {
            let write = StorageWrite::MappedEntry {
                key,
                value: vec![9],
            };
            let decoded = StorageWrite::from_wire(&write.to_wire()).expect("roundtrip");
            assert_eq!(decoded, write);
        }
    }

    #[test]
    fn test_missing_discriminant_is_error() {
        let update = StorageUpdate { kind: None };
        assert!(matches!(
            StorageWrite::from_wire(&update),
            Err(ProtoError::UnknownDiscriminant {
                field: "StorageUpdate.kind"
            })
        ));
    }

    #[test]
    fn test_missing_key_discriminant_is_error() {
        let update = StorageUpdate {
            kind: Some(storage_update::Kind::MappedEntry(MappedEntryUpdate {
                key: None,
                value: vec![1],
            })),
        };
        assert!(matches!(
            StorageWrite::from_wire(&update),
            Err(ProtoError::UnknownDiscriminant {
                field: "MappedEntryUpdate.key"
            })
        ));
    }

    #[test]
    fn test_unknown_wire_field_still_decodes_known_variant() {
        // A decoder must tolerate unknown *fields* (forward compatibility)
        // while rejecting an absent discriminant.
        let write = StorageWrite::RawSlot {
            slot: vec![1; 32],
            value: vec![2],
        };
        let bytes = write.to_wire().encode_to_vec();
        let decoded = StorageUpdate::decode(bytes.as_slice()).expect("decode");
        assert_eq!(StorageWrite::from_wire(&decoded).expect("known"), write);
    }
}

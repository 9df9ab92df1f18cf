use super::Cipher;
use crate::StreamKind;
use log::debug;
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};

/// Cache key of a constructed cipher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CipherSlot {
    pub key: u64,
    pub kind: StreamKind,
}

impl CipherSlot {
    pub fn new(key: u64, kind: StreamKind) -> Self {
        Self { key, kind }
    }
}

/// Ciphers shared by every demux run of a session.
///
/// Construction is idempotent and ciphers are immutable afterwards, so a
/// slot is filled at most once and handed out as [`Arc`].
#[derive(Default)]
pub struct CipherCache {
    slots: Mutex<HashMap<CipherSlot, Arc<Cipher>>>,
}

impl CipherCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: CipherSlot) -> Arc<Cipher> {
        self.slots
            .lock()
            .entry(slot)
            .or_insert_with(|| {
                debug!("Building {} cipher for key {}", slot.kind, slot.key);
                Arc::new(Cipher::for_slot(slot))
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    pub fn clear(&self) {
        self.slots.lock().clear();
    }
}

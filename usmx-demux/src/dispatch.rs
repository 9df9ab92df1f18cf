use crate::{
    Chunk, StreamKind,
    cipher::{Cipher, CipherCache, CipherSlot},
};
use log::trace;
use std::sync::Arc;

/// Key used for audio chunks in place of the container key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SecondaryKey {
    #[default]
    Unset,
    ReusePrimary,
    Explicit(u64),
}

impl From<u64> for SecondaryKey {
    /// `0` means unset and `1` reuses the primary key.
    fn from(value: u64) -> Self {
        match value {
            0 => Self::Unset,
            1 => Self::ReusePrimary,
            key => Self::Explicit(key),
        }
    }
}

/// Decryption settings of one container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Keys {
    /// Container key, `0` disables every transform.
    pub key: u64,
    /// Decrypt audio with the container key when no secondary key is set.
    pub audio_encrypt: bool,
    pub secondary: SecondaryKey,
}

impl Keys {
    pub fn new(key: u64) -> Self {
        Self {
            key,
            ..Default::default()
        }
    }

    pub fn audio_encrypt(mut self, audio_encrypt: bool) -> Self {
        self.audio_encrypt = audio_encrypt;
        self
    }

    pub fn secondary(mut self, secondary: SecondaryKey) -> Self {
        self.secondary = secondary;
        self
    }
}

/// Applies the configured transform to each chunk payload.
#[derive(Default)]
pub struct Dispatcher {
    primary: Option<Arc<Cipher>>,
    secondary: Option<Arc<Cipher>>,
    audio_encrypt: bool,
}

impl Dispatcher {
    pub fn new(keys: Keys, cache: &CipherCache) -> Self {
        if keys.key == 0 {
            return Self::default();
        }

        let secondary = match keys.secondary {
            SecondaryKey::Unset => None,
            SecondaryKey::ReusePrimary => Some(keys.key),
            SecondaryKey::Explicit(key) => Some(key),
        };

        Self {
            primary: Some(cache.get(CipherSlot::new(keys.key, StreamKind::Video))),
            secondary: secondary.map(|key| cache.get(CipherSlot::new(key, StreamKind::Audio))),
            audio_encrypt: keys.audio_encrypt,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.primary.is_some()
    }

    /// Returns `true` when a transform was applied.
    pub fn decrypt(&self, chunk: &mut Chunk) -> bool {
        let cipher = match chunk.kind {
            StreamKind::Video => self.primary.as_ref(),
            StreamKind::Audio => self
                .secondary
                .as_ref()
                .or(self.primary.as_ref().filter(|_| self.audio_encrypt)),
        };

        match cipher {
            Some(cipher) if cipher.supports(chunk.kind) => match chunk.kind {
                StreamKind::Video => cipher.decrypt_video(&mut chunk.payload),
                StreamKind::Audio => cipher.decrypt_audio(&mut chunk.payload),
            },
            Some(_) => {
                trace!("No {} transform for chunk {}", chunk.kind, chunk.index);
                false
            }
            None => false,
        }
    }
}

//! Keyed payload transforms.
//!
//! A [`Cipher`] declares at construction which payload kinds it can
//! transform. Asking a cipher for a transform it does not have leaves the
//! payload untouched.
//!
//! | variant | video | audio |
//! |---------|-------|-------|
//! | `Null` | - | - |
//! | `Video` | USM mask | - |
//! | `Audio` | - | HCA table |
//! | `Combined` | USM mask | USM mask |

mod cache;
mod hca;
mod usm;

pub use cache::{CipherCache, CipherSlot};
pub use hca::HcaTable;
pub use usm::UsmMask;

use crate::StreamKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cipher {
    Null,
    Video(UsmMask),
    Audio(HcaTable),
    Combined(UsmMask),
}

impl Cipher {
    /// Builds the cipher stored in a cache slot.
    ///
    /// The video slot holds the container cipher (both USM masks), the audio
    /// slot holds the audio codec cipher. A zero key builds [`Cipher::Null`].
    pub fn for_slot(slot: CipherSlot) -> Self {
        match (slot.key, slot.kind) {
            (0, _) => Self::Null,
            (key, StreamKind::Video) => Self::Combined(UsmMask::new(key)),
            (key, StreamKind::Audio) => Self::Audio(HcaTable::new(key)),
        }
    }

    pub fn supports(&self, kind: StreamKind) -> bool {
        matches!(
            (self, kind),
            (Self::Video(_) | Self::Combined(_), StreamKind::Video)
                | (Self::Audio(_) | Self::Combined(_), StreamKind::Audio)
        )
    }

    /// Returns `false` when the cipher has no video transform.
    pub fn decrypt_video(&self, data: &mut [u8]) -> bool {
        match self {
            Self::Video(mask) | Self::Combined(mask) => {
                mask.decrypt_video(data);
                true
            }
            Self::Null | Self::Audio(_) => false,
        }
    }

    /// Returns `false` when the cipher has no audio transform.
    pub fn decrypt_audio(&self, data: &mut [u8]) -> bool {
        match self {
            Self::Audio(table) => {
                table.decrypt(data);
                true
            }
            Self::Combined(mask) => {
                mask.crypt_audio(data);
                true
            }
            Self::Null | Self::Video(_) => false,
        }
    }
}

//! XOR mask transforms of the USM container itself.

const AUDIO_TAIL: &[u8; 4] = b"URUC";

/// Video and audio masks expanded from a 64 bit container key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UsmMask {
    video_mask1: [u8; 0x20],
    video_mask2: [u8; 0x20],
    audio_mask: [u8; 0x20],
}

impl UsmMask {
    pub fn new(key: u64) -> Self {
        let c = key.to_le_bytes();
        let mut t = [0u8; 0x20];

        t[0x00] = c[0];
        t[0x01] = c[1];
        t[0x02] = c[2];
        t[0x03] = c[3].wrapping_sub(0x34);
        t[0x04] = c[4].wrapping_add(0xF9);
        t[0x05] = c[5] ^ 0x13;
        t[0x06] = c[6].wrapping_add(0x61);
        t[0x07] = t[0x00] ^ 0xFF;
        t[0x08] = t[0x01].wrapping_add(t[0x02]);
        t[0x09] = t[0x01].wrapping_sub(t[0x07]);
        t[0x0A] = t[0x02] ^ 0xFF;
        t[0x0B] = t[0x01] ^ 0xFF;
        t[0x0C] = t[0x0B].wrapping_add(t[0x09]);
        t[0x0D] = t[0x08].wrapping_sub(t[0x03]);
        t[0x0E] = t[0x0D] ^ 0xFF;
        t[0x0F] = t[0x0A].wrapping_sub(t[0x0B]);
        t[0x10] = t[0x08].wrapping_sub(t[0x0F]);
        t[0x11] = t[0x10] ^ t[0x07];
        t[0x12] = t[0x0F] ^ 0xFF;
        t[0x13] = t[0x03] ^ 0x10;
        t[0x14] = t[0x04].wrapping_sub(0x32);
        t[0x15] = t[0x05].wrapping_add(0xED);
        t[0x16] = t[0x06] ^ 0xF3;
        t[0x17] = t[0x13].wrapping_sub(t[0x0F]);
        t[0x18] = t[0x15].wrapping_add(t[0x07]);
        t[0x19] = 0x21u8.wrapping_sub(t[0x13]);
        t[0x1A] = t[0x14] ^ t[0x17];
        t[0x1B] = t[0x16].wrapping_add(t[0x16]);
        t[0x1C] = t[0x17].wrapping_add(0x44);
        t[0x1D] = t[0x03].wrapping_add(t[0x04]);
        t[0x1E] = t[0x05].wrapping_sub(t[0x16]);
        t[0x1F] = t[0x1D] ^ t[0x13];

        let mut video_mask2 = [0u8; 0x20];
        let mut audio_mask = [0u8; 0x20];

        for i in 0..0x20 {
            video_mask2[i] = t[i] ^ 0xFF;
            audio_mask[i] = if i & 1 == 1 {
                AUDIO_TAIL[(i >> 1) & 3]
            } else {
                t[i] ^ 0xFF
            };
        }

        Self {
            video_mask1: t,
            video_mask2,
            audio_mask,
        }
    }

    /// Frames shorter than 0x240 bytes are stored in clear.
    pub fn decrypt_video(&self, data: &mut [u8]) {
        if data.len() < 0x240 {
            return;
        }

        let encrypted_size = data.len() - 0x40;
        let mut mask = self.video_mask2;

        for i in 0x100..encrypted_size {
            data[0x40 + i] ^= mask[i & 0x1F];
            mask[i & 0x1F] = data[0x40 + i] ^ self.video_mask2[i & 0x1F];
        }

        let mut mask = self.video_mask1;

        for i in 0..0x100 {
            mask[i & 0x1F] ^= data[0x140 + i];
            data[0x40 + i] ^= mask[i & 0x1F];
        }
    }

    pub fn crypt_audio(&self, data: &mut [u8]) {
        for (i, byte) in data.iter_mut().enumerate().skip(0x140) {
            *byte ^= self.audio_mask[i & 0x1F];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_video_frame_untouched() {
        let mask = UsmMask::new(0x1234_5678_9ABC_DEF0);
        let mut data = vec![0x55; 0x23F];
        mask.decrypt_video(&mut data);
        assert_eq!(data, vec![0x55; 0x23F]);
    }

    #[test]
    fn test_video_frame_header_untouched() {
        let mask = UsmMask::new(0x1234_5678_9ABC_DEF0);
        let mut data = (0..0x400).map(|x| x as u8).collect::<Vec<_>>();
        let original = data.clone();
        mask.decrypt_video(&mut data);
        assert_eq!(data[..0x40], original[..0x40]);
        assert_ne!(data[0x40..], original[0x40..]);
    }

    #[test]
    fn test_audio_crypt_is_involution() {
        let mask = UsmMask::new(42);
        let original = (0..0x200).map(|x| (x * 7) as u8).collect::<Vec<_>>();
        let mut data = original.clone();
        mask.crypt_audio(&mut data);
        assert_eq!(data[..0x140], original[..0x140]);
        assert_ne!(data, original);
        mask.crypt_audio(&mut data);
        assert_eq!(data, original);
    }

    #[test]
    fn test_audio_mask_interleaves_tail() {
        let mask = UsmMask::new(0);
        assert_eq!(mask.audio_mask[1], b'U');
        assert_eq!(mask.audio_mask[3], b'R');
        assert_eq!(mask.audio_mask[5], b'U');
        assert_eq!(mask.audio_mask[7], b'C');
        assert_eq!(mask.audio_mask[0], mask.video_mask2[0]);
    }
}

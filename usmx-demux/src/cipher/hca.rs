//! Keyed byte substitution used by HCA audio.

/// Decryption table for HCA cipher type 56.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HcaTable {
    table: [u8; 0x100],
}

impl HcaTable {
    pub fn new(key: u64) -> Self {
        let mut keycode = key.saturating_sub(1);
        let mut kc = [0u8; 7];

        for byte in kc.iter_mut() {
            *byte = keycode as u8;
            keycode >>= 8;
        }

        let seed = [
            kc[1],
            kc[1] ^ kc[6],
            kc[2] ^ kc[3],
            kc[2],
            kc[2] ^ kc[1],
            kc[3] ^ kc[4],
            kc[3],
            kc[3] ^ kc[2],
            kc[4] ^ kc[5],
            kc[4],
            kc[4] ^ kc[3],
            kc[5] ^ kc[6],
            kc[5],
            kc[5] ^ kc[4],
            kc[6] ^ kc[1],
            kc[6],
        ];

        let rows = Self::nibbles(kc[0]);
        let mut base = [0u8; 0x100];

        for (r, seed) in seed.iter().enumerate() {
            let columns = Self::nibbles(*seed);
            for (c, column) in columns.iter().enumerate() {
                base[r * 16 + c] = (rows[r] << 4) | column;
            }
        }

        let mut table = [0u8; 0x100];
        let mut x = 0usize;
        let mut pos = 1;

        for _ in 0..0x100 {
            x = (x + 17) & 0xFF;
            if base[x] != 0 && base[x] != 0xFF && pos < 0xFF {
                table[pos] = base[x];
                pos += 1;
            }
        }

        table[0] = 0;
        table[0xFF] = 0xFF;
        Self { table }
    }

    fn nibbles(key: u8) -> [u8; 16] {
        let mul = ((key & 1) << 3) | 5;
        let add = (key & 0xE) | 1;
        let mut key = key >> 4;
        let mut out = [0u8; 16];

        for value in out.iter_mut() {
            key = (key.wrapping_mul(mul).wrapping_add(add)) & 0xF;
            *value = key;
        }

        out
    }

    pub fn decrypt(&self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            *byte = self.table[*byte as usize];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_permutation() {
        let table = HcaTable::new(0x0030_D9E8_9A4D_1C3F);
        let mut seen = [false; 0x100];
        for value in table.table {
            seen[value as usize] = true;
        }
        assert!(seen.iter().all(|x| *x));
    }

    #[test]
    fn test_fixed_points() {
        let table = HcaTable::new(123_456_789);
        let mut data = [0x00, 0xFF];
        table.decrypt(&mut data);
        assert_eq!(data, [0x00, 0xFF]);
    }
}

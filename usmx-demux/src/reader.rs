use std::io::{ErrorKind, Read, Result};

/// Big endian reader over a byte stream which keeps track of its position.
pub struct Reader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> Reader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    pub fn get_position(&self) -> u64 {
        self.position
    }

    /// Reads exactly `buf.len()` bytes, or returns `Ok(false)` when the stream
    /// was already at its end. A stream ending inside `buf` is an error.
    pub fn read_exact_or_eof(&mut self, buf: &mut [u8]) -> Result<bool> {
        let mut filled = 0;

        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        self.position += filled as u64;

        if filled == 0 {
            Ok(false)
        } else if filled < buf.len() {
            Err(ErrorKind::UnexpectedEof.into())
        } else {
            Ok(true)
        }
    }

    pub fn skip(&mut self, bytes: u64) -> Result<()> {
        let skipped = std::io::copy(&mut (&mut self.inner).take(bytes), &mut std::io::sink())?;
        self.position += skipped;

        if skipped < bytes {
            return Err(ErrorKind::UnexpectedEof.into());
        }

        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    pub fn read_bytes(&mut self, bytes: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0; bytes];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf)?;
        self.position += buf.len() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_big_endian() {
        let mut reader = Reader::new(Cursor::new(vec![0x01, 0x02, 0x00, 0x00, 0x01, 0x00, 0xFF]));
        assert_eq!(reader.read_u16().unwrap(), 0x0102);
        assert_eq!(reader.read_u32().unwrap(), 0x0100);
        assert_eq!(reader.get_position(), 6);
        assert_eq!(reader.read_u8().unwrap(), 0xFF);
    }

    #[test]
    fn test_read_exact_or_eof() {
        let mut reader = Reader::new(Cursor::new(vec![1, 2, 3]));
        let mut buf = [0; 2];
        assert!(reader.read_exact_or_eof(&mut buf).unwrap());
        assert!(reader.read_exact_or_eof(&mut buf).is_err());

        let mut reader = Reader::new(Cursor::new(Vec::new()));
        assert!(!reader.read_exact_or_eof(&mut buf).unwrap());
    }

    #[test]
    fn test_skip_past_end() {
        let mut reader = Reader::new(Cursor::new(vec![0; 4]));
        assert!(reader.skip(3).is_ok());
        assert!(reader.skip(3).is_err());
    }
}

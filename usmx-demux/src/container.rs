//! Streaming tokenizer for USM containers.
//!
//! Every chunk starts with a 4 byte signature and a big endian size of the
//! remaining chunk bytes, followed by a 24 byte header:
//!
//! | bytes | field |
//! |-------|-------|
//! | 1 | reserved |
//! | 1 | payload offset (counted from the end of the size field) |
//! | 2 | padding size |
//! | 1 | channel number |
//! | 2 | reserved |
//! | 1 | payload type (0 = stream data) |
//! | 4 | frame time |
//! | 4 | frame rate |
//! | 8 | reserved |

use crate::{Chunk, ChannelFilter, Error, Result, StreamKind, reader::Reader};
use log::trace;
use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

const HEADER_SIZE: u8 = 0x18;
const PAYLOAD_TYPE_STREAM: u8 = 0;

/// Lazy chunk sequence read from a USM container.
///
/// Only stream data of video and audio chunks is yielded. Sequence indices
/// are assigned in yield order, after channel filtering.
pub struct UsmFile<R> {
    reader: Reader<R>,
    filter: ChannelFilter,
    next_index: u64,
    finished: bool,
}

impl UsmFile<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: Read> UsmFile<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: Reader::new(inner),
            filter: ChannelFilter::default(),
            next_index: 0,
            finished: false,
        }
    }

    pub fn filter(mut self, filter: ChannelFilter) -> Self {
        self.filter = filter;
        self
    }

    fn read_chunk(&mut self) -> Result<Option<Chunk>> {
        loop {
            let offset = self.reader.get_position();
            let truncated = |e: io::Error| match e.kind() {
                io::ErrorKind::UnexpectedEof => Error::Truncated {
                    offset,
                    reason: e.to_string(),
                },
                _ => Error::Io(e),
            };

            let mut signature = [0; 4];
            if !self
                .reader
                .read_exact_or_eof(&mut signature)
                .map_err(truncated)?
            {
                return Ok(None);
            }

            let kind = match &signature {
                b"@SFV" => Some(StreamKind::Video),
                b"@SFA" => Some(StreamKind::Audio),
                b"CRID" | b"@ALP" | b"@CUE" | b"@SBT" => None,
                _ => return Err(Error::InvalidSignature(signature, offset)),
            };

            let size = self.reader.read_u32().map_err(truncated)?;
            self.reader.skip(1).map_err(truncated)?;
            let payload_offset = self.reader.read_u8().map_err(truncated)?;
            let padding = self.reader.read_u16().map_err(truncated)?;
            let channel = self.reader.read_u8().map_err(truncated)?;
            self.reader.skip(2).map_err(truncated)?;
            let payload_type = self.reader.read_u8().map_err(truncated)?;
            let _frame_time = self.reader.read_u32().map_err(truncated)?;
            let _frame_rate = self.reader.read_u32().map_err(truncated)?;
            self.reader.skip(8).map_err(truncated)?;

            if payload_offset < HEADER_SIZE
                || (payload_offset as u64 + padding as u64) > size as u64
            {
                return Err(Error::Malformed {
                    offset,
                    size,
                    payload_offset,
                    padding,
                });
            }

            self.reader
                .skip((payload_offset - HEADER_SIZE) as u64)
                .map_err(truncated)?;
            let payload_size = size as u64 - payload_offset as u64 - padding as u64;

            let wanted = match kind {
                Some(kind) => {
                    payload_type == PAYLOAD_TYPE_STREAM && self.filter.allows(kind, channel)
                }
                None => false,
            };

            if let (true, Some(kind)) = (wanted, kind) {
                let payload = self
                    .reader
                    .read_bytes(payload_size as usize)
                    .map_err(truncated)?;
                self.reader.skip(padding as u64).map_err(truncated)?;

                let chunk = Chunk::new(kind, channel, self.next_index, payload);
                self.next_index += 1;
                return Ok(Some(chunk));
            }

            trace!(
                "Skipping {} chunk at offset {} (channel {}, type {})",
                String::from_utf8_lossy(&signature),
                offset,
                channel,
                payload_type
            );
            self.reader
                .skip(payload_size + padding as u64)
                .map_err(truncated)?;
        }
    }
}

impl<R: Read> Iterator for UsmFile<R> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.read_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Encodes one chunk in USM layout. Used to build containers in tests.
#[doc(hidden)]
pub fn encode_chunk(
    signature: &[u8; 4],
    channel: u8,
    payload_type: u8,
    payload: &[u8],
    padding: u16,
) -> Vec<u8> {
    let size = HEADER_SIZE as u32 + payload.len() as u32 + padding as u32;
    let mut data = Vec::with_capacity(8 + size as usize);
    data.extend_from_slice(signature);
    data.extend_from_slice(&size.to_be_bytes());
    data.push(0);
    data.push(HEADER_SIZE);
    data.extend_from_slice(&padding.to_be_bytes());
    data.push(channel);
    data.extend_from_slice(&[0, 0]);
    data.push(payload_type);
    data.extend_from_slice(&0u32.to_be_bytes());
    data.extend_from_slice(&2997u32.to_be_bytes());
    data.extend_from_slice(&[0; 8]);
    data.extend_from_slice(payload);
    data.resize(data.len() + padding as usize, 0);
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend(encode_chunk(b"CRID", 0, 1, b"header", 2));
        data.extend(encode_chunk(b"@SFV", 0, 1, b"video header", 0));
        data.extend(encode_chunk(b"@SFV", 0, 0, b"frame-0", 3));
        data.extend(encode_chunk(b"@SFA", 1, 0, b"audio-0", 0));
        data.extend(encode_chunk(b"@SFV", 0, 0, b"frame-1", 0));
        data.extend(encode_chunk(b"@SFV", 0, 2, b"#CONTENTS END", 0));
        data
    }

    #[test]
    fn test_yields_stream_data_only() {
        let chunks = UsmFile::new(Cursor::new(sample()))
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], Chunk::new(StreamKind::Video, 0, 0, b"frame-0".to_vec()));
        assert_eq!(chunks[1], Chunk::new(StreamKind::Audio, 1, 1, b"audio-0".to_vec()));
        assert_eq!(chunks[2], Chunk::new(StreamKind::Video, 0, 2, b"frame-1".to_vec()));
    }

    #[test]
    fn test_filter_keeps_indices_contiguous() {
        let chunks = UsmFile::new(Cursor::new(sample()))
            .filter("a=skip".parse().unwrap())
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].index, 1);
        assert_eq!(chunks[1].payload, b"frame-1");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(UsmFile::new(Cursor::new(Vec::new())).count(), 0);
    }

    #[test]
    fn test_invalid_signature() {
        let data = encode_chunk(b"JUNK", 0, 0, b"x", 0);
        let mut file = UsmFile::new(Cursor::new(data));
        assert!(matches!(file.next(), Some(Err(Error::InvalidSignature(..)))));
        assert!(file.next().is_none());
    }

    #[test]
    fn test_truncated_chunk() {
        let mut data = encode_chunk(b"@SFV", 0, 0, b"frame", 0);
        data.truncate(data.len() - 2);
        let mut file = UsmFile::new(Cursor::new(data));
        assert!(matches!(file.next(), Some(Err(Error::Truncated { offset: 0, .. }))));
    }
}

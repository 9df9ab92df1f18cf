use crate::{Chunk, Error, Result};
use std::collections::{BTreeMap, btree_map::Entry};

/// Receiver of chunks released in sequence order.
pub trait ChunkSink {
    fn write_chunk(&mut self, chunk: &Chunk) -> Result<()>;
}

impl ChunkSink for Vec<Chunk> {
    fn write_chunk(&mut self, chunk: &Chunk) -> Result<()> {
        self.push(chunk.clone());
        Ok(())
    }
}

/// Releases chunks to a sink in strictly ascending, contiguous index order.
///
/// Chunks arriving ahead of their predecessors wait in `pending` until the
/// gap closes. Every pending index is above `next`.
#[derive(Debug, Default)]
pub struct Reassembly {
    next: u64,
    pending: BTreeMap<u64, Chunk>,
}

impl Reassembly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next released chunk must carry.
    pub fn next_expected(&self) -> u64 {
        self.next
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn accept<S: ChunkSink + ?Sized>(&mut self, chunk: Chunk, sink: &mut S) -> Result<()> {
        if chunk.index < self.next {
            return Err(Error::LateChunk {
                index: chunk.index,
                expected: self.next,
            });
        }

        if chunk.index > self.next {
            return match self.pending.entry(chunk.index) {
                Entry::Vacant(entry) => {
                    entry.insert(chunk);
                    Ok(())
                }
                Entry::Occupied(entry) => Err(Error::DuplicateChunk {
                    index: *entry.key(),
                }),
            };
        }

        sink.write_chunk(&chunk)?;
        self.next += 1;

        while let Some(chunk) = self.pending.remove(&self.next) {
            sink.write_chunk(&chunk)?;
            self.next += 1;
        }

        if let Some((&index, _)) = self.pending.first_key_value()
            && index < self.next
        {
            return Err(Error::StaleBacklog {
                index,
                expected: self.next,
            });
        }

        Ok(())
    }

    /// Removes every waiting chunk, lowest index first.
    pub fn take_backlog(&mut self) -> Vec<Chunk> {
        std::mem::take(&mut self.pending).into_values().collect()
    }

    /// Checks the final state once the input declared `total` chunks.
    pub fn finalize(&self, total: u64) -> Result<()> {
        if !self.pending.is_empty() {
            return Err(Error::Unflushed {
                pending: self.pending.len(),
                expected: self.next,
            });
        }

        if self.next > total {
            return Err(Error::Overrun {
                delivered: self.next,
                declared: total,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StreamKind;

    fn chunk(index: u64) -> Chunk {
        Chunk::new(StreamKind::Video, 0, index, vec![index as u8])
    }

    fn indices(sink: &[Chunk]) -> Vec<u64> {
        sink.iter().map(|x| x.index).collect()
    }

    #[test]
    fn test_in_order() {
        let mut reassembly = Reassembly::new();
        let mut sink = Vec::new();

        for i in 0..4 {
            reassembly.accept(chunk(i), &mut sink).unwrap();
        }

        assert_eq!(indices(&sink), [0, 1, 2, 3]);
        assert!(reassembly.finalize(4).is_ok());
    }

    #[test]
    fn test_out_of_order() {
        let mut reassembly = Reassembly::new();
        let mut sink = Vec::new();

        for i in [2, 1, 4, 0, 3] {
            reassembly.accept(chunk(i), &mut sink).unwrap();
        }

        assert_eq!(indices(&sink), [0, 1, 2, 3, 4]);
        assert_eq!(reassembly.next_expected(), 5);
        assert_eq!(reassembly.pending(), 0);
        assert!(reassembly.finalize(5).is_ok());
    }

    #[test]
    fn test_every_permutation_of_four() {
        let mut orders = Vec::new();
        for a in 0..4 {
            for b in (0..4).filter(|&b| b != a) {
                for c in (0..4).filter(|&c| c != a && c != b) {
                    orders.push([a, b, c, 6 - a - b - c]);
                }
            }
        }
        assert_eq!(orders.len(), 24);

        for order in orders {
            let mut reassembly = Reassembly::new();
            let mut sink = Vec::new();

            for i in order {
                reassembly.accept(chunk(i), &mut sink).unwrap();
            }

            assert_eq!(indices(&sink), [0, 1, 2, 3], "order {:?}", order);
        }
    }

    #[test]
    fn test_duplicate_pending_chunk() {
        let mut reassembly = Reassembly::new();
        let mut sink = Vec::new();
        reassembly.accept(chunk(0), &mut sink).unwrap();
        reassembly
            .accept(Chunk::new(StreamKind::Video, 0, 2, b"first".to_vec()), &mut sink)
            .unwrap();

        let result =
            reassembly.accept(Chunk::new(StreamKind::Video, 0, 2, b"second".to_vec()), &mut sink);
        assert!(matches!(result, Err(Error::DuplicateChunk { index: 2 })));
        assert_eq!(reassembly.take_backlog()[0].payload, b"first");
    }

    #[test]
    fn test_late_chunk() {
        let mut reassembly = Reassembly::new();
        let mut sink = Vec::new();
        reassembly.accept(chunk(0), &mut sink).unwrap();
        reassembly.accept(chunk(1), &mut sink).unwrap();

        let result = reassembly.accept(chunk(0), &mut sink);
        assert!(matches!(result, Err(Error::LateChunk { index: 0, expected: 2 })));
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_stale_backlog() {
        let mut reassembly = Reassembly {
            next: 1,
            pending: BTreeMap::from([(0, chunk(0))]),
        };
        let mut sink = Vec::new();

        let result = reassembly.accept(chunk(1), &mut sink);
        assert!(matches!(result, Err(Error::StaleBacklog { index: 0, expected: 2 })));
    }

    #[test]
    fn test_unflushed_backlog() {
        let mut reassembly = Reassembly::new();
        let mut sink = Vec::new();
        reassembly.accept(chunk(0), &mut sink).unwrap();
        reassembly.accept(chunk(2), &mut sink).unwrap();

        assert!(matches!(
            reassembly.finalize(3),
            Err(Error::Unflushed { pending: 1, expected: 1 })
        ));
    }

    #[test]
    fn test_overrun() {
        let mut reassembly = Reassembly::new();
        let mut sink = Vec::new();
        for i in 0..3 {
            reassembly.accept(chunk(i), &mut sink).unwrap();
        }

        assert!(matches!(
            reassembly.finalize(2),
            Err(Error::Overrun { delivered: 3, declared: 2 })
        ));
    }

    #[test]
    fn test_zero_chunks() {
        assert!(Reassembly::new().finalize(0).is_ok());
    }

    #[test]
    fn test_take_backlog_sorted() {
        let mut reassembly = Reassembly::new();
        let mut sink = Vec::new();
        for i in [5, 3, 4] {
            reassembly.accept(chunk(i), &mut sink).unwrap();
        }

        assert!(sink.is_empty());
        assert_eq!(indices(&reassembly.take_backlog()), [3, 4, 5]);
        assert!(reassembly.finalize(6).is_ok());
    }
}

use crate::{
    Chunk, Error, Result, StreamKind,
    dispatch::Dispatcher,
    reassembly::{ChunkSink, Reassembly},
};
use log::{debug, info};
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::mpsc::Sender,
};

/// Message sent to a queue consumer.
///
/// A run sends every chunk in the order it was read, then one
/// [`QueueItem::End`] carrying the number of chunks sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueueItem {
    Chunk(Chunk),
    End(u64),
}

/// Where a demux run delivers its chunks. Fixed for the whole run.
pub enum Output {
    Queue(Sender<QueueItem>),
    Directory(PathBuf),
}

/// Files written by a run, keyed by channel number.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Extracted {
    pub videos: BTreeMap<u8, PathBuf>,
    pub audios: BTreeMap<u8, PathBuf>,
}

impl Extracted {
    pub fn is_empty(&self) -> bool {
        self.videos.is_empty() && self.audios.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Queued { total: u64 },
    Files(Extracted),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Init,
    Streaming,
    Finalizing,
    Done,
}

/// Drives one container from its first chunk to its output.
pub struct Demuxer {
    stem: String,
    dispatcher: Dispatcher,
    state: State,
}

impl Demuxer {
    /// `stem` names the output files, usually the container file stem.
    pub fn new<T: Into<String>>(stem: T, dispatcher: Dispatcher) -> Self {
        Self {
            stem: stem.into(),
            dispatcher,
            state: State::Init,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Runs the demuxer over `chunks`. A demuxer runs once; the final
    /// [`State`] stays readable afterwards.
    pub fn run<I>(&mut self, chunks: I, output: Output) -> Result<Outcome>
    where
        I: IntoIterator<Item = Result<Chunk>>,
    {
        let outcome = match output {
            Output::Queue(sender) => {
                info!("Demuxing {} (queue)", self.stem);
                self.run_queue(chunks, sender)?
            }
            Output::Directory(directory) => {
                info!("Demuxing {} into {}", self.stem, directory.display());
                self.run_files(chunks, &directory)?
            }
        };

        self.transition(State::Done);
        info!("Demuxed {}", self.stem);
        Ok(outcome)
    }

    fn transition(&mut self, state: State) {
        debug!("{}: {:?} -> {:?}", self.stem, self.state, state);
        self.state = state;
    }

    fn run_queue<I>(&mut self, chunks: I, sender: Sender<QueueItem>) -> Result<Outcome>
    where
        I: IntoIterator<Item = Result<Chunk>>,
    {
        self.transition(State::Streaming);
        let mut total = 0;

        for chunk in chunks {
            let mut chunk = chunk?;
            self.dispatcher.decrypt(&mut chunk);
            sender
                .send(QueueItem::Chunk(chunk))
                .map_err(|_| Error::QueueClosed)?;
            total += 1;
        }

        self.transition(State::Finalizing);
        sender
            .send(QueueItem::End(total))
            .map_err(|_| Error::QueueClosed)?;
        debug!("{}: sent {} chunks", self.stem, total);
        Ok(Outcome::Queued { total })
    }

    fn run_files<I>(&mut self, chunks: I, directory: &Path) -> Result<Outcome>
    where
        I: IntoIterator<Item = Result<Chunk>>,
    {
        fs::create_dir_all(directory)?;

        let stem = self.stem.clone();
        let mut sink = FileSink::new(directory, &stem);
        let mut reassembly = Reassembly::new();
        let mut total = 0;
        self.transition(State::Streaming);

        for chunk in chunks {
            let mut chunk = chunk?;
            self.dispatcher.decrypt(&mut chunk);
            reassembly.accept(chunk, &mut sink)?;
            total += 1;
        }

        self.transition(State::Finalizing);

        let backlog = reassembly.take_backlog();
        if !backlog.is_empty() {
            debug!(
                "{}: draining {} chunks waiting behind index {}",
                self.stem,
                backlog.len(),
                reassembly.next_expected()
            );
        }

        for chunk in &backlog {
            sink.write_chunk(chunk)?;
        }

        reassembly.finalize(total)?;
        Ok(Outcome::Files(sink.finish()?))
    }
}

/// Streams channel 0 video to disk and keeps every other stream in memory.
struct FileSink<'a> {
    directory: &'a Path,
    stem: &'a str,
    /// Path, writer and index of the last chunk written.
    stream: Option<(PathBuf, BufWriter<File>, u64)>,
    buffers: BTreeMap<(StreamKind, u8), Vec<u8>>,
}

impl<'a> FileSink<'a> {
    fn new(directory: &'a Path, stem: &'a str) -> Self {
        Self {
            directory,
            stem,
            stream: None,
            buffers: BTreeMap::new(),
        }
    }

    fn finish(self) -> Result<Extracted> {
        let mut extracted = Extracted::default();

        for ((kind, channel), data) in &self.buffers {
            let path = self
                .directory
                .join(format!("{}_{}.{}", self.stem, channel, kind.extension()));
            debug!("Writing {} bytes to {}", data.len(), path.display());
            fs::write(&path, data)?;

            match kind {
                StreamKind::Audio => extracted.audios.insert(*channel, path),
                StreamKind::Video => extracted.videos.insert(*channel, path),
            };
        }

        if let Some((path, mut file, index)) = self.stream {
            flush_stream(&mut file, index)?;
            extracted.videos.insert(0, path);
        }

        Ok(extracted)
    }
}

impl ChunkSink for FileSink<'_> {
    fn write_chunk(&mut self, chunk: &Chunk) -> Result<()> {
        if !chunk.is_primary_video() {
            self.buffers
                .entry((chunk.kind, chunk.channel))
                .or_default()
                .extend_from_slice(&chunk.payload);
            return Ok(());
        }

        if self.stream.is_none() {
            let path = self.directory.join(format!("{}.ivf", self.stem));
            debug!("Streaming channel 0 video to {}", path.display());
            let file = BufWriter::new(File::create(&path)?);
            self.stream = Some((path, file, chunk.index));
        }

        if let Some((_, file, index)) = &mut self.stream {
            write_payload(file, chunk)?;
            *index = chunk.index;
        }

        Ok(())
    }
}

fn write_payload<W: Write>(writer: &mut W, chunk: &Chunk) -> Result<()> {
    writer
        .write_all(&chunk.payload)
        .map_err(|e| write_error(e, chunk.index, chunk.size()))
}

/// Buffered bytes belong to the chunks up to `index`.
fn flush_stream<W: Write>(writer: &mut BufWriter<W>, index: u64) -> Result<()> {
    let expected = writer.buffer().len();
    writer.flush().map_err(|e| write_error(e, index, expected))
}

fn write_error(e: io::Error, index: u64, expected: usize) -> Error {
    match e.kind() {
        io::ErrorKind::WriteZero => Error::PartialWrite { index, expected },
        _ => Error::Io(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    struct Full;

    impl Write for Full {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn chunks() -> Vec<Result<Chunk>> {
        vec![
            Ok(Chunk::new(StreamKind::Video, 0, 0, b"v0".to_vec())),
            Ok(Chunk::new(StreamKind::Audio, 0, 1, b"a0".to_vec())),
            Ok(Chunk::new(StreamKind::Video, 0, 2, b"v1".to_vec())),
        ]
    }

    #[test]
    fn test_short_write_is_partial_write() {
        let chunk = Chunk::new(StreamKind::Video, 0, 4, vec![1, 2, 3]);
        assert!(matches!(
            write_payload(&mut Full, &chunk),
            Err(Error::PartialWrite { index: 4, expected: 3 })
        ));
    }

    #[test]
    fn test_queue_closed() {
        let (sender, receiver) = mpsc::channel();
        drop(receiver);

        let result =
            Demuxer::new("movie", Dispatcher::default()).run(chunks(), Output::Queue(sender));
        assert!(matches!(result, Err(Error::QueueClosed)));
    }

    #[test]
    fn test_reader_error_aborts_run() {
        let (sender, receiver) = mpsc::channel();
        let input = vec![
            Ok(Chunk::new(StreamKind::Video, 0, 0, b"v0".to_vec())),
            Err(Error::InvalidSignature(*b"JUNK", 40)),
        ];

        let result = Demuxer::new("movie", Dispatcher::default()).run(input, Output::Queue(sender));
        assert!(matches!(result, Err(Error::InvalidSignature(..))));
        assert_eq!(receiver.try_iter().count(), 1);
    }

    #[test]
    fn test_short_flush_is_partial_write() {
        let mut writer = BufWriter::new(Full);
        let chunk = Chunk::new(StreamKind::Video, 0, 6, vec![1, 2, 3]);
        write_payload(&mut writer, &chunk).unwrap();

        assert!(matches!(
            flush_stream(&mut writer, chunk.index),
            Err(Error::PartialWrite { index: 6, expected: 3 })
        ));
    }

    #[test]
    fn test_states() {
        let mut demuxer = Demuxer::new("movie", Dispatcher::default());
        assert_eq!(demuxer.state(), State::Init);

        let (sender, _receiver) = mpsc::channel();
        demuxer.run(chunks(), Output::Queue(sender)).unwrap();
        assert_eq!(demuxer.state(), State::Done);
    }
}

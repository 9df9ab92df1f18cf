use std::fmt;

/// Elementary stream type carried by a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StreamKind {
    Audio,
    Video,
}

impl StreamKind {
    /// Extension used for the extracted elementary stream.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Audio => "adx",
            Self::Video => "ivf",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Audio => "audio",
            Self::Video => "video",
        })
    }
}

/// One stream data unit of a container.
///
/// `index` is a single counter shared by every chunk of a container,
/// whatever its kind or channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub kind: StreamKind,
    pub channel: u8,
    pub index: u64,
    pub payload: Vec<u8>,
}

impl Chunk {
    pub fn new(kind: StreamKind, channel: u8, index: u64, payload: Vec<u8>) -> Self {
        Self {
            kind,
            channel,
            index,
            payload,
        }
    }

    pub fn size(&self) -> usize {
        self.payload.len()
    }

    pub fn is_video(&self) -> bool {
        self.kind == StreamKind::Video
    }

    /// Channel 0 video, streamed straight to disk in file mode.
    pub fn is_primary_video(&self) -> bool {
        self.is_video() && self.channel == 0
    }
}

use crate::{Error, StreamKind};
use std::collections::BTreeSet;

/// Which channels of one stream kind take part in a demux run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Skip,
    Only(BTreeSet<u8>),
}

impl Selection {
    pub fn contains(&self, channel: u8) -> bool {
        match self {
            Self::All => true,
            Self::Skip => false,
            Self::Only(channels) => channels.contains(&channel),
        }
    }
}

/// Channel restrictions applied by the container reader.
///
/// Parsed from expressions such as `v=0:a=0,1` or `a=skip`.
/// Kinds that are not mentioned keep every channel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelFilter {
    pub audio: Selection,
    pub video: Selection,
}

impl ChannelFilter {
    pub fn allows(&self, kind: StreamKind, channel: u8) -> bool {
        match kind {
            StreamKind::Audio => self.audio.contains(channel),
            StreamKind::Video => self.video.contains(channel),
        }
    }
}

impl std::str::FromStr for ChannelFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut filter = Self::default();

        for stream in s.split_terminator(':').map(|x| x.trim()) {
            let Some((code, queries)) = stream.split_once('=') else {
                return Err(Error::InvalidFilter(s.to_owned()));
            };

            let selection = match code.trim() {
                "a" => &mut filter.audio,
                "v" => &mut filter.video,
                _ => return Err(Error::InvalidFilter(s.to_owned())),
            };

            *selection = Self::parse_selection(queries)
                .ok_or_else(|| Error::InvalidFilter(s.to_owned()))?;
        }

        Ok(filter)
    }
}

impl ChannelFilter {
    fn parse_selection(queries: &str) -> Option<Selection> {
        let mut channels = BTreeSet::new();

        for query in queries.split_terminator(',').map(|x| x.trim()) {
            match query {
                "all" => return Some(Selection::All),
                "skip" => return Some(Selection::Skip),
                channel => {
                    channels.insert(channel.parse::<u8>().ok()?);
                }
            }
        }

        if channels.is_empty() {
            None
        } else {
            Some(Selection::Only(channels))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allows_everything() {
        let filter = ChannelFilter::default();
        assert!(filter.allows(StreamKind::Audio, 3));
        assert!(filter.allows(StreamKind::Video, 0));
    }

    #[test]
    fn test_parse_channels() {
        let filter = "v=0:a=1,2".parse::<ChannelFilter>().unwrap();
        assert!(filter.allows(StreamKind::Video, 0));
        assert!(!filter.allows(StreamKind::Video, 1));
        assert!(filter.allows(StreamKind::Audio, 2));
        assert!(!filter.allows(StreamKind::Audio, 0));
    }

    #[test]
    fn test_parse_skip() {
        let filter = "a=skip".parse::<ChannelFilter>().unwrap();
        assert_eq!(filter.audio, Selection::Skip);
        assert_eq!(filter.video, Selection::All);
    }

    #[test]
    fn test_parse_invalid() {
        assert!("x=1".parse::<ChannelFilter>().is_err());
        assert!("v=one".parse::<ChannelFilter>().is_err());
        assert!("v".parse::<ChannelFilter>().is_err());
    }
}

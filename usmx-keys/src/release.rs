//! Movie metadata shipped with a game release.
//!
//! A release directory holds the version key response of the game server and
//! the movie config tables:
//!
//! - `GetVideoVersionKeyScRsp.json`
//! - `VideoConfig.json` and `LoopCGConfig.json`
//! - `VideoEncryptionConfig.json` and `LoopCGEncryptionConfig.json`

use crate::{AssetKind, Error, Result};
use log::debug;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};

/// Version key lists use small ids; a first value above this is a seed.
const MAX_VIDEO_ID: u64 = 10_000;
/// Id known to be present in the ordinary video list.
const VIDEO_MARKER: u64 = 1;
/// Id known to be present in the loop CG list.
const LOOP_CG_MARKER: u64 = 1464;

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VideoConfigRow {
    #[serde(rename = "VideoID")]
    pub video_id: u64,
    #[serde(rename = "VideoPath")]
    pub video_path: String,
    #[serde(rename = "IsPlayerInvolved")]
    pub is_player_involved: bool,
    #[serde(rename = "CaptionPath")]
    pub caption_path: String,
}

impl VideoConfigRow {
    /// Asset names of this movie. Movies featuring the player character exist
    /// once per player gender.
    pub fn names(&self) -> Vec<String> {
        let name = self
            .video_path
            .strip_suffix(".usm")
            .unwrap_or(&self.video_path);

        if self.is_player_involved {
            vec![format!("{}_f", name), format!("{}_m", name)]
        } else {
            vec![name.to_owned()]
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EncryptionRow {
    #[serde(rename = "VideoID")]
    pub video_id: u64,
    #[serde(rename = "Encryption")]
    pub encryption: bool,
}

/// Metadata of one release, e.g. `3.8`.
#[derive(Clone, Debug, Default)]
pub struct Release {
    pub name: String,
    /// Seed groups of the version key response, by group name.
    pub seed_groups: BTreeMap<String, BTreeMap<u64, u64>>,
    pub video_group: Option<String>,
    pub loop_cg_group: Option<String>,
    /// Video rows followed by loop CG rows.
    pub videos: Vec<VideoConfigRow>,
    pub encryption: HashMap<u64, bool>,
}

impl Release {
    /// Loads `<root>/<name>/`.
    pub fn load<P: AsRef<Path>>(root: P, name: &str) -> Result<Self> {
        if !name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(Error::InvalidRelease(name.to_owned()));
        }

        let dir = root.as_ref().join(name);
        if !dir.is_dir() {
            return Err(Error::InvalidRelease(name.to_owned()));
        }

        let mut release = Self {
            name: name.to_owned(),
            ..Default::default()
        };

        release.parse_version_keys(&read_json(&dir.join("GetVideoVersionKeyScRsp.json"))?);

        for file in ["VideoConfig.json", "LoopCGConfig.json"] {
            release.videos.extend(read_rows::<VideoConfigRow>(&dir.join(file))?);
        }

        for file in ["VideoEncryptionConfig.json", "LoopCGEncryptionConfig.json"] {
            for row in read_rows::<EncryptionRow>(&dir.join(file))? {
                release.encryption.insert(row.video_id, row.encryption);
            }
        }

        debug!(
            "Loaded release {}: {} seed groups, {} movies",
            release.name,
            release.seed_groups.len(),
            release.videos.len()
        );
        Ok(release)
    }

    /// Reads the seed lists of a version key response.
    ///
    /// Every list entry is an object with two integer values, id and seed,
    /// in either order. The first seed seen for an id wins.
    pub fn parse_version_keys(&mut self, response: &Value) {
        let Value::Object(groups) = response else {
            return;
        };

        for (group_name, group) in groups {
            let seeds = self.seed_groups.entry(group_name.clone()).or_default();
            let Value::Array(items) = group else {
                continue;
            };

            for item in items {
                let Some((mut id, mut seed)) = id_seed_pair(item) else {
                    continue;
                };

                if id > MAX_VIDEO_ID {
                    std::mem::swap(&mut id, &mut seed);
                }

                seeds.entry(id).or_insert(seed);

                if id == VIDEO_MARKER {
                    self.video_group = Some(group_name.clone());
                }

                if id == LOOP_CG_MARKER {
                    self.loop_cg_group = Some(group_name.clone());
                }
            }
        }
    }

    /// Seed and asset kind of a movie. Loop CG seeds take precedence.
    pub fn seed(&self, video_id: u64) -> Option<(u64, AssetKind)> {
        let lookup = |group: &Option<String>| {
            group
                .as_ref()
                .and_then(|x| self.seed_groups.get(x))
                .and_then(|x| x.get(&video_id))
                .copied()
        };

        lookup(&self.loop_cg_group)
            .map(|seed| (seed, AssetKind::LoopCg))
            .or_else(|| lookup(&self.video_group).map(|seed| (seed, AssetKind::Video)))
    }

    /// `None` when the encryption tables do not mention the movie.
    pub fn is_encrypted(&self, video_id: u64) -> Option<bool> {
        self.encryption.get(&video_id).copied()
    }
}

fn id_seed_pair(item: &Value) -> Option<(u64, u64)> {
    let Value::Object(fields) = item else {
        return None;
    };

    if fields.len() != 2 {
        return None;
    }

    let mut values = fields.values().map(|value| match value {
        Value::Number(x) => x.as_u64(),
        Value::String(x) => x.trim().parse().ok(),
        Value::Bool(x) => Some(*x as u64),
        _ => None,
    });

    Some((values.next()??, values.next()??))
}

fn read_json(path: &Path) -> Result<Value> {
    let data = fs::read(path).map_err(|source| Error::Read {
        path: path.to_owned(),
        source,
    })?;

    serde_json::from_slice(&data).map_err(|source| Error::Parse {
        path: path.to_owned(),
        source,
    })
}

/// Config tables are stored either as a list of rows or as an object of rows.
fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let rows = match read_json(path)? {
        Value::Array(rows) => rows,
        Value::Object(rows) => rows.into_iter().map(|(_, row)| row).collect(),
        _ => Vec::new(),
    };

    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|source| Error::Parse {
                path: path.to_owned(),
                source,
            })
        })
        .collect()
}

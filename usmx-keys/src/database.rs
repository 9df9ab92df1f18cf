use crate::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::{collections::BTreeMap, fs, path::Path};

/// Group name to an object of asset name to key.
///
/// Groups and names keep the order they were read or inserted in.
pub type KeyMap = Map<String, Value>;

/// Keys of one game title.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TitleKeys {
    #[serde(rename = "Encrytion", alias = "Encryption", default)]
    pub encryption: i64,
    #[serde(rename = "KeyMap", default)]
    pub key_map: KeyMap,
}

impl TitleKeys {
    /// Names and keys of one group, `None` when missing or not an object.
    pub fn group(&self, name: &str) -> Option<&Map<String, Value>> {
        self.key_map.get(name)?.as_object()
    }

    /// Creates the group, replacing anything that is not an object.
    fn ensure_group(&mut self, name: &str) {
        if !matches!(self.key_map.get(name), Some(Value::Object(_))) {
            self.key_map.insert(name.to_owned(), Value::Object(Map::new()));
        }
    }
}

/// Counts of a [`KeyDatabase::merge`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Group entries overwritten in place.
    pub updated: usize,
    pub inserted: usize,
}

/// Persisted keys of every title, stored as `keys.json`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct KeyDatabase {
    pub titles: BTreeMap<String, TitleKeys>,
}

impl KeyDatabase {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_json(path.as_ref())
    }

    /// Starts an empty database when the file does not exist yet.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            Self::load(path)
        } else {
            debug!("{} not found, starting an empty key database", path.display());
            Ok(Self::default())
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_json(path.as_ref(), self)
    }

    /// Key stored for `name` under `title`, from the first group holding it
    /// in file order.
    pub fn lookup(&self, title: &str, name: &str) -> Option<u64> {
        self.titles
            .get(title)?
            .key_map
            .values()
            .find_map(|group| group.get(name)?.as_u64())
    }

    /// Merges freshly derived keys.
    ///
    /// A name already present in one or more groups is updated in every one
    /// of them. Other names go to the `release` group, which is created even
    /// when nothing is inserted into it.
    pub fn merge(
        &mut self,
        title: &str,
        release: &str,
        keys: &BTreeMap<String, u64>,
    ) -> MergeSummary {
        let title = self.titles.entry(title.to_owned()).or_default();
        title.ensure_group(release);
        let mut summary = MergeSummary::default();

        for (name, key) in keys {
            let mut found = false;

            for group in title.key_map.values_mut() {
                if let Some(value) = group.get_mut(name) {
                    *value = Value::from(*key);
                    found = true;
                    summary.updated += 1;
                }
            }

            if !found {
                if let Some(Value::Object(group)) = title.key_map.get_mut(release) {
                    group.insert(name.clone(), Value::from(*key));
                    summary.inserted += 1;
                }
            }
        }

        summary
    }
}

/// Release generation of every asset name, stored as `versions.json`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct VersionTable {
    pub generations: BTreeMap<String, u64>,
}

impl VersionTable {
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            load_json(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_json(path.as_ref(), self)
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.generations.get(name).copied()
    }

    /// Generation of `name`, recording `current` for names not seen before.
    pub fn resolve(&mut self, name: &str, current: u64) -> u64 {
        *self
            .generations
            .entry(name.to_owned())
            .or_insert(current)
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read(path).map_err(|source| Error::Read {
        path: path.to_owned(),
        source,
    })?;

    serde_json::from_slice(&data).map_err(|source| Error::Parse {
        path: path.to_owned(),
        source,
    })
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut data = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut data, formatter);

    value
        .serialize(&mut serializer)
        .map_err(|source| Error::Serialize {
            path: path.to_owned(),
            source,
        })?;

    fs::write(path, data).map_err(|source| Error::Write {
        path: path.to_owned(),
        source,
    })
}

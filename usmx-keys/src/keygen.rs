use crate::{Context, Release, VersionTable, derive};
use log::{debug, warn};
use std::collections::{BTreeMap, HashSet};

/// Where [`crate::Generation::B`] takes the release generation from.
///
/// A key database uses one source for its whole lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GenerationSource {
    /// Encoded in the seed above [`crate::GENERATION_FACTOR`].
    #[default]
    Seed,
    /// Looked up in a [`VersionTable`]; names new to the table are recorded
    /// with `current`.
    Table { current: u64 },
}

/// Derives the key of every encrypted movie of a release.
///
/// Rows are processed in order and the first row of a video id wins. Movies
/// without a seed in the version key response are skipped with a warning.
pub fn derive_release(
    release: &Release,
    source: GenerationSource,
    versions: &mut VersionTable,
) -> BTreeMap<String, u64> {
    let mut seen = HashSet::new();
    let mut keys = BTreeMap::new();

    for row in &release.videos {
        if !seen.insert(row.video_id) {
            continue;
        }

        match release.is_encrypted(row.video_id) {
            Some(true) => (),
            Some(false) => continue,
            None => {
                debug!("{} has no encryption entry, skipping", row.video_path);
                continue;
            }
        }

        let Some((seed, kind)) = release.seed(row.video_id) else {
            warn!("Could not find {} key", row.video_path);
            continue;
        };

        for name in row.names() {
            if keys.contains_key(&name) {
                continue;
            }

            let mut context = Context::new(kind);
            if let GenerationSource::Table { current } = source {
                context = context.release_generation(versions.resolve(&name, current));
            }

            let key = derive(&name, seed, &context);
            debug!("{} = {}", name, key);
            keys.insert(name, key);
        }
    }

    keys
}

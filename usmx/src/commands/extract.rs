use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use log::{info, warn};
use std::{
    fs,
    path::{Path, PathBuf},
};
use usmx_demux::{ChannelFilter, CipherCache, Keys, Outcome, Output, SecondaryKey};
use usmx_keys::KeyDatabase;

/// Demultiplex USM movies into elementary video (.ivf) and audio (.adx) streams.
#[derive(Debug, Clone, Args)]
pub struct Extract {
    /// USM files, or directories which are searched for .usm files.
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Directory for the extracted streams.
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Container key. When omitted the key is looked up by file name in the key database.
    /// 0 disables decryption.
    #[arg(short, long, help_heading = "Decryption Options")]
    key: Option<u64>,

    /// Decrypt audio streams with the container key.
    #[arg(long, help_heading = "Decryption Options")]
    audio_decrypt: bool,

    /// Audio codec key. 0 means none, 1 reuses the container key.
    #[arg(long, default_value_t = 0, help_heading = "Decryption Options")]
    secondary_key: u64,

    /// Key database used when --key is omitted.
    #[arg(long, default_value = "keys.json", help_heading = "Decryption Options")]
    keys: PathBuf,

    /// Title of the key database to look keys up in.
    #[arg(long, default_value = "StarRail", help_heading = "Decryption Options")]
    title: String,

    /// Channels to extract, e.g. `v=0:a=0,1` or `a=skip`.
    /// Stream kinds which are not mentioned keep every channel.
    #[arg(short, long, default_value = "v=all:a=all")]
    select: ChannelFilter,
}

impl Extract {
    pub fn execute(self) -> Result<()> {
        let files = self.files()?;

        if files.is_empty() {
            bail!("No .usm files found.");
        }

        let database = if self.key.is_none() {
            Some(KeyDatabase::load_or_default(&self.keys)?)
        } else {
            None
        };

        let cache = CipherCache::new();

        for file in &files {
            let keys = self.keys_for(file, database.as_ref());
            let outcome = usmx_demux::demux_file(
                file,
                Output::Directory(self.output.clone()),
                keys,
                self.select.clone(),
                &cache,
            )?;

            if let Outcome::Files(extracted) = outcome {
                for (channel, path) in &extracted.videos {
                    info!("  {} {:>2} {}", "video".cyan(), channel, path.display());
                }

                for (channel, path) in &extracted.audios {
                    info!("  {} {:>2} {}", "audio".cyan(), channel, path.display());
                }
            }
        }

        info!("Extracted {} movies", files.len());
        Ok(())
    }

    fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for input in &self.input {
            if input.is_dir() {
                let mut found = fs::read_dir(input)?
                    .map(|entry| entry.map(|x| x.path()))
                    .collect::<std::io::Result<Vec<_>>>()?
                    .into_iter()
                    .filter(|x| x.is_file() && is_usm(x))
                    .collect::<Vec<_>>();
                found.sort();
                files.extend(found);
            } else if input.is_file() {
                files.push(input.clone());
            } else {
                bail!("{} does not exist.", input.display());
            }
        }

        Ok(files)
    }

    fn keys_for(&self, file: &Path, database: Option<&KeyDatabase>) -> Keys {
        let key = match (self.key, database) {
            (Some(key), _) => key,
            (None, Some(database)) => {
                let name = file
                    .file_stem()
                    .map(|x| x.to_string_lossy())
                    .unwrap_or_default();

                database.lookup(&self.title, &name).unwrap_or_else(|| {
                    warn!("No key found for {}, extracting without decryption", name);
                    0
                })
            }
            (None, None) => 0,
        };

        Keys::new(key)
            .audio_encrypt(self.audio_decrypt)
            .secondary(SecondaryKey::from(self.secondary_key))
    }
}

fn is_usm(path: &Path) -> bool {
    path.extension()
        .is_some_and(|x| x.eq_ignore_ascii_case("usm"))
}

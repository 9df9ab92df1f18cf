use anyhow::Result;
use clap::{Args, ValueEnum};
use log::info;
use std::path::PathBuf;
use usmx_keys::{GenerationSource, KeyDatabase, Release, VersionTable};

/// Derive movie keys of a release and merge them into the key database.
#[derive(Debug, Clone, Args)]
pub struct Keygen {
    /// Release to derive keys for, e.g. 3.8.
    #[arg(required = true)]
    release: String,

    /// Directory holding one metadata directory per release.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Key database to update.
    #[arg(long, default_value = "keys.json")]
    keys: PathBuf,

    /// Title of the key database to update.
    #[arg(long, default_value = "StarRail")]
    title: String,

    /// Where newer seeds take the release generation from.
    /// Use the same source for every run against one key database.
    #[arg(long, value_enum, default_value_t = Source::Seed, help_heading = "Generation Options")]
    generation_source: Source,

    /// Version table used with `--generation-source table`.
    #[arg(long, default_value = "versions.json", help_heading = "Generation Options")]
    versions: PathBuf,

    /// Generation recorded for names new to the version table.
    #[arg(long, required_if_eq("generation_source", "table"), help_heading = "Generation Options")]
    generation: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Source {
    Seed,
    Table,
}

impl Keygen {
    pub fn execute(self) -> Result<()> {
        let release = Release::load(&self.root, &self.release)?;
        let source = self.source();

        let mut versions = match source {
            GenerationSource::Seed => VersionTable::default(),
            GenerationSource::Table { .. } => VersionTable::load_or_default(&self.versions)?,
        };

        info!("Deriving keys for release {}", release.name);
        let keys = usmx_keys::derive_release(&release, source, &mut versions);

        let mut database = KeyDatabase::load_or_default(&self.keys)?;
        let summary = database.merge(&self.title, &release.name, &keys);

        if let Some(title) = database.titles.get_mut(&self.title) {
            title.encryption = 1;
        }

        database.save(&self.keys)?;

        if let GenerationSource::Table { .. } = source {
            versions.save(&self.versions)?;
        }

        info!(
            "Derived {} keys ({} updated, {} new) into {}",
            keys.len(),
            summary.updated,
            summary.inserted,
            self.keys.display()
        );
        Ok(())
    }

    fn source(&self) -> GenerationSource {
        match (self.generation_source, self.generation) {
            (Source::Table, Some(current)) => GenerationSource::Table { current },
            _ => GenerationSource::Seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        keygen: Keygen,
    }

    #[test]
    fn test_default_source() {
        let cli = Cli::parse_from(["keygen", "3.8"]);
        assert_eq!(cli.keygen.source(), GenerationSource::Seed);
    }

    #[test]
    fn test_table_source_requires_generation() {
        assert!(Cli::try_parse_from(["keygen", "3.8", "--generation-source", "table"]).is_err());

        let cli = Cli::parse_from([
            "keygen",
            "3.8",
            "--generation-source",
            "table",
            "--generation",
            "38",
        ]);
        assert_eq!(cli.keygen.source(), GenerationSource::Table { current: 38 });
    }
}

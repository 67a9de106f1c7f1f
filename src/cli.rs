use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::pools::MAP_LISTS_FILE_NAME;

#[derive(Parser, Debug)]
#[command(name = "spring-maps")]
#[command(version, about = "Catalogue Spring map archives and generate map pool lists")]
pub struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse map archives, render their previews and store their metadata
    Ingest {
        /// Archive files, or directories to scan for .sdz/.sd7 archives
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Custom data directory (holds maps.db and processed/)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Database path, overriding <data-dir>/maps.db
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Generate mapLists.conf from the map spreadsheet
    Pools {
        /// Spreadsheet id
        #[arg(long, env = "MAPLISTS_SHEET_ID")]
        sheet_id: String,

        /// Google API key with read access to the spreadsheet
        #[arg(long, env = "MAPLISTS_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Output file
        #[arg(short, long, default_value = MAP_LISTS_FILE_NAME)]
        output: PathBuf,

        /// Print the config to stdout instead of writing a file
        #[arg(long, conflicts_with = "json")]
        stdout: bool,

        /// Print the classified pools as JSON instead of writing a file
        #[arg(long)]
        json: bool,
    },

    /// List every map in the catalogue
    ListMaps {
        /// Custom data directory
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Database path, overriding <data-dir>/maps.db
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_pools_defaults() {
        let cli = Cli::try_parse_from([
            "spring-maps",
            "pools",
            "--sheet-id",
            "abc",
            "--api-key",
            "key",
        ])
        .unwrap();

        match cli.command {
            Commands::Pools {
                sheet_id,
                output,
                stdout,
                json,
                ..
            } => {
                assert_eq!(sheet_id, "abc");
                assert_eq!(output, PathBuf::from("mapLists.conf"));
                assert!(!stdout && !json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_ingest_requires_paths() {
        assert!(Cli::try_parse_from(["spring-maps", "ingest"]).is_err());

        let cli = Cli::try_parse_from(["spring-maps", "-v", "ingest", "a.sdz", "maps/"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Ingest { paths, .. } => assert_eq!(paths.len(), 2),
            other => panic!("unexpected command {:?}", other),
        }
    }
}

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::IngestError;
use crate::map::normalize;
use crate::parser::ArchiveParser;
use crate::render::render_assets;
use crate::sync::{MapStore, MapSync, SyncOutcome};

/// Archive extensions picked up when scanning a directory
pub const ARCHIVE_EXTENSIONS: &[&str] = &["sdz", "sd7"];

/// Result of ingesting one archive
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub script_name: String,
    pub dest_dir: PathBuf,
    pub outcome: SyncOutcome,
}

/// Parses archives, renders their previews and stores their metadata.
///
/// Not safe for concurrent ingestion of the same script name; callers that
/// parallelise must serialise per identity.
pub struct MapIngestor<P, S> {
    parser: P,
    sync: MapSync<S>,
    processed_dir: PathBuf,
}

impl<P: ArchiveParser, S: MapStore> MapIngestor<P, S> {
    pub fn new(parser: P, sync: MapSync<S>, processed_dir: impl Into<PathBuf>) -> Self {
        Self {
            parser,
            sync,
            processed_dir: processed_dir.into(),
        }
    }

    pub fn sync(&self) -> &MapSync<S> {
        &self.sync
    }

    /// Ingest a single archive and return the directory its assets were written to
    pub fn ingest(&mut self, path: &Path) -> Result<PathBuf, IngestError> {
        Ok(self.ingest_with_report(path)?.dest_dir)
    }

    pub fn ingest_with_report(&mut self, path: &Path) -> Result<IngestReport, IngestError> {
        let parsed = self.parser.parse(path)?;
        let map = normalize(&parsed);

        let dest_dir = self.processed_dir.join(&map.file_name);
        render_assets(&parsed.imagery, &dest_dir)?;

        let outcome = self.sync.sync(&map)?;
        info!(
            path = %path.display(),
            script_name = %map.script_name,
            dest = %dest_dir.display(),
            "Map ingested"
        );

        Ok(IngestReport {
            script_name: map.script_name,
            dest_dir,
            outcome,
        })
    }
}

/// Expand files and directories into the archives to ingest.
/// Directories are scanned one level deep; results are sorted.
pub fn collect_archives(paths: &[PathBuf]) -> std::io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_archive(p))
                .collect();
            found.sort();
            out.extend(found);
        } else {
            out.push(path.clone());
        }
    }
    Ok(out)
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| ARCHIVE_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_archives() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.sdz", "a.SD7", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.sdz")).unwrap();
        let explicit = PathBuf::from("/somewhere/else.sdz");

        let found = collect_archives(&[dir.path().to_path_buf(), explicit.clone()]).unwrap();
        assert_eq!(
            found,
            vec![dir.path().join("a.SD7"), dir.path().join("b.sdz"), explicit]
        );
    }
}

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use spring_maps::{
    cli::{Cli, Commands},
    data_dir::DataDir,
    ingest::{collect_archives, MapIngestor},
    logging::setup_logging,
    parser::SdzParser,
    pools::generate_pools,
    sheets::GoogleSheetsClient,
    sync::{MapIndex, MapStore, MapSync},
    writer::SqliteMapStore,
};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

fn open_store(data_dir: &DataDir, db: Option<PathBuf>) -> Result<SqliteMapStore> {
    let db_path = db.unwrap_or_else(|| data_dir.db_path());
    SqliteMapStore::open(&db_path).with_context(|| format!("Failed to open database {:?}", db_path))
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Ingest {
            paths,
            data_dir,
            db,
        } => {
            let start = Instant::now();
            let data_dir = DataDir::new(data_dir)?;
            let store = open_store(&data_dir, db)?;

            let index = MapIndex::new();
            index.refresh(&store).context("Failed to load map index")?;
            let sync = MapSync::new(store).with_listener(index.clone());
            let mut ingestor = MapIngestor::new(SdzParser::new(), sync, data_dir.processed_dir());

            let archives = collect_archives(&paths).context("Failed to scan input paths")?;
            let pb = ProgressBar::new(archives.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{msg:30} [{bar:40.cyan/blue}] {pos}/{len}")
                    .context("Invalid progress template")?
                    .progress_chars("=>-"),
            );

            let mut failed = Vec::new();
            for archive in &archives {
                let label = archive
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                pb.set_message(label);

                if let Err(e) = ingestor.ingest(archive) {
                    pb.suspend(|| error!(path = %archive.display(), "Failed to ingest: {}", e));
                    failed.push(archive.clone());
                }
                pb.inc(1);
            }
            pb.finish_with_message("Done");

            info!(
                processed = archives.len() - failed.len(),
                failed = failed.len(),
                maps = index.len(),
                elapsed = %format!("{:.1}s", start.elapsed().as_secs_f64()),
                "Ingest finished"
            );

            if !failed.is_empty() {
                bail!("{} of {} archives failed to ingest", failed.len(), archives.len());
            }
        }

        Commands::Pools {
            sheet_id,
            api_key,
            output,
            stdout,
            json,
        } => {
            let client = GoogleSheetsClient::new()?;
            let generated = generate_pools(&client, &sheet_id, &api_key)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&generated.map_pools)?);
            } else if stdout {
                print!("{}", generated.config_text);
            } else {
                fs::write(&output, &generated.config_text)
                    .with_context(|| format!("Failed to write {:?}", output))?;
                println!("Wrote {} pools to {:?}", generated.map_pools.len(), output);
            }
        }

        Commands::ListMaps { data_dir, db } => {
            let data_dir = DataDir::new(data_dir)?;
            let store = open_store(&data_dir, db)?;
            let maps = store.load_all()?;

            println!("{} maps in catalogue:\n", maps.len());
            for stored in maps {
                let map = &stored.map;
                println!(
                    "  {:>4}  {:<40} {:>3}x{:<3} {}",
                    stored.id,
                    map.script_name,
                    map.width,
                    map.height,
                    data_dir.map_dir(&map.file_name).display()
                );
            }
        }
    }

    Ok(())
}

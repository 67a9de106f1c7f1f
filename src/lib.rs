pub mod cli;
pub mod data_dir;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod map;
pub mod parser;
pub mod pools;
pub mod render;
pub mod schema;
pub mod sheets;
pub mod sync;
pub mod writer;

pub use cli::{Cli, Commands};
pub use ingest::MapIngestor;
pub use pools::{generate_pools, GENERATOR_NAME, MAP_LISTS_FILE_NAME};
pub use sync::{MapIndex, MapStore, MapSync};

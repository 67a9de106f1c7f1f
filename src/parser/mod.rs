pub mod archive;
pub mod dxt;
pub mod mapinfo;
pub mod smd;
pub mod smf;

pub use archive::*;

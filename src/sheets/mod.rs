pub mod client;
pub mod grid;

pub use client::*;
pub use grid::*;

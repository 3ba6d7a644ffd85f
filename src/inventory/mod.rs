//! Application layer: configuration, capture cycles and the inventory CSV.

pub mod config;
pub mod csv_writer;
pub mod runner;

pub use config::{get_config, init_config};
pub use runner::{engine_from_config, process_image_file};
#[cfg(windows)]
pub use runner::{run_once, OutputPaths};

//! Finding, reading, and writing the files the map pipeline depends on, plus downloading new ones.

#[macro_use]
extern crate log;

mod download;
mod io;

pub use crate::download::download_bytes;
pub use crate::io::{create_parent_dir, file_exists, read_json, slurp_file, write_file};

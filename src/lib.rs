pub mod boundary;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod obs;
pub mod operator;
pub mod process;
pub mod specfile;
pub mod ui;
pub mod upstream;
pub mod verify;

pub use error::{Result, UpdaterError};

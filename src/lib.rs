//! Storage inspection and cleanup for the Kiro IDE.
//!
//! [`classifier`] and [`safety`] decide what every storage file is and whether
//! it may be deleted, [`chat`] indexes agent conversation transcripts, and
//! [`cleaner`] turns both into a sized plan and executes it.

pub mod chat;
pub mod classifier;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod history;
pub mod locator;
pub mod logging;
pub mod output;
pub mod safety;
pub mod scanner;
pub mod utils;

pub use error::{Error, Result};

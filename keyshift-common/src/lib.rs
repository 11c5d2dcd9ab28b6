//! # keyshift common library
//!
//! Shared code for the keyshift services:
//! - Musical key resolution (filename key extraction, pitch class table, shift arithmetic)
//! - Transposition requests, pitch ratio and output naming
//! - Bootstrap configuration loading
//! - Common error type

pub mod config;
pub mod error;
pub mod key;
pub mod transposition;

pub use error::{Error, Result};
pub use key::{extract_key, pitch_class, semitone_shift, Key, KeyMode};
pub use transposition::{pitch_ratio, Transposition, TranspositionRequest};

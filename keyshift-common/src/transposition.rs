//! Transposition requests and pitch ratio arithmetic
//!
//! A request is either an explicit semitone offset or a target key. Resolving it
//! against the uploaded filename produces the effective shift, the equal-temperament
//! pitch ratio handed to the audio tool, and a readable output file stem.

use std::path::Path;

use tracing::debug;

use crate::key::{extract_key, semitone_shift};
use crate::{Error, Result};

/// Transposition requested by the client
#[derive(Debug, Clone, PartialEq)]
pub enum TranspositionRequest {
    /// Explicit offset in semitones (fractional values allowed)
    Semitones(f64),
    /// Target key name, compared against the key found in the filename
    TargetKey(String),
}

/// Resolved transposition, ready to hand to the pitch shifter
#[derive(Debug, Clone, PartialEq)]
pub struct Transposition {
    pub semitones: f64,
    pub pitch_ratio: f64,
    /// Readable file stem derived from the shift or target key
    pub output_stem: String,
}

impl Transposition {
    /// Output file name for an upload with the given original filename
    pub fn output_file_name(&self, original_filename: &str) -> String {
        format!("{}{}", self.output_stem, file_extension(original_filename))
    }
}

impl TranspositionRequest {
    /// Resolve the request against the uploaded file's original name
    ///
    /// Target key mode fails with [`Error::NoKeyInFilename`] when the filename
    /// carries no key, and [`Error::UnknownKey`] when either key is not in the table.
    pub fn resolve(&self, original_filename: &str) -> Result<Transposition> {
        match self {
            TranspositionRequest::Semitones(semitones) => {
                let semitones = *semitones;
                Ok(Transposition {
                    semitones,
                    pitch_ratio: checked_pitch_ratio(semitones)?,
                    output_stem: format!(
                        "transposed_{}_semitones_{}",
                        format_amount(semitones.abs()),
                        if semitones < 0.0 { "down" } else { "up" }
                    ),
                })
            }
            TranspositionRequest::TargetKey(target) => {
                let target = target.trim().to_lowercase();
                let original = extract_key(original_filename)
                    .ok_or_else(|| Error::NoKeyInFilename(original_filename.to_string()))?
                    .canonical();

                let shift = semitone_shift(&original, &target)?;
                debug!(
                    original_key = %original,
                    target_key = %target,
                    shift,
                    "Resolved key transposition"
                );

                let semitones = f64::from(shift);
                Ok(Transposition {
                    semitones,
                    pitch_ratio: pitch_ratio(semitones),
                    output_stem: format!(
                        "transposed_{}_to_{}",
                        file_safe_key(&original),
                        file_safe_key(&target)
                    ),
                })
            }
        }
    }
}

/// Equal-temperament frequency ratio for a semitone offset: `2^(semitones / 12)`
pub fn pitch_ratio(semitones: f64) -> f64 {
    2f64.powf(semitones / 12.0)
}

/// Pitch ratio for `semitones`, rejecting offsets whose ratio is not a
/// finite positive number (NaN, infinite, or beyond roughly ±12 000 semitones)
pub fn checked_pitch_ratio(semitones: f64) -> Result<f64> {
    let ratio = pitch_ratio(semitones);
    if !semitones.is_finite() || !ratio.is_finite() || ratio <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "semitones out of range: {}",
            semitones
        )));
    }
    Ok(ratio)
}

/// Parse a `semitones` form value
///
/// The whole trimmed text must be a number; `"3 semitones"` is rejected.
/// NaN, infinite values and offsets with no usable pitch ratio are rejected;
/// any other value is accepted, including zero.
pub fn parse_semitones(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| Error::InvalidInput(format!("semitones must be a number, got '{}'", trimmed)))?;

    if !value.is_finite() {
        return Err(Error::InvalidInput(format!(
            "semitones must be finite, got '{}'",
            trimmed
        )));
    }
    checked_pitch_ratio(value)?;

    Ok(value)
}

/// Shortest readable form of a non-negative amount for file names
///
/// Plain decimal in the usual range, exponent notation for very small
/// amounts so the name stays short (`1e-300`, not 300 zeros).
fn format_amount(amount: f64) -> String {
    if amount == 0.0 || (1e-4..1e6).contains(&amount) {
        format!("{}", amount)
    } else {
        format!("{:e}", amount)
    }
}

/// Lowercased extension of `filename` including the dot, or empty
pub fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

fn file_safe_key(key: &str) -> String {
    key.replace('#', "sharp").replace(' ', "_")
}

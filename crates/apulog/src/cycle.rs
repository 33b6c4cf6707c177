//! Round trips of a trace through one representation and back to bytes.
//!
//! These are the fixtures used to check every conversion pair at once: a
//! trace is decoded, lowered or raised to the chosen representation, and
//! converted back along the inverse path to a fresh trace.
use std::fmt;

use crate::chip::ClockRate;
use crate::error::Result;
use crate::functional::{FunctionalEvent, from_compact, to_compact, to_functional, to_raw};
use crate::score::{
    self, BlendedScore, ExpressiveScore, ReducerConfig, SeparatedScore, downsample,
    expressive_to_raw, from_notation, raw_to_expressive, to_notation,
};
use crate::vgm;

/// Frame rate an expressive-level round trip resamples to.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FrameRate {
    /// Stay at 44.1 kHz.
    #[default]
    Native,
    Fixed(f64),
    /// Estimate from note onsets.
    Estimated,
}

/// Representation a trace is cycled through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Representation {
    Raw,
    Functional,
    Compact,
    RawScore,
    Expressive(FrameRate),
    Separated(FrameRate),
    Blended(FrameRate),
    Notation(FrameRate),
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, rate) = match self {
            Representation::Raw => ("raw", None),
            Representation::Functional => ("functional", None),
            Representation::Compact => ("compact", None),
            Representation::RawScore => ("rawsco", None),
            Representation::Expressive(rate) => ("exprsco", Some(rate)),
            Representation::Separated(rate) => ("seprsco", Some(rate)),
            Representation::Blended(rate) => ("blndsco", Some(rate)),
            Representation::Notation(rate) => ("notation", Some(rate)),
        };
        match rate {
            None | Some(FrameRate::Native) => f.write_str(name),
            Some(FrameRate::Fixed(hz)) => write!(f, "{name}@{hz}"),
            Some(FrameRate::Estimated) => write!(f, "{name}@auto"),
        }
    }
}

/// Cycle `bytes` through `repr` with the default reducer settings.
pub fn cycle(bytes: &[u8], repr: Representation) -> Result<Vec<u8>> {
    cycle_with(bytes, repr, &ReducerConfig::default())
}

/// Cycle `bytes` through `repr`.
///
/// # Errors
///
/// Whatever the conversions on the way fail with: a `FormatError` for a
/// malformed trace, a `ProtocolError` for writes outside the function
/// table, or `InsufficientData` when the frame rate must be estimated.
pub fn cycle_with(bytes: &[u8], repr: Representation, config: &ReducerConfig) -> Result<Vec<u8>> {
    let events = vgm::decode(bytes)?;
    if repr == Representation::Raw {
        return vgm::encode(&events);
    }

    let functional = to_functional(&events)?;
    let functional = match repr {
        Representation::Raw | Representation::Functional => functional,
        Representation::Compact => from_compact(&to_compact(&functional)?)?,
        Representation::RawScore => score::encode(&score::emulate(&functional)?)?,
        Representation::Expressive(rate) => {
            through_expressive(&functional, rate, config, |score| Ok(score.clone()))?
        }
        Representation::Separated(rate) => through_expressive(&functional, rate, config, |s| {
            Ok(SeparatedScore::from_expressive(s).to_expressive())
        })?,
        Representation::Blended(rate) => through_expressive(&functional, rate, config, |s| {
            Ok(BlendedScore::from_expressive(s).to_expressive())
        })?,
        Representation::Notation(rate) => through_expressive(&functional, rate, config, |s| {
            Ok(from_notation(&to_notation(s))?)
        })?,
    };

    let out = vgm::encode(&to_raw(&functional)?)?;
    log::debug!("cycled {} bytes through {} into {} bytes", bytes.len(), repr, out.len());
    Ok(out)
}

fn through_expressive(
    functional: &[FunctionalEvent],
    rate: FrameRate,
    config: &ReducerConfig,
    project: impl FnOnce(&ExpressiveScore) -> Result<ExpressiveScore>,
) -> Result<Vec<FunctionalEvent>> {
    let raw = score::emulate(functional)?;
    let clock: ClockRate = raw.clock;
    let expressive = raw_to_expressive(&raw, config)?;
    let expressive = match rate {
        FrameRate::Native => expressive,
        FrameRate::Fixed(hz) => downsample(&expressive, Some(hz), config)?,
        FrameRate::Estimated => downsample(&expressive, None, config)?,
    };
    let projected = project(&expressive)?;
    Ok(score::encode(&expressive_to_raw(&projected, clock))?)
}

//! Scripted input timelines.
//!
//! A script is a comma-separated list of `keys:start-end` segments, where
//! `keys` is one or more of `q`, `w`, `o`, `p` joined by `+` and the range
//! is in milliseconds of simulated time since reset, half-open:
//!
//! ```text
//! q:0-500,w:500-1000,o+p:1000-1400
//! ```
//!
//! | Key | Control |
//! |-----|---------|
//! | `q` | left thigh drive |
//! | `w` | right thigh drive |
//! | `o` | left calf extend |
//! | `p` | right calf extend |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use teeter_core::time::SimTime;
use teeter_core::types::{ControlInputState, Side};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ScriptError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("Segment {0:?} is missing ':'")]
    MissingColon(String),

    #[error("Unknown key {0:?} (expected q, w, o or p)")]
    UnknownKey(String),

    #[error("Invalid range {0:?} (expected start-end in ms)")]
    InvalidRange(String),

    #[error("Empty range {start}-{end}")]
    EmptyRange { start: u64, end: u64 },
}

// ---------------------------------------------------------------------------
// ScriptKey
// ---------------------------------------------------------------------------

/// One of the four held controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKey {
    LeftThigh,
    RightThigh,
    LeftCalf,
    RightCalf,
}

impl ScriptKey {
    pub const ALL: [Self; 4] = [
        Self::LeftThigh,
        Self::RightThigh,
        Self::LeftCalf,
        Self::RightCalf,
    ];

    pub const fn letter(self) -> char {
        match self {
            Self::LeftThigh => 'q',
            Self::RightThigh => 'w',
            Self::LeftCalf => 'o',
            Self::RightCalf => 'p',
        }
    }

    /// Set this key's control in `input`.
    pub const fn press(self, input: &mut ControlInputState) {
        match self {
            Self::LeftThigh => input.set_thigh_drive(Side::Left, true),
            Self::RightThigh => input.set_thigh_drive(Side::Right, true),
            Self::LeftCalf => input.set_calf_extend(Side::Left, true),
            Self::RightCalf => input.set_calf_extend(Side::Right, true),
        }
    }
}

impl FromStr for ScriptKey {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "q" | "Q" => Ok(Self::LeftThigh),
            "w" | "W" => Ok(Self::RightThigh),
            "o" | "O" => Ok(Self::LeftCalf),
            "p" | "P" => Ok(Self::RightCalf),
            other => Err(ScriptError::UnknownKey(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// InputScript
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    keys: Vec<ScriptKey>,
    start: Duration,
    end: Duration,
}

impl Segment {
    fn contains(&self, t: Duration) -> bool {
        self.start <= t && t < self.end
    }
}

/// A timeline of held inputs sampled by simulated time.
///
/// Segments may overlap; a control is held while any segment naming it
/// covers the sample time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputScript {
    segments: Vec<Segment>,
}

impl InputScript {
    /// Parse the `keys:start-end,...` format. An empty string is an empty
    /// script.
    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        let mut segments = Vec::new();
        for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (keys, range) = part
                .split_once(':')
                .ok_or_else(|| ScriptError::MissingColon(part.to_owned()))?;
            let keys = keys
                .split('+')
                .map(str::parse)
                .collect::<Result<Vec<ScriptKey>, _>>()?;
            let (start, end) = parse_range(range)?;
            segments.push(Segment {
                keys,
                start: Duration::from_millis(start),
                end: Duration::from_millis(end),
            });
        }
        Ok(Self { segments })
    }

    /// Controls held at `time`.
    pub fn sample(&self, time: SimTime) -> ControlInputState {
        let t = time.to_duration();
        let mut input = ControlInputState::IDLE;
        for segment in self.segments.iter().filter(|s| s.contains(t)) {
            for key in &segment.keys {
                key.press(&mut input);
            }
        }
        input
    }

    /// End of the last segment.
    pub fn duration(&self) -> Duration {
        self.segments
            .iter()
            .map(|s| s.end)
            .max()
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

fn parse_range(range: &str) -> Result<(u64, u64), ScriptError> {
    let invalid = || ScriptError::InvalidRange(range.trim().to_owned());
    let (start, end) = range.split_once('-').ok_or_else(invalid)?;
    let start: u64 = start.trim().parse().map_err(|_| invalid())?;
    let end: u64 = end.trim().parse().map_err(|_| invalid())?;
    if end <= start {
        return Err(ScriptError::EmptyRange { start, end });
    }
    Ok((start, end))
}

impl FromStr for InputScript {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for InputScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            for (k, key) in segment.keys.iter().enumerate() {
                if k > 0 {
                    f.write_str("+")?;
                }
                write!(f, "{}", key.letter())?;
            }
            write!(
                f,
                ":{}-{}",
                segment.start.as_millis(),
                segment.end.as_millis()
            )?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn at_ms(ms: u64) -> SimTime {
        SimTime::from_duration(Duration::from_millis(ms))
    }

    // ---- Parsing ----

    #[test]
    fn parses_segments() {
        let script = InputScript::parse("q:0-500, w:500-1000,o+p:1000-1400").unwrap();
        assert_eq!(script.segments.len(), 3);
        assert_eq!(
            script.segments[2].keys,
            vec![ScriptKey::LeftCalf, ScriptKey::RightCalf]
        );
        assert_eq!(script.duration(), Duration::from_millis(1400));
    }

    #[test]
    fn empty_text_is_empty_script() {
        let script = InputScript::parse("  ").unwrap();
        assert!(script.is_empty());
        assert_eq!(script.sample(at_ms(10)), ControlInputState::IDLE);
    }

    #[test]
    fn rejects_malformed_segments() {
        assert_eq!(
            InputScript::parse("q0-500"),
            Err(ScriptError::MissingColon("q0-500".into()))
        );
        assert_eq!(
            InputScript::parse("x:0-500"),
            Err(ScriptError::UnknownKey("x".into()))
        );
        assert_eq!(
            InputScript::parse("q:500"),
            Err(ScriptError::InvalidRange("500".into()))
        );
        assert_eq!(
            InputScript::parse("q:a-b"),
            Err(ScriptError::InvalidRange("a-b".into()))
        );
        assert_eq!(
            InputScript::parse("q:500-500"),
            Err(ScriptError::EmptyRange { start: 500, end: 500 })
        );
    }

    #[test]
    fn display_round_trips_canonical_form() {
        let text = "q:0-500,o+p:1000-1400";
        assert_eq!(InputScript::parse(text).unwrap().to_string(), text);
    }

    // ---- Sampling ----

    #[test]
    fn ranges_are_half_open() {
        let script: InputScript = "q:100-200".parse().unwrap();
        assert!(!script.sample(at_ms(99)).left_thigh_drive);
        assert!(script.sample(at_ms(100)).left_thigh_drive);
        assert!(script.sample(at_ms(199)).left_thigh_drive);
        assert!(!script.sample(at_ms(200)).left_thigh_drive);
    }

    #[test]
    fn overlapping_segments_combine() {
        let script: InputScript = "q:0-300,w+p:200-400".parse().unwrap();
        let input = script.sample(at_ms(250));
        assert!(input.left_thigh_drive);
        assert!(input.right_thigh_drive);
        assert!(input.right_calf_extend);
        assert!(!input.left_calf_extend);
    }
}

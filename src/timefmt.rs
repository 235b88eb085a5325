//! Elapsed/duration display values.

use std::fmt;
use std::time::Duration;

/// Whole minutes and leftover seconds of a time value.
///
/// Both parts are kept as plain numbers; padding the seconds to two digits
/// only happens when the value is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeParts {
    pub minutes: u64,
    pub seconds: u64,
}

impl TimeParts {
    /// Value shown while a duration is still unknown.
    pub const PLACEHOLDER: TimeParts = TimeParts {
        minutes: 0,
        seconds: 0,
    };
}

impl fmt::Display for TimeParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.minutes, self.seconds)
    }
}

/// Split `seconds` into minutes and seconds, truncating fractions.
///
/// `None`, negative and non-finite inputs give [`TimeParts::PLACEHOLDER`].
pub fn split_seconds(seconds: Option<f64>) -> TimeParts {
    match seconds {
        Some(s) if s.is_finite() && s >= 0.0 => {
            let whole = s.floor() as u64;
            TimeParts {
                minutes: whole / 60,
                seconds: whole % 60,
            }
        }
        _ => TimeParts::PLACEHOLDER,
    }
}

pub fn split_duration(d: Option<Duration>) -> TimeParts {
    split_seconds(d.map(|d| d.as_secs_f64()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_whole_minutes_and_truncates_fractions() {
        assert_eq!(
            split_seconds(Some(125.9)),
            TimeParts {
                minutes: 2,
                seconds: 5
            }
        );
        assert_eq!(
            split_seconds(Some(59.99)),
            TimeParts {
                minutes: 0,
                seconds: 59
            }
        );
        assert_eq!(
            split_seconds(Some(3600.0)),
            TimeParts {
                minutes: 60,
                seconds: 0
            }
        );
    }

    #[test]
    fn unknown_or_invalid_input_gives_placeholder() {
        assert_eq!(split_seconds(None), TimeParts::PLACEHOLDER);
        assert_eq!(split_seconds(Some(-3.0)), TimeParts::PLACEHOLDER);
        assert_eq!(split_seconds(Some(f64::NAN)), TimeParts::PLACEHOLDER);
        assert_eq!(split_seconds(Some(f64::INFINITY)), TimeParts::PLACEHOLDER);
        assert_eq!(split_duration(None).to_string(), "0:00");
    }

    #[test]
    fn renders_zero_padded_seconds() {
        assert_eq!(split_seconds(Some(7.0)).to_string(), "0:07");
        assert_eq!(split_seconds(Some(61.0)).to_string(), "1:01");
        assert_eq!(
            split_duration(Some(Duration::from_millis(754_400))).to_string(),
            "12:34"
        );
    }
}

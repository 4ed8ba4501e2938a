/*!
 * Phases: named or numbered revision passes over one locale's targets.
 */

use std::fmt;

use super::interchange::Target;

/// Phase recorded on a target
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    /// No phase attribute
    #[default]
    Unset,
    /// Numeric phase (`phase-name="2"`)
    Number(u32),
    /// Any other phase name
    Named(String),
}

impl Phase {
    /// Interpret a `phase-name` attribute value
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::Unset,
            Some(raw) => match raw.parse::<u32>() {
                Ok(number) => Self::Number(number),
                Err(_) => Self::Named(raw.to_string()),
            },
        }
    }

    /// Attribute value to write, if any
    pub fn to_attribute(&self) -> Option<String> {
        match self {
            Self::Unset => None,
            Self::Number(number) => Some(number.to_string()),
            Self::Named(name) => Some(name.clone()),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "(none)"),
            Self::Number(number) => write!(f, "{}", number),
            Self::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Which target a lookup should pick for a locale
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseSelector {
    /// No phase filter: the first target recorded for the locale
    Any,
    /// Numbered phase with backfill from earlier phases
    Numbered(u32),
    /// Latest phase up to `max_phase` (requested as `"0"`)
    Latest,
    /// Exact match on a non-numeric phase name, no fallback
    Named(String),
}

impl PhaseSelector {
    /// Interpret a requested phase name
    pub fn from_phase_name(phase_name: Option<&str>) -> Self {
        match phase_name.map(str::trim) {
            None => Self::Any,
            Some(raw) => match raw.parse::<u32>() {
                Ok(0) => Self::Latest,
                Ok(number) => Self::Numbered(number),
                Err(_) => Self::Named(raw.to_string()),
            },
        }
    }

    /// Pick a target among those already filtered to one locale
    pub fn select<'a>(&self, targets: &[&'a Target], max_phase: u32) -> Option<&'a Target> {
        let at = |number: u32| {
            targets
                .iter()
                .copied()
                .find(|target| target.phase == Phase::Number(number))
        };

        match self {
            Self::Any => targets.first().copied(),
            Self::Named(name) => targets
                .iter()
                .copied()
                .find(|target| matches!(&target.phase, Phase::Named(phase) if phase == name)),
            Self::Numbered(requested) => at(*requested).or_else(|| {
                if *requested > 1 && *requested <= max_phase {
                    (1..*requested).rev().find_map(at)
                } else {
                    None
                }
            }),
            Self::Latest => (1..=max_phase).rev().find_map(at),
        }
    }
}

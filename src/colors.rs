// Team color lookup: built-in table of team -> (fill, text) colors with an
// optional CSV override file. Colors are plain RGB triples in the core; the
// TUI converts them at the edge.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

// ---------------------------------------------------------------------------
// Rgb
// ---------------------------------------------------------------------------

/// A 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Fill color of an unoccupied base.
    pub const NEUTRAL_BASE: Rgb = Rgb(64, 64, 64);

    /// Linear interpolation toward `other`, `t` in [0, 1].
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Rgb(
            mix(self.0, other.0),
            mix(self.1, other.1),
            mix(self.2, other.2),
        )
    }
}

/// Parse a `#rrggbb` or `rrggbb` hex string.
pub fn parse_hex(s: &str) -> Option<Rgb> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Rgb(r, g, b))
}

// ---------------------------------------------------------------------------
// Color table
// ---------------------------------------------------------------------------

/// Fill and text color pair for one team's scoreboard row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamColors {
    pub fill: Rgb,
    pub text: Rgb,
}

/// Fallback colors for teams missing from the table.
pub const DEFAULT_COLORS: TeamColors = TeamColors {
    fill: Rgb(40, 40, 40),
    text: Rgb(255, 255, 255),
};

/// Built-in (fill, text) pairs for well-known teams.
const BUILTIN: &[(&str, Rgb, Rgb)] = &[
    ("Detroit Tigers", Rgb(0x00, 0x3b, 0x5c), Rgb(0xfa, 0x46, 0x16)),
    ("New York Yankees", Rgb(0x00, 0x3b, 0x5c), Rgb(0xe4, 0x00, 0x2b)),
    ("Cleveland Guardians", Rgb(0x00, 0x38, 0x5d), Rgb(0xe3, 0x19, 0x37)),
    ("Boston Red Sox", Rgb(0xbd, 0x30, 0x39), Rgb(0x0c, 0x23, 0x40)),
    ("Chicago Cubs", Rgb(0x0e, 0x33, 0x86), Rgb(0xcc, 0x34, 0x33)),
    ("Los Angeles Dodgers", Rgb(0x00, 0x5a, 0x8d), Rgb(0xef, 0x3e, 0x42)),
    ("Houston Astros", Rgb(0x00, 0x2d, 0x62), Rgb(0xeb, 0x6e, 0x1f)),
    ("San Francisco Giants", Rgb(0xfd, 0xba, 0x12), Rgb(0x27, 0x25, 0x1f)),
];

#[derive(Debug, Error)]
pub enum ColorTableError {
    #[error("failed to read color override file {path}: {source}")]
    Read {
        path: String,
        source: csv::Error,
    },
}

/// One row of the override CSV: `team,fill,text` with hex colors.
#[derive(Debug, Deserialize)]
struct OverrideRecord {
    team: String,
    fill: String,
    text: String,
}

/// Team-name-to-color lookup, built-ins plus optional CSV overrides.
#[derive(Debug, Clone)]
pub struct ColorTable {
    map: HashMap<String, TeamColors>,
}

impl ColorTable {
    /// The built-in table only.
    pub fn builtin() -> Self {
        let map = BUILTIN
            .iter()
            .map(|(name, fill, text)| {
                (
                    (*name).to_string(),
                    TeamColors {
                        fill: *fill,
                        text: *text,
                    },
                )
            })
            .collect();
        ColorTable { map }
    }

    /// Built-ins with rows from a `team,fill,text` CSV layered on top.
    /// Rows with unparseable colors are skipped with a warning.
    pub fn with_overrides(path: &Path) -> Result<Self, ColorTableError> {
        let mut table = ColorTable::builtin();
        let mut reader =
            csv::Reader::from_path(path).map_err(|source| ColorTableError::Read {
                path: path.display().to_string(),
                source,
            })?;
        for record in reader.deserialize() {
            let record: OverrideRecord = record.map_err(|source| ColorTableError::Read {
                path: path.display().to_string(),
                source,
            })?;
            match (parse_hex(&record.fill), parse_hex(&record.text)) {
                (Some(fill), Some(text)) => {
                    table
                        .map
                        .insert(record.team, TeamColors { fill, text });
                }
                _ => {
                    warn!(team = %record.team, "skipping color override with bad hex value");
                }
            }
        }
        Ok(table)
    }

    pub fn get(&self, team: &str) -> TeamColors {
        self.map.get(team).copied().unwrap_or(DEFAULT_COLORS)
    }

    /// Fill color for an optional team name; the default fill when unknown.
    pub fn fill_for(&self, team: Option<&str>) -> Rgb {
        team.map(|t| self.get(t).fill).unwrap_or(DEFAULT_COLORS.fill)
    }
}

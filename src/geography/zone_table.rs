//! The static zone → wind speed / display color mapping.
//!
//! The dataset only carries zone names; speeds and colors live here and must
//! cover every zone the dataset references. A TOML file can replace the
//! built-in NBC 2016 table:
//!
//! ```toml
//! [[zone]]
//! id = "wind_zone_33"
//! speed_mps = 33
//! color = "#bfd7ea"
//! ```

use std::{collections::BTreeMap, fmt, path::Path, str::FromStr};

use itertools::Itertools;
use serde::Deserialize;

use crate::error::{DataError, LookupError};

/// Built-in NBC 2016 (IS 875 Part 3) basic wind speed zones.
const NBC_2016_ZONES: &[(&str, u32, Color)] = &[
    ("wind_zone_33", 33, Color::rgb(0xbf, 0xd7, 0xea)),
    ("wind_zone_39", 39, Color::rgb(0x9a, 0xd1, 0xc3)),
    ("wind_zone_44", 44, Color::rgb(0x8f, 0xb9, 0x96)),
    ("wind_zone_47", 47, Color::rgb(0xc3, 0xc9, 0x8a)),
    ("wind_zone_50", 50, Color::rgb(0xe6, 0xc7, 0x7a)),
    ("wind_zone_55", 55, Color::rgb(0xc9, 0x7b, 0x63)),
];

pub const LEGEND_TITLE: &str = "Wind Zones (IS 875 : Part 3)";

/// 24-bit display color, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .filter(|h| h.len() == 6 && h.is_ascii())
            .ok_or_else(|| format!("color '{s}' is not of the form #rrggbb"))?;
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| format!("color '{s}' has a non-hex channel"))
        };
        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneStyle {
    pub speed_mps: u32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneTable {
    zones: BTreeMap<String, ZoneStyle>,
}

#[derive(Deserialize)]
struct ZoneTableFile {
    zone: Vec<ZoneTableEntry>,
}

#[derive(Deserialize)]
struct ZoneTableEntry {
    id: String,
    speed_mps: u32,
    color: Color,
}

impl Default for ZoneTable {
    fn default() -> Self {
        let zones = NBC_2016_ZONES
            .iter()
            .map(|&(id, speed_mps, color)| (id.to_owned(), ZoneStyle { speed_mps, color }))
            .collect();
        ZoneTable { zones }
    }
}

impl ZoneTable {
    pub fn from_toml_str(text: &str) -> Result<Self, DataError> {
        let file: ZoneTableFile =
            toml::from_str(text).map_err(|e| DataError::ZoneTable(e.to_string()))?;

        let mut zones = BTreeMap::new();
        for entry in file.zone {
            if entry.id.trim().is_empty() {
                return Err(DataError::ZoneTable("zone entry with empty id".to_owned()));
            }
            let style = ZoneStyle {
                speed_mps: entry.speed_mps,
                color: entry.color,
            };
            if zones.insert(entry.id.clone(), style).is_some() {
                return Err(DataError::ZoneTable(format!("duplicate zone id '{}'", entry.id)));
            }
        }
        if zones.is_empty() {
            return Err(DataError::ZoneTable("table defines no zones".to_owned()));
        }
        Ok(ZoneTable { zones })
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, DataError> {
        let text = std::fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_owned(),
            source,
        })?;
        tracing::debug!("Read zone table from {}", path.display());
        ZoneTable::from_toml_str(&text)
    }

    pub fn style_for(&self, zone_id: &str) -> Result<ZoneStyle, LookupError> {
        self.zones
            .get(zone_id)
            .copied()
            .ok_or_else(|| LookupError::UnknownZone(zone_id.to_owned()))
    }

    pub fn speed_for(&self, zone_id: &str) -> Result<u32, LookupError> {
        self.style_for(zone_id).map(|style| style.speed_mps)
    }

    pub fn color_for(&self, zone_id: &str) -> Result<Color, LookupError> {
        self.style_for(zone_id).map(|style| style.color)
    }

    /// Zones ordered by ascending wind speed, then id.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ZoneStyle)> {
        self.zones
            .iter()
            .map(|(id, style)| (id.as_str(), style))
            .sorted_by_key(|(id, style)| (style.speed_mps, *id))
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Text legend: one line per zone with its color swatch and speed.
    pub fn legend(&self) -> String {
        let lines = self
            .iter()
            .map(|(_, style)| {
                format!(
                    "{}  Zone {} – {} m/s",
                    style.color, style.speed_mps, style.speed_mps
                )
            })
            .join("\n");
        format!("{LEGEND_TITLE}\n{lines}")
    }
}

// src/lib.rs

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod aspect;
pub mod chart;
pub mod compatibility;
pub mod config;
pub mod ephemeris;
pub mod logger;

pub use aspect::{aspect_score, find_aspect, separation, Aspect, AspectRule, ASPECT_RULES};
pub use chart::{build_chart, classify, BodyPosition, Chart};
pub use compatibility::{score_compatibility, CompatibilityLevel, CompatibilityResult};
pub use config::{Config, ConfigError, OutputFormat};
pub use ephemeris::{Ephemeris, EphemerisProvider};

// ---------------------------
// ## Enumerations
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CelestialBody {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

impl CelestialBody {
    /// Canonical chart order. Two charts are paired body-by-body in this order.
    pub const ALL: [CelestialBody; 10] = [
        CelestialBody::Sun,
        CelestialBody::Moon,
        CelestialBody::Mercury,
        CelestialBody::Venus,
        CelestialBody::Mars,
        CelestialBody::Jupiter,
        CelestialBody::Saturn,
        CelestialBody::Uranus,
        CelestialBody::Neptune,
        CelestialBody::Pluto,
    ];

    pub fn iter() -> impl Iterator<Item = CelestialBody> {
        Self::ALL.iter().copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            CelestialBody::Sun => "Sun",
            CelestialBody::Moon => "Moon",
            CelestialBody::Mercury => "Mercury",
            CelestialBody::Venus => "Venus",
            CelestialBody::Mars => "Mars",
            CelestialBody::Jupiter => "Jupiter",
            CelestialBody::Saturn => "Saturn",
            CelestialBody::Uranus => "Uranus",
            CelestialBody::Neptune => "Neptune",
            CelestialBody::Pluto => "Pluto",
        }
    }
}

impl fmt::Display for CelestialBody {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub const SIGNS: [&str; 12] = [
    "Aries",
    "Taurus",
    "Gemini",
    "Cancer",
    "Leo",
    "Virgo",
    "Libra",
    "Scorpio",
    "Sagittarius",
    "Capricorn",
    "Aquarius",
    "Pisces",
];

pub const HOUSES: [&str; 12] = [
    "1st House",
    "2nd House",
    "3rd House",
    "4th House",
    "5th House",
    "6th House",
    "7th House",
    "8th House",
    "9th House",
    "10th House",
    "11th House",
    "12th House",
];

/// Index of the 30° sector holding `longitude`, always in `0..12`.
pub fn sector_index(longitude: f64) -> usize {
    let normalized_longitude = longitude.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    ((normalized_longitude / 30.0).floor() as usize).min(11)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ZodiacSign {
    Aries = 0,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl ZodiacSign {
    const ORDER: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    pub fn from_longitude(longitude: f64) -> Self {
        Self::ORDER[sector_index(longitude)]
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        SIGNS[self.index()]
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ZodiacSign {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Equal 30° houses: house *i* covers the same sector as sign *i*.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum House {
    First = 1,
    Second,
    Third,
    Fourth,
    Fifth,
    Sixth,
    Seventh,
    Eighth,
    Ninth,
    Tenth,
    Eleventh,
    Twelfth,
}

impl House {
    const ORDER: [House; 12] = [
        House::First,
        House::Second,
        House::Third,
        House::Fourth,
        House::Fifth,
        House::Sixth,
        House::Seventh,
        House::Eighth,
        House::Ninth,
        House::Tenth,
        House::Eleventh,
        House::Twelfth,
    ];

    pub fn from_longitude(longitude: f64) -> Self {
        Self::ORDER[sector_index(longitude)]
    }

    /// Zero-based sector index, matching `ZodiacSign::index`.
    pub fn index(&self) -> usize {
        *self as usize - 1
    }

    pub fn label(&self) -> &'static str {
        HOUSES[self.index()]
    }
}

impl fmt::Display for House {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for House {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

// ---------------------------
// ## Structures
// ---------------------------

pub type JulianDay = f64;

/// Geocoded birthplace. Carried alongside the birth moment but not used by the
/// geocentric position math.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Location { latitude, longitude }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthInfo {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: Option<Location>,
}

impl BirthInfo {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        BirthInfo {
            date,
            time,
            location: None,
        }
    }

    /// Parses a `YYYY-MM-DD` date and an `HH:MM` clock time.
    pub fn parse(date: &str, time: &str) -> Result<Self, AstrologyError> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|e| AstrologyError::InvalidInput(format!("date '{}': {}", date, e)))?;
        let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
            .map_err(|e| AstrologyError::InvalidInput(format!("time '{}': {}", time, e)))?;
        Ok(BirthInfo::new(date, time))
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn julian_day(&self) -> JulianDay {
        julian_day(
            self.date.year(),
            self.date.month(),
            self.date.day(),
            self.time.hour(),
            self.time.minute(),
        )
    }

    pub fn chart<P: EphemerisProvider + ?Sized>(&self, ephemeris: &P) -> Result<Chart, AstrologyError> {
        build_chart(ephemeris, self.julian_day())
    }
}

// ---------------------------
// ## Error Handling
// ---------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AstrologyError {
    #[error("ephemeris could not compute {body} at JD {julian_day}: {message}")]
    EphemerisFailure {
        body: CelestialBody,
        julian_day: JulianDay,
        message: String,
    },

    #[error("charts cannot be paired: {left} positions against {right}")]
    ChartLengthMismatch { left: usize, right: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

// ---------------------------
// ## Utility Functions
// ---------------------------

/// Julian Day for a Gregorian calendar date and local clock time.
///
/// The clock time is taken literally: no timezone or UTC offset is applied.
pub fn julian_day(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> JulianDay {
    let hour = hour as f64 + minute as f64 / 60.0;
    let (mut y, mut m) = (year as f64, month as f64);
    if month <= 2 {
        y -= 1.0;
        m += 12.0;
    }
    let a = (y / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();
    (365.25 * (y + 4716.0)).floor() + (30.6001 * (m + 1.0)).floor() + day as f64 + b - 1524.5
        + hour / 24.0
}

/// Rounds to the 2-decimal precision used when presenting degrees.
pub fn display_degree(degree: f64) -> f64 {
    (degree * 100.0).round() / 100.0
}

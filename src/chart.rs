use serde::Serializer;
use tracing::{debug, warn};

use super::*;

/// Sign and house of the 30° sector holding `degree`.
pub fn classify(degree: f64) -> (ZodiacSign, House) {
    (ZodiacSign::from_longitude(degree), House::from_longitude(degree))
}

fn serialize_display_degree<S: Serializer>(degree: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(display_degree(*degree))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodyPosition {
    pub body: CelestialBody,
    /// Unrounded longitude in `[0, 360)`; aspects are measured from this.
    #[serde(rename = "degree", serialize_with = "serialize_display_degree")]
    pub longitude: f64,
    pub sign: ZodiacSign,
    pub house: House,
}

impl BodyPosition {
    pub fn new(body: CelestialBody, longitude: f64) -> Self {
        let mut longitude = longitude.rem_euclid(360.0);
        if longitude >= 360.0 {
            longitude = 0.0;
        }
        let (sign, house) = classify(longitude);
        BodyPosition {
            body,
            longitude,
            sign,
            house,
        }
    }

    /// Longitude rounded for presentation.
    pub fn degree(&self) -> f64 {
        display_degree(self.longitude)
    }
}

impl fmt::Display for BodyPosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} is in {} ({:.2}°) in the {}",
            self.body,
            self.sign,
            self.degree(),
            self.house
        )
    }
}

/// Classified positions in canonical body order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Chart {
    positions: Vec<BodyPosition>,
}

impl Chart {
    /// Wraps positions as given. Order is kept; no body matching is done.
    pub fn from_positions(positions: Vec<BodyPosition>) -> Self {
        Chart { positions }
    }

    pub fn positions(&self) -> &[BodyPosition] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn get(&self, body: CelestialBody) -> Option<&BodyPosition> {
        self.positions.iter().find(|p| p.body == body)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BodyPosition> {
        self.positions.iter()
    }
}

impl<'a> IntoIterator for &'a Chart {
    type Item = &'a BodyPosition;
    type IntoIter = std::slice::Iter<'a, BodyPosition>;

    fn into_iter(self) -> Self::IntoIter {
        self.positions.iter()
    }
}

impl fmt::Display for Chart {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for position in &self.positions {
            writeln!(f, "{}", position)?;
        }
        Ok(())
    }
}

/// Builds the ten-body chart for `julian_day`.
///
/// Any provider failure aborts the whole chart, as does a longitude that is
/// NaN or infinite.
pub fn build_chart<P: EphemerisProvider + ?Sized>(ephemeris: &P, julian_day: JulianDay) -> Result<Chart, AstrologyError> {
    let positions = CelestialBody::iter()
        .map(|body| {
            ephemeris
                .longitude(julian_day, body)
                .and_then(|longitude| {
                    if longitude.is_finite() {
                        Ok(BodyPosition::new(body, longitude))
                    } else {
                        Err(AstrologyError::EphemerisFailure {
                            body,
                            julian_day,
                            message: "non-finite longitude".to_string(),
                        })
                    }
                })
                .inspect_err(|err| warn!(%body, julian_day, error = %err, "chart aborted"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(julian_day, bodies = positions.len(), "chart built");
    Ok(Chart::from_positions(positions))
}

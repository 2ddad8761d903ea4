//! Geocentric ecliptic longitudes from mean orbital elements.
//!
//! A low-precision analytical model: Keplerian orbits with elements of date,
//! the largest lunar perturbations, the Jupiter/Saturn/Uranus mutual terms and
//! a periodic fit for Pluto. Good to a fraction of a degree for the Sun, Moon
//! and planets over the 20th and 21st centuries, which is well inside the 30°
//! sectors and aspect orbs the charts are built from.

use approx::abs_diff_eq;
use tracing::trace;

use super::*;

/// Source of ecliptic longitudes for chart construction.
pub trait EphemerisProvider {
    /// Geocentric ecliptic longitude of `body` at `julian_day`, in degrees `[0, 360)`.
    fn longitude(&self, julian_day: JulianDay, body: CelestialBody) -> Result<f64, AstrologyError>;
}

impl<P: EphemerisProvider + ?Sized> EphemerisProvider for &P {
    fn longitude(&self, julian_day: JulianDay, body: CelestialBody) -> Result<f64, AstrologyError> {
        (**self).longitude(julian_day, body)
    }
}

/// Day zero of the element polynomials: 1999-12-31 0h.
const ELEMENT_EPOCH: JulianDay = 2451543.5;

/// Pluto's periodic fit is only published for 1885-01-01 .. 2100-01-01.
const PLUTO_VALID_FROM: JulianDay = 2409542.5;
const PLUTO_VALID_UNTIL: JulianDay = 2488069.5;

/// Drift of the J2000 equinox to the equinox of date, degrees per day.
const PRECESSION_PER_DAY: f64 = 3.82394e-5;

const KEPLER_MAX_ITERATIONS: usize = 32;
const KEPLER_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
struct OrbitalElements {
    /// Longitude of the ascending node.
    node: f64,
    inclination: f64,
    /// Argument of perihelion.
    perihelion: f64,
    semi_major_axis: f64,
    eccentricity: f64,
    mean_anomaly: f64,
}

impl OrbitalElements {
    const fn from_array(v: [f64; 6]) -> Self {
        OrbitalElements {
            node: v[0],
            inclination: v[1],
            perihelion: v[2],
            semi_major_axis: v[3],
            eccentricity: v[4],
            mean_anomaly: v[5],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Ecliptic {
    longitude: f64,
    latitude: f64,
    distance: f64,
}

impl Ecliptic {
    fn from_rectangular(x: f64, y: f64, z: f64) -> Self {
        Ecliptic {
            longitude: y.atan2(x).to_degrees().rem_euclid(360.0),
            latitude: z.atan2(x.hypot(y)).to_degrees(),
            distance: (x * x + y * y + z * z).sqrt(),
        }
    }

    fn to_rectangular(self) -> (f64, f64, f64) {
        let (lon, lat) = (self.longitude.to_radians(), self.latitude.to_radians());
        (
            self.distance * lon.cos() * lat.cos(),
            self.distance * lon.sin() * lat.cos(),
            self.distance * lat.sin(),
        )
    }
}

fn sin_deg(x: f64) -> f64 {
    x.to_radians().sin()
}

fn cos_deg(x: f64) -> f64 {
    x.to_radians().cos()
}

/// Mean elements of date, linear in `d` (days since `ELEMENT_EPOCH`).
#[derive(Debug, Clone, Copy, PartialEq)]
struct ElementSeries {
    base: OrbitalElements,
    rate: OrbitalElements,
}

impl ElementSeries {
    const fn new(base: [f64; 6], rate: [f64; 6]) -> Self {
        ElementSeries {
            base: OrbitalElements::from_array(base),
            rate: OrbitalElements::from_array(rate),
        }
    }

    fn at(&self, d: f64) -> OrbitalElements {
        let (b, r) = (&self.base, &self.rate);
        OrbitalElements {
            node: b.node + r.node * d,
            inclination: b.inclination + r.inclination * d,
            perihelion: b.perihelion + r.perihelion * d,
            semi_major_axis: b.semi_major_axis + r.semi_major_axis * d,
            eccentricity: b.eccentricity + r.eccentricity * d,
            mean_anomaly: b.mean_anomaly + r.mean_anomaly * d,
        }
    }
}

// [node, inclination, perihelion, semi-major axis, eccentricity, mean anomaly]
const SUN: ElementSeries = ElementSeries::new(
    [0.0, 0.0, 282.9404, 1.0, 0.016709, 356.0470],
    [0.0, 0.0, 4.70935e-5, 0.0, -1.151e-9, 0.9856002585],
);
// semi-major axis in Earth radii
const MOON: ElementSeries = ElementSeries::new(
    [125.1228, 5.1454, 318.0634, 60.2666, 0.054900, 115.3654],
    [-0.0529538083, 0.0, 0.1643573223, 0.0, 0.0, 13.0649929509],
);
const MERCURY: ElementSeries = ElementSeries::new(
    [48.3313, 7.0047, 29.1241, 0.387098, 0.205635, 168.6562],
    [3.24587e-5, 5.00e-8, 1.01444e-5, 0.0, 5.59e-10, 4.0923344368],
);
const VENUS: ElementSeries = ElementSeries::new(
    [76.6799, 3.3946, 54.8910, 0.723330, 0.006773, 48.0052],
    [2.46590e-5, 2.75e-8, 1.38374e-5, 0.0, -1.302e-9, 1.6021302244],
);
const MARS: ElementSeries = ElementSeries::new(
    [49.5574, 1.8497, 286.5016, 1.523688, 0.093405, 18.6021],
    [2.11081e-5, -1.78e-8, 2.92961e-5, 0.0, 2.516e-9, 0.5240207766],
);
const JUPITER: ElementSeries = ElementSeries::new(
    [100.4542, 1.3030, 273.8777, 5.20256, 0.048498, 19.8950],
    [2.76854e-5, -1.557e-7, 1.64505e-5, 0.0, 4.469e-9, 0.0830853001],
);
const SATURN: ElementSeries = ElementSeries::new(
    [113.6634, 2.4886, 339.3939, 9.55475, 0.055546, 316.9670],
    [2.38980e-5, -1.081e-7, 2.97661e-5, 0.0, -9.499e-9, 0.0334442282],
);
const URANUS: ElementSeries = ElementSeries::new(
    [74.0005, 0.7733, 96.6612, 19.18171, 0.047318, 142.5905],
    [1.3978e-5, 1.9e-8, 3.0565e-5, -1.55e-8, 7.45e-9, 0.011725806],
);
const NEPTUNE: ElementSeries = ElementSeries::new(
    [131.7806, 1.7700, 272.8461, 30.05826, 0.008606, 260.2471],
    [3.0173e-5, -2.55e-7, -6.027e-6, 3.313e-8, 2.15e-9, 0.005995147],
);

/// Solves Kepler's equation `M = E - e sin E` for the eccentric anomaly, in degrees.
fn eccentric_anomaly(mean_anomaly: f64, eccentricity: f64) -> Option<f64> {
    let m = mean_anomaly.rem_euclid(360.0).to_radians();
    let mut e0 = m + eccentricity * m.sin() * (1.0 + eccentricity * m.cos());
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let e1 = e0 - (e0 - eccentricity * e0.sin() - m) / (1.0 - eccentricity * e0.cos());
        if !e1.is_finite() {
            return None;
        }
        if abs_diff_eq!(e1, e0, epsilon = KEPLER_TOLERANCE) {
            return Some(e1.to_degrees());
        }
        e0 = e1;
    }
    None
}

/// Position of a body in the frame its elements are referred to
/// (heliocentric for planets, geocentric for the Moon).
fn orbital_position(elements: &OrbitalElements) -> Option<Ecliptic> {
    let ecc = elements.eccentricity;
    let big_e = eccentric_anomaly(elements.mean_anomaly, ecc)?;
    let xv = elements.semi_major_axis * (cos_deg(big_e) - ecc);
    let yv = elements.semi_major_axis * ((1.0 - ecc * ecc).sqrt() * sin_deg(big_e));
    let v = yv.atan2(xv).to_degrees();
    let r = xv.hypot(yv);

    let (n, i, vw) = (elements.node, elements.inclination, v + elements.perihelion);
    let x = r * (cos_deg(n) * cos_deg(vw) - sin_deg(n) * sin_deg(vw) * cos_deg(i));
    let y = r * (sin_deg(n) * cos_deg(vw) + cos_deg(n) * sin_deg(vw) * cos_deg(i));
    let z = r * (sin_deg(vw) * sin_deg(i));
    Some(Ecliptic::from_rectangular(x, y, z))
}

/// Native analytical ephemeris. Stateless; safe to share across threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ephemeris;

impl Ephemeris {
    pub fn new() -> Self {
        Ephemeris
    }

    fn failure(body: CelestialBody, julian_day: JulianDay, message: &str) -> AstrologyError {
        AstrologyError::EphemerisFailure {
            body,
            julian_day,
            message: message.to_string(),
        }
    }

    fn kepler(
        &self,
        series: &ElementSeries,
        body: CelestialBody,
        julian_day: JulianDay,
        d: f64,
    ) -> Result<Ecliptic, AstrologyError> {
        orbital_position(&series.at(d))
            .ok_or_else(|| Self::failure(body, julian_day, "Kepler's equation did not converge"))
    }

    /// Geocentric Sun. Added to a heliocentric vector it gives the geocentric one.
    fn sun(&self, julian_day: JulianDay, d: f64) -> Result<Ecliptic, AstrologyError> {
        self.kepler(&SUN, CelestialBody::Sun, julian_day, d)
    }

    fn moon(&self, julian_day: JulianDay, d: f64) -> Result<f64, AstrologyError> {
        let moon = self.kepler(&MOON, CelestialBody::Moon, julian_day, d)?;
        let (sun, lunar) = (SUN.at(d), MOON.at(d));

        let ms = sun.mean_anomaly;
        let mm = lunar.mean_anomaly;
        let ls = ms + sun.perihelion;
        let lm = mm + lunar.perihelion + lunar.node;
        let dd = lm - ls;
        let f = lm - lunar.node;

        let perturbation = -1.274 * sin_deg(mm - 2.0 * dd)
            + 0.658 * sin_deg(2.0 * dd)
            - 0.186 * sin_deg(ms)
            - 0.059 * sin_deg(2.0 * mm - 2.0 * dd)
            - 0.057 * sin_deg(mm - 2.0 * dd + ms)
            + 0.053 * sin_deg(mm + 2.0 * dd)
            + 0.046 * sin_deg(2.0 * dd - ms)
            + 0.041 * sin_deg(mm - ms)
            - 0.035 * sin_deg(dd)
            - 0.031 * sin_deg(mm + ms)
            - 0.015 * sin_deg(2.0 * f - 2.0 * dd)
            + 0.011 * sin_deg(mm - 4.0 * dd);
        Ok(moon.longitude + perturbation)
    }

    /// Heliocentric Jupiter, Saturn and Uranus longitude corrections, in degrees.
    fn giant_planet_perturbation(body: CelestialBody, d: f64) -> f64 {
        let (mj, ms, mu) = (
            JUPITER.at(d).mean_anomaly,
            SATURN.at(d).mean_anomaly,
            URANUS.at(d).mean_anomaly,
        );
        match body {
            CelestialBody::Jupiter => {
                -0.332 * sin_deg(2.0 * mj - 5.0 * ms - 67.6)
                    - 0.056 * sin_deg(2.0 * mj - 2.0 * ms + 21.0)
                    + 0.042 * sin_deg(3.0 * mj - 5.0 * ms + 21.0)
                    - 0.036 * sin_deg(mj - 2.0 * ms)
                    + 0.022 * cos_deg(mj - ms)
                    + 0.023 * sin_deg(2.0 * mj - 3.0 * ms + 52.0)
                    - 0.016 * sin_deg(mj - 5.0 * ms - 69.0)
            }
            CelestialBody::Saturn => {
                0.812 * sin_deg(2.0 * mj - 5.0 * ms - 67.6)
                    - 0.229 * cos_deg(2.0 * mj - 4.0 * ms - 2.0)
                    + 0.119 * sin_deg(mj - 2.0 * ms - 3.0)
                    + 0.046 * sin_deg(2.0 * mj - 6.0 * ms - 69.0)
                    + 0.014 * sin_deg(mj - 3.0 * ms + 32.0)
            }
            CelestialBody::Uranus => {
                0.040 * sin_deg(ms - 2.0 * mu + 6.0)
                    + 0.035 * sin_deg(ms - 3.0 * mu + 33.0)
                    - 0.015 * sin_deg(mj - mu + 20.0)
            }
            _ => 0.0,
        }
    }

    /// Heliocentric Pluto, J2000 equinox.
    fn pluto(&self, julian_day: JulianDay, d: f64) -> Result<Ecliptic, AstrologyError> {
        if !(PLUTO_VALID_FROM..PLUTO_VALID_UNTIL).contains(&julian_day) {
            return Err(Self::failure(
                CelestialBody::Pluto,
                julian_day,
                "outside the 1885-2099 range of the Pluto series",
            ));
        }
        let s = 50.03 + 0.033459652 * d;
        let p = 238.95 + 0.003968789 * d;
        let longitude = 238.9508 + 0.00400703 * d
            - 19.799 * sin_deg(p) + 19.848 * cos_deg(p)
            + 0.897 * sin_deg(2.0 * p) - 4.956 * cos_deg(2.0 * p)
            + 0.610 * sin_deg(3.0 * p) + 1.211 * cos_deg(3.0 * p)
            - 0.341 * sin_deg(4.0 * p) - 0.190 * cos_deg(4.0 * p)
            + 0.128 * sin_deg(5.0 * p) - 0.034 * cos_deg(5.0 * p)
            - 0.038 * sin_deg(6.0 * p) + 0.031 * cos_deg(6.0 * p)
            + 0.020 * sin_deg(s - p) - 0.010 * cos_deg(s - p);
        let latitude = -3.9082
            - 5.453 * sin_deg(p) - 14.975 * cos_deg(p)
            + 3.527 * sin_deg(2.0 * p) + 1.673 * cos_deg(2.0 * p)
            - 1.051 * sin_deg(3.0 * p) + 0.328 * cos_deg(3.0 * p)
            + 0.179 * sin_deg(4.0 * p) - 0.292 * cos_deg(4.0 * p)
            + 0.019 * sin_deg(5.0 * p) + 0.100 * cos_deg(5.0 * p)
            - 0.031 * sin_deg(6.0 * p) - 0.026 * cos_deg(6.0 * p)
            + 0.011 * cos_deg(s - p);
        let distance = 40.72
            + 6.68 * sin_deg(p) + 6.90 * cos_deg(p)
            - 1.18 * sin_deg(2.0 * p) - 0.03 * cos_deg(2.0 * p)
            + 0.15 * sin_deg(3.0 * p) - 0.14 * cos_deg(3.0 * p);
        Ok(Ecliptic {
            longitude: longitude + PRECESSION_PER_DAY * d,
            latitude,
            distance,
        })
    }

    /// Heliocentric Kepler planet with its perturbation terms.
    fn planet(
        &self,
        series: &ElementSeries,
        body: CelestialBody,
        julian_day: JulianDay,
        d: f64,
    ) -> Result<Ecliptic, AstrologyError> {
        let mut position = self.kepler(series, body, julian_day, d)?;
        position.longitude += Self::giant_planet_perturbation(body, d);
        if body == CelestialBody::Saturn {
            let (mj, ms) = (JUPITER.at(d).mean_anomaly, SATURN.at(d).mean_anomaly);
            position.latitude += -0.020 * cos_deg(2.0 * mj - 4.0 * ms - 2.0)
                + 0.018 * sin_deg(2.0 * mj - 6.0 * ms - 49.0);
        }
        Ok(position)
    }

    fn planet_longitude(
        &self,
        series: &ElementSeries,
        body: CelestialBody,
        julian_day: JulianDay,
        d: f64,
    ) -> Result<f64, AstrologyError> {
        let heliocentric = self.planet(series, body, julian_day, d)?;
        self.geocentric(heliocentric, julian_day, d)
    }

    fn geocentric(&self, heliocentric: Ecliptic, julian_day: JulianDay, d: f64) -> Result<f64, AstrologyError> {
        let (px, py, pz) = heliocentric.to_rectangular();
        let (sx, sy, sz) = self.sun(julian_day, d)?.to_rectangular();
        Ok(Ecliptic::from_rectangular(px + sx, py + sy, pz + sz).longitude)
    }
}

impl EphemerisProvider for Ephemeris {
    fn longitude(&self, julian_day: JulianDay, body: CelestialBody) -> Result<f64, AstrologyError> {
        if !julian_day.is_finite() {
            return Err(Self::failure(body, julian_day, "time coordinate is not finite"));
        }
        let d = julian_day - ELEMENT_EPOCH;

        let longitude = match body {
            CelestialBody::Sun => self.sun(julian_day, d)?.longitude,
            CelestialBody::Moon => self.moon(julian_day, d)?,
            CelestialBody::Pluto => self.geocentric(self.pluto(julian_day, d)?, julian_day, d)?,
            CelestialBody::Mercury => self.planet_longitude(&MERCURY, body, julian_day, d)?,
            CelestialBody::Venus => self.planet_longitude(&VENUS, body, julian_day, d)?,
            CelestialBody::Mars => self.planet_longitude(&MARS, body, julian_day, d)?,
            CelestialBody::Jupiter => self.planet_longitude(&JUPITER, body, julian_day, d)?,
            CelestialBody::Saturn => self.planet_longitude(&SATURN, body, julian_day, d)?,
            CelestialBody::Uranus => self.planet_longitude(&URANUS, body, julian_day, d)?,
            CelestialBody::Neptune => self.planet_longitude(&NEPTUNE, body, julian_day, d)?,
        };

        let longitude = longitude.rem_euclid(360.0);
        if !longitude.is_finite() {
            return Err(Self::failure(body, julian_day, "longitude is not finite"));
        }
        trace!(%body, julian_day, longitude, "ephemeris longitude");
        // rem_euclid may land on 360.0 exactly for a tiny negative input
        Ok(if longitude >= 360.0 { 0.0 } else { longitude })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn angular_distance(a: f64, b: f64) -> f64 {
        let diff = (a - b).rem_euclid(360.0);
        diff.min(360.0 - diff)
    }

    #[test]
    fn test_sun_position_j2000() {
        let eph = Ephemeris::new();
        let sun = eph.longitude(2451545.0, CelestialBody::Sun).unwrap();
        assert_relative_eq!(sun, 280.37, epsilon = 0.1);
    }

    #[test]
    fn test_sun_position_worked_example() {
        // 1990-04-19 0h UT
        let eph = Ephemeris::new();
        let jd = julian_day(1990, 4, 19, 0, 0);
        let sun = eph.longitude(jd, CelestialBody::Sun).unwrap();
        assert_relative_eq!(sun, 28.69, epsilon = 0.1);
    }

    #[test]
    fn test_moon_position_j2000() {
        let eph = Ephemeris::new();
        let moon = eph.longitude(2451545.0, CelestialBody::Moon).unwrap();
        assert!(angular_distance(moon, 223.3) < 1.0, "moon at {}", moon);
    }

    #[test]
    fn test_sun_advances_about_a_degree_per_day() {
        let eph = Ephemeris::new();
        let a = eph.longitude(2460000.5, CelestialBody::Sun).unwrap();
        let b = eph.longitude(2460001.5, CelestialBody::Sun).unwrap();
        let step = (b - a).rem_euclid(360.0);
        assert!(step > 0.95 && step < 1.03, "step {}", step);
    }

    #[test]
    fn test_inner_planets_stay_near_sun() {
        let eph = Ephemeris::new();
        for jd in [2447000.5, 2451545.0, 2455000.5, 2460000.5] {
            let sun = eph.longitude(jd, CelestialBody::Sun).unwrap();
            let mercury = eph.longitude(jd, CelestialBody::Mercury).unwrap();
            let venus = eph.longitude(jd, CelestialBody::Venus).unwrap();
            assert!(angular_distance(sun, mercury) <= 28.5, "mercury elongation at {}", jd);
            assert!(angular_distance(sun, venus) <= 47.5, "venus elongation at {}", jd);
        }
    }

    #[test]
    fn test_element_series_are_linear_in_days() {
        let tables = [&SUN, &MOON, &MERCURY, &VENUS, &MARS, &JUPITER, &SATURN, &URANUS, &NEPTUNE];
        for series in tables {
            assert_eq!(series.at(0.0), series.base);
            let later = series.at(1000.0);
            assert_relative_eq!(later.mean_anomaly, series.base.mean_anomaly + 1000.0 * series.rate.mean_anomaly);
            assert_relative_eq!(later.node, series.base.node + 1000.0 * series.rate.node);
            assert!((0.0..1.0).contains(&later.eccentricity));
            assert!(later.semi_major_axis > 0.0);
        }
        assert_relative_eq!(SUN.at(0.0).perihelion, 282.9404);
        assert_relative_eq!(NEPTUNE.at(0.0).semi_major_axis, 30.05826);
    }

    #[test]
    fn test_all_bodies_in_range() {
        let eph = Ephemeris::new();
        for jd in [2415020.5, 2440000.5, 2451545.0, 2470000.5] {
            for body in CelestialBody::iter() {
                let lon = eph.longitude(jd, body).unwrap();
                assert!((0.0..360.0).contains(&lon), "{} at {} gave {}", body, jd, lon);
            }
        }
    }

    #[test]
    fn test_outer_planets_move_slowly() {
        let eph = Ephemeris::new();
        for body in [CelestialBody::Uranus, CelestialBody::Neptune, CelestialBody::Pluto] {
            let a = eph.longitude(2451545.0, body).unwrap();
            let b = eph.longitude(2451575.0, body).unwrap();
            assert!(angular_distance(a, b) < 2.0, "{} moved {}", body, angular_distance(a, b));
        }
    }

    #[test]
    fn test_pluto_out_of_range_is_failure() {
        let eph = Ephemeris::new();
        let jd = julian_day(1850, 1, 1, 0, 0);
        match eph.longitude(jd, CelestialBody::Pluto) {
            Err(AstrologyError::EphemerisFailure { body, .. }) => assert_eq!(body, CelestialBody::Pluto),
            other => panic!("expected an ephemeris failure, got {:?}", other),
        }
        assert!(eph.longitude(jd, CelestialBody::Saturn).is_ok());
    }

    #[test]
    fn test_non_finite_time_is_failure() {
        let eph = Ephemeris::new();
        for jd in [f64::NAN, f64::INFINITY] {
            assert!(matches!(
                eph.longitude(jd, CelestialBody::Sun),
                Err(AstrologyError::EphemerisFailure { .. })
            ));
        }
    }

    #[test]
    fn test_kepler_solution() {
        let (m, ecc): (f64, f64) = (104.0653, 0.016709);
        let e = eccentric_anomaly(m, ecc).unwrap();
        assert_relative_eq!(e - ecc.to_degrees() * sin_deg(e), m, epsilon = 1e-6);
        assert_relative_eq!(eccentric_anomaly(0.0, 0.2).unwrap(), 0.0, epsilon = 1e-9);
    }
}

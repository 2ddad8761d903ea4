use astro_match::{
    build_chart, julian_day, score_compatibility, AstrologyError, BirthInfo, CelestialBody, CompatibilityLevel,
    Ephemeris, EphemerisProvider, JulianDay,
};

/// Every body at the same offset from a base longitude.
struct UniformEphemeris(f64);

impl EphemerisProvider for UniformEphemeris {
    fn longitude(&self, _julian_day: JulianDay, _body: CelestialBody) -> Result<f64, AstrologyError> {
        Ok(self.0)
    }
}

struct BrokenEphemeris;

impl EphemerisProvider for BrokenEphemeris {
    fn longitude(&self, julian_day: JulianDay, body: CelestialBody) -> Result<f64, AstrologyError> {
        Err(AstrologyError::EphemerisFailure {
            body,
            julian_day,
            message: "numerical failure".to_string(),
        })
    }
}

#[test]
fn same_birth_moment_is_a_perfect_match() {
    let eph = Ephemeris::new();
    let birth = BirthInfo::parse("1991-06-18", "07:10").unwrap();
    let first = birth.chart(&eph).unwrap();
    let second = birth.chart(&eph).unwrap();

    let result = score_compatibility(&first, &second).unwrap();
    assert_eq!(result.raw_score, result.max_score);
    assert_eq!(result.scaled_score, 36);
    assert_eq!(result.level, CompatibilityLevel::Perfect);
}

#[test]
fn disjoint_charts_are_a_low_match() {
    let first = build_chart(&UniformEphemeris(5.0), 0.0).unwrap();
    let second = build_chart(&UniformEphemeris(45.0), 0.0).unwrap();
    let result = score_compatibility(&first, &second).unwrap();
    assert_eq!(result.raw_score, 0);
    assert_eq!(result.level, CompatibilityLevel::Low);
}

#[test]
fn provider_failure_surfaces_as_ephemeris_failure() {
    let err = build_chart(&BrokenEphemeris, julian_day(2000, 1, 1, 0, 0)).unwrap_err();
    assert!(matches!(err, AstrologyError::EphemerisFailure { body: CelestialBody::Sun, .. }));
    assert!(err.to_string().contains("numerical failure"));
}

#[test]
fn charts_outside_pluto_range_fail_whole() {
    let birth = BirthInfo::parse("1870-03-01", "12:00").unwrap();
    let err = birth.chart(&Ephemeris::new()).unwrap_err();
    assert!(matches!(err, AstrologyError::EphemerisFailure { body: CelestialBody::Pluto, .. }));
}

#[test]
fn real_charts_score_within_scale() {
    let eph = Ephemeris::new();
    let births = [
        ("1950-01-15", "03:30"),
        ("1975-08-09", "22:05"),
        ("1991-06-18", "07:10"),
        ("2004-02-29", "12:00"),
        ("2023-11-30", "18:45"),
    ];
    let charts: Vec<_> = births
        .iter()
        .map(|(date, time)| BirthInfo::parse(date, time).unwrap().chart(&eph).unwrap())
        .collect();

    for a in &charts {
        assert_eq!(a.len(), 10);
        for b in &charts {
            let forward = score_compatibility(a, b).unwrap();
            let backward = score_compatibility(b, a).unwrap();
            assert!(forward.scaled_score <= 36);
            assert_eq!(forward.raw_score, backward.raw_score);
        }
    }
}

#[test]
fn independent_threads_build_identical_charts() {
    let jd = julian_day(1991, 6, 18, 7, 10);
    let handles: Vec<_> = (0..4)
        .map(|_| std::thread::spawn(move || build_chart(&Ephemeris::new(), jd).unwrap()))
        .collect();
    let charts: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(charts.windows(2).all(|w| w[0] == w[1]));
}

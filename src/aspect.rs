use super::*;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Aspect {
    Conjunction,
    Sextile,
    Square,
    Trine,
    Opposition,
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Aspect::Conjunction => "Conjunction",
            Aspect::Sextile => "Sextile",
            Aspect::Square => "Square",
            Aspect::Trine => "Trine",
            Aspect::Opposition => "Opposition",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct AspectRule {
    pub aspect: Aspect,
    /// Exact separation, degrees.
    pub angle: f64,
    /// Allowed deviation from `angle`, degrees, inclusive.
    pub orb: f64,
    pub score: u32,
}

impl AspectRule {
    pub const fn new(aspect: Aspect, angle: f64, orb: f64, score: u32) -> Self {
        AspectRule {
            aspect,
            angle,
            orb,
            score,
        }
    }

    pub fn matches(&self, separation: f64) -> bool {
        (separation - self.angle).abs() <= self.orb
    }
}

/// Declaration order is match order: when orbs overlap the earlier rule wins.
pub const ASPECT_RULES: [AspectRule; 5] = [
    AspectRule::new(Aspect::Conjunction, 0.0, 8.0, 5),
    AspectRule::new(Aspect::Sextile, 60.0, 6.0, 3),
    AspectRule::new(Aspect::Square, 90.0, 8.0, 2),
    AspectRule::new(Aspect::Trine, 120.0, 8.0, 4),
    AspectRule::new(Aspect::Opposition, 180.0, 8.0, 1),
];

/// Highest score any single rule in `rules` awards.
pub const fn max_rule_score(rules: &[AspectRule]) -> u32 {
    let mut max = 0;
    let mut i = 0;
    while i < rules.len() {
        if rules[i].score > max {
            max = rules[i].score;
        }
        i += 1;
    }
    max
}

pub const MAX_ASPECT_SCORE: u32 = max_rule_score(&ASPECT_RULES);

/// Minimal angular separation of two longitudes, in `[0, 180]`.
pub fn separation(degree_a: f64, degree_b: f64) -> f64 {
    let diff = (degree_a - degree_b).abs().rem_euclid(360.0);
    diff.min(360.0 - diff)
}

/// First rule in `rules` whose orb covers the separation of the two longitudes.
pub fn find_aspect_in(rules: &[AspectRule], degree_a: f64, degree_b: f64) -> Option<&AspectRule> {
    let angle = separation(degree_a, degree_b);
    rules.iter().find(|rule| rule.matches(angle))
}

pub fn find_aspect(degree_a: f64, degree_b: f64) -> Option<&'static AspectRule> {
    find_aspect_in(&ASPECT_RULES, degree_a, degree_b)
}

/// Score of the aspect formed by two longitudes, 0 when none applies.
pub fn aspect_score(degree_a: f64, degree_b: f64) -> u32 {
    find_aspect(degree_a, degree_b).map_or(0, |rule| rule.score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_separation_is_minimal_arc() {
        assert_relative_eq!(separation(100.0, 10.0), 90.0);
        assert_relative_eq!(separation(350.0, 10.0), 20.0);
        assert_relative_eq!(separation(10.0, 350.0), 20.0);
        assert_relative_eq!(separation(0.0, 180.0), 180.0);
        assert_relative_eq!(separation(725.0, 5.0), 0.0);
    }

    #[test]
    fn test_square_scenario() {
        assert_eq!(find_aspect(100.0, 10.0).map(|r| r.aspect), Some(Aspect::Square));
        assert_eq!(aspect_score(100.0, 10.0), 2);
    }

    #[test]
    fn test_exact_conjunction() {
        for x in [0.0, 45.5, 179.99, 359.99] {
            assert_eq!(aspect_score(x, x), 5);
        }
    }

    #[test]
    fn test_conjunction_across_zero() {
        assert_eq!(find_aspect(358.0, 3.0).map(|r| r.aspect), Some(Aspect::Conjunction));
    }

    #[test]
    fn test_orb_boundaries_are_inclusive() {
        assert_eq!(aspect_score(0.0, 8.0), 5);
        assert_eq!(aspect_score(0.0, 8.5), 0);
        assert_eq!(aspect_score(0.0, 54.0), 3);
        assert_eq!(aspect_score(0.0, 66.0), 3);
        assert_eq!(aspect_score(0.0, 67.0), 0);
        assert_eq!(aspect_score(0.0, 128.0), 4);
        assert_eq!(aspect_score(10.0, 182.0), 1);
        assert_eq!(aspect_score(0.0, 40.0), 0);
    }

    #[test]
    fn test_symmetry() {
        let degrees = [0.0, 7.9, 33.3, 59.0, 91.25, 118.0, 179.5, 200.0, 271.0, 359.9];
        for &a in &degrees {
            for &b in &degrees {
                assert_eq!(aspect_score(a, b), aspect_score(b, a), "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_max_aspect_score() {
        assert_eq!(MAX_ASPECT_SCORE, 5);
        assert_eq!(max_rule_score(&[]), 0);
    }

    #[test]
    fn test_declared_order_wins_on_overlap() {
        // 75° sits inside both widened orbs; the earlier declaration is chosen
        // even though the later one scores higher.
        let rules = [
            AspectRule::new(Aspect::Sextile, 60.0, 20.0, 1),
            AspectRule::new(Aspect::Square, 90.0, 20.0, 9),
        ];
        let rule = find_aspect_in(&rules, 0.0, 75.0).unwrap();
        assert_eq!(rule.aspect, Aspect::Sextile);
        assert_eq!(rule.score, 1);

        let reversed = [rules[1], rules[0]];
        assert_eq!(find_aspect_in(&reversed, 0.0, 75.0).unwrap().aspect, Aspect::Square);
    }

    #[test]
    fn test_default_table_order() {
        let order: Vec<Aspect> = ASPECT_RULES.iter().map(|r| r.aspect).collect();
        assert_eq!(
            order,
            vec![Aspect::Conjunction, Aspect::Sextile, Aspect::Square, Aspect::Trine, Aspect::Opposition]
        );
        let angles: Vec<f64> = ASPECT_RULES.iter().map(|r| r.angle).collect();
        assert_eq!(angles, vec![0.0, 60.0, 90.0, 120.0, 180.0]);
    }
}

//! Synastry scoring: two charts compared body by body on a 36-point scale.

use tracing::debug;

use super::aspect::{find_aspect, MAX_ASPECT_SCORE};
use super::*;

pub const SIGN_MATCH_SCORE: u32 = 2;
pub const HOUSE_MATCH_SCORE: u32 = 1;
/// Most a single aligned body pair can contribute.
pub const MAX_BODY_SCORE: u32 = SIGN_MATCH_SCORE + HOUSE_MATCH_SCORE + MAX_ASPECT_SCORE;
/// Ceiling of the traditional 36-point compatibility scale.
pub const SCALE_MAX: u32 = 36;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompatibilityLevel {
    Low,
    Moderate,
    Good,
    Perfect,
}

impl CompatibilityLevel {
    /// Fixed thresholds on the 36-point scale.
    pub fn from_scaled(scaled: u32) -> Self {
        match scaled {
            30.. => CompatibilityLevel::Perfect,
            18.. => CompatibilityLevel::Good,
            9.. => CompatibilityLevel::Moderate,
            _ => CompatibilityLevel::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CompatibilityLevel::Perfect => "Perfect Match",
            CompatibilityLevel::Good => "Good Match",
            CompatibilityLevel::Moderate => "Moderate Match",
            CompatibilityLevel::Low => "Low Match",
        }
    }
}

impl fmt::Display for CompatibilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for CompatibilityLevel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompatibilityResult {
    pub raw_score: u32,
    pub max_score: u32,
    pub scaled_score: u32,
    pub level: CompatibilityLevel,
    pub breakdown: Vec<String>,
}

impl fmt::Display for CompatibilityResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Score: {}/{} ({})", self.scaled_score, SCALE_MAX, self.level)?;
        writeln!(f, "Raw: {}/{}", self.raw_score, self.max_score)?;
        for line in &self.breakdown {
            writeln!(f, "  {}", line)?;
        }
        Ok(())
    }
}

/// Points and explanations for one aligned pair of positions.
fn score_pair(a: &BodyPosition, b: &BodyPosition, breakdown: &mut Vec<String>) -> u32 {
    let mut score = 0;
    if a.sign == b.sign {
        score += SIGN_MATCH_SCORE;
        breakdown.push(format!("{}: both in {} (+{})", a.body, a.sign, SIGN_MATCH_SCORE));
    }
    if a.house == b.house {
        score += HOUSE_MATCH_SCORE;
        breakdown.push(format!("{}: both in the {} (+{})", a.body, a.house, HOUSE_MATCH_SCORE));
    }
    if let Some(rule) = find_aspect(a.longitude, b.longitude).filter(|rule| rule.score > 0) {
        score += rule.score;
        breakdown.push(format!(
            "{}: {} at {:.2}° (+{})",
            a.body,
            rule.aspect,
            separation(a.longitude, b.longitude),
            rule.score
        ));
    }
    score
}

/// `raw / max` projected onto the 36-point scale.
///
/// Ties round half away from zero (`f64::round`), so 22.5 becomes 23 and 4.5
/// becomes 5. This is not banker's rounding: a half-to-even rule would give 22
/// and 4 for the same inputs.
fn scale(raw: u32, max: u32) -> u32 {
    if max == 0 {
        return 0;
    }
    let scaled = (raw as f64 / max as f64 * SCALE_MAX as f64).round() as u32;
    scaled.min(SCALE_MAX)
}

/// Scores two charts pairwise by position.
///
/// Bodies are paired by index, never matched by name; both charts must hold
/// the same number of positions.
pub fn score_compatibility(first: &Chart, second: &Chart) -> Result<CompatibilityResult, AstrologyError> {
    if first.len() != second.len() {
        return Err(AstrologyError::ChartLengthMismatch {
            left: first.len(),
            right: second.len(),
        });
    }

    let mut breakdown = Vec::new();
    let raw_score: u32 = first
        .iter()
        .zip(second.iter())
        .map(|(a, b)| score_pair(a, b, &mut breakdown))
        .sum();

    let max_score = first.len() as u32 * MAX_BODY_SCORE;
    let scaled_score = scale(raw_score, max_score);
    let level = CompatibilityLevel::from_scaled(scaled_score);
    debug!(raw_score, max_score, scaled_score, %level, "compatibility scored");

    Ok(CompatibilityResult {
        raw_score,
        max_score,
        scaled_score,
        level,
        breakdown,
    })
}

//! Nursing competency scorecard.
//!
//! `gap` is derived from `final` and `standard` and is recomputed on every
//! edit; a stored value is never trusted.

use serde::{Deserialize, Serialize};
use validator::Validate;

pub const CRITICAL_GAP: i64 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Competency {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    #[validate(range(min = 0, max = 5, message = "Scores range from 0 to 5"))]
    pub standard: i64,
    #[serde(rename = "self", default)]
    #[validate(range(min = 0, max = 5, message = "Scores range from 0 to 5"))]
    pub self_score: i64,
    #[serde(default)]
    #[validate(range(min = 0, max = 5, message = "Scores range from 0 to 5"))]
    pub leader: i64,
    #[serde(rename = "final", default)]
    #[validate(range(min = 0, max = 5, message = "Scores range from 0 to 5"))]
    pub final_score: i64,
    #[serde(default)]
    pub gap: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreField {
    Standard,
    #[serde(rename = "self")]
    SelfScore,
    Leader,
    Final,
}

pub fn gap_between(final_score: i64, standard: i64) -> i64 {
    (final_score - standard).max(0)
}

pub fn gap_label(gap: i64) -> &'static str {
    match gap {
        g if g <= 0 => "Met",
        1 => "Slight",
        2 => "Moderate",
        _ => "Critical",
    }
}

impl Competency {
    pub fn new(kind: &str, name: &str, standard: i64, self_score: i64, leader: i64, final_score: i64) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.to_string(),
            standard,
            self_score,
            leader,
            final_score,
            gap: gap_between(final_score, standard),
        }
    }

    pub fn set_score(&mut self, field: ScoreField, value: i64) {
        match field {
            ScoreField::Standard => self.standard = value,
            ScoreField::SelfScore => self.self_score = value,
            ScoreField::Leader => self.leader = value,
            ScoreField::Final => self.final_score = value,
        }
        self.recompute_gap();
    }

    pub fn recompute_gap(&mut self) {
        self.gap = gap_between(self.final_score, self.standard);
    }

    pub fn is_critical(&self) -> bool {
        self.gap >= CRITICAL_GAP
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetencyRecord {
    pub personnel_type: String,
    pub level: String,
    pub standard_level: String,
    #[serde(default)]
    pub competencies: Vec<Competency>,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetencySummary {
    pub total: usize,
    pub average_final: f64,
    pub average_gap: f64,
    pub critical_count: usize,
}

fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl CompetencyRecord {
    pub fn default_template() -> Self {
        let rows = [
            ("Functional", "Commitment to patient-centered care", 3, 3, 3),
            ("Functional", "Problem-solving and clinical decision-making", 2, 3, 3),
            ("Functional", "Building and maintaining therapeutic relationships", 3, 3, 3),
            ("Functional", "Nursing management and administration", 2, 3, 3),
            (
                "Specific",
                "Key clinical issues :: Care and services for patients at the health checkup unit",
                3,
                3,
                3,
            ),
            (
                "Specific",
                "Key clinical issues :: Patient satisfaction at health checkup units",
                3,
                4,
                4,
            ),
            ("Managerial", "Leadership", 3, 3, 3),
            ("Managerial", "Vision", 3, 3, 3),
            ("Managerial", "Potential for leading change", 3, 3, 3),
            ("Managerial", "Self-control", 3, 4, 4),
            ("Managerial", "Potential development", 3, 4, 4),
        ];
        Self {
            personnel_type: "Level 1".to_string(),
            level: "0-1 year".to_string(),
            standard_level: "Standard level".to_string(),
            competencies: rows
                .iter()
                .map(|(kind, name, self_score, leader, final_score)| {
                    Competency::new(kind, name, 1, *self_score, *leader, *final_score)
                })
                .collect(),
            updated_at: None,
        }
    }

    pub fn normalize(&mut self) {
        for c in &mut self.competencies {
            c.recompute_gap();
        }
    }

    pub fn summary(&self) -> CompetencySummary {
        let total = self.competencies.len();
        if total == 0 {
            return CompetencySummary {
                total: 0,
                average_final: 0.0,
                average_gap: 0.0,
                critical_count: 0,
            };
        }
        let final_sum: i64 = self.competencies.iter().map(|c| c.final_score).sum();
        let gap_sum: i64 = self.competencies.iter().map(|c| c.gap).sum();
        CompetencySummary {
            total,
            average_final: one_decimal(final_sum as f64 / total as f64),
            average_gap: one_decimal(gap_sum as f64 / total as f64),
            critical_count: self.competencies.iter().filter(|c| c.is_critical()).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_tracks_final_and_standard_for_all_scores() {
        for standard in 0..=5 {
            for final_score in 0..=5 {
                let mut c = Competency::new("Functional", "x", 0, 0, 0, 0);
                c.set_score(ScoreField::Standard, standard);
                c.set_score(ScoreField::Final, final_score);
                assert_eq!(c.gap, (final_score - standard).max(0));
                c.set_score(ScoreField::Leader, 4);
                assert_eq!(c.gap, (final_score - standard).max(0));
            }
        }
    }

    #[test]
    fn normalize_discards_stored_gap() {
        let mut record = CompetencyRecord::default_template();
        record.competencies[0].gap = 99;
        record.normalize();
        assert_eq!(record.competencies[0].gap, 2);
    }

    #[test]
    fn template_summary() {
        let summary = CompetencyRecord::default_template().summary();
        assert_eq!(summary.total, 11);
        assert_eq!(summary.critical_count, 3);
        assert_eq!(summary.average_final, 3.3);
        assert_eq!(summary.average_gap, 2.3);
    }

    #[test]
    fn labels() {
        assert_eq!(gap_label(0), "Met");
        assert_eq!(gap_label(1), "Slight");
        assert_eq!(gap_label(2), "Moderate");
        assert_eq!(gap_label(4), "Critical");
    }
}

use std::collections::HashSet;
use std::env;

use tracing::warn;

use super::weights::{DEFAULT_WEIGHTS, PreselectionWeights};

/// Averages strictly above this earn the academic bonus.
pub const DEFAULT_ACADEMIC_THRESHOLD: f64 = 7.5;

pub const DEFAULT_PRESTIGE_COLLEGES: &[&str] = &[
    "Massachusetts Institute of Technology",
    "Stanford University",
    "Harvard University",
    "University of Cambridge",
    "University of Oxford",
    "University of Tokyo",
    "National University of Singapore",
];

/// Skills relevant for the trainee role.
pub const DEFAULT_RELEVANT_SKILLS: &[&str] = &[
    "Programming",
    "Data Science",
    "Machine Learning",
    "Python",
    "JavaScript",
    "SQL",
    "Git",
    "Linux",
    "Algorithms",
    "Data Structures",
    "Cloud Basics",
    "APIs",
    "Docker",
    "Testing",
];

/// Immutable scoring configuration passed into every scoring call.
#[derive(Debug, Clone, PartialEq)]
pub struct PreselectionConfig {
    pub weights: PreselectionWeights,
    pub academic_threshold: f64,
    pub prestige_colleges: HashSet<String>,
    pub relevant_skills: HashSet<String>,
}

impl Default for PreselectionConfig {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
            academic_threshold: DEFAULT_ACADEMIC_THRESHOLD,
            prestige_colleges: to_set(DEFAULT_PRESTIGE_COLLEGES.iter().copied()),
            relevant_skills: to_set(DEFAULT_RELEVANT_SKILLS.iter().copied()),
        }
    }
}

impl PreselectionConfig {
    /// Reads overrides from the environment, falling back to the defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let weights = PreselectionWeights {
            academic_average: parse_env_f64("CT_WEIGHT_ACADEMIC_AVERAGE")
                .unwrap_or(defaults.weights.academic_average),
            college: parse_env_f64("CT_WEIGHT_COLLEGE").unwrap_or(defaults.weights.college),
            skills: parse_env_f64("CT_WEIGHT_SKILL").unwrap_or(defaults.weights.skills),
        };
        let weights = if weights.is_non_negative() {
            weights
        } else {
            warn!(?weights, "negative preselection weight configured; using defaults");
            defaults.weights
        };

        Self {
            weights,
            academic_threshold: parse_env_f64("CT_ACADEMIC_THRESHOLD")
                .unwrap_or(defaults.academic_threshold),
            prestige_colleges: parse_env_list("CT_PRESTIGE_COLLEGES")
                .unwrap_or(defaults.prestige_colleges),
            relevant_skills: parse_env_list("CT_RELEVANT_SKILLS")
                .unwrap_or(defaults.relevant_skills),
        }
    }
}

fn to_set<'a>(values: impl Iterator<Item = &'a str>) -> HashSet<String> {
    values.map(str::to_string).collect()
}

fn parse_env_f64(name: &str) -> Option<f64> {
    env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

fn parse_env_list(name: &str) -> Option<HashSet<String>> {
    env::var(name).ok().map(|raw| parse_list(&raw)).filter(|set| !set.is_empty())
}

fn parse_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_original_lists() {
        let config = PreselectionConfig::default();
        assert_eq!(config.prestige_colleges.len(), 7);
        assert_eq!(config.relevant_skills.len(), 14);
        assert!(config.prestige_colleges.contains("Stanford University"));
        assert!(config.relevant_skills.contains("Docker"));
        assert_eq!(config.academic_threshold, 7.5);
    }

    #[test]
    fn list_parsing_trims_and_skips_blanks() {
        let parsed = parse_list(" Rust , ,Go,");
        assert_eq!(parsed, to_set(["Rust", "Go"].into_iter()));
    }

    #[test]
    fn unset_variables_fall_back_to_defaults() {
        assert_eq!(parse_env_f64("CT_TEST_UNSET_WEIGHT_VARIABLE"), None);
        assert_eq!(parse_env_list("CT_TEST_UNSET_LIST_VARIABLE"), None);
    }
}

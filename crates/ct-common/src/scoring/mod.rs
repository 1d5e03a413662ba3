pub mod config;
pub mod weights;

use std::cmp::Ordering;

use crate::candidate::{Candidate, CandidateId};

pub use config::PreselectionConfig;
pub use weights::{DEFAULT_WEIGHTS, PreselectionWeights};

/// Per-term breakdown of a preselection score.
#[derive(Debug, Clone, PartialEq)]
pub struct PreselectionScore {
    pub total: f64,
    pub academic: f64,
    pub college: f64,
    pub skills: f64,
    pub matched_skills: usize,
}

/// A stored candidate together with its freshly computed score.
///
/// The score is never persisted; it is derived from the current
/// configuration every time candidates are read.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub id: CandidateId,
    pub candidate: Candidate,
    pub score: f64,
}

pub struct PreselectionEngine {
    config: PreselectionConfig,
}

impl Default for PreselectionEngine {
    fn default() -> Self {
        Self::new(PreselectionConfig::default())
    }
}

impl PreselectionEngine {
    pub fn new(config: PreselectionConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, candidate: &Candidate) -> PreselectionScore {
        let weights = self.config.weights;

        let academic = if candidate.academic_average > self.config.academic_threshold {
            weights.academic_average
        } else {
            0.0
        };

        let college = if self.config.prestige_colleges.contains(&candidate.college) {
            weights.college
        } else {
            0.0
        };

        let mut total = academic + college;
        let mut skills = 0.0;
        let mut matched_skills = 0;
        for skill in &candidate.skills {
            if self.config.relevant_skills.contains(skill) {
                total += weights.skills;
                skills += weights.skills;
                matched_skills += 1;
            }
        }

        PreselectionScore {
            total,
            academic,
            college,
            skills,
            matched_skills,
        }
    }

    /// Scores every candidate, keeping ids aligned with input positions.
    pub fn score_all(&self, candidates: Vec<Candidate>) -> Vec<ScoredCandidate> {
        candidates
            .into_iter()
            .enumerate()
            .map(|(index, candidate)| {
                let score = self.score(&candidate).total;
                ScoredCandidate {
                    id: CandidateId(index),
                    candidate,
                    score,
                }
            })
            .collect()
    }

    /// Returns at most `k` candidates ordered by descending score.
    ///
    /// The sort is stable, so equal scores keep creation order.
    pub fn rank_top_k(&self, candidates: Vec<Candidate>, k: usize) -> Vec<ScoredCandidate> {
        if k == 0 {
            return Vec::new();
        }

        let mut ranked = self.score_all(candidates);
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked.truncate(k);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, average: f64, college: &str, skills: &[&str]) -> Candidate {
        Candidate {
            full_name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            college: college.into(),
            degree: "Computer Science".into(),
            academic_average: average,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            work_experience: "-".into(),
        }
    }

    #[test]
    fn full_profile_scores_sum_of_weights() {
        let engine = PreselectionEngine::default();
        let score = engine.score(&candidate(
            "Ana",
            9.0,
            "Stanford University",
            &["Python", "SQL"],
        ));

        assert!((score.total - 0.82).abs() < 1e-9);
        assert_eq!(score.academic, 0.5);
        assert_eq!(score.college, 0.3);
        assert_eq!(score.matched_skills, 2);
    }

    #[test]
    fn academic_threshold_is_strict() {
        let engine = PreselectionEngine::default();

        assert_eq!(engine.score(&candidate("A", 7.5, "UNAM", &[])).total, 0.0);
        assert_eq!(engine.score(&candidate("B", 7.51, "UNAM", &[])).total, 0.5);
    }

    #[test]
    fn college_and_skills_require_exact_match() {
        let engine = PreselectionEngine::default();
        let score = engine.score(&candidate(
            "Luis",
            5.0,
            "stanford university",
            &["python", "Rust", "Docker"],
        ));

        assert_eq!(score.college, 0.0);
        assert_eq!(score.matched_skills, 1);
        assert!((score.total - 0.01).abs() < 1e-9);
    }

    #[test]
    fn score_never_decreases_with_more_relevant_skills() {
        let engine = PreselectionEngine::default();
        let pool = ["Python", "SQL", "Git", "Linux", "Docker", "Python"];

        let mut previous = f64::MIN;
        for held in 0..=pool.len() {
            let score = engine
                .score(&candidate("Maria", 8.0, "UNAM", &pool[..held]))
                .total;
            assert!(score >= previous, "{held} skills scored {score} < {previous}");
            previous = score;
        }
    }

    #[test]
    fn custom_weights_are_respected() {
        let engine = PreselectionEngine::new(PreselectionConfig {
            weights: PreselectionWeights {
                academic_average: 1.0,
                college: 2.0,
                skills: 0.5,
            },
            ..PreselectionConfig::default()
        });

        let score = engine.score(&candidate("Carlos", 9.5, "Harvard University", &["SQL"]));
        assert!((score.total - 3.5).abs() < 1e-9);
    }

    #[test]
    fn rank_top_k_on_empty_input_is_empty() {
        let engine = PreselectionEngine::default();
        for k in [0, 1, 10] {
            assert!(engine.rank_top_k(Vec::new(), k).is_empty());
        }
    }

    #[test]
    fn rank_top_k_sorts_descending_and_truncates() {
        let engine = PreselectionEngine::default();
        let candidates = vec![
            candidate("Low", 5.0, "UNAM", &[]),
            candidate("High", 9.0, "Harvard University", &["SQL"]),
            candidate("Mid", 8.0, "UNAM", &[]),
        ];

        let top = engine.rank_top_k(candidates.clone(), 2);
        let names: Vec<_> = top.iter().map(|c| c.candidate.full_name.as_str()).collect();
        assert_eq!(names, vec!["High", "Mid"]);
        assert_eq!(top[0].id, CandidateId(1));

        let all = engine.rank_top_k(candidates, 10);
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|pair| pair[0].score >= pair[1].score));
    }

    #[test]
    fn ties_keep_creation_order() {
        let engine = PreselectionEngine::default();
        let candidates = vec![
            candidate("First", 8.0, "UNAM", &[]),
            candidate("Second", 8.0, "UBA", &[]),
            candidate("Best", 8.0, "University of Oxford", &[]),
            candidate("Third", 9.0, "UdeC", &[]),
        ];

        let ranked = engine.rank_top_k(candidates, 4);
        let ids: Vec<_> = ranked.iter().map(|c| c.id.index()).collect();
        assert_eq!(ids, vec![2, 0, 1, 3]);
    }

    #[test]
    fn k_zero_yields_nothing() {
        let engine = PreselectionEngine::default();
        let ranked = engine.rank_top_k(vec![candidate("Ana", 9.0, "UNAM", &[])], 0);
        assert!(ranked.is_empty());
    }
}

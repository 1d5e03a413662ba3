use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Separator used when the skill list is flattened into a single CSV cell.
pub const SKILL_SEPARATOR: char = ',';

pub const ACADEMIC_AVERAGE_MIN_EXCLUSIVE: f64 = 3.0;
pub const ACADEMIC_AVERAGE_MAX: f64 = 10.0;

static RE_EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$").unwrap()
});

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("academic_average must be greater than 3 and at most 10 (got {0})")]
    AcademicAverageOutOfRange(f64),
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("skill must not contain ',': {0}")]
    SkillContainsSeparator(String),
    #[error("skills must not be blank")]
    BlankSkill,
    #[error("work_experience must not be blank")]
    BlankWorkExperience,
}

/// Positional identity of a stored candidate (row index in creation order).
///
/// Only stable while the store stays append-only; any per-row deletion
/// would shift every later id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub usize);

impl CandidateId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A student applying for the trainee role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub full_name: String,
    pub email: String,
    pub college: String,
    pub degree: String,
    pub academic_average: f64,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default = "default_work_experience")]
    pub work_experience: String,
}

pub fn default_work_experience() -> String {
    "-".to_string()
}

impl Candidate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        // NaN fails both comparisons and is rejected here as well.
        if !(self.academic_average > ACADEMIC_AVERAGE_MIN_EXCLUSIVE
            && self.academic_average <= ACADEMIC_AVERAGE_MAX)
        {
            return Err(ValidationError::AcademicAverageOutOfRange(
                self.academic_average,
            ));
        }

        if !is_valid_email(&self.email) {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }

        for skill in &self.skills {
            if skill.trim().is_empty() {
                return Err(ValidationError::BlankSkill);
            }
            if skill.contains(SKILL_SEPARATOR) {
                return Err(ValidationError::SkillContainsSeparator(skill.clone()));
            }
        }

        // A blank cell reads back as the placeholder, so it cannot be stored as is.
        if self.work_experience.trim().is_empty() {
            return Err(ValidationError::BlankWorkExperience);
        }

        Ok(())
    }

    /// Trims the email and fills a blank `work_experience` with the
    /// placeholder, so the stored row reads back unchanged.
    pub fn normalized(mut self) -> Self {
        self.email = self.email.trim().to_string();
        if self.work_experience.trim().is_empty() {
            self.work_experience = default_work_experience();
        }
        self
    }

    pub fn joined_skills(&self) -> String {
        self.skills.join(&SKILL_SEPARATOR.to_string())
    }
}

pub fn is_valid_email(email: &str) -> bool {
    RE_EMAIL.is_match(email)
}

/// Splits a stored skills cell back into a list; blank cells yield no skills.
pub fn split_skills(cell: &str) -> Vec<String> {
    if cell.trim().is_empty() {
        return Vec::new();
    }

    cell.split(SKILL_SEPARATOR).map(str::to_string).collect()
}

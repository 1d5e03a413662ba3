use crate::candidate::Candidate;
use crate::scoring::ScoredCandidate;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("score filters require scored candidates")]
    ScoreUnavailable,
    #[error("page and per_page must be at least 1 (got page={page}, per_page={per_page})")]
    InvalidPagination { page: usize, per_page: usize },
}

/// Anything the query layer can filter: a candidate and, optionally, its score.
pub trait Filterable {
    fn candidate(&self) -> &Candidate;
    fn score(&self) -> Option<f64>;
}

impl Filterable for ScoredCandidate {
    fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    fn score(&self) -> Option<f64> {
        Some(self.score)
    }
}

/// Optional predicates combined with AND. Text filters are case-insensitive
/// substring tests; score bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateFilter {
    pub name: Option<String>,
    pub college: Option<String>,
    pub degree: Option<String>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
}

impl CandidateFilter {
    pub fn uses_score(&self) -> bool {
        self.min_score.is_some() || self.max_score.is_some()
    }

    pub fn matches<T: Filterable>(&self, item: &T) -> Result<bool, QueryError> {
        let candidate = item.candidate();

        if !contains_ignore_case(&candidate.full_name, self.name.as_deref())
            || !contains_ignore_case(&candidate.college, self.college.as_deref())
            || !contains_ignore_case(&candidate.degree, self.degree.as_deref())
        {
            return Ok(false);
        }

        if !self.uses_score() {
            return Ok(true);
        }

        let score = item.score().ok_or(QueryError::ScoreUnavailable)?;
        let above_min = self.min_score.map_or(true, |min| score >= min);
        let below_max = self.max_score.map_or(true, |max| score <= max);
        Ok(above_min && below_max)
    }

    pub fn apply<T: Filterable>(&self, items: Vec<T>) -> Result<Vec<T>, QueryError> {
        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            if self.matches(&item)? {
                kept.push(item);
            }
        }
        Ok(kept)
    }
}

// An absent or empty needle passes everything through.
fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) if !needle.is_empty() => {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }
        _ => true,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

/// Slices `items` into 1-indexed pages. Pages past the end are empty.
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Result<Page<T>, QueryError> {
    if page == 0 || per_page == 0 {
        return Err(QueryError::InvalidPagination { page, per_page });
    }

    let total = items.len();
    let total_pages = total.div_ceil(per_page);
    let start = (page - 1).saturating_mul(per_page);

    let items = items.into_iter().skip(start).take(per_page).collect();

    Ok(Page {
        items,
        total,
        page,
        per_page,
        total_pages,
    })
}

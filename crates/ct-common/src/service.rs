use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, instrument};

use crate::candidate::{Candidate, CandidateId, ValidationError};
use crate::query::{CandidateFilter, Filterable, Page, QueryError, paginate};
use crate::report::{DEFAULT_REPORT_FILENAME, PdfReportGenerator, ReportError};
use crate::scoring::{PreselectionConfig, PreselectionEngine, ScoredCandidate};
use crate::store::{CsvCandidateStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("storage error: {0}")]
    Storage(StoreError),
    #[error(transparent)]
    Render(#[from] ReportError),
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(err) => ServiceError::Validation(err),
            other => ServiceError::Storage(other),
        }
    }
}

/// Listing view of a stored candidate; `score` is present only when requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateEntry {
    pub id: CandidateId,
    #[serde(flatten)]
    pub candidate: Candidate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Filterable for CandidateEntry {
    fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    fn score(&self) -> Option<f64> {
        self.score
    }
}

impl From<ScoredCandidate> for CandidateEntry {
    fn from(value: ScoredCandidate) -> Self {
        Self {
            id: value.id,
            candidate: value.candidate,
            score: Some(value.score),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub filter: CandidateFilter,
    pub with_score: bool,
    pub page: usize,
    pub per_page: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filter: CandidateFilter::default(),
            with_score: true,
            page: 1,
            per_page: 10,
        }
    }
}

/// Composes the record store, the preselection engine and the report renderer.
pub struct CandidateService {
    store: CsvCandidateStore,
    engine: PreselectionEngine,
    reports: PdfReportGenerator,
}

impl CandidateService {
    pub fn new(
        store: CsvCandidateStore,
        config: PreselectionConfig,
        reports: PdfReportGenerator,
    ) -> Self {
        Self {
            store,
            engine: PreselectionEngine::new(config),
            reports,
        }
    }

    pub fn store(&self) -> &CsvCandidateStore {
        &self.store
    }

    #[instrument(skip_all, fields(email = %candidate.email))]
    pub fn create(&self, candidate: Candidate) -> Result<(CandidateId, Candidate), ServiceError> {
        let candidate = candidate.normalized();
        let id = self.store.append(&candidate)?;
        info!(%id, "candidate created");
        Ok((id, candidate))
    }

    pub fn list(&self, query: &ListQuery) -> Result<Page<CandidateEntry>, ServiceError> {
        if query.filter.uses_score() && !query.with_score {
            return Err(QueryError::ScoreUnavailable.into());
        }

        let candidates = self.store.load_all()?;
        let entries: Vec<CandidateEntry> = if query.with_score {
            self.engine
                .score_all(candidates)
                .into_iter()
                .map(CandidateEntry::from)
                .collect()
        } else {
            candidates
                .into_iter()
                .enumerate()
                .map(|(index, candidate)| CandidateEntry {
                    id: CandidateId(index),
                    candidate,
                    score: None,
                })
                .collect()
        };

        let filtered = query.filter.apply(entries)?;
        Ok(paginate(filtered, query.page, query.per_page)?)
    }

    pub fn get(&self, id: CandidateId) -> Result<Option<CandidateEntry>, ServiceError> {
        let entry = self.store.get_by_id(id)?.map(|candidate| {
            let score = self.engine.score(&candidate).total;
            CandidateEntry {
                id,
                candidate,
                score: Some(score),
            }
        });
        Ok(entry)
    }

    pub fn top_k(&self, k: usize) -> Result<Vec<ScoredCandidate>, ServiceError> {
        let candidates = self.store.load_all()?;
        Ok(self.engine.rank_top_k(candidates, k))
    }

    #[instrument(skip(self))]
    pub fn generate_report(&self, k: usize) -> Result<PathBuf, ServiceError> {
        let top = self.top_k(k)?;
        let path = self.reports.generate(&top, DEFAULT_REPORT_FILENAME)?;
        info!(count = top.len(), path = %path.display(), "preselection report generated");
        Ok(path)
    }

    #[instrument(skip(self))]
    pub fn clear(&self) -> Result<(), ServiceError> {
        self.store.clear()?;
        info!("candidate store cleared");
        Ok(())
    }
}

pub mod candidate;
pub mod logging;
pub mod query;
pub mod report;
pub mod scoring;
pub mod service;
pub mod store;

pub use candidate::{Candidate, CandidateId, ValidationError};
pub use query::{CandidateFilter, Filterable, Page, QueryError};
pub use report::{PdfReportGenerator, ReportError, ReportStyle};
pub use scoring::{PreselectionConfig, PreselectionEngine, ScoredCandidate};
pub use service::{CandidateEntry, CandidateService, ListQuery, ServiceError};
pub use store::{CsvCandidateStore, StoreError};

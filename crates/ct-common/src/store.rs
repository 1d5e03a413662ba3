use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::candidate::{
    Candidate, CandidateId, ValidationError, default_work_experience, split_skills,
};

/// Column order of the backing CSV file.
pub const HEADER: [&str; 7] = [
    "full_name",
    "email",
    "college",
    "degree",
    "academic_average",
    "skills",
    "work_experience",
];

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid candidate: {0}")]
    Validation(#[from] ValidationError),
    #[error("candidate file i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("candidate file is malformed: {0}")]
    Csv(#[from] csv::Error),
}

/// On-disk shape of one row; skills are flattened into a single cell.
#[derive(Debug, Serialize, Deserialize)]
struct CandidateRow {
    full_name: String,
    email: String,
    college: String,
    degree: String,
    academic_average: f64,
    #[serde(default)]
    skills: String,
    #[serde(default)]
    work_experience: String,
}

impl From<&Candidate> for CandidateRow {
    fn from(value: &Candidate) -> Self {
        Self {
            full_name: value.full_name.clone(),
            email: value.email.clone(),
            college: value.college.clone(),
            degree: value.degree.clone(),
            academic_average: value.academic_average,
            skills: value.joined_skills(),
            work_experience: value.work_experience.clone(),
        }
    }
}

impl From<CandidateRow> for Candidate {
    fn from(row: CandidateRow) -> Self {
        let work_experience = if row.work_experience.trim().is_empty() {
            default_work_experience()
        } else {
            row.work_experience
        };

        Self {
            full_name: row.full_name,
            email: row.email,
            college: row.college,
            degree: row.degree,
            academic_average: row.academic_average,
            skills: split_skills(&row.skills),
            work_experience,
        }
    }
}

/// Append-only candidate table backed by a single CSV file.
///
/// Every call opens, reads or appends, and closes the file. There is no
/// locking: two writers appending at once can interleave rows, so callers
/// that handle requests concurrently must serialize access themselves.
#[derive(Debug, Clone)]
pub struct CsvCandidateStore {
    path: PathBuf,
}

impl CsvCandidateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validates and appends one row, writing the header first for a new file.
    #[instrument(skip(self, candidate), fields(path = %self.path.display()))]
    pub fn append(&self, candidate: &Candidate) -> Result<CandidateId, StoreError> {
        candidate.validate()?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let needs_header = !self.path.exists() || fs::metadata(&self.path)?.len() == 0;
        let id = if needs_header {
            CandidateId(0)
        } else {
            CandidateId(self.count()?)
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(HEADER)?;
        }
        writer.serialize(CandidateRow::from(candidate))?;
        writer.flush()?;

        debug!(%id, "candidate row appended");
        Ok(id)
    }

    /// Reads every row in creation order. A missing file means no data yet.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load_all(&self) -> Result<Vec<Candidate>, StoreError> {
        let Some(mut reader) = self.reader()? else {
            return Ok(Vec::new());
        };

        let candidates = reader
            .deserialize::<CandidateRow>()
            .map(|row| row.map(Candidate::from).map_err(StoreError::from))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = candidates.len(), "candidates loaded");
        Ok(candidates)
    }

    pub fn get_by_id(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError> {
        Ok(self.load_all()?.into_iter().nth(id.index()))
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let Some(mut reader) = self.reader()? else {
            return Ok(0);
        };

        let mut count = 0;
        for record in reader.records() {
            record?;
            count += 1;
        }
        Ok(count)
    }

    /// Removes the backing file. Clearing an absent store is a no-op.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn reader(&self) -> Result<Option<csv::Reader<fs::File>>, StoreError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);
        Ok(Some(reader))
    }
}

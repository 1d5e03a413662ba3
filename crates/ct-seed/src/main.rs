use std::path::PathBuf;

use clap::Parser;
use ct_common::logging::init_tracing_subscriber;
use ct_common::{
    Candidate, CandidateService, CsvCandidateStore, ListQuery, PdfReportGenerator,
    PreselectionConfig, ServiceError,
};
use dotenvy::dotenv;
use tracing::info;

#[derive(Debug, Clone, Parser)]
#[command(name = "ct-seed", about = "Reset the candidate store with demo data")]
struct Cli {
    /// CSV file holding the candidate records
    #[arg(long, env = "CT_DATA_PATH", default_value = "data/candidates.csv")]
    data_path: PathBuf,

    /// Directory where the preselection report is written
    #[arg(long, env = "CT_REPORT_DIR", default_value = "reports")]
    report_dir: PathBuf,

    /// Number of preselected candidates to show and render
    #[arg(long, default_value_t = 10)]
    k: usize,

    /// Skip rendering the PDF report
    #[arg(long)]
    no_report: bool,
}

fn demo_candidate(
    full_name: &str,
    email: &str,
    college: &str,
    degree: &str,
    academic_average: f64,
    skills: &[&str],
    work_experience: &str,
) -> Candidate {
    Candidate {
        full_name: full_name.into(),
        email: email.into(),
        college: college.into(),
        degree: degree.into(),
        academic_average,
        skills: skills.iter().map(|s| s.to_string()).collect(),
        work_experience: work_experience.into(),
    }
}

fn demo_candidates() -> Vec<Candidate> {
    vec![
        demo_candidate(
            "Ana Gómez",
            "ana@example.com",
            "Universidad de Buenos Aires",
            "Data Science",
            9.1,
            &["Python", "Rust", "Java"],
            "Internship at XYZ, 2022 - 2024",
        ),
        demo_candidate(
            "Luis Fernández",
            "luisf@example.com",
            "Stanford University",
            "Computer Science",
            5.0,
            &["Python", "SQL", "Docker"],
            "-",
        ),
        demo_candidate(
            "María Pérez",
            "maria.p@example.com",
            "UNAM",
            "Software Engineering",
            6.3,
            &["Java"],
            "Volunteer projects",
        ),
        demo_candidate(
            "Carlos Ruiz",
            "carlos.ruiz@example.com",
            "Harvard University",
            "Information Systems",
            9.5,
            &["AWS"],
            "Research assistant",
        ),
        demo_candidate(
            "Sofía Martínez",
            "sofia.m@example.com",
            "Massachusetts Institute of Technology",
            "Computer Science",
            6.8,
            &["C++", "Python", "SQL"],
            "Summer internship",
        ),
    ]
}

fn build_service(cli: &Cli, config: PreselectionConfig) -> CandidateService {
    CandidateService::new(
        CsvCandidateStore::new(&cli.data_path),
        config,
        PdfReportGenerator::new(&cli.report_dir),
    )
}

/// Clears the store, appends the demo set and returns the rendered report, if any.
fn seed(service: &CandidateService, cli: &Cli) -> Result<Option<PathBuf>, ServiceError> {
    service.clear()?;
    for candidate in demo_candidates() {
        service.create(candidate)?;
    }

    let all = service.list(&ListQuery {
        with_score: false,
        per_page: usize::MAX,
        ..ListQuery::default()
    })?;
    println!("All candidates ({}):", all.total);
    for entry in &all.items {
        println!(
            "  [{}] {} <{}> {} / {} avg={:.2}",
            entry.id,
            entry.candidate.full_name,
            entry.candidate.email,
            entry.candidate.college,
            entry.candidate.degree,
            entry.candidate.academic_average,
        );
    }

    let top = service.top_k(cli.k)?;
    println!("\nTop {} preselected candidates:", cli.k);
    for (rank, scored) in top.iter().enumerate() {
        println!(
            "  {}. {} score={:.2}",
            rank + 1,
            scored.candidate.full_name,
            scored.score,
        );
    }

    if cli.no_report {
        return Ok(None);
    }

    let path = service.generate_report(cli.k)?;
    Ok(Some(path))
}

fn main() {
    dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));

    let cli = Cli::parse();
    let service = build_service(&cli, PreselectionConfig::from_env());

    match seed(&service, &cli) {
        Ok(Some(path)) => info!(path = %path.display(), "report written"),
        Ok(None) => info!("report skipped"),
        Err(err) => {
            tracing::error!(error = %err, "ct-seed failed");
            std::process::exit(1);
        }
    }
}

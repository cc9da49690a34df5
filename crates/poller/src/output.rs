// Human-facing report on stdout

use colored::Colorize;
use jobrelay_core::application::BatchSummary;
use jobrelay_core::domain::{Job, JobStatus};
use std::path::Path;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct CandidateRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Filename")]
    filename: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "File URL")]
    file_url: String,
}

impl From<&Job> for CandidateRow {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            filename: job.filename.clone().unwrap_or_default(),
            status: job.status.to_string(),
            file_url: job.file_url.clone().unwrap_or_default(),
        }
    }
}

pub fn candidate_table(jobs: &[Job], status: &JobStatus) -> String {
    if jobs.is_empty() {
        return format!("No entities with status={}.", status);
    }
    Table::new(jobs.iter().map(CandidateRow::from)).to_string()
}

pub fn print_candidates(jobs: &[Job], status: &JobStatus) {
    println!("{}", candidate_table(jobs, status));
}

pub fn summary_line(summary: &BatchSummary, input_dir: &Path) -> String {
    if summary.handled == 0 {
        return "No new files to download.".to_string();
    }
    format!(
        "Downloaded, processed, and uploaded {} file(s). Local root: {}",
        summary.handled,
        input_dir.display()
    )
}

pub fn print_summary(summary: &BatchSummary, input_dir: &Path) {
    let line = summary_line(summary, input_dir);
    if summary.handled == 0 {
        println!("{}", line);
    } else {
        println!("{} {}", "✓".green(), line.bold());
    }

    if summary.failed > 0 {
        println!("  {} {} job(s) reported as failed", "✗".red(), summary.failed);
    }
    if summary.report_warnings > 0 {
        println!(
            "  {} {} terminal update(s) could not be delivered",
            "!".yellow(),
            summary.report_warnings
        );
    }
}

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{self, PipelineOutput, RawEngagement, Status};

/// Reads raw engagements from a JSON array or a CSV file, chosen by
/// extension. An unreadable file is the pipeline's one fatal error.
pub fn read_records(path: &Path) -> Result<Vec<RawEngagement>> {
    let file = File::open(path).map_err(|source| Error::InputUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    let records = if path.extension().and_then(|e| e.to_str()) == Some("csv") {
        parse_csv(file)?
    } else {
        parse_json(file)?
    };

    validate_ids(&records)?;
    info!(count = records.len(), path = %path.display(), "loaded raw engagements");
    Ok(records)
}

fn parse_json(reader: impl Read) -> Result<Vec<RawEngagement>> {
    Ok(serde_json::from_reader(reader)?)
}

/// CSV rows carry the same fields as the JSON form, with `technologies`
/// as a `;`-separated cell and the same lenient date handling.
fn parse_csv(reader: impl Read) -> Result<Vec<RawEngagement>> {
    #[derive(Deserialize)]
    struct CsvRow {
        id: String,
        customer: String,
        #[serde(default)]
        notes: String,
        #[serde(default)]
        feedback: String,
        #[serde(default)]
        technologies: String,
        status: Status,
        #[serde(default)]
        date: String,
    }

    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();

    for row in csv_reader.deserialize::<CsvRow>() {
        let row = row?;
        records.push(RawEngagement {
            id: row.id,
            customer: row.customer,
            notes: row.notes,
            feedback: row.feedback,
            technologies: row
                .technologies
                .split(';')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            status: row.status,
            date: models::parse_date(&row.date),
        });
    }

    Ok(records)
}

fn validate_ids(records: &[RawEngagement]) -> Result<()> {
    let mut seen = HashSet::new();
    for record in records {
        if record.id.trim().is_empty() {
            return Err(Error::InvalidRecord("record with empty id".to_string()));
        }
        if !seen.insert(record.id.as_str()) {
            return Err(Error::InvalidRecord(format!(
                "duplicate engagement id '{}'",
                record.id
            )));
        }
    }
    Ok(())
}

/// Filter selection applied before a pipeline run, mirroring the
/// dashboard's sidebar controls.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub customer: Option<String>,
    pub status: Option<Status>,
    pub since_days: Option<i64>,
}

impl RecordFilter {
    pub fn apply(&self, records: Vec<RawEngagement>) -> Vec<RawEngagement> {
        let cutoff = self.since_days.map(cutoff_date);
        records
            .into_iter()
            .filter(|record| {
                if let Some(customer) = &self.customer {
                    if !record.customer.eq_ignore_ascii_case(customer) {
                        return false;
                    }
                }
                if let Some(status) = self.status {
                    if record.status != status {
                        return false;
                    }
                }
                if let Some(cutoff) = cutoff {
                    // A recency filter drops dateless records: their
                    // recency cannot be established.
                    match record.date {
                        Some(date) if date >= cutoff => {}
                        _ => return false,
                    }
                }
                true
            })
            .collect()
    }
}

pub fn cutoff_date(since_days: i64) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(since_days.max(1))
}

/// Reads a `{technology: score}` proficiency table. Unlike the record
/// source, a configured-but-unreadable table is a hard error.
pub fn read_proficiency(path: &Path) -> Result<std::collections::HashMap<String, f64>> {
    let file = File::open(path).map_err(|source| Error::InputUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_reader(file)?)
}

/// Writes the interchange document the dashboard consumes.
pub fn write_output(path: &Path, output: &PipelineOutput) -> Result<()> {
    write_pretty(path, output)
}

/// Writes a raw engagement list, e.g. from the seed generator.
pub fn write_records(path: &Path, records: &[RawEngagement]) -> Result<()> {
    write_pretty(path, records)
}

fn write_pretty<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

const CUSTOMERS: &[&str] = &[
    "FinTech Corp",
    "HealthPlus",
    "RetailGiant",
    "AutoMotive Inc",
    "EduTech Solutions",
    "Global Logistics",
    "MediaStream",
    "GreenEnergy",
    "CyberSecure",
    "DataDriven Co",
];

const TECHNOLOGIES: &[&str] = &[
    "Delta Lake",
    "Auto Loader",
    "PySpark",
    "Unity Catalog",
    "Databricks SQL",
    "MLflow",
    "Structured Streaming",
    "Photon",
    "Serverless",
    "Terraform",
];

const NOTES_TEMPLATES: &[&str] = &[
    "Customer faced issues with {tech}. Resolved by optimizing configuration.",
    "Team is struggling with {tech} adoption. Recommended training.",
    "Successfully migrated to {tech}. Performance improved by 30%.",
    "Initial setup of {tech} was challenging due to legacy data formats.",
    "POC for {tech} was successful. Moving to production next week.",
    "Debugging {tech} errors took significant time. Root cause was network configuration.",
    "Customer requested best practices for {tech} scaling.",
    "Implemented {tech} for real-time analytics dashboard.",
    "Governance review highlighted gaps in {tech} implementation.",
    "Optimized {tech} jobs to reduce costs by 20%.",
];

const FEEDBACK_TEMPLATES: &[&str] = &[
    "Great experience, but {tech} documentation could be better.",
    "The team was very helpful in resolving our {tech} issues.",
    "Impressed with the performance of {tech}.",
    "Implementation took longer than expected due to {tech} complexity.",
    "Would recommend the platform for {tech} workloads.",
    "Need more support on {tech} advanced features.",
    "Smooth transition to {tech}.",
    "Encountered some bugs with {tech} preview features.",
    "Excellent guidance on {tech} architecture.",
    "Looking forward to expanding {tech} usage.",
];

// Roughly the production status mix: half completed, a third in progress,
// the rest split between at-risk and planned.
const STATUS_CYCLE: &[Status] = &[
    Status::Completed,
    Status::InProgress,
    Status::Completed,
    Status::AtRisk,
    Status::Completed,
    Status::InProgress,
    Status::Planned,
    Status::Completed,
    Status::InProgress,
    Status::Completed,
];

/// Generates realistic synthetic engagement records, cycling through the
/// template tables so output is reproducible run to run (dates are
/// anchored to today).
pub fn seed_records(count: usize) -> Vec<RawEngagement> {
    let today = Utc::now().date_naive();

    (0..count)
        .map(|i| {
            let stack_size = 1 + i % 4;
            let start = (i * 3) % TECHNOLOGIES.len();
            let technologies: Vec<String> = (0..stack_size)
                .map(|j| TECHNOLOGIES[(start + j) % TECHNOLOGIES.len()].to_string())
                .collect();
            let main_tech = &technologies[0];

            RawEngagement {
                id: format!("ENG-{:03}", i + 1),
                customer: CUSTOMERS[i % CUSTOMERS.len()].to_string(),
                notes: NOTES_TEMPLATES[i % NOTES_TEMPLATES.len()].replace("{tech}", main_tech),
                feedback: FEEDBACK_TEMPLATES[(i * 7) % FEEDBACK_TEMPLATES.len()]
                    .replace("{tech}", main_tech),
                technologies,
                status: STATUS_CYCLE[i % STATUS_CYCLE.len()],
                date: Some(today - Duration::days((i * 3 % 90) as i64)),
            }
        })
        .collect()
}

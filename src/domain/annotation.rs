//! Plain-text manifest describing the files of one layout.

use crate::domain::error::FxError;
use crate::domain::layout::{LayoutKind, DATES_FILE, RATES_FILE};
use crate::domain::store::DATASET_FILE;
use crate::ports::dataset_port::DatasetPort;
use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedFile {
    pub name: String,
    /// `None` when the file could not be read.
    pub records: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub kind: LayoutKind,
    pub location: String,
    pub files: Vec<AnnotatedFile>,
}

impl Annotation {
    /// Collect the files belonging to `kind` and count their rows.
    ///
    /// Year and week partitions share a naming scheme, so both kinds list
    /// every partition file present.
    pub fn scan(port: &dyn DatasetPort, kind: LayoutKind) -> Result<Self, FxError> {
        let names: Vec<String> = match kind {
            LayoutKind::Single => [DATASET_FILE]
                .into_iter()
                .filter(|n| port.exists(n))
                .map(String::from)
                .collect(),
            LayoutKind::SplitColumns => [DATES_FILE, RATES_FILE]
                .into_iter()
                .filter(|n| port.exists(n))
                .map(String::from)
                .collect(),
            LayoutKind::ByYear | LayoutKind::ByWeek => port.list_partitions()?,
        };

        let files = names
            .into_iter()
            .map(|name| {
                let records = match port.row_count(&name) {
                    Ok(n) => Some(n),
                    Err(e) => {
                        log::warn!("could not count rows of {}: {}", name, e);
                        None
                    }
                };
                AnnotatedFile { name, records }
            })
            .collect();

        Ok(Self {
            kind,
            location: port.location(),
            files,
        })
    }

    pub fn render(&self, created: NaiveDateTime) -> String {
        let mut out = String::new();
        out.push_str("Dataset annotation\n");
        out.push_str(&"=".repeat(50));
        out.push('\n');
        out.push_str(&format!("Layout: {}\n", self.kind));
        out.push_str(&format!("Data path: {}\n", self.location));
        out.push_str(&format!("File count: {}\n", self.files.len()));
        out.push_str("Files:\n");
        for file in &self.files {
            match file.records {
                Some(n) => out.push_str(&format!("  - {}: {} records\n", file.name, n)),
                None => out.push_str(&format!("  - {}: unreadable\n", file.name)),
            }
        }
        out.push_str(&format!("\nCreated: {}\n", created.format("%Y-%m-%d %H:%M:%S")));
        out
    }
}

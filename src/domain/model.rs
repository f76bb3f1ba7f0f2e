use crate::domain::phone::NormalizedPhone;
use crate::domain::source::{PrimaryLayout, SecondaryLayout};
use crate::utils::error::{EtlError, Result};
use serde::Serialize;

/// One spreadsheet row. Cells are positional; the owning [`SourceTable`]
/// holds the header names. Empty cells are stored as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    cells: Vec<Option<String>>,
}

impl RawRow {
    pub fn from_strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cells = values
            .into_iter()
            .map(|v| {
                let v = v.as_ref().trim();
                (!v.is_empty()).then(|| v.to_string())
            })
            .collect();
        Self { cells }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(|c| c.as_deref())
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }
}

/// An input export held in memory.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl SourceTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// 標題比對忽略大小寫與前後空白
    pub fn column(&self, header: &str) -> Option<usize> {
        let wanted = header.trim().to_lowercase();
        self.headers
            .iter()
            .position(|h| h.trim().to_lowercase() == wanted)
    }

    pub fn require_column(&self, header: &str) -> Result<usize> {
        self.column(header)
            .ok_or_else(|| EtlError::MissingColumnError {
                source_name: self.name.clone(),
                column: header.to_string(),
            })
    }

    /// Every present candidate column, in candidate order.
    pub fn columns_matching(&self, candidates: &[String]) -> Vec<usize> {
        let mut found = Vec::new();
        for candidate in candidates {
            if let Some(idx) = self.column(candidate) {
                if !found.contains(&idx) {
                    found.push(idx);
                }
            }
        }
        found
    }

    /// Every column whose header contains `needle`, in header order.
    pub fn columns_containing(&self, needle: &str) -> Vec<usize> {
        let needle = needle.to_lowercase();
        self.headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Both exports with their resolved column layouts, as returned by the
/// extract phase.
#[derive(Debug, Clone, Default)]
pub struct SourceTables {
    pub primary: SourceTable,
    pub primary_layout: PrimaryLayout,
    pub secondary: SourceTable,
    pub secondary_layout: SecondaryLayout,
}

/// A merged customer, one per distinct phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerRecord {
    pub phone: NormalizedPhone,
    pub full_name: String,
    pub email: Option<String>,
    pub preferred_professional: Option<String>,
    pub last_service: Option<String>,
    pub notes: Option<String>,
    pub referral_source: Option<String>,
}

impl CustomerRecord {
    pub fn new(phone: NormalizedPhone) -> Self {
        Self {
            phone,
            full_name: String::new(),
            email: None,
            preferred_professional: None,
            last_service: None,
            notes: None,
            referral_source: None,
        }
    }
}

/// Row accounting for one merge run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub primary_rows: usize,
    pub primary_not_retained: usize,
    pub primary_invalid_phone: usize,
    pub primary_duplicates: usize,
    pub secondary_rows: usize,
    pub secondary_invalid_phone: usize,
    pub secondary_unusable_name: usize,
    pub created_from_primary: usize,
    pub created_from_secondary: usize,
}

impl MergeStats {
    pub fn total_records(&self) -> usize {
        self.created_from_primary + self.created_from_secondary
    }
}

/// One output file worth of records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlBatch {
    /// 1-based
    pub index: usize,
    pub batch_count: usize,
    /// 1-based position of the first record within the merged list
    pub first_record: usize,
    pub last_record: usize,
    pub total_records: usize,
    pub file_name: String,
    #[serde(skip)]
    pub statement: String,
}

impl SqlBatch {
    pub fn record_count(&self) -> usize {
        self.last_record + 1 - self.first_record
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub customers: Vec<CustomerRecord>,
    pub batches: Vec<SqlBatch>,
    pub stats: MergeStats,
}

use crate::domain::model::SourceTable;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};

/// Header names accepted for the "last service" column of the primary export,
/// in priority order. Matched case-insensitively once, when the file is loaded.
pub const LAST_SERVICE_FALLBACKS: &[&str] = &[
    "Último Serviço",
    "Ultimo Serviço",
    "Ultimo Servico",
    "Último Atendimento",
    "Ultimo Atendimento",
];

/// 沒有完全相符的標題時，改找標題含有這段文字的欄位（Último / Ultimo 皆可）
pub const LAST_SERVICE_HEADER_HINT: &str = "ltimo";

/// Location and dialect of one spreadsheet export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub path: String,
    /// 未設定時依副檔名判斷：`.tsv` 用 tab，其餘用逗號
    pub delimiter: Option<char>,
}

impl SourceSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            delimiter: None,
        }
    }

    pub fn delimiter_byte(&self) -> u8 {
        match self.delimiter {
            Some(c) if c.is_ascii() => c as u8,
            _ if self.path.to_ascii_lowercase().ends_with(".tsv") => b'\t',
            _ => b',',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimaryColumns {
    pub professional: String,
    pub phone: String,
    pub client: String,
    pub last_service: Vec<String>,
}

impl Default for PrimaryColumns {
    fn default() -> Self {
        Self {
            professional: "Profissional".to_string(),
            phone: "Celular".to_string(),
            client: "Cliente".to_string(),
            last_service: LAST_SERVICE_FALLBACKS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryColumns {
    pub phone: String,
    pub email: String,
    pub notes: String,
    pub referral_source: String,
    pub name: String,
}

impl Default for SecondaryColumns {
    fn default() -> Self {
        Self {
            phone: "Celular".to_string(),
            email: "Email".to_string(),
            notes: "Obs".to_string(),
            referral_source: "ComoSoube".to_string(),
            name: "Nome".to_string(),
        }
    }
}

/// Expected header names of both exports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub primary: PrimaryColumns,
    pub secondary: SecondaryColumns,
}

/// Column positions of the primary export, resolved once after loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimaryLayout {
    pub professional: usize,
    pub phone: usize,
    pub client: usize,
    /// 可能為空：找不到任何候選欄位時 last_service 一律為 NULL
    pub last_service: Vec<usize>,
}

impl PrimaryLayout {
    pub fn resolve(table: &SourceTable, columns: &PrimaryColumns) -> Result<Self> {
        let mut layout = Self {
            professional: table.require_column(&columns.professional)?,
            phone: table.require_column(&columns.phone)?,
            client: table.require_column(&columns.client)?,
            last_service: table.columns_matching(&columns.last_service),
        };

        if layout.last_service.is_empty() {
            layout.last_service = table.columns_containing(LAST_SERVICE_HEADER_HINT);
            if !layout.last_service.is_empty() {
                tracing::info!(
                    "Last-service column in '{}' matched by header text: {:?}",
                    table.name,
                    layout
                        .last_service
                        .iter()
                        .map(|&i| table.headers[i].as_str())
                        .collect::<Vec<_>>()
                );
                return Ok(layout);
            }
        }

        if layout.last_service.is_empty() {
            tracing::warn!(
                "⚠️ No last-service column found in '{}' (tried: {}, or any header containing '{}'); last_service will be NULL",
                table.name,
                columns.last_service.join(", "),
                LAST_SERVICE_HEADER_HINT
            );
        } else {
            tracing::debug!(
                "Last-service columns in '{}': {:?}",
                table.name,
                layout
                    .last_service
                    .iter()
                    .map(|&i| table.headers[i].as_str())
                    .collect::<Vec<_>>()
            );
        }

        Ok(layout)
    }
}

/// Column positions of the secondary export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecondaryLayout {
    pub phone: usize,
    pub email: usize,
    pub notes: usize,
    pub referral_source: usize,
    pub name: usize,
}

impl SecondaryLayout {
    pub fn resolve(table: &SourceTable, columns: &SecondaryColumns) -> Result<Self> {
        Ok(Self {
            phone: table.require_column(&columns.phone)?,
            email: table.require_column(&columns.email)?,
            notes: table.require_column(&columns.notes)?,
            referral_source: table.require_column(&columns.referral_source)?,
            name: table.require_column(&columns.name)?,
        })
    }
}

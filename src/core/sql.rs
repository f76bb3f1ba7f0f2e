use crate::domain::model::{CustomerRecord, SqlBatch};
use std::fmt::Write as _;
use std::ops::Range;

pub const DEFAULT_TABLE: &str = "customers";
pub const DEFAULT_FILE_PREFIX: &str = "IMPORTAR_PARTE_";

const INSERT_COLUMNS: &str = "phone, full_name, email, preferred_professional, last_service, notes, referral_source, is_vip, created_at";
const COALESCED_COLUMNS: &[&str] = &[
    "email",
    "preferred_professional",
    "last_service",
    "notes",
    "referral_source",
];

/// Render a text value as a SQL literal.
///
/// `None`, and anything that is empty once cleaned, becomes an unquoted
/// `NULL`. Quotes are doubled; NUL, `´`, backticks and C0/C1 control
/// characters are removed.
pub fn escape_sql(value: Option<&str>) -> String {
    let Some(value) = value else {
        return "NULL".to_string();
    };

    let cleaned: String = value
        .replace('\'', "''")
        .chars()
        .filter(|c| !matches!(c, '\u{00}'..='\u{1f}' | '\u{7f}'..='\u{9f}' | '´' | '`'))
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        "NULL".to_string()
    } else {
        format!("'{}'", cleaned)
    }
}

/// `total / batch_count + 1`, so that `batch_count` slices always cover
/// every record. The trailing slices may come out empty.
pub fn batch_size(total: usize, batch_count: usize) -> usize {
    total / batch_count.max(1) + 1
}

/// Consecutive non-empty slices covering `0..total`, at most `batch_count`.
pub fn plan_batches(total: usize, batch_count: usize) -> Vec<Range<usize>> {
    let size = batch_size(total, batch_count);
    (0..batch_count.max(1))
        .map(|i| (i * size).min(total)..((i + 1) * size).min(total))
        .filter(|r| !r.is_empty())
        .collect()
}

pub fn batch_file_name(prefix: &str, index: usize, batch_count: usize) -> String {
    let width = batch_count.to_string().len().max(2);
    format!("{}{:0width$}.sql", prefix, index, width = width)
}

/// Builds the upsert files for a table.
#[derive(Debug, Clone)]
pub struct SqlEmitter<'a> {
    table: &'a str,
    file_prefix: &'a str,
    batch_count: usize,
}

impl<'a> SqlEmitter<'a> {
    pub fn new(table: &'a str, file_prefix: &'a str, batch_count: usize) -> Self {
        Self {
            table,
            file_prefix,
            batch_count: batch_count.max(1),
        }
    }

    pub fn build_batches(&self, customers: &[CustomerRecord]) -> Vec<SqlBatch> {
        let total = customers.len();
        let ranges = plan_batches(total, self.batch_count);

        tracing::debug!(
            "Splitting {} customers into {} files of up to {} rows",
            total,
            ranges.len(),
            batch_size(total, self.batch_count)
        );

        ranges
            .into_iter()
            .enumerate()
            .map(|(i, range)| {
                let index = i + 1;
                let mut statement = String::new();
                let _ = writeln!(statement, "-- PARTE {} de {}", index, self.batch_count);
                let _ = writeln!(
                    statement,
                    "-- Clientes {} a {} de {}",
                    range.start + 1,
                    range.end,
                    total
                );
                statement.push('\n');
                statement.push_str(&self.render_statement(&customers[range.clone()]));

                SqlBatch {
                    index,
                    batch_count: self.batch_count,
                    first_record: range.start + 1,
                    last_record: range.end,
                    total_records: total,
                    file_name: batch_file_name(self.file_prefix, index, self.batch_count),
                    statement,
                }
            })
            .collect()
    }

    /// One `INSERT ... ON CONFLICT` statement for the given records.
    pub fn render_statement(&self, customers: &[CustomerRecord]) -> String {
        let values: Vec<String> = customers.iter().map(render_values).collect();

        let mut sql = String::new();
        let _ = writeln!(sql, "INSERT INTO {} AS existing ({})", self.table, INSERT_COLUMNS);
        sql.push_str("VALUES\n");
        sql.push_str(&values.join(",\n"));
        sql.push('\n');
        sql.push_str("ON CONFLICT (phone) DO UPDATE SET\n");
        sql.push_str("  full_name = EXCLUDED.full_name");
        for column in COALESCED_COLUMNS {
            let _ = write!(
                sql,
                ",\n  {col} = COALESCE(EXCLUDED.{col}, existing.{col})",
                col = column
            );
        }
        sql.push_str(";\n");
        sql
    }
}

fn render_values(c: &CustomerRecord) -> String {
    format!(
        "({}, {}, {}, {}, {}, {}, {}, false, NOW())",
        escape_sql(Some(c.phone.as_str())),
        escape_sql(Some(&c.full_name)),
        escape_sql(c.email.as_deref()),
        escape_sql(c.preferred_professional.as_deref()),
        escape_sql(c.last_service.as_deref()),
        escape_sql(c.notes.as_deref()),
        escape_sql(c.referral_source.as_deref()),
    )
}

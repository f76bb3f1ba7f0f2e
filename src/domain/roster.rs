use serde::{Deserialize, Serialize};

/// One professional listed in the primary roster export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessionalEntry {
    pub full_name: String,
    #[serde(default = "default_retain")]
    pub retain: bool,
    pub short_name: Option<String>,
}

fn default_retain() -> bool {
    true
}

impl ProfessionalEntry {
    pub fn retained(full_name: &str, short_name: &str) -> Self {
        Self {
            full_name: full_name.to_string(),
            retain: true,
            short_name: Some(short_name.to_string()),
        }
    }

    /// 沒有設定短名時沿用全名
    pub fn display_name(&self) -> &str {
        self.short_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(self.full_name.as_str())
    }
}

/// Professionals whose customers are imported, with their display names.
///
/// Primary-roster rows whose professional is absent from the roster, or
/// present with `retain = false`, are not imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfessionalRoster {
    entries: Vec<ProfessionalEntry>,
}

impl ProfessionalRoster {
    pub fn new(entries: Vec<ProfessionalEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ProfessionalEntry] {
        &self.entries
    }

    /// Display name for a retained professional, `None` when the row should be
    /// skipped. Names are compared exactly as exported, ignoring surrounding
    /// whitespace.
    pub fn display_name(&self, full_name: &str) -> Option<&str> {
        let wanted = full_name.trim();
        self.entries
            .iter()
            .find(|e| e.retain && e.full_name.trim() == wanted)
            .map(ProfessionalEntry::display_name)
    }

    pub fn retained_count(&self) -> usize {
        self.entries.iter().filter(|e| e.retain).count()
    }
}

impl Default for ProfessionalRoster {
    fn default() -> Self {
        Self::new(vec![
            ProfessionalEntry::retained("Hiago Lopes Marques", "Hiago"),
            ProfessionalEntry::retained("Alexson bonnes Oliveira Coelho", "Alex"),
            ProfessionalEntry::retained("Felippe Malaquias De Oliveira", "Filippe"),
        ])
    }
}

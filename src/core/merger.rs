use crate::domain::model::{CustomerRecord, MergeStats, RawRow, SourceTables};
use crate::domain::phone::NormalizedPhone;
use crate::domain::roster::ProfessionalRoster;
use crate::domain::source::{PrimaryLayout, SecondaryLayout};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Contact data taken from the secondary export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ContactExtras {
    email: Option<String>,
    notes: Option<String>,
    referral_source: Option<String>,
    name: Option<String>,
}

/// Phone-keyed map that remembers first insertion order.
#[derive(Debug)]
struct PhoneMap<T> {
    positions: HashMap<NormalizedPhone, usize>,
    entries: Vec<(NormalizedPhone, T)>,
}

impl<T> PhoneMap<T> {
    fn new() -> Self {
        Self {
            positions: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn contains(&self, phone: &NormalizedPhone) -> bool {
        self.positions.contains_key(phone)
    }

    fn get(&self, phone: &NormalizedPhone) -> Option<&T> {
        self.positions.get(phone).map(|&i| &self.entries[i].1)
    }

    /// 重複的 key 取代舊值，但保留原本的位置
    fn upsert(&mut self, phone: NormalizedPhone, value: T) {
        match self.positions.get(&phone) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.positions.insert(phone.clone(), self.entries.len());
                self.entries.push((phone, value));
            }
        }
    }

    fn iter(&self) -> impl Iterator<Item = (&NormalizedPhone, &T)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn into_values(self) -> Vec<T> {
        self.entries.into_iter().map(|(_, v)| v).collect()
    }
}

/// Fill an optional field only while it is still empty.
fn fill_if_absent(slot: &mut Option<String>, incoming: Option<&str>) {
    if slot.is_none() {
        *slot = incoming.map(str::to_string);
    }
}

/// Replace a field unconditionally.
fn overwrite(slot: &mut String, incoming: &str) {
    *slot = incoming.to_string();
}

/// Placeholder names such as "." or a single initial are not usable.
fn usable_name(name: Option<&str>) -> Option<&str> {
    let name = name?.trim();
    if name == "." || name.chars().count() <= 1 {
        None
    } else {
        Some(name)
    }
}

/// Render recognizable dates as `yyyy-mm-dd`, leave anything else untouched.
pub(crate) fn normalize_service_date(raw: &str) -> String {
    let raw = raw.trim();

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return dt.date().format("%Y-%m-%d").to_string();
        }
    }

    raw.to_string()
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub customers: Vec<CustomerRecord>,
    pub stats: MergeStats,
}

/// Combines both rosters into one record per phone.
///
/// The primary export seeds records (first row per phone wins) and the
/// secondary export only fills contact fields or contributes phones the
/// primary export never mentions.
pub struct Merger<'a> {
    roster: &'a ProfessionalRoster,
}

impl<'a> Merger<'a> {
    pub fn new(roster: &'a ProfessionalRoster) -> Self {
        Self { roster }
    }

    pub fn merge(&self, tables: &SourceTables) -> MergeOutcome {
        let mut stats = MergeStats::default();

        let extras = self.collect_extras(tables, &mut stats);
        let mut customers: PhoneMap<CustomerRecord> = PhoneMap::new();

        // 第一輪：主名單
        stats.primary_rows = tables.primary.rows.len();
        for (i, row) in tables.primary.rows.iter().enumerate() {
            let layout = &tables.primary_layout;

            let Some(professional) = row
                .get(layout.professional)
                .and_then(|name| self.roster.display_name(name))
            else {
                stats.primary_not_retained += 1;
                continue;
            };

            let Some(phone) = NormalizedPhone::parse(row.get(layout.phone)) else {
                stats.primary_invalid_phone += 1;
                tracing::debug!(
                    "Dropping primary row {}: invalid phone {:?}",
                    i + 2,
                    row.get(layout.phone)
                );
                continue;
            };

            if customers.contains(&phone) {
                stats.primary_duplicates += 1;
                continue;
            }

            let mut record = CustomerRecord::new(phone.clone());
            overwrite(&mut record.full_name, row.get(layout.client).unwrap_or(""));
            fill_if_absent(&mut record.preferred_professional, Some(professional));
            let last_service = last_service(row, layout);
            fill_if_absent(&mut record.last_service, last_service.as_deref());
            if let Some(extra) = extras.get(&phone) {
                fill_contact(&mut record, extra);
            }

            customers.upsert(phone, record);
            stats.created_from_primary += 1;
        }

        // 第二輪：只在副名單出現的電話
        for (phone, extra) in extras.iter() {
            if customers.contains(phone) {
                continue;
            }
            let Some(name) = usable_name(extra.name.as_deref()) else {
                stats.secondary_unusable_name += 1;
                continue;
            };

            let mut record = CustomerRecord::new(phone.clone());
            overwrite(&mut record.full_name, name);
            fill_contact(&mut record, extra);

            customers.upsert(phone.clone(), record);
            stats.created_from_secondary += 1;
        }

        tracing::info!(
            "🔀 Merged {} customers ({} from primary, {} secondary-only)",
            customers.len(),
            stats.created_from_primary,
            stats.created_from_secondary
        );
        tracing::info!(
            "   primary: {} rows, {} other professionals, {} invalid phones, {} repeated phones",
            stats.primary_rows,
            stats.primary_not_retained,
            stats.primary_invalid_phone,
            stats.primary_duplicates
        );
        tracing::info!(
            "   secondary: {} rows, {} invalid phones, {} without usable name",
            stats.secondary_rows,
            stats.secondary_invalid_phone,
            stats.secondary_unusable_name
        );

        MergeOutcome {
            customers: customers.into_values(),
            stats,
        }
    }

    fn collect_extras(
        &self,
        tables: &SourceTables,
        stats: &mut MergeStats,
    ) -> PhoneMap<ContactExtras> {
        let layout: &SecondaryLayout = &tables.secondary_layout;
        let mut extras = PhoneMap::new();

        stats.secondary_rows = tables.secondary.rows.len();
        for (i, row) in tables.secondary.rows.iter().enumerate() {
            let Some(phone) = NormalizedPhone::parse(row.get(layout.phone)) else {
                stats.secondary_invalid_phone += 1;
                tracing::debug!(
                    "Dropping secondary row {}: invalid phone {:?}",
                    i + 2,
                    row.get(layout.phone)
                );
                continue;
            };

            extras.upsert(
                phone,
                ContactExtras {
                    email: row.get(layout.email).map(str::to_string),
                    notes: row.get(layout.notes).map(str::to_string),
                    referral_source: row.get(layout.referral_source).map(str::to_string),
                    name: row.get(layout.name).map(str::to_string),
                },
            );
        }

        extras
    }
}

fn fill_contact(record: &mut CustomerRecord, extra: &ContactExtras) {
    fill_if_absent(&mut record.email, extra.email.as_deref());
    fill_if_absent(&mut record.notes, extra.notes.as_deref());
    fill_if_absent(&mut record.referral_source, extra.referral_source.as_deref());
}

fn last_service(row: &RawRow, layout: &PrimaryLayout) -> Option<String> {
    layout
        .last_service
        .iter()
        .find_map(|&i| row.get(i))
        .map(normalize_service_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::SourceTable;
    use crate::domain::roster::ProfessionalEntry;
    use crate::domain::source::{PrimaryColumns, SecondaryColumns};

    const PRIMARY_HEADERS: &[&str] = &["Profissional", "Celular", "Cliente", "Último Serviço"];
    const SECONDARY_HEADERS: &[&str] = &["Celular", "Email", "Obs", "ComoSoube", "Nome"];

    fn table(name: &str, headers: &[&str], rows: &[&[&str]]) -> SourceTable {
        SourceTable::new(
            name,
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter().map(|r| RawRow::from_strings(r.iter())).collect(),
        )
    }

    fn tables(primary: &[&[&str]], secondary: &[&[&str]]) -> SourceTables {
        let primary = table("primary", PRIMARY_HEADERS, primary);
        let secondary = table("secondary", SECONDARY_HEADERS, secondary);
        SourceTables {
            primary_layout: PrimaryLayout::resolve(&primary, &PrimaryColumns::default()).unwrap(),
            secondary_layout: SecondaryLayout::resolve(&secondary, &SecondaryColumns::default())
                .unwrap(),
            primary,
            secondary,
        }
    }

    fn merge(tables: &SourceTables) -> MergeOutcome {
        let roster = ProfessionalRoster::default();
        Merger::new(&roster).merge(tables)
    }

    #[test]
    fn test_primary_name_and_secondary_contact_are_combined() {
        let t = tables(
            &[&["Hiago Lopes Marques", "11987654321", "João", ""]],
            &[&["(11) 98765-4321", "a@b.com", "", "", "Joao Silva"]],
        );
        let out = merge(&t);

        assert_eq!(out.customers.len(), 1);
        let c = &out.customers[0];
        assert_eq!(c.phone.as_str(), "11987654321");
        assert_eq!(c.full_name, "João");
        assert_eq!(c.preferred_professional.as_deref(), Some("Hiago"));
        assert_eq!(c.email.as_deref(), Some("a@b.com"));
        assert_eq!(c.notes, None);
        assert_eq!(c.last_service, None);
    }

    #[test]
    fn test_first_primary_row_wins() {
        let t = tables(
            &[
                &["Hiago Lopes Marques", "11987654321", "Primeiro", "01/03/2025"],
                &["Felippe Malaquias De Oliveira", "5511987654321", "Segundo", "02/03/2025"],
            ],
            &[],
        );
        let out = merge(&t);

        assert_eq!(out.customers.len(), 1);
        assert_eq!(out.customers[0].full_name, "Primeiro");
        assert_eq!(out.customers[0].preferred_professional.as_deref(), Some("Hiago"));
        assert_eq!(out.customers[0].last_service.as_deref(), Some("2025-03-01"));
        assert_eq!(out.stats.primary_duplicates, 1);
    }

    #[test]
    fn test_secondary_only_customer() {
        let t = tables(
            &[],
            &[&["21999998888", "", "prefere sábado", "Instagram", " Maria Souza "]],
        );
        let out = merge(&t);

        assert_eq!(out.customers.len(), 1);
        let c = &out.customers[0];
        assert_eq!(c.full_name, "Maria Souza");
        assert_eq!(c.preferred_professional, None);
        assert_eq!(c.last_service, None);
        assert_eq!(c.notes.as_deref(), Some("prefere sábado"));
        assert_eq!(c.referral_source.as_deref(), Some("Instagram"));
        assert_eq!(out.stats.created_from_secondary, 1);
    }

    #[test]
    fn test_placeholder_secondary_names_are_skipped() {
        let t = tables(
            &[],
            &[
                &["21999990001", "", "", "", "."],
                &["21999990002", "", "", "", "A"],
                &["21999990003", "x@y.com", "", "", ""],
                &["21999990004", "", "", "", "Ana"],
            ],
        );
        let out = merge(&t);

        assert_eq!(out.customers.len(), 1);
        assert_eq!(out.customers[0].full_name, "Ana");
        assert_eq!(out.stats.secondary_unusable_name, 3);
    }

    #[test]
    fn test_other_professionals_and_invalid_phones_are_dropped() {
        let t = tables(
            &[
                &["Outro Barbeiro", "11987654321", "Pedro", ""],
                &["Hiago Lopes Marques", "12345", "Lucas", ""],
                &["Hiago Lopes Marques", "", "Rafael", ""],
            ],
            &[&["abc", "", "", "", "Carla"]],
        );
        let out = merge(&t);

        assert!(out.customers.is_empty());
        assert_eq!(out.stats.primary_not_retained, 1);
        assert_eq!(out.stats.primary_invalid_phone, 2);
        assert_eq!(out.stats.secondary_invalid_phone, 1);
    }

    #[test]
    fn test_secondary_never_overwrites_primary() {
        let t = tables(
            &[&["Alexson bonnes Oliveira Coelho", "1133334444", "Bruno", "2025-01-10"]],
            &[&["11933334444", "b@c.com", "vip", "Google", "Bruno Costa"]],
        );
        let out = merge(&t);

        assert_eq!(out.customers.len(), 1);
        let c = &out.customers[0];
        assert_eq!(c.phone.as_str(), "11933334444");
        assert_eq!(c.full_name, "Bruno");
        assert_eq!(c.preferred_professional.as_deref(), Some("Alex"));
        assert_eq!(c.last_service.as_deref(), Some("2025-01-10"));
        assert_eq!(c.email.as_deref(), Some("b@c.com"));
        assert_eq!(c.referral_source.as_deref(), Some("Google"));
    }

    #[test]
    fn test_later_secondary_row_replaces_extras_but_keeps_order() {
        let t = tables(
            &[],
            &[
                &["21999990001", "old@x.com", "", "", "Ana"],
                &["21999990002", "", "", "", "Beto"],
                &["21999990001", "new@x.com", "", "", "Ana Paula"],
            ],
        );
        let out = merge(&t);

        let names: Vec<&str> = out.customers.iter().map(|c| c.full_name.as_str()).collect();
        assert_eq!(names, vec!["Ana Paula", "Beto"]);
        assert_eq!(out.customers[0].email.as_deref(), Some("new@x.com"));
    }

    #[test]
    fn test_records_are_ordered_primary_then_secondary() {
        let t = tables(
            &[
                &["Hiago Lopes Marques", "11900000002", "B", ""],
                &["Hiago Lopes Marques", "11900000001", "A", ""],
            ],
            &[
                &["11900000003", "", "", "", "Carlos"],
                &["11900000001", "a@a.com", "", "", "Alice"],
            ],
        );
        let out = merge(&t);

        let phones: Vec<&str> = out.customers.iter().map(|c| c.phone.as_str()).collect();
        assert_eq!(phones, vec!["11900000002", "11900000001", "11900000003"]);
        assert_eq!(out.stats.total_records(), 3);
    }

    #[test]
    fn test_alternate_roster_can_be_injected() {
        let t = tables(
            &[
                &["Carlos Souza", "11900000001", "Cliente 1", ""],
                &["Hiago Lopes Marques", "11900000002", "Cliente 2", ""],
            ],
            &[],
        );
        let roster = ProfessionalRoster::new(vec![ProfessionalEntry::retained(
            "Carlos Souza",
            "Carlão",
        )]);
        let out = Merger::new(&roster).merge(&t);

        assert_eq!(out.customers.len(), 1);
        assert_eq!(out.customers[0].preferred_professional.as_deref(), Some("Carlão"));
    }

    #[test]
    fn test_last_service_falls_back_to_next_non_empty_column() {
        let primary = table(
            "primary",
            &["Profissional", "Celular", "Cliente", "Último Serviço", "Ultimo Atendimento"],
            &[&["Hiago Lopes Marques", "11900000001", "Zé", "", "Corte 15/08/2025"]],
        );
        let secondary = table("secondary", SECONDARY_HEADERS, &[]);
        let t = SourceTables {
            primary_layout: PrimaryLayout::resolve(&primary, &PrimaryColumns::default()).unwrap(),
            secondary_layout: SecondaryLayout::resolve(&secondary, &SecondaryColumns::default())
                .unwrap(),
            primary,
            secondary,
        };
        let out = merge(&t);

        assert_eq!(out.customers[0].last_service.as_deref(), Some("Corte 15/08/2025"));
    }

    #[test]
    fn test_last_service_found_by_header_text() {
        let primary = table(
            "primary",
            &["Profissional", "Celular", "Cliente", "Data do Último Atendimento"],
            &[&["Hiago Lopes Marques", "11987654321", "João", "20/09/2025"]],
        );
        let secondary = table("secondary", SECONDARY_HEADERS, &[]);
        let t = SourceTables {
            primary_layout: PrimaryLayout::resolve(&primary, &PrimaryColumns::default()).unwrap(),
            secondary_layout: SecondaryLayout::resolve(&secondary, &SecondaryColumns::default())
                .unwrap(),
            primary,
            secondary,
        };

        let out = merge(&t);

        assert_eq!(out.customers.len(), 1);
        assert_eq!(out.customers[0].last_service.as_deref(), Some("2025-09-20"));
    }

    #[test]
    fn test_normalize_service_date() {
        assert_eq!(normalize_service_date("20/09/2025"), "2025-09-20");
        assert_eq!(normalize_service_date("2025-09-20 00:00:00"), "2025-09-20");
        assert_eq!(normalize_service_date("20/09/2025 14:30"), "2025-09-20");
        assert_eq!(normalize_service_date(" Corte + barba "), "Corte + barba");
    }
}

use serde::{Deserialize, Serialize};

/// Authoritative read-time schema. The live sheet's header row may have
/// columns missing, duplicated, or reordered; fetches are reconciled
/// against this list (missing columns come back empty, extras are
/// dropped).
pub const EXPECTED_HEADERS: [&str; 15] = [
    "name",
    "email",
    "universitas",
    "major",
    "whatsapp",
    "linkedin",
    "instagram",
    "cv",
    "code",
    "portofolio",
    "status",
    "select_unit",
    "user",
    "posisi",
    "timestamp",
];

/// Headers that must be alignable in the live sheet; everything else is
/// synthesized as empty when absent.
pub const REQUIRED_HEADERS: [&str; 2] = ["name", "status"];

/// Organizational units an applicant can be assigned to. Rendered with
/// a leading empty choice meaning "unassigned".
pub const UNITS: [&str; 5] = ["GOMAN", "GOFIN", "GOTECH", "GOCREW", "GOLAB"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Waiting,
    Screening,
    Interview,
    ProcessInUnit,
    Offering,
    Hired,
    Rejected,
}

impl Status {
    pub const ALL: [Status; 7] = [
        Status::Waiting,
        Status::Screening,
        Status::Interview,
        Status::ProcessInUnit,
        Status::Offering,
        Status::Hired,
        Status::Rejected,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Status::Waiting => "Waiting",
            Status::Screening => "Screening",
            Status::Interview => "Interview",
            Status::ProcessInUnit => "Process in Unit",
            Status::Offering => "Offering",
            Status::Hired => "Hired",
            Status::Rejected => "Rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Status> {
        Status::ALL.iter().copied().find(|s| s.label() == raw)
    }

    /// Display value for a stored cell. Absent or unrecognized values
    /// show as the first catalog entry; the stored cell is never
    /// corrected.
    pub fn display_of(raw: &str) -> Status {
        Status::parse(raw).unwrap_or(Status::ALL[0])
    }

    /// The unit editor is only meaningful once an applicant has reached
    /// a unit-facing stage.
    pub fn allows_unit(self) -> bool {
        matches!(
            self,
            Status::ProcessInUnit | Status::Offering | Status::Hired
        )
    }

    pub fn next(self) -> Status {
        let idx = Status::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Status::ALL[(idx + 1) % Status::ALL.len()]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TalentRecord {
    /// 0-based position within the unfiltered snapshot. This is the
    /// only write key; it survives filtering and pagination unchanged.
    pub row: usize,
    pub name: String,
    pub email: String,
    pub universitas: String,
    pub major: String,
    pub whatsapp: String,
    pub linkedin: String, // URL, may be empty
    pub instagram: String,
    pub cv: String, // URL, may be empty
    pub code: String,
    pub portofolio: String,
    pub status: String, // raw cell; display defaulting is read-side only
    pub select_unit: String,
    pub user: String, // assigned recruiter, free text
    pub posisi: String,
    pub timestamp: String,
}

impl TalentRecord {
    /// Builds a record from cells already aligned to EXPECTED_HEADERS
    /// order. Short rows are padded with empty strings.
    pub fn from_cells(row: usize, cells: &[String]) -> Self {
        let get = |i: usize| cells.get(i).cloned().unwrap_or_default();
        TalentRecord {
            row,
            name: get(0),
            email: get(1),
            universitas: get(2),
            major: get(3),
            whatsapp: get(4),
            linkedin: get(5),
            instagram: get(6),
            cv: get(7),
            code: get(8),
            portofolio: get(9),
            status: get(10),
            select_unit: get(11),
            user: get(12),
            posisi: get(13),
            timestamp: get(14),
        }
    }

    pub fn field(&self, column: &str) -> Option<&str> {
        let value = match column {
            "name" => &self.name,
            "email" => &self.email,
            "universitas" => &self.universitas,
            "major" => &self.major,
            "whatsapp" => &self.whatsapp,
            "linkedin" => &self.linkedin,
            "instagram" => &self.instagram,
            "cv" => &self.cv,
            "code" => &self.code,
            "portofolio" => &self.portofolio,
            "status" => &self.status,
            "select_unit" => &self.select_unit,
            "user" => &self.user,
            "posisi" => &self.posisi,
            "timestamp" => &self.timestamp,
            _ => return None,
        };
        Some(value.as_str())
    }

    pub fn status_display(&self) -> Status {
        Status::display_of(&self.status)
    }
}

/// One full ordered fetch of the roster at a point in time.
pub type RosterSnapshot = Vec<TalentRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_exact_labels() {
        assert_eq!(Status::parse("Waiting"), Some(Status::Waiting));
        assert_eq!(Status::parse("Process in Unit"), Some(Status::ProcessInUnit));
        assert_eq!(Status::parse("Hired"), Some(Status::Hired));
        assert_eq!(Status::parse("hired"), None);
        assert_eq!(Status::parse(""), None);
    }

    #[test]
    fn test_status_display_defaults_to_first() {
        assert_eq!(Status::display_of(""), Status::Waiting);
        assert_eq!(Status::display_of("garbage"), Status::Waiting);
        assert_eq!(Status::display_of("Offering"), Status::Offering);
    }

    #[test]
    fn test_unit_gate() {
        assert!(Status::ProcessInUnit.allows_unit());
        assert!(Status::Offering.allows_unit());
        assert!(Status::Hired.allows_unit());
        assert!(!Status::Waiting.allows_unit());
        assert!(!Status::Rejected.allows_unit());
    }

    #[test]
    fn test_status_next_wraps() {
        assert_eq!(Status::Waiting.next(), Status::Screening);
        assert_eq!(Status::Rejected.next(), Status::Waiting);
    }

    #[test]
    fn test_from_cells_pads_short_rows() {
        let cells = vec!["Ana".to_string(), "ana@x.id".to_string()];
        let rec = TalentRecord::from_cells(3, &cells);
        assert_eq!(rec.row, 3);
        assert_eq!(rec.name, "Ana");
        assert_eq!(rec.email, "ana@x.id");
        assert_eq!(rec.timestamp, "");
    }

    #[test]
    fn test_field_lookup_matches_struct() {
        let mut cells: Vec<String> = EXPECTED_HEADERS.iter().map(|h| format!("v-{h}")).collect();
        cells[10] = "Hired".to_string();
        let rec = TalentRecord::from_cells(0, &cells);
        for header in EXPECTED_HEADERS {
            assert!(rec.field(header).is_some(), "missing accessor for {header}");
        }
        assert_eq!(rec.field("status"), Some("Hired"));
        assert_eq!(rec.field("nope"), None);
    }
}

//! Publication rows.

use serde::Serialize;

/// One publication owned by a member.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Publication {
    /// Normalized year (`""` when unknown)
    pub year: String,
    pub title: String,
    pub authors: String,
    pub venue: String,
    pub notes: String,
}

impl Publication {
    /// Build a publication from raw cells, normalizing the year.
    pub fn new(year: &str, title: &str, authors: &str, venue: &str, notes: &str) -> Self {
        Self {
            year: normalize_year(year),
            title: title.trim().to_string(),
            authors: authors.trim().to_string(),
            venue: venue.trim().to_string(),
            notes: notes.trim().to_string(),
        }
    }

    /// Whether every field is blank.
    pub fn is_blank(&self) -> bool {
        [&self.year, &self.title, &self.authors, &self.venue, &self.notes]
            .iter()
            .all(|field| field.is_empty())
    }

    /// Numeric year used for ordering; blank or non-numeric years count as 0.
    pub fn sort_key(&self) -> i64 {
        self.year.parse().unwrap_or(0)
    }
}

/// Normalize a year cell: `"2023.0"` becomes `"2023"`, blanks stay blank and
/// anything non-numeric is kept as written.
pub fn normalize_year(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => format!("{}", value.trunc() as i64),
        _ => trimmed.to_string(),
    }
}

/// Sort newest first. Blank years end up last; equal years keep their order.
pub fn sort_publications(publications: &mut [Publication]) {
    publications.sort_by_key(|p| std::cmp::Reverse(p.sort_key()));
}

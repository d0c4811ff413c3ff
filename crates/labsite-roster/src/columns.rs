//! Spreadsheet column mapping.

use serde::Deserialize;

/// Header names of the spreadsheet columns the roster reads.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Columns {
    /// Member name (required)
    pub name: String,

    /// Publication year
    pub year: String,

    /// Publication title
    pub title: String,

    /// Publication authors
    pub authors: String,

    /// Conference or journal
    pub venue: String,

    /// Free-form notes
    pub notes: String,

    /// External homepage overriding the generated page
    pub homepage: String,

    /// Opt-out flag for page generation
    pub manual: String,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            name: "姓名".to_string(),
            // The sheet carries a member-level "Year" too; the second one is the publication's
            year: "Year.1".to_string(),
            title: "Publication Title".to_string(),
            authors: "Authors".to_string(),
            venue: "Conferences/Journals".to_string(),
            notes: "Notes".to_string(),
            homepage: "Homepage".to_string(),
            manual: "Manual".to_string(),
        }
    }
}

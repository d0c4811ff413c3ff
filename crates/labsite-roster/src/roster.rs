//! Member records grouped from spreadsheet rows.

use std::collections::{BTreeMap, HashMap};

use crate::columns::Columns;
use crate::publication::{sort_publications, Publication};
use crate::romanize::{romanize, slugify};
use crate::sheet::Sheet;

/// A lab member.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// Chinese name as written in the spreadsheet (unique key)
    pub name: String,

    /// "Given Surname" romanization
    pub romanized: String,

    /// Output file stem, unique within the roster
    pub slug: String,

    /// External homepage overriding the generated page link
    pub homepage: Option<String>,

    /// Whether the member opted out of page generation
    pub manual: bool,

    /// Publications, newest first
    pub publications: Vec<Publication>,
}

/// All members of the lab, ordered by name.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    members: Vec<Member>,
    index: HashMap<String, usize>,
}

/// Errors that can occur when building the roster.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("Spreadsheet has no '{0}' column")]
    MissingColumn(String),
}

/// Rows collected for one member before they become a [`Member`].
#[derive(Default)]
struct Group {
    homepage: Option<String>,
    manual: bool,
    publications: Vec<Publication>,
}

impl Roster {
    /// Group spreadsheet rows by member name.
    pub fn from_sheet(sheet: &Sheet, columns: &Columns) -> Result<Self, RosterError> {
        let name_col = sheet
            .column(&columns.name)
            .ok_or_else(|| RosterError::MissingColumn(columns.name.clone()))?;

        let optional = |header: &str| {
            let col = sheet.column(header);
            if col.is_none() {
                tracing::debug!("Column '{}' not present, treating as empty", header);
            }
            col
        };
        let year_col = optional(&columns.year);
        let title_col = optional(&columns.title);
        let authors_col = optional(&columns.authors);
        let venue_col = optional(&columns.venue);
        let notes_col = optional(&columns.notes);
        let homepage_col = optional(&columns.homepage);
        let manual_col = optional(&columns.manual);

        let mut groups: BTreeMap<String, Group> = BTreeMap::new();

        for row in 0..sheet.len() {
            let name = sheet.cell(row, name_col).trim();
            if name.is_empty() {
                continue;
            }

            let cell = |col: Option<usize>| col.map(|c| sheet.cell(row, c)).unwrap_or("");
            let group = groups.entry(name.to_string()).or_default();

            let homepage = cell(homepage_col).trim();
            if group.homepage.is_none() && !homepage.is_empty() {
                group.homepage = Some(homepage.to_string());
            }

            group.manual |= is_truthy(cell(manual_col));

            let publication = Publication::new(
                cell(year_col),
                cell(title_col),
                cell(authors_col),
                cell(venue_col),
                cell(notes_col),
            );
            if !publication.is_blank() {
                group.publications.push(publication);
            }
        }

        Ok(Self::from_groups(groups))
    }

    fn from_groups(groups: BTreeMap<String, Group>) -> Self {
        let mut members = Vec::with_capacity(groups.len());
        let mut index = HashMap::new();
        let mut slug_counts: HashMap<String, usize> = HashMap::new();

        for (name, mut group) in groups {
            sort_publications(&mut group.publications);

            let base = slugify(&name);
            let count = slug_counts.entry(base.clone()).or_insert(0);
            *count += 1;
            let slug = if *count == 1 {
                base
            } else {
                tracing::warn!(
                    "Slug '{}' already taken, using '{}-{}' for {}",
                    base,
                    base,
                    count,
                    name
                );
                format!("{}-{}", base, count)
            };

            index.insert(name.clone(), members.len());
            members.push(Member {
                romanized: romanize(&name),
                name,
                slug,
                homepage: group.homepage,
                manual: group.manual,
                publications: group.publications,
            });
        }

        Self { members, index }
    }

    /// Look up a member by Chinese name.
    pub fn get(&self, name: &str) -> Option<&Member> {
        self.index.get(name.trim()).map(|&i| &self.members[i])
    }

    /// Iterate over members in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the roster has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

fn is_truthy(cell: &str) -> bool {
    matches!(
        cell.trim().to_lowercase().as_str(),
        "1" | "1.0" | "true" | "yes" | "y" | "x" | "✓" | "是"
    )
}

//! Member roster for the lab site.
//!
//! This crate loads the members spreadsheet, groups its rows into member
//! records with their publications, romanizes Chinese names and parses the
//! optional per-member profile files.

pub mod columns;
pub mod profile;
pub mod publication;
pub mod romanize;
pub mod roster;
pub mod sheet;

pub use columns::Columns;
pub use profile::{load_profile, parse_profile, Profile, ProfileError, ProfileMeta};
pub use publication::{normalize_year, sort_publications, Publication};
pub use romanize::{romanize, slugify, split_name, to_pinyin};
pub use roster::{Member, Roster, RosterError};
pub use sheet::{load_sheet, Sheet, SheetError};

//! Static site generator for lab member pages.
//!
//! Renders one page per member from the roster and patches the member cards
//! on the group homepage.

pub mod avatars;
pub mod builder;
pub mod templates;

pub use builder::{BuildConfig, BuildError, BuildResult, SiteBuilder};

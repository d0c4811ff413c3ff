//! Member card patching.
//!
//! Every member card on the homepage is mutated in place: the Chinese name is
//! replaced with its romanization, the card is wrapped in a link to the
//! member's page (or external homepage) and its avatar slot is filled with an
//! image or an icon placeholder.
//!
//! The document is read once with scraper to find each card's name and
//! avatar slot, then rewritten with lol_html so that everything outside the
//! cards is emitted byte for byte. Links from earlier runs are recognized in
//! the lol_html pass, since an HTML5 tree builder moves cards that contain
//! links of their own out of the anchor wrapped around them.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use lol_html::html_content::{ContentType, Element};
use lol_html::{element, end_tag, rewrite_str, RewriteStrSettings};
use scraper::Html;

use crate::master::parse_selector;
use crate::{html_escape, html_unescape, RewriteError};

/// Attribute marking anchors this tool wrapped around a card; holds the card's raw name.
const LINK_MARKER: &str = "data-member-link";

/// Attribute recording the spreadsheet name on a patched card.
const NAME_ATTR: &str = "data-member-name";

/// Where a card links to.
#[derive(Debug, Clone, PartialEq)]
pub struct CardLink {
    /// Link target
    pub href: String,

    /// Whether the link leaves the site (opens in a new tab)
    pub external: bool,
}

/// What fills a card's avatar slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Avatar {
    /// A photo
    Image { src: String, alt: String },

    /// Icon placeholder when no photo exists
    Icon,
}

/// Changes to apply to one card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardPatch {
    /// Text shown instead of the raw name
    pub display_name: String,

    /// Link wrapped around the card, if any
    pub link: Option<CardLink>,

    /// Avatar slot content
    pub avatar: Avatar,
}

/// Decides how a card with a given raw name is patched.
pub trait CardResolver {
    /// Resolve the name found on a card (the text of its first `<p>`).
    fn resolve(&self, name: &str) -> CardPatch;
}

/// Selectors locating cards and their avatar slots.
#[derive(Debug, Clone, PartialEq)]
pub struct CardSelectors {
    /// CSS selector matching a member card
    pub card: String,

    /// Class of the avatar element inside a card
    pub avatar_class: String,
}

impl Default for CardSelectors {
    fn default() -> Self {
        Self {
            card: ".member-card".to_string(),
            avatar_class: "member-avatar".to_string(),
        }
    }
}

impl CardSelectors {
    fn avatar(&self) -> String {
        format!("{} .{}", self.card, self.avatar_class)
    }

    fn name(&self) -> String {
        format!("{} p", self.card)
    }
}

/// Summary of a patching pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchReport {
    /// Cards found
    pub cards: usize,

    /// Cards whose displayed name changed
    pub renamed: usize,

    /// Cards that now link somewhere
    pub linked: usize,

    /// Cards showing a photo
    pub images: usize,

    /// Cards showing the icon placeholder
    pub icons: usize,

    /// Cards left alone because they have no name paragraph
    pub skipped: usize,
}

/// How a card is currently wrapped.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Wrapper {
    None,
    /// An anchor from a previous run, ours to update
    Owned,
    /// A hand-written anchor, left alone
    Foreign,
}

/// What the read-only pass learned about a card.
#[derive(Debug)]
struct CardPlan {
    raw_name: String,
    has_avatar: bool,
}

#[derive(Default)]
struct RewriteState {
    /// Start tags seen so far
    seq: usize,
    /// Innermost open anchor, keyed by the position of its start tag
    open_anchor: Option<(usize, Wrapper)>,
    next_card: usize,
    current: Option<CardPatch>,
    name_done: bool,
    avatar_done: bool,
    resolved: HashMap<String, CardPatch>,
    report: PatchReport,
}

impl RewriteState {
    /// Resolve each distinct name once.
    fn resolve<R: CardResolver + ?Sized>(&mut self, resolver: &R, name: &str) -> CardPatch {
        self.resolved
            .entry(name.to_string())
            .or_insert_with(|| resolver.resolve(name))
            .clone()
    }
}

impl PatchReport {
    fn record(&mut self, raw_name: &str, patch: &CardPatch, wrapper: Wrapper) {
        if patch.display_name != raw_name {
            self.renamed += 1;
        }
        if patch.link.is_some() && wrapper != Wrapper::Foreign {
            self.linked += 1;
        }
        match patch.avatar {
            Avatar::Image { .. } => self.images += 1,
            Avatar::Icon => self.icons += 1,
        }
    }
}

/// Patch every member card in `html`.
///
/// Anchors this tool wraps around a card carry the card's raw name in
/// [`LINK_MARKER`]. Whether a card is already wrapped is decided while
/// streaming: the card's start tag must directly follow an anchor start tag
/// that is still open.
pub fn patch_cards<R: CardResolver + ?Sized>(
    html: &str,
    selectors: &CardSelectors,
    resolver: &R,
) -> Result<(String, PatchReport), RewriteError> {
    let name_selector = selectors.name();
    let avatar_selector = selectors.avatar();
    let anchor_selector = format!("a[{}]", LINK_MARKER);
    for css in [&selectors.card, &name_selector, &avatar_selector] {
        validate_rewrite_selector(css)?;
    }

    let plans = plan_cards(html, selectors)?;

    let state = Rc::new(RefCell::new(RewriteState::default()));
    let avatar_class = selectors.avatar_class.as_str();

    let output = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                // Registered first, so it runs before the handlers below on the same element
                element!("*", |el: &mut Element| {
                    let seq = {
                        let mut st = state.borrow_mut();
                        st.seq += 1;
                        st.seq
                    };
                    if el.tag_name() != "a" {
                        return Ok(());
                    }

                    let wrapper = if el.has_attribute(LINK_MARKER) {
                        Wrapper::Owned
                    } else {
                        Wrapper::Foreign
                    };
                    state.borrow_mut().open_anchor = Some((seq, wrapper));

                    let state = Rc::clone(&state);
                    el.on_end_tag(end_tag!(move |_end| {
                        let mut st = state.borrow_mut();
                        if st.open_anchor.is_some_and(|(start, _)| start == seq) {
                            st.open_anchor = None;
                        }
                        Ok(())
                    }))
                }),
                element!(anchor_selector, |el| {
                    let name = el
                        .get_attribute(LINK_MARKER)
                        .map(|n| html_unescape(n.trim()))
                        .unwrap_or_default();
                    if name.is_empty() {
                        return Ok(());
                    }

                    let mut st = state.borrow_mut();
                    let patch = st.resolve(resolver, &name);
                    match &patch.link {
                        Some(link) => {
                            el.set_attribute("href", &link.href)?;
                            if link.external {
                                el.set_attribute("target", "_blank")?;
                                el.set_attribute("rel", "noopener")?;
                            } else {
                                el.set_attribute("target", "_self")?;
                                el.remove_attribute("rel");
                            }
                        }
                        None => {
                            el.remove_and_keep_content();
                            st.open_anchor = None;
                        }
                    }
                    Ok(())
                }),
                element!(selectors.card, |el| {
                    let mut st = state.borrow_mut();
                    let index = st.next_card;
                    st.next_card += 1;
                    st.current = None;
                    st.name_done = false;
                    st.avatar_done = false;
                    st.report.cards += 1;

                    let plan = match plans.get(index) {
                        Some(Some(plan)) => plan,
                        Some(None) => {
                            st.report.skipped += 1;
                            return Ok(());
                        }
                        None => {
                            tracing::warn!("Card #{} was not planned; left as is", index);
                            st.report.skipped += 1;
                            return Ok(());
                        }
                    };

                    let wrapper = match st.open_anchor {
                        Some((start, wrapper)) if start + 1 == st.seq => wrapper,
                        _ => Wrapper::None,
                    };
                    let patch = st.resolve(resolver, &plan.raw_name);

                    el.set_attribute(NAME_ATTR, &plan.raw_name)?;

                    if wrapper == Wrapper::None {
                        if let Some(link) = &patch.link {
                            el.before(&open_anchor(link, &plan.raw_name), ContentType::Html);
                            el.after("</a>", ContentType::Html);
                        }
                    }

                    if !plan.has_avatar {
                        el.prepend(&avatar_html(&patch, avatar_class), ContentType::Html);
                    }

                    st.report.record(&plan.raw_name, &patch, wrapper);
                    st.current = Some(patch);
                    Ok(())
                }),
                element!(name_selector, |el| {
                    let mut st = state.borrow_mut();
                    if st.name_done {
                        return Ok(());
                    }
                    st.name_done = true;

                    if let Some(patch) = &st.current {
                        el.set_inner_content(&patch.display_name, ContentType::Text);
                    }
                    Ok(())
                }),
                element!(avatar_selector, |el| {
                    let mut st = state.borrow_mut();
                    if st.avatar_done {
                        return Ok(());
                    }
                    st.avatar_done = true;

                    if let Some(patch) = &st.current {
                        el.replace(&avatar_html(patch, avatar_class), ContentType::Html);
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    )?;

    let st = state.borrow();
    if st.next_card != plans.len() {
        tracing::warn!(
            "Planned {} cards but rewrote {}; the homepage may be malformed",
            plans.len(),
            st.next_card
        );
    }

    Ok((output, st.report.clone()))
}

/// Read the document and find each card's name and avatar slot.
///
/// Returns one entry per card in document order, `None` for cards without a
/// name paragraph.
fn plan_cards(html: &str, selectors: &CardSelectors) -> Result<Vec<Option<CardPlan>>, RewriteError> {
    let document = Html::parse_document(html);
    let card_selector = parse_selector(&selectors.card)?;
    let p_selector = parse_selector("p")?;
    let avatar_selector = parse_selector(&format!(".{}", selectors.avatar_class))?;

    let plans = document
        .select(&card_selector)
        .map(|card| {
            let Some(p) = card.select(&p_selector).next() else {
                tracing::debug!("Card without a name paragraph: {}", card.html());
                return None;
            };

            let raw_name = card
                .value()
                .attr(NAME_ATTR)
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| p.text().collect::<String>().trim().to_string());

            Some(CardPlan {
                raw_name,
                has_avatar: card.select(&avatar_selector).next().is_some(),
            })
        })
        .collect();

    Ok(plans)
}

fn validate_rewrite_selector(css: &str) -> Result<(), RewriteError> {
    css.parse::<lol_html::Selector>()
        .map(|_| ())
        .map_err(|e| RewriteError::Selector {
            selector: css.to_string(),
            message: e.to_string(),
        })
}

fn open_anchor(link: &CardLink, name: &str) -> String {
    let target = if link.external {
        r#"target="_blank" rel="noopener""#
    } else {
        r#"target="_self""#
    };

    format!(
        r#"<a href="{}" {} {}="{}">"#,
        html_escape(&link.href),
        target,
        LINK_MARKER,
        html_escape(name)
    )
}

fn avatar_html(patch: &CardPatch, class: &str) -> String {
    match &patch.avatar {
        Avatar::Image { src, alt } => format!(
            r#"<img class="{} rounded-circle" src="{}" alt="{}" loading="lazy">"#,
            html_escape(class),
            html_escape(src),
            html_escape(alt)
        ),
        Avatar::Icon => format!(
            r#"<i class="{} bi bi-person-circle" aria-hidden="true"></i>"#,
            html_escape(class)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    /// Resolver backed by a fixed table: name -> (display, link, photo).
    struct Table(HashMap<&'static str, (&'static str, Option<CardLink>, Option<&'static str>)>);

    impl CardResolver for Table {
        fn resolve(&self, name: &str) -> CardPatch {
            match self.0.get(name) {
                Some((display, link, photo)) => CardPatch {
                    display_name: display.to_string(),
                    link: link.clone(),
                    avatar: match photo {
                        Some(src) => Avatar::Image {
                            src: src.to_string(),
                            alt: display.to_string(),
                        },
                        None => Avatar::Icon,
                    },
                },
                None => CardPatch {
                    display_name: name.to_string(),
                    link: None,
                    avatar: Avatar::Icon,
                },
            }
        }
    }

    fn internal(href: &str) -> Option<CardLink> {
        Some(CardLink {
            href: href.to_string(),
            external: false,
        })
    }

    fn resolver() -> Table {
        let mut table = HashMap::new();
        table.insert(
            "张三",
            (
                "San Zhang",
                internal("members/zhangsan.html"),
                Some("images/avatars/zhangsan.jpg"),
            ),
        );
        table.insert(
            "李四",
            (
                "Si Li",
                Some(CardLink {
                    href: "https://lisi.example.com".to_string(),
                    external: true,
                }),
                None,
            ),
        );
        table.insert("王五", ("Wu Wang", None, None));
        Table(table)
    }

    fn patch(html: &str) -> (String, PatchReport) {
        patch_cards(html, &CardSelectors::default(), &resolver()).unwrap()
    }

    #[test]
    fn renames_links_and_decorates_cards() {
        let html = r#"<div class="row"><div class="member-card"><div class="member-avatar"></div><p>张三</p></div></div>"#;

        let (output, report) = patch(html);

        assert_eq!(
            output,
            r#"<div class="row"><a href="members/zhangsan.html" target="_self" data-member-link="张三"><div class="member-card" data-member-name="张三"><img class="member-avatar rounded-circle" src="images/avatars/zhangsan.jpg" alt="San Zhang" loading="lazy"><p>San Zhang</p></div></a></div>"#
        );
        assert_eq!(report.cards, 1);
        assert_eq!(report.renamed, 1);
        assert_eq!(report.linked, 1);
        assert_eq!(report.images, 1);
    }

    #[test]
    fn external_links_open_in_new_tab() {
        let html = r#"<div class="member-card"><p>李四</p></div>"#;

        let (output, report) = patch(html);

        assert!(output.starts_with(
            r#"<a href="https://lisi.example.com" target="_blank" rel="noopener" data-member-link="李四">"#
        ));
        assert!(output.contains(r#"<i class="member-avatar bi bi-person-circle" aria-hidden="true"></i><p>Si Li</p>"#));
        assert_eq!(report.icons, 1);
    }

    #[test]
    fn unlinked_member_is_renamed_only() {
        let html = r#"<div class="member-card"><span class="member-avatar">?</span><p> 王五 </p></div>"#;

        let (output, report) = patch(html);

        assert!(!output.contains("<a "));
        assert!(output.contains("<p>Wu Wang</p>"));
        assert!(!output.contains("?"));
        assert_eq!(report.linked, 0);
    }

    #[test]
    fn unknown_names_keep_raw_text() {
        let html = r#"<div class="member-card"><p>赵六</p></div>"#;

        let (output, report) = patch(html);

        assert!(output.contains("<p>赵六</p>"));
        assert!(output.contains("bi-person-circle"));
        assert_eq!(report.renamed, 0);
        assert_eq!(report.icons, 1);
    }

    #[test]
    fn cards_without_paragraph_are_untouched() {
        let html = r#"<div class="member-card"><span>张三</span></div><div class="member-card"><p>王五</p></div>"#;

        let (output, report) = patch(html);

        assert!(output.starts_with(r#"<div class="member-card"><span>张三</span></div>"#));
        assert!(output.contains("<p>Wu Wang</p>"));
        assert_eq!(report.cards, 2);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn only_first_paragraph_is_renamed() {
        let html = r#"<div class="member-card"><p>张三</p><p>PhD student</p></div>"#;

        let (output, _) = patch(html);

        assert!(output.contains("<p>San Zhang</p><p>PhD student</p>"));
    }

    #[test]
    fn hand_written_links_are_left_alone() {
        let html = r#"<a href="people/zs.html"><div class="member-card"><p>张三</p></div></a>"#;

        let (output, report) = patch(html);

        assert!(output.starts_with(r#"<a href="people/zs.html"><div class="member-card""#));
        assert_eq!(output.matches("<a ").count(), 1);
        assert_eq!(report.linked, 0);
    }

    #[test]
    fn patching_is_idempotent() {
        let html = r#"<section>
  <div class="member-card"><div class="member-avatar"></div><p>张三</p></div>
  <div class="member-card"><p>李四</p></div>
  <div class="member-card"><p>王五</p></div>
</section>"#;

        let (once, _) = patch(html);
        let (twice, report) = patch(&once);

        assert_eq!(once, twice);
        assert_eq!(report.cards, 3);
        assert_eq!(report.renamed, 3);
    }

    #[test]
    fn patching_is_idempotent_with_links_inside_cards() {
        let html = r#"<section><div class="member-card"><div class="member-avatar"></div><p>张三</p><a href="mailto:zs@lab.org">Email</a></div></section>"#;

        let (once, _) = patch(html);
        let (twice, report) = patch(&once);
        let (thrice, _) = patch(&twice);

        assert_eq!(
            once,
            r#"<section><a href="members/zhangsan.html" target="_self" data-member-link="张三"><div class="member-card" data-member-name="张三"><img class="member-avatar rounded-circle" src="images/avatars/zhangsan.jpg" alt="San Zhang" loading="lazy"><p>San Zhang</p><a href="mailto:zs@lab.org">Email</a></div></a></section>"#
        );
        assert_eq!(once, twice);
        assert_eq!(twice, thrice);
        assert_eq!(report.linked, 1);
    }

    #[test]
    fn closed_sibling_links_do_not_count_as_wrappers() {
        let html = r#"<a href="index.html">Back</a><div class="member-card"><p>张三</p></div>"#;

        let (output, report) = patch(html);

        assert!(output.starts_with(
            r#"<a href="index.html">Back</a><a href="members/zhangsan.html" target="_self" data-member-link="张三"><div"#
        ));
        assert_eq!(report.linked, 1);
    }

    #[test]
    fn unnamed_markers_are_not_wrapped_again() {
        let previous = r#"<a href="old.html" data-member-link><div class="member-card"><p>张三</p></div></a>"#;

        let (output, _) = patch(previous);

        assert!(output.starts_with(r#"<a href="old.html" data-member-link><div class="member-card""#));
        assert_eq!(output.matches("<a ").count(), 1);
    }

    #[test]
    fn escaped_names_round_trip_through_links() {
        let mut table = resolver();
        table
            .0
            .insert("A&B", ("A and B", internal("members/a-b.html"), None));
        let html = r#"<div class="member-card"><p>A&amp;B</p></div>"#;

        let (once, _) = patch_cards(html, &CardSelectors::default(), &table).unwrap();
        let (twice, _) = patch_cards(&once, &CardSelectors::default(), &table).unwrap();

        assert!(once.contains(r#"data-member-link="A&amp;B""#));
        assert_eq!(once, twice);
    }

    #[test]
    fn updates_links_from_previous_runs() {
        let previous = r#"<a href="members/lisi.html" target="_self" data-member-link="李四"><div class="member-card" data-member-name="李四"><p>Si Li</p></div></a>"#;

        let (output, _) = patch(previous);

        assert!(output.starts_with(
            r#"<a href="https://lisi.example.com" target="_blank" data-member-link="李四" rel="noopener">"#
        ));
    }

    #[test]
    fn unwraps_links_that_no_longer_apply() {
        let previous = r#"<a href="members/wangwu.html" target="_self" data-member-link="王五"><div class="member-card" data-member-name="王五"><p>Wu Wang</p></div></a>"#;

        let (output, _) = patch(previous);

        assert!(output.starts_with(r#"<div class="member-card""#));
        assert!(!output.contains("</a>"));
    }

    #[test]
    fn custom_selectors() {
        let selectors = CardSelectors {
            card: ".person".to_string(),
            avatar_class: "photo".to_string(),
        };
        let html = r#"<div class="person"><img class="photo" src="x.png"><p>张三</p></div>"#;

        let (output, _) = patch_cards(html, &selectors, &resolver()).unwrap();

        assert!(output.contains(r#"<img class="photo rounded-circle" src="images/avatars/zhangsan.jpg""#));
    }

    #[test]
    fn rejects_invalid_selector() {
        let selectors = CardSelectors {
            card: "[[".to_string(),
            ..Default::default()
        };

        let result = patch_cards("<p></p>", &selectors, &resolver());

        assert!(matches!(result, Err(RewriteError::Selector { .. })));
    }
}

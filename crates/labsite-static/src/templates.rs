//! Template engine for rendering member pages.

use std::path::Path;

use minijinja::{context, path_loader, Environment};

use labsite_html::Fragments;
use labsite_roster::{Profile, Publication};

/// Built-in templates, by name.
pub const BUILTIN_TEMPLATES: [(&str, &str); 2] = [
    ("member.html", MEMBER_TEMPLATE),
    ("publications.html", PUBLICATIONS_TEMPLATE),
];

/// Context for rendering a member page.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Context {
    /// Chinese name
    pub name: String,
    /// Romanized name, used as the page heading
    pub name_en: String,
    /// Avatar URL relative to the member page
    pub avatar: Option<String>,
    /// Publications, newest first
    pub publications: Vec<Publication>,
    /// Optional profile
    pub profile: Option<Profile>,
}

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with the built-in templates.
    pub fn new() -> Self {
        let mut env = Environment::new();

        for (name, source) in BUILTIN_TEMPLATES {
            env.add_template_owned(name.to_string(), source.to_string())
                .expect("Failed to add built-in template");
        }

        Self { env }
    }

    /// Create a template engine that prefers templates found in `dir`.
    ///
    /// Templates missing from `dir` fall back to the built-in ones.
    pub fn with_overrides(dir: &Path) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(dir));

        for (name, source) in BUILTIN_TEMPLATES {
            if dir.join(name).is_file() {
                tracing::info!("Using template override {}", dir.join(name).display());
                continue;
            }
            env.add_template_owned(name.to_string(), source.to_string())
                .expect("Failed to add built-in template");
        }

        Self { env }
    }

    /// Render a member page around the shared homepage fragments.
    pub fn render_member(
        &self,
        fragments: &Fragments,
        context: &Context,
    ) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template("member.html")?;

        tmpl.render(context! {
            head => &fragments.head,
            nav => &fragments.nav,
            banner => &fragments.banner,
            footer => &fragments.footer,
            name => &context.name,
            name_en => &context.name_en,
            avatar => &context.avatar,
            publications => &context.publications,
            profile => &context.profile,
        })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

const MEMBER_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
{{ head | safe }}
<body>
{{ nav | safe }}
{{ banner | safe }}
<main class="container my-5">
  {% if avatar %}
  <div class="text-center mb-3">
    <img class="member-avatar rounded-circle" src="{{ avatar }}" alt="{{ name_en }}" width="160" height="160">
  </div>
  {% endif %}
  <h1 class="text-center mb-4 wow fadeIn">{{ name_en }}</h1>

  <section class="my-4">
    <h3>Research Interest</h3>
    <p>{% if profile and profile.meta.research %}{{ profile.meta.research }}{% else %}<!-- Fill in later -->{% endif %}</p>
  </section>

  <section class="my-4">
    <h3>Education</h3>
    <ul>
      <li><strong>Bachelor&nbsp;School:</strong> {% if profile and profile.meta.bachelor %}{{ profile.meta.bachelor }}{% else %}<!-- Fill in -->{% endif %}</li>
      <li><strong>Master&nbsp;School:</strong> {% if profile and profile.meta.master %}{{ profile.meta.master }}{% else %}<!-- Fill in -->{% endif %}</li>
      {% if profile and profile.meta.phd %}<li><strong>PhD&nbsp;School:</strong> {{ profile.meta.phd }}</li>{% endif %}
    </ul>
  </section>

  {% if profile and profile.meta.email %}
  <section class="my-4">
    <h3>Contact</h3>
    <p><a href="mailto:{{ profile.meta.email }}">{{ profile.meta.email }}</a></p>
  </section>
  {% endif %}

  {% if profile and profile.bio_html %}
  <section class="my-4">
    <h3>About</h3>
    {{ profile.bio_html | safe }}
  </section>
  {% endif %}

  <section class="my-4">
    <h3>Publications</h3>
    {% include "publications.html" %}
  </section>
</main>
{{ footer | safe }}
</body>
</html>
"##;

const PUBLICATIONS_TEMPLATE: &str = r##"<div class="table-responsive">
  <table class="table table-striped table-bordered table-sm">
    <thead class="table-light">
      <tr><th>Year</th><th>Title</th><th>Authors</th><th>Venue</th><th>Notes</th></tr>
    </thead>
    <tbody>
    {% for pub in publications %}
      <tr><td>{{ pub.year }}</td><td>{{ pub.title }}</td><td>{{ pub.authors }}</td><td>{{ pub.venue }}</td><td>{{ pub.notes }}</td></tr>
    {% endfor %}
    </tbody>
  </table>
</div>"##;

#[cfg(test)]
mod tests {
    use super::*;
    use labsite_roster::ProfileMeta;
    use std::fs;
    use tempfile::tempdir;

    fn fragments() -> Fragments {
        Fragments {
            head: r#"<head><base href="../"><title>AI Lab</title></head>"#.to_string(),
            nav: r#"<nav><a href="../index.html">Home</a></nav>"#.to_string(),
            banner: "<header><h1>Group</h1></header>".to_string(),
            footer: "<footer>Footer</footer>".to_string(),
        }
    }

    fn context() -> Context {
        Context {
            name: "张三".to_string(),
            name_en: "San Zhang".to_string(),
            avatar: None,
            publications: vec![Publication::new(
                "2023.0",
                "Graphs <and> Trees",
                "Zhang & Li",
                "NeurIPS",
                "",
            )],
            profile: None,
        }
    }

    #[test]
    fn renders_member_page() {
        let engine = TemplateEngine::new();

        let html = engine.render_member(&fragments(), &context()).unwrap();

        assert!(html.contains(r#"<head><base href="../"><title>AI Lab</title></head>"#));
        assert!(html.contains(r#"<nav><a href="../index.html">Home</a></nav>"#));
        assert!(html.contains("<header><h1>Group</h1></header>"));
        assert!(html.contains("<footer>Footer</footer>"));
        assert!(html.contains("San Zhang</h1>"));
        assert!(html.contains("<h3>Research Interest</h3>"));
        assert!(html.contains("<!-- Fill in later -->"));
        assert!(!html.contains("member-avatar"));
    }

    #[test]
    fn escapes_publication_cells() {
        let engine = TemplateEngine::new();

        let html = engine.render_member(&fragments(), &context()).unwrap();

        assert!(html.contains(r#"<table class="table table-striped table-bordered table-sm">"#));
        assert!(html.contains("<td>2023</td>"));
        assert!(html.contains("<td>Graphs &lt;and&gt; Trees</td>"));
        assert!(html.contains("<td>Zhang &amp; Li</td>"));
    }

    #[test]
    fn empty_publications_render_empty_body() {
        let engine = TemplateEngine::new();
        let mut context = context();
        context.publications.clear();

        let html = engine.render_member(&fragments(), &context).unwrap();

        assert!(html.contains("<thead class=\"table-light\">"));
        assert!(!html.contains("<td>"));
    }

    #[test]
    fn fills_profile_sections() {
        let engine = TemplateEngine::new();
        let mut context = context();
        context.avatar = Some("../images/avatars/zhangsan.jpg".to_string());
        context.profile = Some(Profile {
            meta: ProfileMeta {
                research: Some("Graph learning".to_string()),
                bachelor: Some("Peking University".to_string()),
                phd: Some("MIT".to_string()),
                ..Default::default()
            },
            bio_html: "<p>Hello</p>".to_string(),
        });

        let html = engine.render_member(&fragments(), &context).unwrap();

        assert!(html.contains("<p>Graph learning</p>"));
        assert!(html.contains("Peking University"));
        assert!(html.contains("<strong>PhD&nbsp;School:</strong> MIT"));
        assert!(html.contains("<p>Hello</p>"));
        assert!(html.contains(r#"src="../images/avatars/zhangsan.jpg""#));
        assert!(!html.contains("Contact"));
    }

    #[test]
    fn prefers_template_overrides() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("publications.html"),
            "<ol>{% for pub in publications %}<li>{{ pub.title }}</li>{% endfor %}</ol>",
        )
        .unwrap();

        let engine = TemplateEngine::with_overrides(temp.path());
        let html = engine.render_member(&fragments(), &context()).unwrap();

        assert!(html.contains("<ol><li>Graphs &lt;and&gt; Trees</li></ol>"));
        assert!(html.contains("<h3>Research Interest</h3>"));
    }
}

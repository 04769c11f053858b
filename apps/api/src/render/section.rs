//! Section renderer: one titled piece of resume content → one HTML fragment.
//!
//! Every piece of user text passes through [`escape`] before it reaches the
//! output. Empty content produces an empty fragment, never an empty heading.

use serde_json::{Map, Value};

use crate::models::section::{value_text, LinkItem, Links, SectionContent};

/// Title-like fields, first truthy one wins.
const TITLE_FIELDS: [&str; 3] = ["role", "title", "position"];
/// Organization-like fields, first truthy one wins.
const ORG_FIELDS: [&str; 3] = ["company", "organization", "institution"];
/// Date/location fields, every truthy one is shown in this order.
const META_FIELDS: [&str; 4] = ["period", "dates", "duration", "location"];
const BULLET_FIELDS: [&str; 3] = ["bullets", "highlights", "responsibilities"];

const HEADING_SEPARATOR: &str = " — ";
const META_SEPARATOR: &str = " · ";

const SAFE_SCHEMES: [&str; 4] = ["http://", "https://", "mailto:", "tel:"];

/// Escapes text for HTML element and attribute contexts.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders one section. Returns an empty string when there is nothing to show.
pub fn render_section(title: &str, content: Option<&SectionContent>) -> String {
    let Some(content) = content.filter(|c| !c.is_empty()) else {
        return String::new();
    };

    let body = match content {
        SectionContent::Text(text) => format!("<p>{}</p>", escape(text.trim())),
        SectionContent::Table(map) => render_table(map),
        SectionContent::List(items) => render_list(items.iter().map(String::as_str)),
        SectionContent::Entries(entries) => entries.iter().map(render_entry).collect(),
    };

    wrap_section(title, &body)
}

/// Renders the links section as a list of anchors. Links without a usable
/// URL become plain text items.
pub fn render_links(title: &str, links: Option<&Links>) -> String {
    let items: Vec<String> = match links {
        None => Vec::new(),
        Some(Links::Map(map)) => map
            .iter()
            .filter_map(|(label, url)| {
                let url = match url {
                    Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
                    _ => None,
                };
                link_item(Some(label.trim().to_string()).filter(|l| !l.is_empty()), url)
            })
            .collect(),
        Some(Links::List(list)) => list
            .iter()
            .filter_map(|item| match item {
                LinkItem::Entry { label, url } => link_item(label.clone(), url.clone()),
                LinkItem::Bare(text) => {
                    let text = text.trim();
                    if text.is_empty() {
                        None
                    } else if is_safe_url(text) {
                        Some(anchor(text, text))
                    } else {
                        Some(escape(text))
                    }
                }
            })
            .collect(),
    };

    if items.is_empty() {
        return String::new();
    }

    let list: String = items.iter().map(|item| format!("<li>{item}</li>")).collect();
    wrap_section(title, &format!("<ul>{list}</ul>"))
}

fn wrap_section(title: &str, body: &str) -> String {
    format!(
        "<div class=\"section\"><h2>{}</h2>{body}</div>",
        escape(title)
    )
}

fn render_table(map: &Map<String, Value>) -> String {
    let mut html = String::from("<dl>");
    for (key, value) in map {
        let key = escape(key);
        match value {
            Value::String(s) => html.push_str(&format!("<dt>{key}</dt><dd>{}</dd>", escape(s))),
            other => html.push_str(&format!(
                "<dt>{key}</dt><dd><pre>{}</pre></dd>",
                escape(&other.to_string())
            )),
        }
    }
    html.push_str("</dl>");
    html
}

fn render_list<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let items: String = items
        .map(|item| format!("<li>{}</li>", escape(item)))
        .collect();
    format!("<ul>{items}</ul>")
}

fn render_entry(entry: &Map<String, Value>) -> String {
    let mut html = String::from("<div class=\"item\">");

    let heading: Vec<String> = [first_truthy(entry, &TITLE_FIELDS), first_truthy(entry, &ORG_FIELDS)]
        .into_iter()
        .flatten()
        .collect();
    if !heading.is_empty() {
        html.push_str(&format!("<h3>{}</h3>", escape(&heading.join(HEADING_SEPARATOR))));
    }

    let meta: Vec<String> = META_FIELDS
        .iter()
        .filter_map(|key| entry.get(*key).filter(|v| is_truthy(v)).map(value_text))
        .collect();
    if !meta.is_empty() {
        html.push_str(&format!(
            "<p class=\"meta\">{}</p>",
            escape(&meta.join(META_SEPARATOR))
        ));
    }

    for key in BULLET_FIELDS {
        if let Some(Value::Array(bullets)) = entry.get(key) {
            if !bullets.is_empty() {
                let texts: Vec<String> = bullets.iter().map(value_text).collect();
                html.push_str(&render_list(texts.iter().map(String::as_str)));
            }
        }
    }

    let remaining: Vec<(&String, &Value)> = entry
        .iter()
        .filter(|(key, _)| !is_consumed(key))
        .collect();
    if !remaining.is_empty() {
        html.push_str("<dl>");
        for (key, value) in remaining {
            html.push_str(&format!(
                "<dt>{}</dt><dd>{}</dd>",
                escape(key),
                escape(&value_text(value))
            ));
        }
        html.push_str("</dl>");
    }

    html.push_str("</div>");
    html
}

fn is_consumed(key: &str) -> bool {
    TITLE_FIELDS
        .iter()
        .chain(ORG_FIELDS.iter())
        .chain(META_FIELDS.iter())
        .chain(BULLET_FIELDS.iter())
        .any(|field| *field == key)
}

fn first_truthy(entry: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| entry.get(*key).filter(|v| is_truthy(v)).map(value_text))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn link_item(label: Option<String>, url: Option<String>) -> Option<String> {
    match (label, url) {
        (None, None) => None,
        (Some(label), Some(url)) if is_safe_url(&url) => Some(anchor(&url, &label)),
        (None, Some(url)) if is_safe_url(&url) => Some(anchor(&url, &url)),
        (Some(label), Some(url)) => Some(escape(&format!("{label}: {url}"))),
        (None, Some(url)) => Some(escape(&url)),
        (Some(label), None) => Some(escape(&label)),
    }
}

fn anchor(href: &str, label: &str) -> String {
    format!("<a href=\"{}\">{}</a>", escape(href), escape(label))
}

fn is_safe_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    SAFE_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::models::resume::PageSize;

/// Content of one resume section, classified by shape.
///
/// Deserializes from any JSON value: strings become `Text`, objects `Table`,
/// non-empty arrays of objects `Entries`, every other array `List`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum SectionContent {
    Text(String),
    Table(Map<String, Value>),
    List(Vec<String>),
    Entries(Vec<Map<String, Value>>),
}

impl SectionContent {
    pub fn is_empty(&self) -> bool {
        match self {
            SectionContent::Text(text) => text.trim().is_empty(),
            SectionContent::Table(map) => map.is_empty(),
            SectionContent::List(items) => items.is_empty(),
            SectionContent::Entries(entries) => entries.is_empty(),
        }
    }
}

impl From<Value> for SectionContent {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => SectionContent::Text(String::new()),
            Value::String(s) => SectionContent::Text(s),
            Value::Object(map) => SectionContent::Table(map),
            Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
                SectionContent::Entries(
                    items
                        .into_iter()
                        .filter_map(|item| match item {
                            Value::Object(map) => Some(map),
                            _ => None,
                        })
                        .collect(),
                )
            }
            Value::Array(items) => SectionContent::List(items.iter().map(value_text).collect()),
            other => SectionContent::Text(other.to_string()),
        }
    }
}

impl From<&str> for SectionContent {
    fn from(text: &str) -> Self {
        SectionContent::Text(text.to_string())
    }
}

/// Plain text of a JSON value: strings as-is, everything else as JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A collection of profile links.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum Links {
    /// label → URL
    Map(Map<String, Value>),
    List(Vec<LinkItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkItem {
    Entry {
        label: Option<String>,
        url: Option<String>,
    },
    /// Used as both label and target.
    Bare(String),
}

impl From<Value> for Links {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Links::Map(map),
            Value::Array(items) => Links::List(items.into_iter().map(LinkItem::from).collect()),
            Value::Null => Links::List(Vec::new()),
            other => Links::List(vec![LinkItem::from(other)]),
        }
    }
}

impl From<Value> for LinkItem {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => LinkItem::Entry {
                label: ["label", "name"]
                    .iter()
                    .find_map(|key| non_empty_string(map.get(*key))),
                url: non_empty_string(map.get("url")),
            },
            other => LinkItem::Bare(value_text(&other)),
        }
    }
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Everything needed to render and store one resume.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResumeInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub page_size: PageSize,
    #[serde(default)]
    pub objective: Option<SectionContent>,
    #[serde(default)]
    pub technical_skills: Option<SectionContent>,
    #[serde(default)]
    pub experience: Option<SectionContent>,
    #[serde(default)]
    pub education: Option<SectionContent>,
    #[serde(default)]
    pub certification: Option<SectionContent>,
    #[serde(default)]
    pub courses: Option<SectionContent>,
    #[serde(default)]
    pub languages: Option<SectionContent>,
    #[serde(default)]
    pub links: Option<Links>,
    /// Rewrite `description` through the text-improvement API before rendering.
    #[serde(default)]
    pub improve_description: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_shapes() {
        assert_eq!(
            SectionContent::from(json!("hello")),
            SectionContent::Text("hello".to_string())
        );
        assert!(matches!(
            SectionContent::from(json!({"a": 1})),
            SectionContent::Table(_)
        ));
        assert!(matches!(
            SectionContent::from(json!([{"role": "x"}, {"role": "y"}])),
            SectionContent::Entries(ref e) if e.len() == 2
        ));
        assert_eq!(
            SectionContent::from(json!(["Rust", 3, {"a": 1}])),
            SectionContent::List(vec![
                "Rust".to_string(),
                "3".to_string(),
                "{\"a\":1}".to_string()
            ])
        );
        assert!(SectionContent::from(json!([])).is_empty());
        assert!(SectionContent::from(Value::Null).is_empty());
    }

    #[test]
    fn test_links_shapes() {
        let links = Links::from(json!([
            {"name": "GitHub", "url": "https://github.com/jane"},
            {"label": "Blog"},
            "https://jane.dev"
        ]));
        assert_eq!(
            links,
            Links::List(vec![
                LinkItem::Entry {
                    label: Some("GitHub".to_string()),
                    url: Some("https://github.com/jane".to_string())
                },
                LinkItem::Entry {
                    label: Some("Blog".to_string()),
                    url: None
                },
                LinkItem::Bare("https://jane.dev".to_string()),
            ])
        );
    }

    #[test]
    fn test_input_defaults() {
        let input: ResumeInput = serde_json::from_value(json!({
            "name": "Jane",
            "objective": null,
            "technical_skills": ["Rust", "Go"]
        }))
        .unwrap();

        assert_eq!(input.page_size, PageSize::A4);
        assert!(input.objective.is_none());
        assert!(!input.improve_description);
        assert_eq!(
            input.technical_skills,
            Some(SectionContent::List(vec!["Rust".into(), "Go".into()]))
        );
    }

    #[test]
    fn test_input_page_size_ignores_case() {
        let input: ResumeInput =
            serde_json::from_value(json!({"name": "Jane", "page_size": "LETTER"})).unwrap();
        assert_eq!(input.page_size, PageSize::Letter);

        assert!(serde_json::from_value::<ResumeInput>(json!({"name": "Jane", "page_size": "B5"}))
            .is_err());
    }
}

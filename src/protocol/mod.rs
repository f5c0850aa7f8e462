//! Protocol definitions
//!
//! A protocol is the schema + permission graph installed on a storage node.
//! `types` declares what each record type looks like; `structure` nests the
//! types and attaches `$actions` access rules to every level. The nesting of
//! `structure` is exactly the parent chain records must follow.

mod registrar;
mod rules;

pub use registrar::{AnnouncedProtocol, InstalledProtocol, ProtocolRegistrar};
pub use rules::Ancestor;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DUDEMY_PROTOCOL: &str = "https://example.com/dudemy";
pub const COURSE_SCHEMA: &str = "https://example.com/dudemy/schema1";
pub const CONTENT_SCHEMA: &str = "https://example.com/dudemy/schema2";
pub const VIDEO_SCHEMA: &str = "https://example.com/dudemy/schema3";

pub const COURSE_PATH: &str = "course";
pub const CONTENT_PATH: &str = "course/content";
pub const VIDEO_PATH: &str = "course/content/video";
pub const COMMENTS_PATH: &str = "course/comments";

pub const JSON_FORMAT: &str = "application/json";
pub const VIDEO_FORMAT: &str = "video/mp4";

/// Who an access rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Who {
    Anyone,
    Author,
}

/// What an access rule allows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Write,
}

/// One `$actions` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRule {
    pub who: Who,
    pub can: Action,
    /// Ancestor protocol path whose author the rule refers to (`who: author`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub of: Option<String>,
}

impl ActionRule {
    pub fn anyone(can: Action) -> Self {
        Self { who: Who::Anyone, can, of: None }
    }

    pub fn author_of(path: &str, can: Action) -> Self {
        Self {
            who: Who::Author,
            can,
            of: Some(path.to_string()),
        }
    }
}

/// Declared record type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(rename = "dataFormats")]
    pub data_formats: Vec<String>,
}

impl ProtocolType {
    pub fn accepts(&self, data_format: &str) -> bool {
        self.data_formats.iter().any(|f| f == data_format)
    }
}

/// A level of the structure tree: its rules plus nested child types
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(rename = "$actions", default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionRule>,
    #[serde(flatten)]
    pub children: BTreeMap<String, RuleSet>,
}

impl RuleSet {
    pub fn new(actions: Vec<ActionRule>) -> Self {
        Self {
            actions,
            children: BTreeMap::new(),
        }
    }

    pub fn child(mut self, name: &str, rules: RuleSet) -> Self {
        self.children.insert(name.to_string(), rules);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolDefinition {
    pub protocol: String,
    pub published: bool,
    pub types: BTreeMap<String, ProtocolType>,
    pub structure: BTreeMap<String, RuleSet>,
}

impl ProtocolDefinition {
    /// Rules at a protocol path such as `course/content/video`
    pub fn rule_set(&self, path: &str) -> Option<&RuleSet> {
        let mut segments = path.split('/');
        let mut current = self.structure.get(segments.next()?)?;
        for segment in segments {
            current = current.children.get(segment)?;
        }
        Some(current)
    }

    /// Type declaration for the last segment of a protocol path
    pub fn type_at(&self, path: &str) -> Option<&ProtocolType> {
        self.rule_set(path)?;
        let name = path.rsplit('/').next()?;
        self.types.get(name)
    }

    /// Every protocol path in the structure tree, parents before children
    pub fn paths(&self) -> Vec<String> {
        fn walk(prefix: &str, level: &BTreeMap<String, RuleSet>, out: &mut Vec<String>) {
            for (name, rules) in level {
                let path = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{}/{}", prefix, name)
                };
                out.push(path.clone());
                walk(&path, &rules.children, out);
            }
        }
        let mut out = Vec::new();
        walk("", &self.structure, &mut out);
        out
    }

    /// Check internal consistency before installing
    pub fn validate(&self) -> Result<(), String> {
        if self.protocol.is_empty() {
            return Err("protocol URI is empty".to_string());
        }
        for path in self.paths() {
            let name = path.rsplit('/').next().unwrap_or_default();
            let Some(declared) = self.types.get(name) else {
                return Err(format!("structure path '{}' uses undeclared type '{}'", path, name));
            };
            if declared.data_formats.is_empty() {
                return Err(format!("type '{}' accepts no data formats", name));
            }
            let rules = self.rule_set(&path).map(|r| r.actions.as_slice()).unwrap_or_default();
            for rule in rules {
                match (&rule.who, &rule.of) {
                    (Who::Author, None) => {
                        return Err(format!("author rule at '{}' is missing 'of'", path));
                    }
                    (Who::Author, Some(of)) if !is_ancestor_path(of, &path) => {
                        return Err(format!("'{}' is not an ancestor of '{}'", of, path));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

/// `of` may name the path itself or any proper prefix of it
fn is_ancestor_path(of: &str, path: &str) -> bool {
    path == of || path.starts_with(&format!("{}/", of))
}

/// Parent protocol path (`course/content` for `course/content/video`)
pub fn parent_path(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}

/// The course hierarchy protocol: course → content → video, course → comments
pub fn dudemy_protocol() -> ProtocolDefinition {
    let json_type = |schema: Option<&str>| ProtocolType {
        schema: schema.map(str::to_string),
        data_formats: vec![JSON_FORMAT.to_string()],
    };

    let mut types = BTreeMap::new();
    types.insert("course".to_string(), json_type(Some(COURSE_SCHEMA)));
    types.insert("content".to_string(), json_type(Some(CONTENT_SCHEMA)));
    types.insert(
        "video".to_string(),
        ProtocolType {
            schema: Some(VIDEO_SCHEMA.to_string()),
            data_formats: vec![VIDEO_FORMAT.to_string()],
        },
    );
    types.insert("comments".to_string(), json_type(None));

    let video = RuleSet::new(vec![
        ActionRule::author_of(CONTENT_PATH, Action::Write),
        ActionRule::anyone(Action::Read),
    ]);
    let content = RuleSet::new(vec![
        ActionRule::anyone(Action::Read),
        ActionRule::author_of(COURSE_PATH, Action::Write),
    ])
    .child("video", video);
    let comments = RuleSet::new(vec![
        ActionRule::anyone(Action::Write),
        ActionRule::anyone(Action::Read),
    ]);
    let course = RuleSet::new(vec![
        ActionRule::anyone(Action::Read),
        ActionRule::anyone(Action::Write),
    ])
    .child("content", content)
    .child("comments", comments);

    let mut structure = BTreeMap::new();
    structure.insert("course".to_string(), course);

    ProtocolDefinition {
        protocol: DUDEMY_PROTOCOL.to_string(),
        published: true,
        types,
        structure,
    }
}

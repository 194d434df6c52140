//! Catalog entities and the values the resolution engine produces.

use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A catalog entry as served by the catalog provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Module {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    /// Developer handle, shown by presentation only.
    #[serde(default)]
    pub developer: Option<String>,
    #[serde(default, deserialize_with = "deserialize_commands")]
    pub commands: Vec<Command>,
}

impl Module {
    pub fn new(id: i64, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            developer: None,
            commands: Vec::new(),
        }
    }

    pub fn with_command(mut self, command: impl Into<String>, description: impl Into<String>) -> Self {
        self.commands.push(Command {
            command: command.into(),
            description: description.into(),
        });
        self
    }

    pub fn with_developer(mut self, developer: impl Into<String>) -> Self {
        self.developer = Some(developer.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Command {
    pub command: String,
    #[serde(default)]
    pub description: String,
}

/// Commands arrive either as `{"command": .., "description": ..}` objects or
/// as the catalog service's `{"<command>": "<description>"}` maps. Only an
/// object with exactly those two keys is read as a pair; any other object is
/// a map whose entries keep their listed order.
fn deserialize_commands<'de, D>(deserializer: D) -> Result<Vec<Command>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Map<String, Value>>> = Option::deserialize(deserializer)?;
    let mut commands = Vec::new();
    for entry in raw.unwrap_or_default() {
        if is_pair(&entry) {
            let command = text_or_empty(field(&entry, "command")).map_err(D::Error::custom)?;
            let description =
                text_or_empty(field(&entry, "description")).map_err(D::Error::custom)?;
            commands.push(Command {
                command,
                description,
            });
            continue;
        }
        for (command, description) in entry {
            commands.push(Command {
                description: text_or_empty(&description).map_err(D::Error::custom)?,
                command,
            });
        }
    }
    Ok(commands)
}

fn is_pair(entry: &Map<String, Value>) -> bool {
    entry.len() == 2
        && entry.get("command").is_some_and(Value::is_string)
        && entry.contains_key("description")
}

fn field<'a>(entry: &'a Map<String, Value>, key: &str) -> &'a Value {
    entry.get(key).unwrap_or(&Value::Null)
}

fn text_or_empty(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        other => Err(format!("expected a string or null, found {other}")),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Which module field a document or observation came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FieldTag {
    Name,
    Description,
    CommandName,
    CommandDescription,
}

impl FieldTag {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldTag::Name => "name",
            FieldTag::Description => "description",
            FieldTag::CommandName => "command_name",
            FieldTag::CommandDescription => "command_description",
        }
    }

    /// Short provenance label ("found by: ...").
    pub fn label(self) -> &'static str {
        match self {
            FieldTag::Name => "name",
            FieldTag::Description => "description",
            FieldTag::CommandName | FieldTag::CommandDescription => "command",
        }
    }
}

impl fmt::Display for FieldTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(FieldTag::Name),
            "description" => Ok(FieldTag::Description),
            "command_name" => Ok(FieldTag::CommandName),
            "command_description" => Ok(FieldTag::CommandDescription),
            other => Err(format!("unknown field tag: {other}")),
        }
    }
}

/// One searchable text field extracted from a module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub owner_id: i64,
    pub sequence_no: u64,
    pub field_tag: FieldTag,
    pub content: String,
}

/// Similarity of the query against one field of one module.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct MatchObservation {
    pub module_id: i64,
    /// Normalized similarity in `[0, 1]`.
    pub score: f64,
    pub field_tag: FieldTag,
}

/// Which staged-matcher stage produced a hit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    Boolean,
    Fuzzy,
    Substring,
    /// Scored-similarity matcher; not a fallback stage.
    Similarity,
}

impl MatchStage {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStage::Boolean => "boolean",
            MatchStage::Fuzzy => "fuzzy",
            MatchStage::Substring => "substring",
            MatchStage::Similarity => "similarity",
        }
    }
}

impl fmt::Display for MatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful resolution: the winning module plus its provenance.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ModuleMatch {
    pub module_id: i64,
    pub matched_field: Option<FieldTag>,
    pub stage: MatchStage,
    pub score: f32,
}

/// The engine's verdict for one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Found(ModuleMatch),
    /// The catalog was searched and nothing matched.
    NotFound,
}

impl Resolution {
    pub fn module_id(&self) -> Option<i64> {
        match self {
            Resolution::Found(m) => Some(m.module_id),
            Resolution::NotFound => None,
        }
    }

    pub fn matched_field(&self) -> Option<FieldTag> {
        match self {
            Resolution::Found(m) => m.matched_field,
            Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_catalog_map_commands_and_null_descriptions() {
        let json = r#"{
            "id": 7,
            "name": "weather",
            "description": null,
            "developer": "someone",
            "commands": [{"wget": "get weather"}, {"wclear": null}]
        }"#;
        let module: Module = serde_json::from_str(json).unwrap();
        assert_eq!(module.description, "");
        assert_eq!(module.developer.as_deref(), Some("someone"));
        assert_eq!(
            module.commands,
            vec![
                Command {
                    command: "wget".into(),
                    description: "get weather".into()
                },
                Command {
                    command: "wclear".into(),
                    description: String::new()
                },
            ]
        );
    }

    #[test]
    fn decodes_pair_commands_and_missing_fields() {
        let json = r#"{
            "id": 1,
            "name": "notes",
            "commands": [{"command": "note", "description": "save a note"}]
        }"#;
        let module: Module = serde_json::from_str(json).unwrap();
        assert_eq!(module.description, "");
        assert!(module.developer.is_none());
        assert_eq!(module.commands[0].command, "note");
        assert_eq!(module.commands[0].description, "save a note");

        let bare: Module = serde_json::from_str(r#"{"id": 2, "name": "x", "commands": null}"#).unwrap();
        assert!(bare.commands.is_empty());
    }

    #[test]
    fn map_commands_keep_listed_order() {
        let json = r#"{
            "id": 3,
            "name": "runner",
            "commands": [{"command": "runs things"}, {"zeta": "z", "alpha": "a"}]
        }"#;
        let module: Module = serde_json::from_str(json).unwrap();
        let listed: Vec<(&str, &str)> = module
            .commands
            .iter()
            .map(|c| (c.command.as_str(), c.description.as_str()))
            .collect();
        assert_eq!(
            listed,
            vec![("command", "runs things"), ("zeta", "z"), ("alpha", "a")]
        );
    }

    #[test]
    fn non_string_command_description_is_rejected() {
        let json = r#"{"id": 4, "name": "x", "commands": [{"go": 5}]}"#;
        assert!(serde_json::from_str::<Module>(json).is_err());
    }

    #[test]
    fn field_tag_round_trips_through_str() {
        for tag in [
            FieldTag::Name,
            FieldTag::Description,
            FieldTag::CommandName,
            FieldTag::CommandDescription,
        ] {
            assert_eq!(tag.as_str().parse::<FieldTag>().unwrap(), tag);
        }
        assert!("title".parse::<FieldTag>().is_err());
        assert_eq!(FieldTag::CommandDescription.label(), "command");
    }

    #[test]
    fn not_found_has_no_module_id() {
        assert_eq!(Resolution::NotFound.module_id(), None);
        assert!(!Resolution::NotFound.is_found());
    }
}

use serde::{Deserialize, Serialize};

const OPTION_STRING: u8 = 3;

pub const SPORTS: [&str; 5] = ["NFL", "NBA", "MLB", "PGA", "CFL"];

/// `(label, value)` pairs shown in the category picker.
pub const CATEGORY_CHOICES: [(&str, &str); 5] = [
    ("All", "All"),
    ("Awards", "Awards"),
    ("Futures", "Team Futures"),
    ("Leaders", "Stat Leaders"),
    ("Props", "Props"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandDef {
    pub name: String,
    pub description: String,
    pub options: Vec<OptionDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub description: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice {
    pub name: String,
    pub value: String,
}

/// Registered command as returned by the list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredCommand {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandScope {
    Global,
    Guild(String),
}

impl CommandScope {
    pub fn label(&self) -> &'static str {
        match self {
            CommandScope::Global => "global",
            CommandScope::Guild(_) => "guild",
        }
    }
}

fn string_option(name: &str, description: &str, required: bool, choices: Vec<Choice>) -> OptionDef {
    OptionDef {
        name: name.into(),
        kind: OPTION_STRING,
        description: description.into(),
        required,
        choices,
    }
}

pub fn futures_command() -> CommandDef {
    let sports = SPORTS
        .iter()
        .map(|s| Choice { name: s.to_string(), value: s.to_string() })
        .collect();
    let categories = CATEGORY_CHOICES
        .iter()
        .map(|(label, value)| Choice { name: label.to_string(), value: value.to_string() })
        .collect();

    CommandDef {
        name: "futures".into(),
        description: "Get a screenshot of futures odds".into(),
        options: vec![
            string_option("sport", "Choose a sport", true, sports),
            string_option("category", "Optional: Choose category", false, categories),
            string_option("market", "Optional: Market filter", false, Vec::new()),
        ],
    }
}

/// Everything the bot should have registered.
pub fn desired_commands() -> Vec<CommandDef> {
    vec![futures_command()]
}

/// Registered commands with no local definition.
pub fn stale_commands<'a>(existing: &'a [RegisteredCommand], desired: &[CommandDef]) -> Vec<&'a RegisteredCommand> {
    existing
        .iter()
        .filter(|c| !desired.iter().any(|d| d.name == c.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn futures_definition_wire_shape() {
        let v = serde_json::to_value(futures_command()).unwrap();
        assert_eq!(v["name"], "futures");
        assert_eq!(v["options"][0]["name"], "sport");
        assert_eq!(v["options"][0]["required"], true);
        assert_eq!(v["options"][0]["choices"].as_array().unwrap().len(), 5);
        assert_eq!(v["options"][1]["choices"][2], json!({"name": "Futures", "value": "Team Futures"}));
        assert!(v["options"][2].get("choices").is_none());
        assert_eq!(v["options"][2]["type"], 3);
    }

    #[test]
    fn stale_commands_are_those_not_desired() {
        let existing = vec![
            RegisteredCommand { id: "1".into(), name: "futures".into() },
            RegisteredCommand { id: "2".into(), name: "bzero".into() },
        ];
        let stale = stale_commands(&existing, &desired_commands());
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, "2");
    }
}

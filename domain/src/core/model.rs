//! Model value object representing the remote chat model

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Chat models reachable through the completions API (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Model {
    #[default]
    Gpt4,
    Gpt4o,
    Gpt4oMini,
    Gpt41,
    Gpt35Turbo,
    // Any other identifier the endpoint accepts
    Custom(String),
}

impl Model {
    /// Get the wire identifier for this model
    pub fn as_str(&self) -> &str {
        match self {
            Model::Gpt4 => "gpt-4",
            Model::Gpt4o => "gpt-4o",
            Model::Gpt4oMini => "gpt-4o-mini",
            Model::Gpt41 => "gpt-4.1",
            Model::Gpt35Turbo => "gpt-3.5-turbo",
            Model::Custom(s) => s,
        }
    }

    /// Models offered by `/model` without typing a custom name
    pub fn known_models() -> Vec<Model> {
        vec![
            Model::Gpt4,
            Model::Gpt4o,
            Model::Gpt4oMini,
            Model::Gpt41,
            Model::Gpt35Turbo,
        ]
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "gpt-4" => Model::Gpt4,
            "gpt-4o" => Model::Gpt4o,
            "gpt-4o-mini" => Model::Gpt4oMini,
            "gpt-4.1" => Model::Gpt41,
            "gpt-3.5-turbo" => Model::Gpt35Turbo,
            other => Model::Custom(other.to_string()),
        })
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let Ok(model) = s.parse();
        Ok(model)
    }
}

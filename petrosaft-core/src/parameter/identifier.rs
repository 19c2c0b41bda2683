use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Possible variants to identify a component.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierOption {
    Name,
    Cas,
    Formula,
}

/// Identification of a real substance or a pseudo-component.
///
/// Pseudo-components (e.g. a lumped C10-C12 cut) usually only carry a name.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Identifier {
    /// Name of the substance or the pseudo-component
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// CAS number
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cas: Option<String>,
    /// Chemical formula or carbon number range
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

impl Identifier {
    pub fn new(name: Option<&str>, cas: Option<&str>, formula: Option<&str>) -> Self {
        Self {
            name: name.map(Into::into),
            cas: cas.map(Into::into),
            formula: formula.map(Into::into),
        }
    }

    /// Identifier that only consists of a name.
    pub fn from_name(name: &str) -> Self {
        Self::new(Some(name), None, None)
    }

    pub fn as_string(&self, option: IdentifierOption) -> Option<String> {
        match option {
            IdentifierOption::Name => self.name.clone(),
            IdentifierOption::Cas => self.cas.clone(),
            IdentifierOption::Formula => self.formula.clone(),
        }
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<_> = [
            ("name", &self.name),
            ("cas", &self.cas),
            ("formula", &self.formula),
        ]
        .into_iter()
        .filter_map(|(key, id)| id.as_ref().map(|id| format!("{key}={id}")))
        .collect();
        write!(f, "Identifier({})", ids.join(", "))
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.cas == other.cas
    }
}
impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.cas.hash(state);
    }
}

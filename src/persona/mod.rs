//! Personas and their canned response tables.
//!
//! A persona is a fixed, named response profile: five canned strings, one
//! per emotional category. Personas are static and read-only once the
//! store is built; the engine only ever looks replies up, never mutates.
//!
//! # Built-in Personas
//!
//! | Id | Name | Title |
//! |--------|--------|---------------------------------|
//! | sarah | Sarah | The Empathetic Listener |
//! | marcus | Marcus | The Motivational Coach |
//! | luna | Luna | The Mindfulness Guide |
//! | alex | Alex | The Practical Problem Solver |

mod builtin;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use rand::seq::IteratorRandom;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The five fixed response categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseCategory {
    /// Opening message when a session starts.
    Greeting,
    /// Input mentioning anxiety or worry.
    Anxious,
    /// Input mentioning sadness.
    Sad,
    /// Input mentioning stress or overload.
    Stressed,
    /// Anything that matched no keyword set.
    Default,
}

impl ResponseCategory {
    /// All categories, in selector precedence order.
    pub const ALL: [Self; 5] = [
        Self::Greeting,
        Self::Anxious,
        Self::Sad,
        Self::Stressed,
        Self::Default,
    ];
}

impl fmt::Display for ResponseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Greeting => write!(f, "greeting"),
            Self::Anxious => write!(f, "anxious"),
            Self::Sad => write!(f, "sad"),
            Self::Stressed => write!(f, "stressed"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Personality flavor of a persona.
///
/// Drives presentation concerns such as the chat theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    /// Warm, feelings-first.
    Empathetic,
    /// Energetic, action-first.
    Motivational,
    /// Calm, present-moment.
    Mindful,
    /// Structured, solution-first.
    Practical,
}

/// Canned responses, one per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseTable {
    /// Opening message.
    pub greeting: String,
    /// Reply for anxious input.
    pub anxious: String,
    /// Reply for sad input.
    pub sad: String,
    /// Reply for stressed input.
    pub stressed: String,
    /// Reply when nothing matched.
    pub default: String,
}

impl ResponseTable {
    /// Look up the response for a category.
    #[must_use]
    pub fn get(&self, category: ResponseCategory) -> &str {
        match category {
            ResponseCategory::Greeting => &self.greeting,
            ResponseCategory::Anxious => &self.anxious,
            ResponseCategory::Sad => &self.sad,
            ResponseCategory::Stressed => &self.stressed,
            ResponseCategory::Default => &self.default,
        }
    }
}

/// A fixed, named response profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Unique identifier (lookup key).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Descriptive title.
    pub title: String,
    /// Personality flavor.
    pub personality: Personality,
    /// Canned responses.
    pub responses: ResponseTable,
}

impl Persona {
    /// Validate the persona's data.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPersona`] if the id, name, title, or
    /// any of the five responses is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidPersona {
            persona_id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.is_empty() {
            return Err(invalid("empty id"));
        }
        if self.name.is_empty() {
            return Err(invalid("empty name"));
        }
        if self.title.is_empty() {
            return Err(invalid("empty title"));
        }
        for category in ResponseCategory::ALL {
            if self.responses.get(category).is_empty() {
                return Err(invalid(&format!("missing {category} response")));
            }
        }
        Ok(())
    }
}

/// Read-only persona lookup, id → [`Persona`].
///
/// Every persona is validated when the store is built, so lookups always
/// return well-formed data.
///
/// # Example
///
/// ```
/// use companion_chat::persona::PersonaStore;
///
/// let store = PersonaStore::builtin().expect("builtin personas are valid");
/// let sarah = store.get("sarah").expect("sarah exists");
/// assert_eq!(sarah.title, "The Empathetic Listener");
/// ```
#[derive(Debug, Clone)]
pub struct PersonaStore {
    personas: HashMap<String, Persona>,
}

impl PersonaStore {
    /// Build the store of built-in personas.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPersona`] if a built-in persona
    /// fails validation.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_personas(builtin::builtin_personas())
    }

    /// Build a store from a list of personas.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPersona`] if any persona fails
    /// validation or two personas share an id.
    pub fn from_personas(personas: Vec<Persona>) -> Result<Self, ConfigError> {
        let mut map = HashMap::with_capacity(personas.len());
        for persona in personas {
            persona.validate()?;
            if map.contains_key(&persona.id) {
                return Err(ConfigError::InvalidPersona {
                    persona_id: persona.id,
                    reason: "duplicate id".to_string(),
                });
            }
            map.insert(persona.id.clone(), persona);
        }
        Ok(Self { personas: map })
    }

    /// Load a persona pack from a JSON file holding an array of personas.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::PersonaPack`] if the file cannot be read or
    /// parsed, and [`ConfigError::InvalidPersona`] if a parsed persona
    /// fails validation.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let pack_error = |reason: String| ConfigError::PersonaPack {
            path: path.display().to_string(),
            reason,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| pack_error(e.to_string()))?;
        let personas: Vec<Persona> =
            serde_json::from_str(&raw).map_err(|e| pack_error(e.to_string()))?;
        Self::from_personas(personas)
    }

    /// Look up a persona by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.personas.get(id)
    }

    /// Pick a persona uniformly at random.
    ///
    /// Returns `None` only for an empty store.
    #[must_use]
    pub fn random(&self) -> Option<&Persona> {
        self.personas.values().choose(&mut rand::thread_rng())
    }

    /// Sorted persona ids.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.personas.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of personas in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.personas.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}

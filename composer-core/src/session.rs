//! The session model: every character the user has created plus display
//! configuration.

use serde::{Deserialize, Serialize};

use crate::character::{Character, CharacterKind, CompoundCharacter, GlyphBox, SimpleCharacter};
use crate::config::DisplayConfig;
use crate::error::{ComposerError, ComposerResult};

/// Default language preference tag.
pub const DEFAULT_LANGUAGE: &str = "en";

/// All characters of a session, in creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionModel {
    /// Characters in creation order.
    characters: Vec<Character>,
    /// Display configuration.
    #[serde(default)]
    pub display: DisplayConfig,
    /// Language preference tag, opaque to the core.
    #[serde(default = "SessionModel::default_language")]
    pub language: String,
}

impl SessionModel {
    /// Create an empty session model.
    #[must_use]
    pub fn new(display: DisplayConfig) -> Self {
        Self {
            characters: Vec::new(),
            display,
            language: Self::default_language(),
        }
    }

    fn default_language() -> String {
        DEFAULT_LANGUAGE.to_string()
    }

    /// All characters in order.
    #[must_use]
    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    /// Number of characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    /// Check if the model has no characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Find a character by identity.
    #[must_use]
    pub fn get(&self, identity: char) -> Option<&Character> {
        self.characters.iter().find(|c| c.identity() == identity)
    }

    /// Characters of one variant, in model order.
    ///
    /// The iterator is lazy and can be cloned to restart it.
    pub fn characters_of_kind(
        &self,
        kind: CharacterKind,
    ) -> impl Iterator<Item = &Character> + Clone + '_ {
        self.characters.iter().filter(move |c| c.is_kind(kind))
    }

    /// Find the simple character with this identity.
    ///
    /// Unlike [`SessionModel::get`] this skips a compound that shares the
    /// identity.
    #[must_use]
    pub fn get_simple(&self, identity: char) -> Option<&SimpleCharacter> {
        self.characters.iter().find_map(|c| match c {
            Character::Simple(simple) if simple.identity == identity => Some(simple),
            _ => None,
        })
    }

    fn has_simple(&self, identity: char) -> bool {
        self.get_simple(identity).is_some()
    }

    /// Append a default-boxed simple character for every identity not
    /// already present as one.
    ///
    /// Returns the identities that were appended, in input order.
    pub fn add_simple_characters<I>(&mut self, identities: I) -> Vec<char>
    where
        I: IntoIterator<Item = char>,
    {
        let mut added = Vec::new();
        for identity in identities {
            if self.has_simple(identity) {
                continue;
            }
            self.characters
                .push(SimpleCharacter::with_default_box(identity, &self.display).into());
            added.push(identity);
        }
        if !added.is_empty() {
            tracing::info!("Added {} simple characters", added.len());
        }
        added
    }

    /// Compose a compound character from existing characters.
    ///
    /// Components are copied out of the model by value. Composing an
    /// identity that is already a compound replaces it in place.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::InvalidOperation`] if there are no components
    /// or the identity belongs to a simple character, and
    /// [`ComposerError::UnknownCharacter`] if a component does not exist.
    pub fn compose(&mut self, identity: char, components: &[char]) -> ComposerResult<&Character> {
        if components.is_empty() {
            return Err(ComposerError::InvalidOperation(format!(
                "compound character {identity} needs at least one component"
            )));
        }
        if self.has_simple(identity) {
            return Err(ComposerError::InvalidOperation(format!(
                "{identity} is a simple character"
            )));
        }

        let components = components
            .iter()
            .map(|&component| {
                self.get(component)
                    .cloned()
                    .ok_or(ComposerError::UnknownCharacter(component))
            })
            .collect::<ComposerResult<Vec<_>>>()?;
        let compound = Character::from(CompoundCharacter {
            identity,
            components,
        });

        let index = if let Some(index) = self.position(identity) {
            self.characters[index] = compound;
            index
        } else {
            self.characters.push(compound);
            self.characters.len() - 1
        };
        tracing::info!("Composed {identity}");
        Ok(&self.characters[index])
    }

    /// Move and resize a simple character.
    ///
    /// Compounds that already copied this character keep their copy.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::UnknownCharacter`] if no simple character has
    /// this identity.
    pub fn update_simple_box(&mut self, identity: char, placement: GlyphBox) -> ComposerResult<()> {
        let simple = self
            .characters
            .iter_mut()
            .find_map(|c| match c {
                Character::Simple(simple) if simple.identity == identity => Some(simple),
                _ => None,
            })
            .ok_or(ComposerError::UnknownCharacter(identity))?;
        simple.place(placement);
        Ok(())
    }

    /// Remove the character with this identity.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::UnknownCharacter`] if it does not exist.
    pub fn remove_character(&mut self, identity: char) -> ComposerResult<Character> {
        let index = self
            .position(identity)
            .ok_or(ComposerError::UnknownCharacter(identity))?;
        Ok(self.characters.remove(index))
    }

    /// Remove the simple character with this identity, leaving a compound
    /// of the same identity in place.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::UnknownCharacter`] if no simple character has
    /// this identity.
    pub fn remove_simple(&mut self, identity: char) -> ComposerResult<SimpleCharacter> {
        let (index, simple) = self
            .characters
            .iter()
            .enumerate()
            .find_map(|(index, c)| match c {
                Character::Simple(simple) if simple.identity == identity => Some((index, *simple)),
                _ => None,
            })
            .ok_or(ComposerError::UnknownCharacter(identity))?;
        self.characters.remove(index);
        Ok(simple)
    }

    fn position(&self, identity: char) -> Option<usize> {
        self.characters.iter().position(|c| c.identity() == identity)
    }

    /// Serialize the model to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> ComposerResult<String> {
        serde_json::to_string(self).map_err(ComposerError::Decode)
    }

    /// Deserialize a model from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::Decode`] if the JSON does not describe a model.
    pub fn from_json(json: &str) -> ComposerResult<Self> {
        serde_json::from_str(json).map_err(ComposerError::Decode)
    }
}

impl Default for SessionModel {
    fn default() -> Self {
        Self::new(DisplayConfig::default())
    }
}

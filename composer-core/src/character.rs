//! Characters - the building blocks of a session.
//!
//! A [`Character`] is either a simple leaf glyph backed by one artwork asset,
//! or a compound built from other characters. Components are stored by value,
//! so a composition is a tree and never a graph.
//!
//! ## Persisted form
//!
//! A compound is written with its whole subtree as one flat pre-order node
//! list; every compound node carries its component count:
//!
//! ```text
//! {"type": "compound", "char": "森", "components": 2, "nodes": [
//!     {"type": "simple", "char": "木", ...},
//!     {"type": "compound", "char": "林", "components": 2},
//!     {"type": "simple", "char": "木", ...},
//!     {"type": "simple", "char": "木", ...}
//! ]}
//! ```
//!
//! The JSON nesting depth stays constant however deep the composition is.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::asset::{Artwork, AssetStore};
use crate::config::DisplayConfig;
use crate::error::{ComposerError, ComposerResult};

/// Which variant of [`Character`] to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterKind {
    /// Leaf glyphs backed by artwork.
    Simple,
    /// Characters composed from other characters.
    Compound,
}

/// A leaf glyph placed in the abstract character grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleCharacter {
    /// Identity code point; also the asset store key.
    #[serde(rename = "char")]
    pub identity: char,
    /// Box width.
    pub width: i32,
    /// Box height.
    pub height: i32,
    /// Left offset.
    pub x: i32,
    /// Top offset.
    pub y: i32,
}

impl SimpleCharacter {
    /// Create a simple character with the default box for `config`.
    #[must_use]
    pub const fn with_default_box(identity: char, config: &DisplayConfig) -> Self {
        let size = config.inner_size();
        Self {
            identity,
            width: size,
            height: size,
            x: config.border_size,
            y: config.border_size,
        }
    }

    /// The placement box of this glyph.
    #[must_use]
    pub const fn glyph_box(&self) -> GlyphBox {
        GlyphBox {
            identity: self.identity,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    /// Move and resize this glyph to `placement`, keeping its identity.
    pub fn place(&mut self, placement: GlyphBox) {
        self.x = placement.x;
        self.y = placement.y;
        self.width = placement.width;
        self.height = placement.height;
    }
}

/// A character composed from an ordered list of other characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundCharacter {
    /// Identity code point.
    #[serde(rename = "char")]
    pub identity: char,
    /// Components, copied by value at composition time.
    pub components: Vec<Character>,
}

/// A simple or compound character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Character {
    /// A leaf glyph.
    Simple(SimpleCharacter),
    /// A composition of other characters.
    Compound(CompoundCharacter),
}

impl Character {
    /// Identity code point, regardless of variant.
    #[must_use]
    pub const fn identity(&self) -> char {
        match self {
            Self::Simple(simple) => simple.identity,
            Self::Compound(compound) => compound.identity,
        }
    }

    /// The variant of this character.
    #[must_use]
    pub const fn kind(&self) -> CharacterKind {
        match self {
            Self::Simple(_) => CharacterKind::Simple,
            Self::Compound(_) => CharacterKind::Compound,
        }
    }

    /// Check whether this character is of the given variant.
    #[must_use]
    pub fn is_kind(&self, kind: CharacterKind) -> bool {
        self.kind() == kind
    }

    /// Iterate over every simple leaf reachable from this character,
    /// depth first, in component order.
    #[must_use]
    pub fn simple_leaves(&self) -> SimpleLeaves<'_> {
        SimpleLeaves {
            pending: vec![self],
        }
    }

    /// Flatten this character into its positioned leaf boxes.
    ///
    /// Compound boxes are concatenated in component order; placing them
    /// relative to each other is left to the renderer.
    #[must_use]
    pub fn render_geometry(&self) -> Geometry {
        Geometry {
            identity: self.identity(),
            boxes: self.simple_leaves().map(SimpleCharacter::glyph_box).collect(),
        }
    }
}

impl From<SimpleCharacter> for Character {
    fn from(simple: SimpleCharacter) -> Self {
        Self::Simple(simple)
    }
}

impl From<CompoundCharacter> for Character {
    fn from(compound: CompoundCharacter) -> Self {
        Self::Compound(compound)
    }
}

impl Serialize for Character {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        CharacterRecord::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Character {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = CharacterRecord::deserialize(deserializer)?;
        Self::try_from(record).map_err(D::Error::custom)
    }
}

/// Persisted form of a [`Character`].
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum CharacterRecord {
    Simple(SimpleCharacter),
    Compound {
        #[serde(rename = "char")]
        identity: char,
        components: usize,
        #[serde(default)]
        nodes: Vec<NodeRecord>,
    },
}

/// One node of a flattened compound subtree, in pre-order.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum NodeRecord {
    Simple(SimpleCharacter),
    Compound {
        #[serde(rename = "char")]
        identity: char,
        components: usize,
    },
}

impl From<&Character> for CharacterRecord {
    fn from(character: &Character) -> Self {
        let compound = match character {
            Character::Simple(simple) => return Self::Simple(*simple),
            Character::Compound(compound) => compound,
        };

        let mut nodes = Vec::new();
        let mut pending: Vec<&Character> = compound.components.iter().rev().collect();
        while let Some(node) = pending.pop() {
            match node {
                Character::Simple(simple) => nodes.push(NodeRecord::Simple(*simple)),
                Character::Compound(inner) => {
                    nodes.push(NodeRecord::Compound {
                        identity: inner.identity,
                        components: inner.components.len(),
                    });
                    pending.extend(inner.components.iter().rev());
                }
            }
        }
        Self::Compound {
            identity: compound.identity,
            components: compound.components.len(),
            nodes,
        }
    }
}

/// A compound being rebuilt from its node list.
struct Frame {
    identity: char,
    arity: usize,
    components: Vec<Character>,
}

impl Frame {
    fn new(identity: char, arity: usize) -> Self {
        Self {
            identity,
            arity,
            components: Vec::new(),
        }
    }

    fn is_complete(&self) -> bool {
        self.components.len() == self.arity
    }

    fn finish(self) -> Character {
        Character::Compound(CompoundCharacter {
            identity: self.identity,
            components: self.components,
        })
    }
}

impl TryFrom<CharacterRecord> for Character {
    type Error = String;

    fn try_from(record: CharacterRecord) -> Result<Self, Self::Error> {
        let (root, arity, nodes) = match record {
            CharacterRecord::Simple(simple) => return Ok(Self::Simple(simple)),
            CharacterRecord::Compound {
                identity,
                components,
                nodes,
            } => (identity, components, nodes),
        };

        let mut nodes = nodes.into_iter();
        let mut parents: Vec<Frame> = Vec::new();
        let mut current = Frame::new(root, arity);
        loop {
            if current.is_complete() {
                let finished = current.finish();
                let Some(mut parent) = parents.pop() else {
                    if nodes.next().is_some() {
                        return Err(format!("compound {root} has more nodes than components"));
                    }
                    return Ok(finished);
                };
                parent.components.push(finished);
                current = parent;
                continue;
            }
            match nodes.next() {
                Some(NodeRecord::Simple(simple)) => current.components.push(Self::Simple(simple)),
                Some(NodeRecord::Compound {
                    identity,
                    components,
                }) => parents.push(std::mem::replace(
                    &mut current,
                    Frame::new(identity, components),
                )),
                None => {
                    return Err(format!(
                        "compound {} is missing components",
                        current.identity
                    ))
                }
            }
        }
    }
}

/// Polymorphic identity accessor.
#[must_use]
pub const fn identity_of(character: &Character) -> char {
    character.identity()
}

/// Depth-first iterator over the simple leaves of a character.
///
/// Uses an explicit stack, so arbitrarily deep compositions cannot overflow
/// the call stack.
#[derive(Debug, Clone)]
pub struct SimpleLeaves<'a> {
    pending: Vec<&'a Character>,
}

impl<'a> Iterator for SimpleLeaves<'a> {
    type Item = &'a SimpleCharacter;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(character) = self.pending.pop() {
            match character {
                Character::Simple(simple) => return Some(simple),
                Character::Compound(compound) => {
                    self.pending.extend(compound.components.iter().rev());
                }
            }
        }
        None
    }
}

/// A positioned box referencing the artwork of one simple character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphBox {
    /// Identity of the artwork to draw.
    #[serde(rename = "char")]
    pub identity: char,
    /// Left offset.
    pub x: i32,
    /// Top offset.
    pub y: i32,
    /// Box width.
    pub width: i32,
    /// Box height.
    pub height: i32,
}

/// Flattened render parameters of one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    /// Identity of the character that was flattened.
    #[serde(rename = "char")]
    pub identity: char,
    /// Leaf boxes in component order.
    pub boxes: Vec<GlyphBox>,
}

impl Geometry {
    /// Number of leaf boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Check if the geometry has no boxes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Pair every box with its artwork.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::MissingAsset`] for the first box whose
    /// identity has no entry in `assets`.
    pub fn resolve<'a>(
        &'a self,
        assets: &'a AssetStore,
    ) -> ComposerResult<Vec<(&'a GlyphBox, &'a Artwork)>> {
        self.boxes
            .iter()
            .map(|glyph_box| {
                assets
                    .get(glyph_box.identity)
                    .map(|artwork| (glyph_box, artwork))
                    .ok_or(ComposerError::MissingAsset(glyph_box.identity))
            })
            .collect()
    }
}

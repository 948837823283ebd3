//! Recipe and tag data model.
//!
//! This module provides:
//! - The serde model for raw recipe declarations as shipped in game data
//! - Ingredient slot declarations (bare name, item/tag reference, alternatives)
//! - The closed set of recipe kinds the calculator expands
//! - Tag declarations with nested tag references

use craftbook_common::canonical_name;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Type string of the hand-written "gathered from the world" recipes.
pub const NATURALLY_OCCURRING: &str = "craftbook:naturally_occurring";

/// Name prefix marking hand-written recipes that patch gaps in game data.
pub const CUSTOM_RECIPE_PREFIX: &str = "custom-";

/// Recipe kinds the calculator knows how to expand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecipeKind {
    /// Grid recipe with a fixed placement pattern.
    Shaped,
    /// Grid recipe where placement does not matter.
    Shapeless,
    /// Furnace smelting.
    Smelting,
    /// Blast furnace smelting.
    Blasting,
    /// Smoker cooking.
    Smoking,
    /// Campfire cooking.
    CampfireCooking,
    /// Stonecutter cuts.
    Stonecutting,
    /// Smithing table upgrades (base item plus addition).
    Smithing,
    /// Gathered from the world rather than crafted.
    NaturallyOccurring,
}

impl RecipeKind {
    /// Maps a raw recipe `type` string to a supported kind.
    ///
    /// Returns `None` for every type the calculator does not expand
    /// (special crafting such as banner duplication or map extension).
    #[must_use]
    pub fn from_type(raw: &str) -> Option<Self> {
        match raw {
            "minecraft:crafting_shaped" => Some(Self::Shaped),
            "minecraft:crafting_shapeless" => Some(Self::Shapeless),
            "minecraft:smelting" => Some(Self::Smelting),
            "minecraft:blasting" => Some(Self::Blasting),
            "minecraft:smoking" => Some(Self::Smoking),
            "minecraft:campfire_cooking" => Some(Self::CampfireCooking),
            "minecraft:stonecutting" => Some(Self::Stonecutting),
            "minecraft:smithing" => Some(Self::Smithing),
            NATURALLY_OCCURRING => Some(Self::NaturallyOccurring),
            _ => None,
        }
    }

    /// Kinds whose plural ingredient list denotes alternatives for one slot.
    #[must_use]
    pub const fn is_single_ingredient(self) -> bool {
        matches!(
            self,
            Self::Smelting | Self::Blasting | Self::Smoking | Self::Stonecutting
        )
    }

    /// Hand-written kinds rather than game data.
    #[must_use]
    pub const fn is_custom(self) -> bool {
        matches!(self, Self::NaturallyOccurring)
    }
}

/// Item-or-tag reference form of an ingredient slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientRef {
    /// Item name, when the slot names a concrete item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    /// Tag name, when the slot accepts any member of a tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// One ingredient slot as declared in recipe data.
///
/// Slots come in three wire shapes: a bare name, an `{item}` or `{tag}`
/// reference, or a list of interchangeable alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IngredientSpec {
    /// Any one of the listed alternatives satisfies the slot.
    AnyOf(Vec<IngredientSpec>),
    /// Reference to a single item or to a tag.
    Ref(IngredientRef),
    /// Bare item name.
    Name(String),
}

impl IngredientSpec {
    /// Slot referencing a concrete item.
    #[must_use]
    pub fn item(name: impl Into<String>) -> Self {
        Self::Ref(IngredientRef {
            item: Some(name.into()),
            tag: None,
        })
    }

    /// Slot accepting any member of a tag.
    #[must_use]
    pub fn tag(name: impl Into<String>) -> Self {
        Self::Ref(IngredientRef {
            item: None,
            tag: Some(name.into()),
        })
    }
}

/// Result of a recipe: the item it yields and how many units per batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeResult {
    /// Item the recipe produces.
    pub item: String,
    /// Units produced per batch.
    #[serde(default = "default_count")]
    pub count: u64,
}

fn default_count() -> u64 {
    1
}

/// One raw recipe declaration.
///
/// Mirrors the on-disk JSON: which ingredient carrier is populated depends
/// on the type (`ingredients`/`ingredient` for shapeless and cooking
/// recipes, `pattern` plus `key` for shaped ones, `base` plus `addition`
/// for smithing). Naturally occurring recipes declare the `self`
/// placeholder as their only ingredient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Raw recipe type string, e.g. `minecraft:smelting`.
    #[serde(rename = "type")]
    pub recipe_type: String,
    /// Result item and batch yield.
    pub result: RecipeResult,
    /// Ingredient list (shapeless recipes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<IngredientSpec>>,
    /// Single-slot ingredient (cooking recipes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredient: Option<IngredientSpec>,
    /// Placement grid rows (shaped recipes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Vec<String>>,
    /// Symbol to ingredient mapping for the pattern (shaped recipes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<BTreeMap<char, IngredientSpec>>,
    /// Base item being upgraded (smithing recipes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<IngredientSpec>,
    /// Upgrade material (smithing recipes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addition: Option<IngredientSpec>,
}

impl Recipe {
    /// Supported kind of this recipe, `None` when the type is not expanded.
    #[must_use]
    pub fn kind(&self) -> Option<RecipeKind> {
        RecipeKind::from_type(&self.recipe_type)
    }

    /// Whether the calculator can expand this recipe at all.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.kind().is_some()
    }

    /// Canonical name of the result item.
    #[must_use]
    pub fn result_name(&self) -> &str {
        canonical_name(&self.result.item)
    }
}

impl Default for RecipeResult {
    fn default() -> Self {
        Self {
            item: String::new(),
            count: 1,
        }
    }
}

/// A named set of interchangeable items.
///
/// Values may reference other tags with a leading `#`; expansion is
/// recursive down to leaf items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Item names and `#`-prefixed nested tag references, in declared order.
    pub values: Vec<String>,
}

impl Tag {
    /// Creates a tag over the given values.
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

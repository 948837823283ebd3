//! Immutable table bundle consumed by the calculator.
//!
//! This module provides:
//! - `RecipeBook`: recipes, tags, and the by-result index for one game version
//! - Structural validation at construction time
//! - JSON ingestion for the external data-loading layer
//!
//! A book is built once per game version by the data-loading layer and then
//! shared by reference into every builder and aggregator call; nothing in it
//! is mutated afterwards.

use crate::recipe::{Recipe, RecipeKind, Tag, CUSTOM_RECIPE_PREFIX};
use ahash::AHashMap;
use craftbook_common::{canonical_name, GameVersion};
use thiserror::Error;
use tracing::debug;

/// Errors raised while assembling a recipe book from raw tables.
///
/// These only occur at the construction boundary; once a book exists,
/// tree building and aggregation never fail on data inconsistency.
#[derive(Debug, Error)]
pub enum BookError {
    /// Recipe declares a zero yield
    #[error("recipe {0} declares a zero yield")]
    ZeroYield(String),
    /// Shaped recipe without its pattern or key
    #[error("shaped recipe {0} is missing its pattern or key")]
    MissingPattern(String),
    /// Smithing recipe without base or addition
    #[error("smithing recipe {0} is missing its base or addition")]
    MissingSmithingSlot(String),
    /// Failed to parse a JSON table
    #[error("failed to parse table JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for book construction.
pub type BookResult<T> = Result<T, BookError>;

/// Immutable bundle of recipes, tags, and the by-result index.
#[derive(Debug, Clone, Default)]
pub struct RecipeBook {
    version: GameVersion,
    recipes: AHashMap<String, Recipe>,
    tags: AHashMap<String, Tag>,
    by_result: AHashMap<String, Vec<String>>,
}

impl RecipeBook {
    /// Builds a book from raw recipe and tag tables.
    ///
    /// Validates structure (zero yields, shaped recipes without their
    /// pattern, smithing recipes without both slots) and assembles the
    /// by-result index over the supported recipes: custom recipes sort
    /// alphabetically ahead of the game's own, also alphabetical.
    pub fn new(
        version: GameVersion,
        recipes: AHashMap<String, Recipe>,
        tags: AHashMap<String, Tag>,
    ) -> BookResult<Self> {
        for (name, recipe) in &recipes {
            if recipe.result.count == 0 {
                return Err(BookError::ZeroYield(name.clone()));
            }
            match recipe.kind() {
                Some(RecipeKind::Shaped) if recipe.pattern.is_none() || recipe.key.is_none() => {
                    return Err(BookError::MissingPattern(name.clone()));
                }
                Some(RecipeKind::Smithing)
                    if recipe.base.is_none() || recipe.addition.is_none() =>
                {
                    return Err(BookError::MissingSmithingSlot(name.clone()));
                }
                _ => {}
            }
        }

        let mut custom: AHashMap<String, Vec<String>> = AHashMap::new();
        let mut natural: AHashMap<String, Vec<String>> = AHashMap::new();
        for (name, recipe) in &recipes {
            if !recipe.is_supported() {
                debug!(recipe = %name, kind = %recipe.recipe_type, "skipping unsupported recipe type");
                continue;
            }
            let result = recipe.result_name().to_owned();
            if is_custom_recipe(name, recipe) {
                custom.entry(result).or_default().push(name.clone());
            } else {
                natural.entry(result).or_default().push(name.clone());
            }
        }

        let mut by_result: AHashMap<String, Vec<String>> = AHashMap::new();
        for (result, mut names) in custom {
            names.sort_unstable();
            by_result.insert(result, names);
        }
        for (result, mut names) in natural {
            names.sort_unstable();
            by_result.entry(result).or_default().extend(names);
        }

        let tags = tags
            .into_iter()
            .map(|(name, tag)| (canonical_name(&name).to_owned(), tag))
            .collect();

        Ok(Self {
            version,
            recipes,
            tags,
            by_result,
        })
    }

    /// Parses recipe and tag tables from their JSON wire form.
    pub fn from_json(
        version: GameVersion,
        recipes_json: &str,
        tags_json: &str,
    ) -> BookResult<Self> {
        let recipes: AHashMap<String, Recipe> = serde_json::from_str(recipes_json)?;
        let tags: AHashMap<String, Tag> = serde_json::from_str(tags_json)?;
        Self::new(version, recipes, tags)
    }

    /// Version of the game data this book was built from.
    #[must_use]
    pub const fn version(&self) -> GameVersion {
        self.version
    }

    /// Looks up a recipe by name.
    #[must_use]
    pub fn recipe(&self, name: &str) -> Option<&Recipe> {
        self.recipes.get(name)
    }

    /// Looks up a tag by name; namespace and tag markers are ignored.
    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&Tag> {
        self.tags.get(canonical_name(name))
    }

    /// Ordered recipe names producing an item: custom first, then natural.
    #[must_use]
    pub fn recipes_for(&self, item: &str) -> &[String] {
        self.by_result.get(item).map_or(&[], Vec::as_slice)
    }

    /// Whether any supported recipe produces the item.
    #[must_use]
    pub fn has_producers(&self, item: &str) -> bool {
        !self.recipes_for(item).is_empty()
    }

    /// Number of recipes in the book, supported or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// Whether the book holds no recipes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

/// Hand-written recipes come either with the custom type namespace or the
/// `custom-` name prefix.
fn is_custom_recipe(name: &str, recipe: &Recipe) -> bool {
    recipe.kind().is_some_and(RecipeKind::is_custom) || name.starts_with(CUSTOM_RECIPE_PREFIX)
}

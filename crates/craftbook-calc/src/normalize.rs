//! Ingredient normalization.
//!
//! Turns raw ingredient declarations into canonical entries: tags expand
//! recursively down to leaf items, duplicate references merge, shaped
//! pattern symbol counts become forced amounts, and the reserved `self`
//! placeholder disappears.

use crate::book::RecipeBook;
use crate::recipe::{IngredientSpec, Recipe, RecipeKind};
use ahash::AHashMap;
use craftbook_common::{canonical_name, is_tag_ref, SELF_PLACEHOLDER};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A canonical ingredient entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientEntry {
    /// Canonical item name.
    pub name: String,
    /// Units required by one batch of the enclosing recipe.
    pub amount_required: u64,
    /// Tag this entry was expanded from, when it came out of one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl IngredientEntry {
    /// Creates a plain entry with no group label.
    #[must_use]
    pub fn new(name: impl Into<String>, amount_required: u64) -> Self {
        Self {
            name: name.into(),
            amount_required,
            group: None,
        }
    }

    /// Creates an entry carrying the tag it was expanded from.
    #[must_use]
    pub fn grouped(name: impl Into<String>, amount_required: u64, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount_required,
            group: Some(group.into()),
        }
    }
}

/// A normalized ingredient slot.
///
/// Plain slots require one specific item; `AnyOf` slots are satisfied by
/// any one of their alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Normalized {
    /// One required item.
    Item(IngredientEntry),
    /// Interchangeable alternatives; any one satisfies the slot.
    AnyOf(Vec<IngredientEntry>),
}

/// Accumulates entries in first-seen order, merging repeats by name.
#[derive(Debug, Default)]
struct EntryAccumulator {
    entries: Vec<IngredientEntry>,
    by_name: AHashMap<String, usize>,
}

impl EntryAccumulator {
    fn add(&mut self, name: &str, group: Option<&str>, forced: Option<u64>) {
        if name == SELF_PLACEHOLDER {
            return;
        }
        match self.by_name.get(name) {
            Some(&index) => {
                let existing = &mut self.entries[index];
                match forced {
                    Some(amount) => existing.amount_required = amount,
                    None => existing.amount_required += 1,
                }
                if group.is_some() {
                    existing.group = group.map(str::to_owned);
                }
            }
            None => {
                self.by_name.insert(name.to_owned(), self.entries.len());
                self.entries.push(IngredientEntry {
                    name: name.to_owned(),
                    amount_required: forced.unwrap_or(1),
                    group: group.map(str::to_owned),
                });
            }
        }
    }

    fn into_entries(self) -> Vec<IngredientEntry> {
        self.entries
    }
}

/// Normalizes a list of raw ingredient slots.
///
/// Plain entries come first (first-seen order, repeats merged), followed by
/// one `AnyOf` group per tag or alternatives list, in declaration order.
/// With a `forced` amount every matched entry is pinned to exactly that
/// amount instead of accumulating.
#[must_use]
pub fn normalize_ingredients(
    specs: &[IngredientSpec],
    book: &RecipeBook,
    forced: Option<u64>,
) -> Vec<Normalized> {
    let mut plain = EntryAccumulator::default();
    let mut groups = Vec::new();

    for spec in specs {
        match spec {
            IngredientSpec::Name(raw) => plain.add(canonical_name(raw), None, forced),
            IngredientSpec::Ref(reference) => {
                if let Some(tag) = &reference.tag {
                    push_group(&mut groups, expand_tag(canonical_name(tag), book, forced));
                } else if let Some(item) = &reference.item {
                    plain.add(canonical_name(item), None, forced);
                }
            }
            IngredientSpec::AnyOf(alternatives) => {
                push_group(&mut groups, expand_alternatives(alternatives, book, forced));
            }
        }
    }

    let mut normalized: Vec<Normalized> =
        plain.into_entries().into_iter().map(Normalized::Item).collect();
    normalized.extend(groups);
    normalized
}

/// Normalizes one raw slot; group-shaped slots produce a single `AnyOf`.
#[must_use]
pub fn normalize_one(
    spec: &IngredientSpec,
    book: &RecipeBook,
    forced: Option<u64>,
) -> Vec<Normalized> {
    normalize_ingredients(std::slice::from_ref(spec), book, forced)
}

/// All normalized ingredient slots for one recipe.
///
/// Shaped recipes count their pattern symbols into forced amounts; smithing
/// recipes combine base and addition; smelting-family recipes that declare
/// a plural list treat it as one alternatives slot.
#[must_use]
pub fn recipe_ingredients(recipe: &Recipe, book: &RecipeBook) -> Vec<Normalized> {
    let Some(kind) = recipe.kind() else {
        return Vec::new();
    };
    match kind {
        RecipeKind::Shaped => shaped_ingredients(recipe, book),
        RecipeKind::Smithing => {
            let specs: Vec<IngredientSpec> = recipe
                .base
                .iter()
                .chain(recipe.addition.iter())
                .cloned()
                .collect();
            normalize_ingredients(&specs, book, None)
        }
        _ => normalize_ingredients(&plural_or_single(recipe, kind), book, None),
    }
}

/// Prefers the plural `ingredients` carrier, falling back to the single
/// `ingredient` slot. Cooking recipes that list several ingredients mean
/// "any of them", not "all of them".
fn plural_or_single(recipe: &Recipe, kind: RecipeKind) -> Vec<IngredientSpec> {
    if let Some(list) = &recipe.ingredients {
        if kind.is_single_ingredient() && list.len() > 1 {
            return vec![IngredientSpec::AnyOf(list.clone())];
        }
        return list.clone();
    }
    recipe.ingredient.clone().into_iter().collect()
}

fn shaped_ingredients(recipe: &Recipe, book: &RecipeBook) -> Vec<Normalized> {
    let (Some(pattern), Some(key)) = (&recipe.pattern, &recipe.key) else {
        return Vec::new();
    };

    // Count symbol occurrences across the grid in first-seen order,
    // skipping symbols the key does not define.
    let mut order: Vec<char> = Vec::new();
    let mut counts: AHashMap<char, u64> = AHashMap::new();
    for row in pattern {
        for symbol in row.chars() {
            if !key.contains_key(&symbol) {
                continue;
            }
            let count = counts.entry(symbol).or_insert(0);
            if *count == 0 {
                order.push(symbol);
            }
            *count += 1;
        }
    }

    let mut normalized = Vec::new();
    for symbol in order {
        if let (Some(spec), Some(count)) = (key.get(&symbol), counts.get(&symbol)) {
            normalized.extend(normalize_one(spec, book, Some(*count)));
        }
    }
    normalized
}

fn push_group(groups: &mut Vec<Normalized>, entries: Vec<IngredientEntry>) {
    if !entries.is_empty() {
        groups.push(Normalized::AnyOf(entries));
    }
}

/// Expands a tag to its leaf entries, recursing through nested tags.
/// Every leaf carries the tag it was directly listed under as its group.
fn expand_tag(tag_name: &str, book: &RecipeBook, forced: Option<u64>) -> Vec<IngredientEntry> {
    let mut accumulator = EntryAccumulator::default();
    let mut seen = Vec::new();
    expand_tag_into(tag_name, book, forced, &mut accumulator, &mut seen);
    accumulator.into_entries()
}

fn expand_tag_into(
    tag_name: &str,
    book: &RecipeBook,
    forced: Option<u64>,
    accumulator: &mut EntryAccumulator,
    seen: &mut Vec<String>,
) {
    // Malformed data can make tags reference each other in a loop.
    if seen.iter().any(|name| name == tag_name) {
        warn!(tag = %tag_name, "tag references itself, skipping re-entry");
        return;
    }
    let Some(tag) = book.tag(tag_name) else {
        warn!(tag = %tag_name, "unknown tag reference, expanding to nothing");
        return;
    };
    seen.push(tag_name.to_owned());
    for value in &tag.values {
        let name = canonical_name(value);
        if is_tag_ref(value) {
            expand_tag_into(name, book, forced, accumulator, seen);
        } else {
            accumulator.add(name, Some(tag_name), forced);
        }
    }
    seen.pop();
}

/// Expands an alternatives list into one flat group of entries; nested
/// lists and tags flatten into the same group.
fn expand_alternatives(
    alternatives: &[IngredientSpec],
    book: &RecipeBook,
    forced: Option<u64>,
) -> Vec<IngredientEntry> {
    let mut accumulator = EntryAccumulator::default();
    flatten_alternatives(alternatives, book, forced, &mut accumulator);
    accumulator.into_entries()
}

fn flatten_alternatives(
    alternatives: &[IngredientSpec],
    book: &RecipeBook,
    forced: Option<u64>,
    accumulator: &mut EntryAccumulator,
) {
    for alternative in alternatives {
        match alternative {
            IngredientSpec::Name(raw) => accumulator.add(canonical_name(raw), None, forced),
            IngredientSpec::Ref(reference) => {
                if let Some(tag) = &reference.tag {
                    let mut seen = Vec::new();
                    expand_tag_into(canonical_name(tag), book, forced, accumulator, &mut seen);
                } else if let Some(item) = &reference.item {
                    accumulator.add(canonical_name(item), None, forced);
                }
            }
            IngredientSpec::AnyOf(nested) => {
                flatten_alternatives(nested, book, forced, accumulator);
            }
        }
    }
}

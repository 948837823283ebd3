//! Shopping list aggregation.
//!
//! Walks a built recipe tree along a selection path and produces the
//! flattened per-item ledger: what must be gathered, what gets crafted in
//! passing and in which batch sizes, and which consumer demanded every
//! unit. Repeated visits to the same item from different branches merge
//! into one entry, so quantities are conserved across the whole walk.

use crate::tree::{ItemNode, RecipeOption, Selection, SelectionPath, TreeNode};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Reserved consumer key for demand coming from the original request.
pub const USED_FOR_SELF: &str = "self";
/// Reserved consumer key accumulating all recipe-driven demand.
pub const USED_FOR_RECIPES: &str = "recipes";

/// Starting inventory, item name to quantity on hand.
pub type Inventory = AHashMap<String, u64>;

/// Ledger entry for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingEntry {
    /// Canonical item name.
    pub name: String,
    /// Minimum depth at which the item is needed (0 = requested directly).
    pub level: u64,
    /// Whether the tree gives this item at least one recipe.
    pub has_recipe: bool,
    /// Total fresh units demanded across all consumers.
    pub amount_required: u64,
    /// Produced-but-unconsumed balance after the walk; never negative.
    pub amount_available: u64,
    /// Starting inventory, never mutated.
    pub have: u64,
    /// Units satisfied by leftovers instead of fresh production.
    pub implied_have: u64,
    /// Demand attribution by consumer; `self` and `recipes` are reserved.
    pub amount_used_for: BTreeMap<String, u64>,
    /// Direct child item names of the chosen recipe, in visit order.
    pub requires: Vec<String>,
    /// Units produced over the walk, batch rounding included.
    pub total_created: u64,
    /// Batch yield of the chosen recipe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_recipe_creates: Option<u64>,
    /// Type string of the chosen recipe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_type: Option<String>,
}

impl ShoppingEntry {
    fn new(name: &str, level: u64, has_recipe: bool, have: u64) -> Self {
        Self {
            name: name.to_owned(),
            level,
            has_recipe,
            amount_required: 0,
            amount_available: have,
            have,
            implied_have: 0,
            amount_used_for: [(USED_FOR_SELF.to_owned(), 0), (USED_FOR_RECIPES.to_owned(), 0)]
                .into_iter()
                .collect(),
            requires: Vec::new(),
            total_created: 0,
            amount_recipe_creates: None,
            recipe_type: None,
        }
    }
}

/// The flattened ledger, keyed by item name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShoppingList {
    entries: BTreeMap<String, ShoppingEntry>,
}

impl ShoppingList {
    /// Looks up the entry for an item.
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&ShoppingEntry> {
        self.entries.get(name)
    }

    /// Iterates entries in item-name order.
    pub fn iter(&self) -> impl Iterator<Item = &ShoppingEntry> {
        self.entries.values()
    }

    /// Number of distinct items in the ledger.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the walk touched no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Walks `tree` along `selections`, producing the per-item ledger.
///
/// Group members and recipes missing from the selection path fall back to
/// the tree's own default selection, then to the first declared choice;
/// aggregation never fails.
#[must_use]
pub fn build_shopping_list(
    tree: &[TreeNode],
    selections: &SelectionPath,
    inventory: &Inventory,
) -> ShoppingList {
    let mut walker = Walker {
        inventory,
        entries: BTreeMap::new(),
    };
    walker.walk(tree, selections, None, 1, 0);
    ShoppingList {
        entries: walker.entries,
    }
}

/// Call-local accumulator; dropped into the final ledger when the walk ends.
struct Walker<'a> {
    inventory: &'a Inventory,
    entries: BTreeMap<String, ShoppingEntry>,
}

impl Walker<'_> {
    fn walk(
        &mut self,
        nodes: &[TreeNode],
        selections: &SelectionPath,
        parent: Option<&str>,
        multiplier: u64,
        depth: u64,
    ) {
        for node in nodes {
            match node {
                TreeNode::Group(members) => {
                    if let Some(member) = choose_member(members, selections) {
                        self.walk(
                            std::slice::from_ref(member),
                            selections,
                            parent,
                            multiplier,
                            depth,
                        );
                    }
                }
                TreeNode::Item(item) => self.visit(item, selections, parent, multiplier, depth),
            }
        }
    }

    fn visit(
        &mut self,
        node: &ItemNode,
        selections: &SelectionPath,
        parent: Option<&str>,
        multiplier: u64,
        depth: u64,
    ) {
        let amount = node.amount_required.saturating_mul(multiplier);

        if !self.entries.contains_key(&node.name) {
            let have = self.inventory.get(&node.name).copied().unwrap_or(0);
            self.entries.insert(
                node.name.clone(),
                ShoppingEntry::new(&node.name, depth, node.num_recipes > 0, have),
            );
        }

        if let Some(parent) = parent {
            if let Some(parent_entry) = self.entries.get_mut(parent) {
                if !parent_entry.requires.iter().any(|child| child == &node.name) {
                    parent_entry.requires.push(node.name.clone());
                }
            }
        }

        let Some(entry) = self.entries.get_mut(&node.name) else {
            return;
        };
        entry.level = entry.level.min(depth);

        let consumer = parent.unwrap_or(USED_FOR_SELF);
        *entry
            .amount_used_for
            .entry(consumer.to_owned())
            .or_insert(0) += amount;
        if parent.is_some() {
            *entry
                .amount_used_for
                .entry(USED_FOR_RECIPES.to_owned())
                .or_insert(0) += amount;
        }
        entry.amount_required = entry.amount_required.saturating_add(amount);

        // Leftovers cover this consumer entirely, or not at all.
        let available = entry.amount_available;
        let satisfied = available >= amount;
        if satisfied {
            entry.amount_available = available - amount;
            entry.implied_have = entry.implied_have.saturating_add(amount);
        }

        let selection = selections.get(&node.name);
        let Some(option) = choose_option(node, selection) else {
            // Terminal item: nothing to produce, demand is already booked.
            return;
        };

        entry.amount_recipe_creates = Some(option.amount_created);
        entry.recipe_type = Some(option.recipe_type.clone());

        let next_multiplier = if satisfied {
            0
        } else {
            let batch = option.amount_created.max(1);
            let missing = amount - available;
            let batches = missing.div_ceil(batch);
            let created = batch.saturating_mul(batches);
            entry.total_created = entry.total_created.saturating_add(created);
            entry.amount_available = created.saturating_sub(missing);
            batches
        };

        let fallback = SelectionPath::new();
        let child_selections = selection.map_or(&fallback, |choice| &choice.ingredients);
        self.walk(
            &option.ingredients,
            child_selections,
            Some(&node.name),
            next_multiplier,
            depth + 1,
        );
    }
}

/// Picks a group member: the one named in the path, else the member the
/// builder selected, else the first declared.
fn choose_member<'t>(members: &'t [TreeNode], selections: &SelectionPath) -> Option<&'t TreeNode> {
    members
        .iter()
        .find(|member| {
            matches!(member, TreeNode::Item(node) if selections.contains_key(&node.name))
        })
        .or_else(|| {
            members
                .iter()
                .find(|member| matches!(member, TreeNode::Item(node) if node.selected))
        })
        .or_else(|| members.first())
}

/// Picks a recipe option: the one named in the path, else the option the
/// builder selected, else the first declared.
fn choose_option<'t>(node: &'t ItemNode, selection: Option<&Selection>) -> Option<&'t RecipeOption> {
    if node.recipes.is_empty() {
        return None;
    }
    if let Some(pinned) = selection.and_then(|choice| choice.recipe.as_deref()) {
        if let Some(option) = node.recipes.iter().find(|option| option.name == pinned) {
            return Some(option);
        }
        debug!(item = %node.name, recipe = %pinned, "selected recipe not in tree, falling back");
    }
    node.recipes
        .iter()
        .find(|option| option.selected)
        .or_else(|| node.recipes.first())
}

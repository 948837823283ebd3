//! Recipe tree construction.
//!
//! Expands requested items into every viable production path: each item
//! node lists the recipes that produce it, each recipe recurses into its
//! own normalized ingredients, and tag expansions become groups of
//! interchangeable alternatives. Re-entrant items demote to terminal
//! leaves so cycles in the recipe graph always terminate, and every node
//! gets a default selection based on a resource-efficiency score unless
//! the caller pinned a choice.

use crate::book::RecipeBook;
use crate::normalize::{normalize_one, recipe_ingredients, Normalized};
use craftbook_common::{RequestTarget, Requested};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Pinned choices for one item: the recipe to use and, beneath it, the
/// choices for that recipe's ingredients.
///
/// Group membership is chosen by naming the member: a group member whose
/// name appears as a key at the current level is the selected member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Recipe name to use for this item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<String>,
    /// Choices for the chosen recipe's ingredients, keyed by item name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ingredients: BTreeMap<String, Selection>,
}

impl Selection {
    /// Pins a recipe by name, with no deeper choices.
    #[must_use]
    pub fn recipe(name: impl Into<String>) -> Self {
        Self {
            recipe: Some(name.into()),
            ingredients: BTreeMap::new(),
        }
    }
}

/// Caller-pinned choices, keyed by item name.
pub type SelectionPath = BTreeMap<String, Selection>;

/// Per-node statistics over its recipe options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStats {
    /// Best efficiency among this node's options.
    pub max_recipe_efficiency: i64,
    /// Ingredient count of the most efficient option.
    pub min_recipe_ingredients: i64,
}

/// One way to produce an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeOption {
    /// Recipe name.
    pub name: String,
    /// Raw recipe type string.
    pub recipe_type: String,
    /// Canonical name of the produced item.
    pub result_name: String,
    /// Units the consumer requires.
    pub amount_required: u64,
    /// Units one batch yields.
    pub amount_created: u64,
    /// Recipe trees of this recipe's ingredients.
    pub ingredients: Vec<TreeNode>,
    /// Resource efficiency score; higher is better.
    pub efficiency: i64,
    /// Whether this option is the active choice for its node.
    pub selected: bool,
    /// Whether this option's subtree re-enters an item above it.
    pub circular: bool,
}

/// A single item in the tree with its recipe options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemNode {
    /// Canonical item name.
    pub name: String,
    /// Tag this node was expanded from, when it came out of one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Units required by the consumer that asked for this node.
    pub amount_required: u64,
    /// Number of viable recipe options.
    pub num_recipes: usize,
    /// Viable ways to produce this item, in deterministic candidate order.
    pub recipes: Vec<RecipeOption>,
    /// Whether this node is the active choice among its siblings.
    pub selected: bool,
    /// Aggregate statistics over the options.
    pub stats: NodeStats,
}

/// Node of a recipe tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Single item with its recipe options.
    Item(ItemNode),
    /// Interchangeable alternatives; exactly one member is selected.
    Group(Vec<TreeNode>),
}

impl TreeNode {
    /// The item node inside, when this is not a group.
    #[must_use]
    pub fn as_item(&self) -> Option<&ItemNode> {
        match self {
            Self::Item(node) => Some(node),
            Self::Group(_) => None,
        }
    }
}

/// Aggregate results of one builder call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Whether any branch hit a circular reference.
    pub node_is_circular: bool,
    /// Best efficiency among the top-level nodes.
    pub most_efficient_node: i64,
    /// Minimum total item count along the most resource-efficient path.
    pub min_items_required: i64,
}

/// Builds the full recipe tree for a set of requested items.
///
/// Never fails: malformed amounts coerce to 1 upstream, unsupported
/// recipe types are filtered from the book's index, unknown tags expand
/// to nothing, and circular references demote to terminal leaves.
#[must_use]
pub fn build_recipe_tree(
    book: &RecipeBook,
    requests: &[Requested],
    selections: &SelectionPath,
) -> (Vec<TreeNode>, BuildStats) {
    let builder = TreeBuilder { book };
    let mut items = Vec::new();
    for request in requests {
        items.extend(builder.normalize_request(request));
    }
    let (nodes, frame) = builder.build_items(&items, selections, &[], false);
    let stats = BuildStats {
        node_is_circular: frame.circular,
        most_efficient_node: frame.best_efficiency.unwrap_or(0),
        min_items_required: frame.min_items,
    };
    (nodes, stats)
}

/// Stats carried between recursion frames.
#[derive(Debug, Default)]
struct FrameStats {
    /// A cycle was hit somewhere below, even if already contained.
    circular: bool,
    /// Items whose cycle has not yet been contained by their own frame.
    open_cycles: Vec<String>,
    /// Best efficiency among the frame's sibling nodes.
    best_efficiency: Option<i64>,
    /// Minimum item count along the most efficient path.
    min_items: i64,
}

struct TreeBuilder<'a> {
    book: &'a RecipeBook,
}

impl TreeBuilder<'_> {
    /// Top-level requests normalize with their amount pinned, so a tag
    /// request fans out into a group whose members all carry the amount.
    fn normalize_request(&self, request: &Requested) -> Vec<Normalized> {
        use crate::recipe::IngredientSpec;

        let forced = Some(request.amount_required);
        let spec = match &request.target {
            RequestTarget::Item(name) => IngredientSpec::Name(name.clone()),
            RequestTarget::Tag(name) => IngredientSpec::tag(name.clone()),
        };
        normalize_one(&spec, self.book, forced)
    }

    fn build_items(
        &self,
        items: &[Normalized],
        selections: &SelectionPath,
        ancestors: &[String],
        is_group: bool,
    ) -> (Vec<TreeNode>, FrameStats) {
        let mut nodes: Vec<TreeNode> = Vec::new();
        let mut stats = FrameStats::default();
        let mut best_sibling_idx: Option<usize> = None;
        let mut found_selected_member = !is_group;

        for item in items {
            let entry = match item {
                Normalized::AnyOf(members) => {
                    let members: Vec<Normalized> =
                        members.iter().cloned().map(Normalized::Item).collect();
                    let (group_nodes, group_stats) =
                        self.build_items(&members, selections, ancestors, true);
                    stats.circular |= group_stats.circular;
                    stats.open_cycles.extend(group_stats.open_cycles);
                    // A group counts as one item toward the path total.
                    stats.min_items += 1;
                    nodes.push(TreeNode::Group(group_nodes));
                    continue;
                }
                Normalized::Item(entry) => entry,
            };

            let name = entry.name.as_str();
            let mut node = ItemNode {
                name: name.to_owned(),
                group: entry.group.clone(),
                amount_required: entry.amount_required,
                num_recipes: 0,
                recipes: Vec::new(),
                selected: !is_group,
                stats: NodeStats::default(),
            };

            if is_group && selections.contains_key(name) {
                node.selected = true;
                found_selected_member = true;
            }

            if !is_group {
                stats.min_items += as_signed(entry.amount_required);
            }

            let candidates = self.book.recipes_for(name);
            let re_entrant = ancestors.iter().any(|ancestor| ancestor == name);

            if re_entrant || candidates.is_empty() {
                if re_entrant {
                    debug!(item = %name, "circular reference, demoting to terminal leaf");
                    stats.circular = true;
                    stats.open_cycles.push(name.to_owned());
                }
                if stats.best_efficiency.map_or(true, |best| best < 0) {
                    stats.best_efficiency = Some(0);
                    best_sibling_idx = Some(nodes.len());
                }
                nodes.push(TreeNode::Item(node));
                continue;
            }

            let mut ancestors_here = ancestors.to_vec();
            ancestors_here.push(name.to_owned());

            let selection = selections.get(name);
            let pinned_recipe = selection.and_then(|choice| choice.recipe.as_deref());
            let fallback = SelectionPath::new();
            let child_selections = selection.map_or(&fallback, |choice| &choice.ingredients);

            let mut options: Vec<RecipeOption> = Vec::new();
            let mut best_efficiency: Option<i64> = None;
            let mut best_ingredients: i64 = 0;
            let mut default_idx: Option<usize> = None;
            let mut found_pinned = false;
            let mut any_non_circular = false;

            for recipe_name in candidates {
                let Some(recipe) = self.book.recipe(recipe_name) else {
                    continue;
                };
                let amount_created = recipe.result.count;
                let ingredients = recipe_ingredients(recipe, self.book);
                let (child_nodes, child_stats) =
                    self.build_items(&ingredients, child_selections, &ancestors_here, false);

                stats.circular |= child_stats.circular;

                let mut efficiency = as_signed(amount_created) - child_stats.min_items
                    + child_stats.best_efficiency.unwrap_or(0);
                let circular = !child_stats.open_cycles.is_empty();
                if circular {
                    efficiency = -2 * efficiency.abs();
                }
                // Cycles that implicate this item are contained here; the
                // rest stay open for the frames above.
                for cycle in child_stats.open_cycles {
                    if cycle != name {
                        stats.open_cycles.push(cycle);
                    }
                }

                let pinned = pinned_recipe == Some(recipe_name.as_str());
                if pinned {
                    found_pinned = true;
                } else if !circular
                    && best_efficiency.map_or(true, |best| efficiency > best)
                {
                    best_efficiency = Some(efficiency);
                    best_ingredients = child_stats.min_items;
                    default_idx = Some(options.len());
                }
                any_non_circular |= !circular;

                options.push(RecipeOption {
                    name: recipe_name.clone(),
                    recipe_type: recipe.recipe_type.clone(),
                    result_name: recipe.result_name().to_owned(),
                    amount_required: entry.amount_required,
                    amount_created,
                    ingredients: child_nodes,
                    efficiency,
                    selected: pinned,
                    circular,
                });
            }

            if !found_pinned {
                if let Some(idx) = default_idx {
                    options[idx].selected = true;
                }
            }

            if !options.is_empty() && !any_non_circular {
                debug!(item = %name, "every recipe option is circular, demoting to terminal leaf");
                options.clear();
                best_efficiency = None;
                best_ingredients = 0;
            }

            node.stats = NodeStats {
                max_recipe_efficiency: best_efficiency.unwrap_or(0),
                min_recipe_ingredients: best_ingredients,
            };
            node.num_recipes = options.len();
            node.recipes = options;

            if !is_group {
                stats.min_items += node.stats.min_recipe_ingredients;
            }

            if stats
                .best_efficiency
                .map_or(true, |best| node.stats.max_recipe_efficiency > best)
            {
                stats.best_efficiency = Some(node.stats.max_recipe_efficiency);
                best_sibling_idx = Some(nodes.len());
                if is_group {
                    // Alternatives replace rather than add: the path only
                    // needs the ingredients of the best member.
                    stats.min_items = node.stats.min_recipe_ingredients;
                }
            }

            nodes.push(TreeNode::Item(node));
        }

        if is_group && !found_selected_member {
            if let Some(idx) = best_sibling_idx {
                if let Some(TreeNode::Item(node)) = nodes.get_mut(idx) {
                    node.selected = true;
                }
            }
        }

        (nodes, stats)
    }
}

fn as_signed(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::RecipeBook;
    use craftbook_common::GameVersion;

    fn book(recipes_json: &str, tags_json: &str) -> RecipeBook {
        RecipeBook::from_json(GameVersion::new(1, 16, 0), recipes_json, tags_json)
            .expect("book should build")
    }

    fn item<'t>(node: &'t TreeNode) -> &'t ItemNode {
        node.as_item().expect("expected an item node")
    }

    const TORCH_RECIPES: &str = r#"{
        "torch": {
            "type": "minecraft:crafting_shapeless",
            "ingredients": [
                {"item": "minecraft:stick"},
                [{"item": "minecraft:coal"}, {"item": "minecraft:charcoal"}]
            ],
            "result": {"item": "minecraft:torch", "count": 4}
        },
        "stick": {
            "type": "minecraft:crafting_shapeless",
            "ingredients": [{"tag": "minecraft:planks"}],
            "result": {"item": "minecraft:stick", "count": 4}
        },
        "charcoal": {
            "type": "minecraft:smelting",
            "ingredient": {"item": "minecraft:oak_log"},
            "result": {"item": "minecraft:charcoal"}
        }
    }"#;

    const TORCH_TAGS: &str = r#"{
        "minecraft:planks": {"values": ["minecraft:oak_planks", "minecraft:birch_planks"]}
    }"#;

    #[test]
    fn test_unproducible_item_is_terminal_leaf() {
        let book = book("{}", "{}");
        let (tree, stats) =
            build_recipe_tree(&book, &[Requested::item("oak_log", 5)], &SelectionPath::new());

        assert_eq!(tree.len(), 1);
        let node = item(&tree[0]);
        assert_eq!(node.name, "oak_log");
        assert_eq!(node.amount_required, 5);
        assert_eq!(node.num_recipes, 0);
        assert!(node.recipes.is_empty());
        assert!(!stats.node_is_circular);
    }

    #[test]
    fn test_torch_tree_expands_alternatives_and_tags() {
        let book = book(TORCH_RECIPES, TORCH_TAGS);
        let (tree, stats) =
            build_recipe_tree(&book, &[Requested::item("torch", 1)], &SelectionPath::new());

        assert!(!stats.node_is_circular);
        let torch = item(&tree[0]);
        assert_eq!(torch.num_recipes, 1);
        let option = &torch.recipes[0];
        assert!(option.selected);

        // stick first (plain), then the coal/charcoal group
        let stick = item(&option.ingredients[0]);
        assert_eq!(stick.name, "stick");
        let TreeNode::Group(members) = &option.ingredients[1] else {
            panic!("expected a group of alternatives");
        };
        assert_eq!(members.len(), 2);
        assert_eq!(item(&members[0]).name, "coal");
        assert_eq!(item(&members[1]).name, "charcoal");
        // exactly one member selected
        let selected: Vec<_> = members.iter().filter(|m| item(m).selected).collect();
        assert_eq!(selected.len(), 1);

        // the stick recipe expands the planks tag into a group
        let TreeNode::Group(planks) = &stick.recipes[0].ingredients[0] else {
            panic!("expected the planks tag to expand into a group");
        };
        assert_eq!(item(&planks[0]).group.as_deref(), Some("planks"));
    }

    #[test]
    fn test_candidate_order_custom_first() {
        let recipes = r#"{
            "iron_b": {
                "type": "minecraft:smelting",
                "ingredient": {"item": "minecraft:iron_ore"},
                "result": {"item": "minecraft:iron_ingot"}
            },
            "iron_a": {
                "type": "minecraft:smelting",
                "ingredient": {"item": "minecraft:deepslate_iron_ore"},
                "result": {"item": "minecraft:iron_ingot"}
            },
            "custom-iron": {
                "type": "craftbook:naturally_occurring",
                "ingredient": {"item": "self"},
                "result": {"item": "minecraft:iron_ingot"}
            }
        }"#;
        let book = book(recipes, "{}");
        let (tree, _) = build_recipe_tree(
            &book,
            &[Requested::item("iron_ingot", 1)],
            &SelectionPath::new(),
        );

        let names: Vec<_> = item(&tree[0])
            .recipes
            .iter()
            .map(|option| option.name.as_str())
            .collect();
        assert_eq!(names, ["custom-iron", "iron_a", "iron_b"]);
    }

    #[test]
    fn test_default_selection_prefers_efficient_recipe() {
        // Recipe "rich" yields 4 from one ingredient; "poor" yields 1 from
        // three ingredients. "rich" must win the default selection.
        let recipes = r#"{
            "poor": {
                "type": "minecraft:crafting_shapeless",
                "ingredients": [
                    {"item": "minecraft:clay_ball"},
                    {"item": "minecraft:clay_ball"},
                    {"item": "minecraft:clay_ball"}
                ],
                "result": {"item": "minecraft:brick"}
            },
            "rich": {
                "type": "minecraft:smelting",
                "ingredient": {"item": "minecraft:clay_ball"},
                "result": {"item": "minecraft:brick", "count": 4}
            }
        }"#;
        let book = book(recipes, "{}");
        let (tree, _) =
            build_recipe_tree(&book, &[Requested::item("brick", 1)], &SelectionPath::new());

        let node = item(&tree[0]);
        let selected: Vec<_> = node
            .recipes
            .iter()
            .filter(|option| option.selected)
            .map(|option| option.name.as_str())
            .collect();
        assert_eq!(selected, ["rich"]);
        assert_eq!(node.stats.max_recipe_efficiency, 3);
    }

    #[test]
    fn test_pinned_recipe_wins_over_default() {
        let recipes = r#"{
            "rich": {
                "type": "minecraft:smelting",
                "ingredient": {"item": "minecraft:clay_ball"},
                "result": {"item": "minecraft:brick", "count": 4}
            },
            "poor": {
                "type": "minecraft:crafting_shapeless",
                "ingredients": [{"item": "minecraft:clay_ball"}],
                "result": {"item": "minecraft:brick"}
            }
        }"#;
        let book = book(recipes, "{}");
        let mut selections = SelectionPath::new();
        selections.insert("brick".into(), Selection::recipe("poor"));
        let (tree, _) = build_recipe_tree(&book, &[Requested::item("brick", 1)], &selections);

        let selected: Vec<_> = item(&tree[0])
            .recipes
            .iter()
            .filter(|option| option.selected)
            .map(|option| option.name.as_str())
            .collect();
        assert_eq!(selected, ["poor"]);
    }

    #[test]
    fn test_cycle_with_escape_is_contained() {
        // gold_ingot <-> gold_nugget is a cycle, but smelting raw gold
        // escapes it; the cyclic option must never win default selection.
        let recipes = r#"{
            "gold_ingot_from_nuggets": {
                "type": "minecraft:crafting_shapeless",
                "ingredients": [{"item": "minecraft:gold_nugget"}],
                "result": {"item": "minecraft:gold_ingot"}
            },
            "gold_ingot_from_smelting": {
                "type": "minecraft:smelting",
                "ingredient": {"item": "minecraft:raw_gold"},
                "result": {"item": "minecraft:gold_ingot"}
            },
            "gold_nugget": {
                "type": "minecraft:crafting_shapeless",
                "ingredients": [{"item": "minecraft:gold_ingot"}],
                "result": {"item": "minecraft:gold_nugget", "count": 9}
            }
        }"#;
        let book = book(recipes, "{}");
        let (tree, stats) = build_recipe_tree(
            &book,
            &[Requested::item("gold_ingot", 1)],
            &SelectionPath::new(),
        );

        assert!(stats.node_is_circular);
        let node = item(&tree[0]);
        assert_eq!(node.num_recipes, 2);

        let cyclic = node
            .recipes
            .iter()
            .find(|option| option.name == "gold_ingot_from_nuggets")
            .expect("cyclic option present");
        assert!(cyclic.circular);
        assert!(!cyclic.selected);
        assert!(cyclic.efficiency <= 0);

        let escape = node
            .recipes
            .iter()
            .find(|option| option.name == "gold_ingot_from_smelting")
            .expect("escape option present");
        assert!(!escape.circular);
        assert!(escape.selected);
    }

    #[test]
    fn test_pure_cycle_demotes_to_leaf() {
        let recipes = r#"{
            "a_from_b": {
                "type": "minecraft:crafting_shapeless",
                "ingredients": [{"item": "minecraft:b"}],
                "result": {"item": "minecraft:a"}
            },
            "b_from_a": {
                "type": "minecraft:crafting_shapeless",
                "ingredients": [{"item": "minecraft:a"}],
                "result": {"item": "minecraft:b"}
            }
        }"#;
        let book = book(recipes, "{}");
        let (tree, stats) =
            build_recipe_tree(&book, &[Requested::item("a", 1)], &SelectionPath::new());

        assert!(stats.node_is_circular);
        let node = item(&tree[0]);
        // The only production path re-enters "a", so nothing survives.
        assert_eq!(node.num_recipes, 0);
        assert!(node.recipes.is_empty());
    }

    #[test]
    fn test_group_member_selection_from_path() {
        let book = book(TORCH_RECIPES, TORCH_TAGS);
        let mut selections = SelectionPath::new();
        selections.insert(
            "torch".into(),
            Selection {
                recipe: Some("torch".into()),
                ingredients: [("charcoal".to_owned(), Selection::default())]
                    .into_iter()
                    .collect(),
            },
        );
        let (tree, _) = build_recipe_tree(&book, &[Requested::item("torch", 1)], &selections);

        let option = &item(&tree[0]).recipes[0];
        let TreeNode::Group(members) = &option.ingredients[1] else {
            panic!("expected a group of alternatives");
        };
        let charcoal = members
            .iter()
            .map(|member| item(member))
            .find(|node| node.name == "charcoal")
            .expect("charcoal member present");
        assert!(charcoal.selected);
        let coal = members
            .iter()
            .map(|member| item(member))
            .find(|node| node.name == "coal")
            .expect("coal member present");
        assert!(!coal.selected);
    }

    #[test]
    fn test_tag_request_builds_group() {
        let book = book(TORCH_RECIPES, TORCH_TAGS);
        let (tree, _) =
            build_recipe_tree(&book, &[Requested::tag("planks", 3)], &SelectionPath::new());

        assert_eq!(tree.len(), 1);
        let TreeNode::Group(members) = &tree[0] else {
            panic!("expected a group for a tag request");
        };
        assert_eq!(members.len(), 2);
        for member in members {
            assert_eq!(item(member).amount_required, 3);
        }
    }

    #[test]
    fn test_build_is_idempotent() {
        let book = book(TORCH_RECIPES, TORCH_TAGS);
        let requests = [Requested::item("torch", 9), Requested::item("stick", 2)];
        let first = build_recipe_tree(&book, &requests, &SelectionPath::new());
        let second = build_recipe_tree(&book, &requests, &SelectionPath::new());

        assert_eq!(first, second);
    }
}

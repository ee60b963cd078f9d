//! Capability resolution by name pattern.
//!
//! The remote workspace advertises its operations under names that are not
//! fixed at build time, so selection has to disambiguate by name shape.
//! The heuristic is a strategy table: an ordered list of (predicate,
//! description) pairs evaluated top-down, first match wins.  It is fully
//! deterministic and testable without any live provider.

use tracing::debug;

use crate::traits::ToolDescriptor;

/// The canonical HTTP-POST-style page-creation name, checked as an exact
/// shape before any token heuristics run.
const CANONICAL_CREATE_PAGE: &str = "api-post-page";

/// Verb tokens that signal a creation operation.
const CREATE_VERBS: &[&str] = &["create", "post", "add", "new"];

/// Noun tokens that signal the page/task target entity.  Singular only;
/// plural spellings are handled by the alias tier below.
const TARGET_NOUNS: &[&str] = &["page", "task", "todo", "item"];

/// Modifier tokens that disqualify a name even when verb and noun match:
/// comments, mutations of existing entities, and container-level targets.
const EXCLUDED_MODIFIERS: &[&str] = &[
    "comment", "comments", "update", "patch", "delete", "archive", "database", "databases",
    "block", "blocks",
];

/// Exact known aliases, tried after the token heuristic.
const KNOWN_ALIASES: &[&str] = &[
    "notion_create_page",
    "create_page",
    "post_page",
    "add_page",
    "notion-create-pages",
    "create-pages",
    "create_pages",
];

/// One tier of the strategy table.
struct NameStrategy {
    /// What this tier matches, for log lines.
    description: &'static str,
    /// Predicate over a single capability name.
    matches: fn(&str) -> bool,
}

/// The strategy table, in strict priority order.
static STRATEGIES: &[NameStrategy] = &[
    NameStrategy {
        description: "canonical HTTP-POST-style creation name",
        matches: matches_canonical,
    },
    NameStrategy {
        description: "creation verb + target noun, no excluded modifier",
        matches: matches_create_tokens,
    },
    NameStrategy {
        description: "exact known alias",
        matches: matches_alias,
    },
];

/// A successful resolution: which tool, and which tier selected it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<'a> {
    /// The selected capability.
    pub tool: &'a ToolDescriptor,
    /// The strategy tier that matched, for audit logging.
    pub rule: &'static str,
}

/// Select the page/task creation capability from a discovered tool set.
///
/// Tiers are evaluated top-down and, within a tier, tools in discovery
/// order — so the same name set always yields the same selection.  Returns
/// `None` when nothing matches; the caller must then fall back to the
/// built-in local provider rather than guess.
pub fn resolve_create_tool(tools: &[ToolDescriptor]) -> Option<Resolution<'_>> {
    for strategy in STRATEGIES {
        if let Some(tool) = tools.iter().find(|t| (strategy.matches)(&t.name)) {
            debug!(tool = %tool.name, rule = strategy.description, "capability resolved");
            return Some(Resolution {
                tool,
                rule: strategy.description,
            });
        }
    }
    None
}

/// Tier 1: exact canonical form, case-insensitive.
fn matches_canonical(name: &str) -> bool {
    name.eq_ignore_ascii_case(CANONICAL_CREATE_PAGE)
}

/// Tier 2: token-level creation verb and target noun, excluding modifier
/// tokens that denote comments, mutations, or a different target entity.
fn matches_create_tokens(name: &str) -> bool {
    let tokens = tokenize(name);
    let has_verb = tokens.iter().any(|t| CREATE_VERBS.contains(&t.as_str()));
    let has_noun = tokens.iter().any(|t| TARGET_NOUNS.contains(&t.as_str()));
    let has_excluded = tokens
        .iter()
        .any(|t| EXCLUDED_MODIFIERS.contains(&t.as_str()));
    has_verb && has_noun && !has_excluded
}

/// Tier 3: fixed alias list, case-insensitive exact match.
fn matches_alias(name: &str) -> bool {
    let lower = name.to_lowercase();
    KNOWN_ALIASES.contains(&lower.as_str())
}

/// Split a capability name into lowercase alphanumeric tokens.
///
/// `API-post-page`, `create_page`, and `createPage` all tokenize to forms
/// the tiers above can reason about.
fn tokenize(name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in name.chars() {
        if c.is_alphanumeric() {
            // A case flip starts a new token so camelCase splits too.
            if c.is_uppercase() && current.chars().last().is_some_and(|p| p.is_lowercase()) {
                tokens.push(std::mem::take(&mut current));
            }
            current.extend(c.to_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Nested rule flattening.
//!
//! A nested rule's selector is resolved against every alternative of its
//! parent's (already flattened) selector:
//!
//! ```css
//! .menu, .bar {
//!     &:hover { ... }      /* .menu:hover, .bar:hover */
//!     & > item { ... }     /* .menu > item, .bar > item */
//!     > item { ... }       /* same as above */
//!     item { ... }         /* .menu item, .bar item */
//! }
//! ```
//!
//! - `&` is replaced by the parent selector
//! - `&.class` appends to the parent's last compound selector
//! - `.x > &` grafts `.x >` onto the parent's first compound, so
//!   `.a .b { .x > & {} }` yields `.x > .a .b`
//! - Nested without `&` implies a descendant combinator
//!
//! Combinators always nest to the left, the same shape the parser builds.

use crate::selector::{CombinatorKind, Selector};

/// Resolves each child alternative against each parent alternative.
pub fn combine(parents: &[Selector], children: &[Selector]) -> Vec<Selector> {
    let mut combined = Vec::with_capacity(parents.len() * children.len());
    for parent in parents {
        for child in children {
            combined.push(if child.has_parent_reference() {
                substitute(child, parent)
            } else {
                prepend(child.clone(), CombinatorKind::Descendant, parent.clone())
            });
        }
    }
    combined
}

fn substitute(child: &Selector, parent: &Selector) -> Selector {
    match child {
        Selector::Parent => parent.clone(),
        Selector::Compound(parts) if parts.contains(&Selector::Parent) => {
            let extra = parts
                .iter()
                .filter(|s| **s != Selector::Parent)
                .cloned()
                .collect();
            append_to_last_compound(parent.clone(), extra)
        }
        Selector::Combinator { kind, left, right } => {
            prepend(substitute(right, parent), *kind, substitute(left, parent))
        }
        other => other.clone(),
    }
}

/// Merges `extra` simple selectors into the rightmost compound of `selector`.
fn append_to_last_compound(selector: Selector, mut extra: Vec<Selector>) -> Selector {
    match selector {
        Selector::Combinator { kind, left, right } => {
            Selector::combinator(kind, *left, append_to_last_compound(*right, extra))
        }
        Selector::Compound(mut parts) => {
            parts.append(&mut extra);
            Selector::Compound(parts)
        }
        simple => {
            extra.insert(0, simple);
            Selector::Compound(extra)
        }
    }
}

/// Joins `left` to the leftmost compound of `selector` with `kind`.
fn prepend(selector: Selector, kind: CombinatorKind, left: Selector) -> Selector {
    match selector {
        Selector::Combinator {
            kind: inner,
            left: first,
            right,
        } => Selector::combinator(inner, prepend(*first, kind, left), *right),
        other => Selector::combinator(kind, left, other),
    }
}

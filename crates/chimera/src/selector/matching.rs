//! Right-to-left selector matching.
//!
//! The rightmost compound of a selector is tested against the element first;
//! combinators then walk ancestors or previous siblings. Because combinators
//! nest to the left, a failing left side simply makes the walk try the next
//! candidate, which gives full backtracking for chains like `a b > c`.

use crate::dom::{DocumentTree, ElementFlags, ElementId};
use crate::selector::{CombinatorKind, PseudoClass, PseudoFunction, Selector};

/// Whether `selector` matches `element` in its current tree state.
///
/// Pure: reads the tree, never mutates it.
///
/// # Panics
///
/// On a [`Selector::Parent`] that was never resolved. Compiled stylesheets
/// and [`parse_selector`](crate::parse_selector) never produce one.
pub fn matches<T: DocumentTree + ?Sized>(selector: &Selector, tree: &T, element: ElementId) -> bool {
    match selector {
        Selector::MatchAll => true,
        Selector::TagName(name) => tree.tag_name(element) == name,
        Selector::Id(id) => tree.attribute(element, "id") == Some(id.as_str()),
        Selector::ClassName(class) => tree.has_class(element, class),
        Selector::Attribute { name, op, value } => match tree.attribute(element, name) {
            Some(actual) => value.as_deref().is_none_or(|expected| op.test(actual, expected)),
            None => false,
        },
        Selector::PseudoClass(pseudo) => matches_pseudo_class(*pseudo, tree, element),
        Selector::PseudoFunction(function) => matches_pseudo_function(function, tree, element),
        Selector::Parent => unreachable!("'&' survived nested rule flattening"),
        Selector::Compound(parts) => parts.iter().all(|part| matches(part, tree, element)),
        Selector::Combinator { kind, left, right } => {
            matches(right, tree, element) && matches_left(*kind, left, tree, element)
        }
        Selector::Group(alternatives) => alternatives.iter().any(|alt| matches(alt, tree, element)),
    }
}

fn matches_left<T: DocumentTree + ?Sized>(
    kind: CombinatorKind,
    left: &Selector,
    tree: &T,
    element: ElementId,
) -> bool {
    match kind {
        CombinatorKind::Descendant => tree.ancestors(element).any(|a| matches(left, tree, a)),
        CombinatorKind::Child => tree.parent(element).is_some_and(|p| matches(left, tree, p)),
        CombinatorKind::AdjacentSibling => tree
            .previous_sibling(element)
            .is_some_and(|s| matches(left, tree, s)),
        CombinatorKind::Sibling => previous_siblings(tree, element).any(|s| matches(left, tree, s)),
    }
}

fn previous_siblings<T: DocumentTree + ?Sized>(
    tree: &T,
    element: ElementId,
) -> impl Iterator<Item = ElementId> + '_ {
    std::iter::successors(tree.previous_sibling(element), move |&s| tree.previous_sibling(s))
}

fn next_siblings<T: DocumentTree + ?Sized>(
    tree: &T,
    element: ElementId,
) -> impl Iterator<Item = ElementId> + '_ {
    std::iter::successors(tree.next_sibling(element), move |&s| tree.next_sibling(s))
}

fn same_tag<T: DocumentTree + ?Sized>(tree: &T, a: ElementId, b: ElementId) -> bool {
    tree.tag_name(a) == tree.tag_name(b)
}

/// Only `button` elements carry an enabled state, read from the `enabled`
/// attribute: absent, empty or `"true"` is enabled, `"false"` is disabled.
fn enabled_state<T: DocumentTree + ?Sized>(tree: &T, element: ElementId) -> Option<bool> {
    if tree.tag_name(element) != "button" {
        return None;
    }
    match tree.attribute(element, "enabled") {
        None | Some("") | Some("true") => Some(true),
        Some("false") => Some(false),
        Some(_) => None,
    }
}

fn matches_pseudo_class<T: DocumentTree + ?Sized>(
    pseudo: PseudoClass,
    tree: &T,
    element: ElementId,
) -> bool {
    match pseudo {
        PseudoClass::Hover => tree.flags(element).contains(ElementFlags::HOVERED),
        PseudoClass::Active => tree.flags(element).contains(ElementFlags::ACTIVE),
        PseudoClass::Root => tree.flags(element).contains(ElementFlags::ROOT),
        PseudoClass::Enabled => enabled_state(tree, element) == Some(true),
        PseudoClass::Disabled => enabled_state(tree, element) == Some(false),
        PseudoClass::FirstChild => tree.previous_sibling(element).is_none(),
        PseudoClass::LastChild => tree.next_sibling(element).is_none(),
        PseudoClass::OnlyChild => {
            tree.previous_sibling(element).is_none() && tree.next_sibling(element).is_none()
        }
        PseudoClass::FirstOfType => {
            !previous_siblings(tree, element).any(|s| same_tag(tree, s, element))
        }
        PseudoClass::LastOfType => !next_siblings(tree, element).any(|s| same_tag(tree, s, element)),
        PseudoClass::OnlyOfType => {
            matches_pseudo_class(PseudoClass::FirstOfType, tree, element)
                && matches_pseudo_class(PseudoClass::LastOfType, tree, element)
        }
    }
}

fn matches_pseudo_function<T: DocumentTree + ?Sized>(
    function: &PseudoFunction,
    tree: &T,
    element: ElementId,
) -> bool {
    match function {
        PseudoFunction::NthChild { anb, of } | PseudoFunction::NthLastChild { anb, of } => {
            if let Some(of) = of {
                if !matches(of, tree, element) {
                    return false;
                }
            }
            let counted = |s: &ElementId| of.as_deref().is_none_or(|of| matches(of, tree, *s));
            let before = if matches!(function, PseudoFunction::NthChild { .. }) {
                previous_siblings(tree, element).filter(counted).count()
            } else {
                next_siblings(tree, element).filter(counted).count()
            };
            anb.matches(before + 1)
        }
        PseudoFunction::NthOfType(anb) => {
            let before = previous_siblings(tree, element)
                .filter(|s| same_tag(tree, *s, element))
                .count();
            anb.matches(before + 1)
        }
        PseudoFunction::NthLastOfType(anb) => {
            let after = next_siblings(tree, element)
                .filter(|s| same_tag(tree, *s, element))
                .count();
            anb.matches(after + 1)
        }
        PseudoFunction::Not(inner) => !matches(inner, tree, element),
        PseudoFunction::Is(inner) => matches(inner, tree, element),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::testing::TestTree;
    use crate::parse_selector;

    fn check(tree: &TestTree, selector: &str, element: ElementId) -> bool {
        let selector = parse_selector(selector).unwrap();
        matches(&selector, tree, element)
    }

    /// ```text
    /// root
    /// ├── div.box#main
    /// │   ├── p.a
    /// │   ├── span
    /// │   └── p.b
    /// └── button[enabled=false]
    /// ```
    fn sample() -> (TestTree, [ElementId; 6]) {
        let (mut tree, root) = TestTree::new("root");
        let div = tree.add(root, "div", &[("class", "box"), ("id", "main")]);
        let p1 = tree.add(div, "p", &[("class", "a")]);
        let span = tree.add(div, "span", &[]);
        let p2 = tree.add(div, "p", &[("class", "b")]);
        let button = tree.add(root, "button", &[("enabled", "false")]);
        (tree, [root, div, p1, span, p2, button])
    }

    #[test]
    fn test_simple_selectors() {
        let (tree, [_, div, p1, ..]) = sample();
        assert!(check(&tree, "div", div));
        assert!(check(&tree, "#main", div));
        assert!(check(&tree, ".box", div));
        assert!(check(&tree, "div.box#main", div));
        assert!(!check(&tree, "div.a", div));
        assert!(check(&tree, "*", p1));
        assert!(!check(&tree, "DIV", div));
    }

    #[test]
    fn test_combinators() {
        let (tree, [root, _, p1, span, p2, _]) = sample();
        assert!(check(&tree, "root p", p1));
        assert!(check(&tree, "div > p", p2));
        assert!(!check(&tree, "root > p", p1));
        assert!(check(&tree, "p + span", span));
        assert!(!check(&tree, "p + p", p2));
        assert!(check(&tree, "p ~ p", p2));
        assert!(check(&tree, ".a ~ .b", p2));
        assert!(!check(&tree, "span ~ .a", p1));
        assert!(!check(&tree, "div root", root));
    }

    #[test]
    fn test_descendant_backtracks() {
        // "root > div span" must not give up at the first ancestor that matches "div"
        let (mut tree, root) = TestTree::new("root");
        let outer = tree.add(root, "div", &[]);
        let inner = tree.add(outer, "div", &[]);
        let span = tree.add(inner, "span", &[]);
        assert!(check(&tree, "root > div span", span));
        assert!(check(&tree, "root > div > div > span", span));
        assert!(!check(&tree, "root > div > span", span));
    }

    #[test]
    fn test_structural_pseudo_classes() {
        let (tree, [root, div, p1, span, p2, button]) = sample();
        assert!(check(&tree, ":root", root));
        assert!(!check(&tree, ":root", div));
        assert!(check(&tree, "p:first-child", p1));
        assert!(check(&tree, "p:last-child", p2));
        assert!(!check(&tree, ":only-child", p1));
        assert!(check(&tree, "span:only-of-type", span));
        assert!(check(&tree, "p:first-of-type", p1));
        assert!(check(&tree, "p:last-of-type", p2));
        assert!(!check(&tree, "p:last-of-type", p1));
        assert!(check(&tree, "button:disabled", button));
        assert!(!check(&tree, ":enabled", div));
    }

    #[test]
    fn test_enabled_attribute_values() {
        let (mut tree, root) = TestTree::new("root");
        let button = tree.add(root, "button", &[]);
        assert!(check(&tree, ":enabled", button));
        tree.set_attribute(button, "enabled", "");
        assert!(check(&tree, ":enabled", button));
        tree.set_attribute(button, "enabled", "false");
        assert!(check(&tree, ":disabled", button));
        tree.set_attribute(button, "enabled", "maybe");
        assert!(!check(&tree, ":enabled", button));
        assert!(!check(&tree, ":disabled", button));
    }

    #[test]
    fn test_state_flags() {
        let (mut tree, [_, div, ..]) = sample();
        assert!(!check(&tree, "div:hover", div));
        tree.set_flags(div, ElementFlags::HOVERED);
        assert!(check(&tree, "div:hover", div));
        assert!(!check(&tree, "div:active", div));
    }

    #[test]
    fn test_nth_child() {
        let (mut tree, root) = TestTree::new("ul");
        let items: Vec<ElementId> = (0..6).map(|_| tree.add(root, "li", &[])).collect();
        let indices = |tree: &TestTree, selector: &str| -> Vec<usize> {
            items
                .iter()
                .enumerate()
                .filter(|(_, el)| check(tree, selector, **el))
                .map(|(i, _)| i + 1)
                .collect()
        };
        assert_eq!(indices(&tree, ":nth-child(2n+1)"), vec![1, 3, 5]);
        assert_eq!(indices(&tree, ":nth-child(even)"), indices(&tree, ":nth-child(2n)"));
        assert_eq!(indices(&tree, ":nth-child(odd)"), vec![1, 3, 5]);
        assert_eq!(indices(&tree, ":nth-child(0)"), Vec::<usize>::new());
        assert_eq!(indices(&tree, ":nth-child(3)"), vec![3]);
        assert_eq!(indices(&tree, ":nth-child(-n+2)"), vec![1, 2]);
        assert_eq!(indices(&tree, ":nth-last-child(1)"), vec![6]);
        assert_eq!(indices(&tree, ":nth-last-child(2n)"), vec![1, 3, 5]);
    }

    #[test]
    fn test_nth_child_of_selector() {
        let (mut tree, root) = TestTree::new("ul");
        let a1 = tree.add(root, "li", &[("class", "x")]);
        let b1 = tree.add(root, "li", &[]);
        let a2 = tree.add(root, "li", &[("class", "x")]);
        let a3 = tree.add(root, "li", &[("class", "x")]);
        assert!(check(&tree, ":nth-child(1 of .x)", a1));
        assert!(check(&tree, ":nth-child(2 of .x)", a2));
        assert!(!check(&tree, ":nth-child(2 of .x)", b1));
        assert!(check(&tree, ":nth-last-child(1 of .x)", a3));
        assert!(check(&tree, ":nth-child(2)", b1));
    }

    #[test]
    fn test_nth_of_type() {
        let (tree, [_, _, p1, span, p2, _]) = sample();
        assert!(check(&tree, "p:nth-of-type(2)", p2));
        assert!(check(&tree, ":nth-of-type(1)", span));
        assert!(check(&tree, ":nth-last-of-type(2)", p1));
    }

    #[test]
    fn test_not_and_is() {
        let (tree, [_, div, p1, span, p2, _]) = sample();
        assert!(check(&tree, "p:not(.a)", p2));
        assert!(!check(&tree, "p:not(.a)", p1));
        assert!(check(&tree, ":is(span, .b)", span));
        assert!(check(&tree, ":is(span, .b)", p2));
        assert!(!check(&tree, ":is(span, .b)", div));
    }

    #[test]
    fn test_attributes() {
        let (mut tree, root) = TestTree::new("root");
        let el = tree.add(root, "input", &[("type", "text"), ("lang", "en-GB")]);
        assert!(check(&tree, "[type]", el));
        assert!(check(&tree, "[type=text]", el));
        assert!(check(&tree, "[type=\"text\"]", el));
        assert!(!check(&tree, "[type=radio]", el));
        assert!(check(&tree, "[lang|=en]", el));
        assert!(check(&tree, "[type^=te]", el));
        assert!(!check(&tree, "[missing]", el));
    }

    #[test]
    fn test_matching_is_repeatable() {
        let (tree, [_, _, _, _, p2, _]) = sample();
        let selector = parse_selector("div > p ~ p:last-child").unwrap();
        let first = matches(&selector, &tree, p2);
        assert!((0..10).all(|_| matches(&selector, &tree, p2) == first));
    }

    #[test]
    fn test_detached_element_loses_structure() {
        let (mut tree, [_, _, _, span, ..]) = sample();
        assert!(check(&tree, "div > span", span));
        tree.detach(span);
        assert!(!check(&tree, "div > span", span));
        assert!(check(&tree, "span:only-child", span));
    }
}

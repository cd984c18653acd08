//! Arena storage for elements.
//!
//! [`ElementTree`] owns every element ever created in a document, attached
//! or not, and keeps the intrusive parent/child/sibling links consistent.
//! Element ids are arena indices and stay valid for the life of the tree.

use chimera::dom::{DocumentTree, ElementFlags, ElementId};

use crate::error::DomError;

#[derive(Debug)]
struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    flags: ElementFlags,
    parent: Option<ElementId>,
    first_child: Option<ElementId>,
    last_child: Option<ElementId>,
    prev_sibling: Option<ElementId>,
    next_sibling: Option<ElementId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: Vec::new(),
            flags: ElementFlags::empty(),
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ElementTree {
    elements: Vec<Element>,
}

impl ElementTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached element.
    pub fn create(&mut self, tag: &str) -> ElementId {
        let id = ElementId(self.elements.len());
        self.elements.push(Element::new(tag));
        id
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, element: ElementId) -> bool {
        element.0 < self.elements.len()
    }

    /// Fails with [`DomError::UnknownElement`] for ids this tree never issued.
    pub fn check(&self, element: ElementId) -> Result<(), DomError> {
        if self.contains(element) {
            Ok(())
        } else {
            Err(DomError::UnknownElement(element))
        }
    }

    /// The child at `index`, counting from the first child.
    pub fn child_at(&self, parent: ElementId, index: usize) -> Result<ElementId, DomError> {
        self.check(parent)?;
        self.children(parent).nth(index).ok_or_else(|| DomError::IndexOutOfRange {
            index,
            len: self.child_count(parent),
        })
    }

    pub fn child_count(&self, parent: ElementId) -> usize {
        self.children(parent).count()
    }

    /// Position of `element` among its siblings.
    pub fn index_of(&self, element: ElementId) -> usize {
        let mut index = 0;
        let mut current = element;
        while let Some(previous) = self.elements[current.0].prev_sibling {
            index += 1;
            current = previous;
        }
        index
    }

    /// Whether `ancestor` is `element` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: ElementId, element: ElementId) -> bool {
        ancestor == element || self.ancestors(element).any(|a| a == ancestor)
    }

    // =========================================================================
    // Links
    // =========================================================================

    /// Links a detached `child` under `parent`, before `reference` or last.
    pub(crate) fn link(&mut self, parent: ElementId, child: ElementId, reference: Option<ElementId>) {
        let prev = match reference {
            Some(reference) => self.elements[reference.0].prev_sibling,
            None => self.elements[parent.0].last_child,
        };

        {
            let node = &mut self.elements[child.0];
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = reference;
        }

        match prev {
            Some(prev) => self.elements[prev.0].next_sibling = Some(child),
            None => self.elements[parent.0].first_child = Some(child),
        }
        match reference {
            Some(reference) => self.elements[reference.0].prev_sibling = Some(child),
            None => self.elements[parent.0].last_child = Some(child),
        }
    }

    /// Unlinks `child` from its parent. Its own subtree stays intact.
    pub(crate) fn unlink(&mut self, child: ElementId) -> Option<ElementId> {
        let node = &mut self.elements[child.0];
        let parent = node.parent.take()?;
        let (prev, next) = (node.prev_sibling.take(), node.next_sibling.take());

        match prev {
            Some(prev) => self.elements[prev.0].next_sibling = next,
            None => self.elements[parent.0].first_child = next,
        }
        match next {
            Some(next) => self.elements[next.0].prev_sibling = prev,
            None => self.elements[parent.0].last_child = prev,
        }
        Some(parent)
    }

    // =========================================================================
    // Attributes and state
    // =========================================================================

    /// Sets an attribute and returns its previous value.
    pub(crate) fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) -> Option<String> {
        let attributes = &mut self.elements[element.0].attributes;
        match attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value.to_string())),
            None => {
                attributes.push((name.to_string(), value.to_string()));
                None
            }
        }
    }

    /// Removes an attribute and returns its previous value.
    pub(crate) fn remove_attribute(&mut self, element: ElementId, name: &str) -> Option<String> {
        let attributes = &mut self.elements[element.0].attributes;
        let position = attributes.iter().position(|(k, _)| k == name)?;
        Some(attributes.remove(position).1)
    }

    /// Sets or clears `flag`. Returns whether anything changed.
    pub(crate) fn set_flag(&mut self, element: ElementId, flag: ElementFlags, on: bool) -> bool {
        let flags = &mut self.elements[element.0].flags;
        let before = *flags;
        flags.set(flag, on);
        before != *flags
    }

    pub fn attributes(&self, element: ElementId) -> impl Iterator<Item = (&str, &str)> {
        self.elements[element.0]
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl DocumentTree for ElementTree {
    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.elements[element.0].parent
    }

    fn first_child(&self, element: ElementId) -> Option<ElementId> {
        self.elements[element.0].first_child
    }

    fn previous_sibling(&self, element: ElementId) -> Option<ElementId> {
        self.elements[element.0].prev_sibling
    }

    fn next_sibling(&self, element: ElementId) -> Option<ElementId> {
        self.elements[element.0].next_sibling
    }

    fn tag_name(&self, element: ElementId) -> &str {
        &self.elements[element.0].tag
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<&str> {
        self.elements[element.0]
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn flags(&self, element: ElementId) -> ElementFlags {
        self.elements[element.0].flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_children(count: usize) -> (ElementTree, ElementId, Vec<ElementId>) {
        let mut tree = ElementTree::new();
        let root = tree.create("root");
        let children: Vec<_> = (0..count).map(|_| tree.create("item")).collect();
        for &child in &children {
            tree.link(root, child, None);
        }
        (tree, root, children)
    }

    #[test]
    fn test_link_appends_and_inserts() {
        let (mut tree, root, children) = tree_with_children(2);
        let first = tree.create("first");
        tree.link(root, first, Some(children[0]));

        assert_eq!(tree.children(root).collect::<Vec<_>>(), [first, children[0], children[1]]);
        assert_eq!(tree.previous_sibling(children[0]), Some(first));
        assert_eq!(tree.index_of(children[1]), 2);
        assert_eq!(tree.child_at(root, 0), Ok(first));
    }

    #[test]
    fn test_unlink_repairs_links() {
        let (mut tree, root, children) = tree_with_children(3);
        assert_eq!(tree.unlink(children[1]), Some(root));
        assert_eq!(tree.unlink(children[1]), None);

        assert_eq!(tree.next_sibling(children[0]), Some(children[2]));
        assert_eq!(tree.previous_sibling(children[2]), Some(children[0]));

        tree.unlink(children[2]);
        tree.unlink(children[0]);
        assert_eq!(tree.first_child(root), None);
        assert_eq!(tree.child_count(root), 0);
    }

    #[test]
    fn test_child_at_out_of_range() {
        let (tree, root, _) = tree_with_children(2);
        assert_eq!(tree.child_at(root, 5), Err(DomError::IndexOutOfRange { index: 5, len: 2 }));
        assert_eq!(
            tree.child_at(ElementId(99), 0),
            Err(DomError::UnknownElement(ElementId(99)))
        );
    }

    #[test]
    fn test_attributes_return_previous_values() {
        let mut tree = ElementTree::new();
        let el = tree.create("div");
        assert_eq!(tree.set_attribute(el, "class", "a"), None);
        assert_eq!(tree.set_attribute(el, "class", "b"), Some("a".to_string()));
        assert_eq!(tree.attribute(el, "class"), Some("b"));
        assert_eq!(tree.remove_attribute(el, "class"), Some("b".to_string()));
        assert_eq!(tree.remove_attribute(el, "class"), None);
    }

    #[test]
    fn test_flags() {
        let mut tree = ElementTree::new();
        let el = tree.create("button");
        assert!(tree.set_flag(el, ElementFlags::HOVERED, true));
        assert!(!tree.set_flag(el, ElementFlags::HOVERED, true));
        assert!(tree.flags(el).contains(ElementFlags::HOVERED));
        assert!(tree.set_flag(el, ElementFlags::HOVERED, false));
    }
}

//! The document boundary seen by the style engine.
//!
//! Chimera never owns or mutates a document. Hosts implement [`DocumentTree`]
//! for their own element storage and hand `&impl DocumentTree` to the matcher
//! and to [`StyleSystem`](crate::cascade::StyleSystem) queries.

use bitflags::bitflags;

bitflags! {
    /// Transient per-element state maintained by the host.
    ///
    /// ```
    /// use chimera::dom::ElementFlags;
    ///
    /// let mut flags = ElementFlags::empty();
    /// flags |= ElementFlags::HOVERED;
    /// assert!(flags.contains(ElementFlags::HOVERED));
    /// assert!(!flags.contains(ElementFlags::ACTIVE));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ElementFlags: u8 {
        /// Pointer is over the element
        const HOVERED = 0b0000_0001;
        /// Element is being pressed
        const ACTIVE  = 0b0000_0010;
        /// Element is the document root
        const ROOT    = 0b0000_0100;
    }
}

/// Opaque identity of an element inside one document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

/// Read-only view of a tree-structured document.
pub trait DocumentTree {
    fn parent(&self, element: ElementId) -> Option<ElementId>;
    fn first_child(&self, element: ElementId) -> Option<ElementId>;
    fn previous_sibling(&self, element: ElementId) -> Option<ElementId>;
    fn next_sibling(&self, element: ElementId) -> Option<ElementId>;
    fn tag_name(&self, element: ElementId) -> &str;
    fn attribute(&self, element: ElementId, name: &str) -> Option<&str>;
    fn flags(&self, element: ElementId) -> ElementFlags;

    /// Whether the element's class list contains `class`.
    ///
    /// The default splits the `class` attribute on whitespace.
    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.attribute(element, "class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }

    fn children(&self, element: ElementId) -> Children<'_, Self> {
        Children {
            tree: self,
            next: self.first_child(element),
        }
    }

    /// All strict descendants in document order.
    fn descendants(&self, element: ElementId) -> Descendants<'_, Self> {
        Descendants {
            tree: self,
            root: element,
            next: self.first_child(element),
        }
    }

    /// Strict ancestors, nearest first.
    fn ancestors(&self, element: ElementId) -> Ancestors<'_, Self> {
        Ancestors {
            tree: self,
            next: self.parent(element),
        }
    }
}

pub struct Children<'a, T: ?Sized> {
    tree: &'a T,
    next: Option<ElementId>,
}

impl<T: DocumentTree + ?Sized> Iterator for Children<'_, T> {
    type Item = ElementId;

    fn next(&mut self) -> Option<ElementId> {
        let current = self.next?;
        self.next = self.tree.next_sibling(current);
        Some(current)
    }
}

pub struct Ancestors<'a, T: ?Sized> {
    tree: &'a T,
    next: Option<ElementId>,
}

impl<T: DocumentTree + ?Sized> Iterator for Ancestors<'_, T> {
    type Item = ElementId;

    fn next(&mut self) -> Option<ElementId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// Pre-order walk below a root element, excluding the root itself.
pub struct Descendants<'a, T: ?Sized> {
    tree: &'a T,
    root: ElementId,
    next: Option<ElementId>,
}

impl<T: DocumentTree + ?Sized> Iterator for Descendants<'_, T> {
    type Item = ElementId;

    fn next(&mut self) -> Option<ElementId> {
        let current = self.next?;
        self.next = match self.tree.first_child(current) {
            Some(child) => Some(child),
            None => {
                let mut node = current;
                loop {
                    if node == self.root {
                        break None;
                    }
                    if let Some(sibling) = self.tree.next_sibling(node) {
                        break Some(sibling);
                    }
                    match self.tree.parent(node) {
                        Some(parent) => node = parent,
                        None => break None,
                    }
                }
            }
        };
        Some(current)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Minimal vector-backed tree for unit tests.

    use super::*;

    struct TestNode {
        tag: String,
        attributes: Vec<(String, String)>,
        parent: Option<ElementId>,
        children: Vec<ElementId>,
        flags: ElementFlags,
    }

    pub(crate) struct TestTree {
        nodes: Vec<TestNode>,
    }

    impl TestTree {
        pub(crate) fn new(root_tag: &str) -> (Self, ElementId) {
            let root = TestNode {
                tag: root_tag.to_string(),
                attributes: Vec::new(),
                parent: None,
                children: Vec::new(),
                flags: ElementFlags::ROOT,
            };
            (Self { nodes: vec![root] }, ElementId(0))
        }

        pub(crate) fn add(&mut self, parent: ElementId, tag: &str, attributes: &[(&str, &str)]) -> ElementId {
            let id = ElementId(self.nodes.len());
            self.nodes.push(TestNode {
                tag: tag.to_string(),
                attributes: attributes
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                parent: Some(parent),
                children: Vec::new(),
                flags: ElementFlags::empty(),
            });
            self.nodes[parent.0].children.push(id);
            id
        }

        pub(crate) fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
            let attributes = &mut self.nodes[element.0].attributes;
            match attributes.iter_mut().find(|(k, _)| k == name) {
                Some(entry) => entry.1 = value.to_string(),
                None => attributes.push((name.to_string(), value.to_string())),
            }
        }

        pub(crate) fn set_flags(&mut self, element: ElementId, flags: ElementFlags) {
            self.nodes[element.0].flags = flags;
        }

        pub(crate) fn detach(&mut self, element: ElementId) {
            if let Some(parent) = self.nodes[element.0].parent.take() {
                self.nodes[parent.0].children.retain(|&c| c != element);
            }
        }

        fn sibling(&self, element: ElementId, offset: isize) -> Option<ElementId> {
            let parent = self.nodes[element.0].parent?;
            let siblings = &self.nodes[parent.0].children;
            let index = siblings.iter().position(|&c| c == element)?;
            siblings.get(index.checked_add_signed(offset)?).copied()
        }
    }

    impl DocumentTree for TestTree {
        fn parent(&self, element: ElementId) -> Option<ElementId> {
            self.nodes[element.0].parent
        }

        fn first_child(&self, element: ElementId) -> Option<ElementId> {
            self.nodes[element.0].children.first().copied()
        }

        fn previous_sibling(&self, element: ElementId) -> Option<ElementId> {
            self.sibling(element, -1)
        }

        fn next_sibling(&self, element: ElementId) -> Option<ElementId> {
            self.sibling(element, 1)
        }

        fn tag_name(&self, element: ElementId) -> &str {
            &self.nodes[element.0].tag
        }

        fn attribute(&self, element: ElementId, name: &str) -> Option<&str> {
            self.nodes[element.0]
                .attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        }

        fn flags(&self, element: ElementId) -> ElementFlags {
            self.nodes[element.0].flags
        }
    }
}

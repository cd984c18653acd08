//! A document whose styles stay live while it is edited.
//!
//! [`Document`] pairs an [`ElementTree`] with a [`StyleSystem`]. Every
//! mutation goes through the document, which applies it to the tree and then
//! forwards the matching signal to the style system, so queries never see
//! stale styles.

use std::sync::Arc;

use chimera::compiler::{CompileOptions, compile};
use chimera::diagnostics::{Diagnostic, Diagnostics};
use chimera::dom::{DocumentTree, ElementFlags, ElementId};
use chimera::selector::matching;
use chimera::stylesheet::Rule;
use chimera::{PropertySet, StyleSystem, Stylesheet};

use crate::error::DomError;
use crate::tree::ElementTree;

#[derive(Debug)]
pub struct Document {
    tree: ElementTree,
    styles: StyleSystem,
    root: ElementId,
}

impl Document {
    /// Creates a document with a single root element and the engine-default
    /// stylesheet.
    pub fn new(root_tag: &str) -> Self {
        Self::with_style_system(root_tag, StyleSystem::new())
    }

    pub fn with_style_system(root_tag: &str, styles: StyleSystem) -> Self {
        let mut tree = ElementTree::new();
        let root = tree.create(root_tag);
        tree.set_flag(root, ElementFlags::ROOT, true);
        Self { tree, styles, root }
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn styles(&self) -> &StyleSystem {
        &self.styles
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Creates a detached element. Attach it with [`append_child`](Self::append_child)
    /// or [`insert_child`](Self::insert_child).
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        self.tree.create(tag)
    }

    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        self.detach_from_parent(child);
        self.attach(parent, child, None);
        Ok(())
    }

    /// Inserts `child` so that it ends up at `index` among `parent`'s
    /// children. A child that is already attached is moved; `index` counts
    /// siblings after it has been taken out.
    pub fn insert_child(&mut self, parent: ElementId, index: usize, child: ElementId) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        self.detach_from_parent(child);

        let len = self.tree.child_count(parent);
        let reference = match index {
            i if i < len => Some(self.tree.child_at(parent, i)?),
            i if i == len => None,
            _ => return Err(DomError::IndexOutOfRange { index, len }),
        };
        self.attach(parent, child, reference);
        Ok(())
    }

    /// Removes and returns the child at `index`. The removed element keeps its
    /// subtree and can be attached again.
    pub fn remove_child(&mut self, parent: ElementId, index: usize) -> Result<ElementId, DomError> {
        let child = self.tree.child_at(parent, index)?;
        self.detach_from_parent(child);
        Ok(child)
    }

    /// Takes `element` out of its parent, if it has one.
    pub fn detach(&mut self, element: ElementId) -> Result<(), DomError> {
        self.tree.check(element)?;
        self.detach_from_parent(element);
        Ok(())
    }

    fn check_insert(&self, parent: ElementId, child: ElementId) -> Result<(), DomError> {
        self.tree.check(parent)?;
        self.tree.check(child)?;
        if self.tree.is_inclusive_ancestor(child, parent) {
            return Err(DomError::CycleInsert { parent, child });
        }
        Ok(())
    }

    fn attach(&mut self, parent: ElementId, child: ElementId, reference: Option<ElementId>) {
        self.tree.link(parent, child, reference);
        log::trace!(
            "inserted <{}> {:?} under {:?} at {}",
            self.tree.tag_name(child),
            child,
            parent,
            self.tree.index_of(child)
        );
        self.styles.child_inserted(&self.tree, parent, child);
    }

    fn detach_from_parent(&mut self, child: ElementId) {
        if let Some(parent) = self.tree.unlink(child) {
            log::trace!("removed {:?} from {:?}", child, parent);
            self.styles.child_removed(&self.tree, parent, child);
        }
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    pub fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) -> Result<(), DomError> {
        self.tree.check(element)?;
        let old = self.tree.set_attribute(element, name, value);
        self.styles
            .attribute_changed(&self.tree, element, name, old.as_deref(), Some(value));
        Ok(())
    }

    pub fn remove_attribute(&mut self, element: ElementId, name: &str) -> Result<Option<String>, DomError> {
        self.tree.check(element)?;
        let old = self.tree.remove_attribute(element, name);
        if old.is_some() {
            self.styles
                .attribute_changed(&self.tree, element, name, old.as_deref(), None);
        }
        Ok(old)
    }

    /// Sets the inline `style` declarations of `element`.
    pub fn set_style(&mut self, element: ElementId, declarations: &str) -> Result<(), DomError> {
        self.set_attribute(element, "style", declarations)
    }

    /// Replaces the whole class list.
    pub fn set_class_name(&mut self, element: ElementId, classes: &str) -> Result<(), DomError> {
        self.tree.check(element)?;
        let old = self.tree.set_attribute(element, "class", classes);
        if old.as_deref() != Some(classes) {
            self.styles.class_list_changed(&self.tree, element);
        }
        Ok(())
    }

    /// Adds `class` unless present. Returns whether the list changed.
    pub fn add_class(&mut self, element: ElementId, class: &str) -> Result<bool, DomError> {
        self.tree.check(element)?;
        if self.tree.has_class(element, class) {
            return Ok(false);
        }
        let mut classes: Vec<&str> = self
            .tree
            .attribute(element, "class")
            .map(|list| list.split_whitespace().collect())
            .unwrap_or_default();
        classes.push(class);
        let list = classes.join(" ");
        self.tree.set_attribute(element, "class", &list);
        self.styles.class_list_changed(&self.tree, element);
        Ok(true)
    }

    /// Removes every occurrence of `class`. Returns whether the list changed.
    pub fn remove_class(&mut self, element: ElementId, class: &str) -> Result<bool, DomError> {
        self.tree.check(element)?;
        if !self.tree.has_class(element, class) {
            return Ok(false);
        }
        let list = self
            .tree
            .attribute(element, "class")
            .map(|list| {
                list.split_whitespace()
                    .filter(|c| *c != class)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();
        self.tree.set_attribute(element, "class", &list);
        self.styles.class_list_changed(&self.tree, element);
        Ok(true)
    }

    // =========================================================================
    // Pseudo-states
    // =========================================================================

    pub fn set_hovered(&mut self, element: ElementId, hovered: bool) -> Result<(), DomError> {
        self.set_state(element, ElementFlags::HOVERED, hovered)
    }

    pub fn set_active(&mut self, element: ElementId, active: bool) -> Result<(), DomError> {
        self.set_state(element, ElementFlags::ACTIVE, active)
    }

    fn set_state(&mut self, element: ElementId, flag: ElementFlags, on: bool) -> Result<(), DomError> {
        self.tree.check(element)?;
        if self.tree.set_flag(element, flag, on) {
            self.styles.pseudo_state_changed(&self.tree, element, flag);
        }
        Ok(())
    }

    // =========================================================================
    // Stylesheets
    // =========================================================================

    pub fn add_stylesheet(&mut self, sheet: Arc<Stylesheet>) {
        self.styles.add_stylesheet(sheet);
    }

    /// Compiles `source` and attaches the result, even when it has
    /// diagnostics. Returns the sheet's generation with the diagnostics.
    pub fn load_stylesheet(&mut self, name: &str, source: &str) -> (u64, Diagnostics) {
        let compilation = compile(source, &CompileOptions::new(name));
        for diagnostic in &compilation.diagnostics {
            log::debug!("{}", diagnostic);
        }
        let generation = compilation.stylesheet.generation();
        self.styles.add_stylesheet(Arc::new(compilation.stylesheet));
        (generation, compilation.diagnostics)
    }

    pub fn remove_stylesheet(&mut self, generation: u64) -> Option<Arc<Stylesheet>> {
        self.styles.remove_stylesheet(generation)
    }

    // =========================================================================
    // Style queries
    // =========================================================================

    /// Cascaded rules with the inline style on top.
    pub fn current_style(&mut self, element: ElementId) -> Result<&PropertySet, DomError> {
        self.tree.check(element)?;
        Ok(self.styles.current_style(&self.tree, element))
    }

    /// Cascaded rules only.
    pub fn cascaded_style(&mut self, element: ElementId) -> Result<&PropertySet, DomError> {
        self.tree.check(element)?;
        Ok(self.styles.cascaded_style(&self.tree, element))
    }

    pub fn inline_style(&mut self, element: ElementId) -> Result<&PropertySet, DomError> {
        self.tree.check(element)?;
        Ok(self.styles.inline_style(&self.tree, element))
    }

    pub fn matches(&self, element: ElementId, selector: &str) -> Result<bool, DomError> {
        self.tree.check(element)?;
        Ok(self.styles.matches(&self.tree, element, selector)?)
    }

    /// Every element from the root down, in document order, that matches
    /// `selector`.
    pub fn select(&self, selector: &str) -> Result<Vec<ElementId>, DomError> {
        let selector = chimera::parse_selector(selector)?;
        Ok(std::iter::once(self.root)
            .chain(self.tree.descendants(self.root))
            .filter(|&element| matching::matches(&selector, &self.tree, element))
            .collect())
    }

    pub fn query_rules(&self) -> Vec<&Rule> {
        self.styles.query_rules()
    }

    /// Diagnostics raised while compiling inline styles since the last call.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.styles.take_diagnostics()
    }
}

impl DocumentTree for Document {
    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.tree.parent(element)
    }

    fn first_child(&self, element: ElementId) -> Option<ElementId> {
        self.tree.first_child(element)
    }

    fn previous_sibling(&self, element: ElementId) -> Option<ElementId> {
        self.tree.previous_sibling(element)
    }

    fn next_sibling(&self, element: ElementId) -> Option<ElementId> {
        self.tree.next_sibling(element)
    }

    fn tag_name(&self, element: ElementId) -> &str {
        self.tree.tag_name(element)
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<&str> {
        self.tree.attribute(element, name)
    }

    fn flags(&self, element: ElementId) -> ElementFlags {
        self.tree.flags(element)
    }
}

//! The Style Object Model: per-element cascaded styles, kept lazily up to
//! date as the document changes.
//!
//! ## States
//!
//! Every element is in one of three states, see [`NodeState`]:
//!
//! - `Absent`: never queried, or detached. The first query resolves it.
//! - `Clean`: the cached style is current. Queries are cache hits.
//! - `Dirty`: a mutation may have changed which rules match. The next query
//!   resolves it again; nothing is recomputed eagerly.
//!
//! ## Resolution
//!
//! 1. Collect every rule of every attached sheet (engine default first) whose
//!    selector matches the element
//! 2. Sort by origin, then specificity, then sheet position and declaration
//!    order
//! 3. Merge the property sets in that order; later entries win unless an
//!    earlier one is `!important`
//! 4. Overlay the element's inline `style` declarations, which always win

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::compiler::{CompileOptions, compile, compile_inline};
use crate::diagnostics::Diagnostic;
use crate::dom::{DocumentTree, ElementFlags, ElementId};
use crate::error::ChimeraError;
use crate::eval::{BUILTINS, FunctionRegistry};
use crate::properties::PropertySet;
use crate::selector::{self, StatePseudos};
use crate::stylesheet::{Origin, Rule, Stylesheet};

const DEFAULT_STYLES: &str = include_str!("default.scss");

/// The engine-default stylesheet, compiled once per process.
pub static DEFAULT_SHEET: Lazy<Arc<Stylesheet>> = Lazy::new(|| {
    let options = CompileOptions::new("default.scss").origin(Origin::Default);
    let compilation = compile(DEFAULT_STYLES, &options);
    for diagnostic in &compilation.diagnostics {
        log::warn!("{}", diagnostic);
    }
    Arc::new(compilation.stylesheet)
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeState {
    Absent,
    Clean,
    Dirty,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StyleStats {
    /// Full cascade resolutions performed.
    pub resolutions: usize,
    /// Queries answered from the cache.
    pub cache_hits: usize,
}

#[derive(Debug)]
struct StyleNode {
    dirty: bool,
    /// Rules only.
    cascaded: PropertySet,
    /// Rules with the inline set on top.
    current: PropertySet,
    inline: Arc<PropertySet>,
    /// The `style` text `inline` was compiled from.
    inline_source: String,
}

/// Computes and caches the styles of one document's elements.
///
/// The system never holds the document; every call that needs the tree takes
/// it as an argument. Hosts forward their mutation signals through
/// [`attribute_changed`](Self::attribute_changed) and friends.
#[derive(Debug)]
pub struct StyleSystem {
    default_sheet: Arc<Stylesheet>,
    sheets: Vec<Arc<Stylesheet>>,
    state_pseudos: StatePseudos,
    functions: Arc<FunctionRegistry>,
    nodes: HashMap<ElementId, StyleNode>,
    inline_diagnostics: Vec<Diagnostic>,
    stats: StyleStats,
}

impl Default for StyleSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleSystem {
    pub fn new() -> Self {
        Self::with_default_sheet(Arc::clone(&DEFAULT_SHEET))
    }

    /// Uses `sheet` in place of the engine-default stylesheet.
    pub fn with_default_sheet(sheet: Arc<Stylesheet>) -> Self {
        Self {
            state_pseudos: sheet.state_pseudos(),
            default_sheet: sheet,
            sheets: Vec::new(),
            functions: Arc::clone(&BUILTINS),
            nodes: HashMap::new(),
            inline_diagnostics: Vec::new(),
            stats: StyleStats::default(),
        }
    }

    /// Functions available to inline `style` declarations.
    pub fn set_functions(&mut self, functions: Arc<FunctionRegistry>) {
        self.functions = functions;
        self.invalidate_all();
    }

    // ------------------------------------------------------------------
    // Stylesheets
    // ------------------------------------------------------------------

    pub fn add_stylesheet(&mut self, sheet: Arc<Stylesheet>) {
        log::debug!(
            "attaching stylesheet '{}' (generation {})",
            sheet.name(),
            sheet.generation()
        );
        self.sheets.push(sheet);
        self.sheets_changed();
    }

    /// Detaches the sheet with `generation`. Returns it if it was attached.
    pub fn remove_stylesheet(&mut self, generation: u64) -> Option<Arc<Stylesheet>> {
        let position = self.sheets.iter().position(|s| s.generation() == generation)?;
        let sheet = self.sheets.remove(position);
        self.sheets_changed();
        Some(sheet)
    }

    /// The default sheet followed by attached sheets in attach order.
    pub fn stylesheets(&self) -> impl Iterator<Item = &Arc<Stylesheet>> {
        std::iter::once(&self.default_sheet).chain(self.sheets.iter())
    }

    fn sheets_changed(&mut self) {
        self.state_pseudos = self
            .stylesheets()
            .fold(StatePseudos::empty(), |acc, sheet| acc | sheet.state_pseudos());
        self.invalidate_all();
    }

    /// Every rule of every sheet, in cascade order of sheets.
    pub fn query_rules(&self) -> Vec<&Rule> {
        self.stylesheets().flat_map(|sheet| sheet.rules()).collect()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The cascaded style with the inline style on top.
    pub fn current_style<T>(&mut self, tree: &T, element: ElementId) -> &PropertySet
    where
        T: DocumentTree + ?Sized,
    {
        &self.node(tree, element).current
    }

    /// The style from stylesheet rules alone.
    pub fn cascaded_style<T>(&mut self, tree: &T, element: ElementId) -> &PropertySet
    where
        T: DocumentTree + ?Sized,
    {
        &self.node(tree, element).cascaded
    }

    /// The element's own `style` declarations.
    pub fn inline_style<T>(&mut self, tree: &T, element: ElementId) -> &PropertySet
    where
        T: DocumentTree + ?Sized,
    {
        &self.node(tree, element).inline
    }

    /// The rules matching `element`, lowest priority first.
    pub fn matching_rules<T>(&self, tree: &T, element: ElementId) -> Vec<&Rule>
    where
        T: DocumentTree + ?Sized,
    {
        let mut matched = Vec::new();
        for (position, sheet) in self.stylesheets().enumerate() {
            for rule in sheet.rules() {
                if selector::matches(&rule.selector, tree, element) {
                    matched.push((sheet.origin(), rule.specificity, position, rule.index, rule));
                }
            }
        }
        matched.sort_by_key(|&(origin, specificity, position, index, _)| {
            (origin, specificity, position, index)
        });
        matched.into_iter().map(|(.., rule)| rule).collect()
    }

    /// Tests `element` against selector text.
    pub fn matches<T>(&self, tree: &T, element: ElementId, selector: &str) -> Result<bool, ChimeraError>
    where
        T: DocumentTree + ?Sized,
    {
        let selector = crate::parse_selector(selector)?;
        Ok(selector::matches(&selector, tree, element))
    }

    pub fn node_state(&self, element: ElementId) -> NodeState {
        match self.nodes.get(&element) {
            None => NodeState::Absent,
            Some(node) if node.dirty => NodeState::Dirty,
            Some(_) => NodeState::Clean,
        }
    }

    pub fn stats(&self) -> StyleStats {
        self.stats
    }

    /// Drains the diagnostics raised while compiling inline styles.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.inline_diagnostics)
    }

    fn node<T>(&mut self, tree: &T, element: ElementId) -> &StyleNode
    where
        T: DocumentTree + ?Sized,
    {
        let clean = matches!(self.nodes.get(&element), Some(node) if !node.dirty);
        if clean {
            self.stats.cache_hits += 1;
        } else {
            let node = self.resolve(tree, element);
            self.nodes.insert(element, node);
        }
        &self.nodes[&element]
    }

    fn resolve<T>(&mut self, tree: &T, element: ElementId) -> StyleNode
    where
        T: DocumentTree + ?Sized,
    {
        let source = tree.attribute(element, "style").unwrap_or_default();
        let cached = self
            .nodes
            .get(&element)
            .filter(|node| node.inline_source == source)
            .map(|node| Arc::clone(&node.inline));
        let inline = match cached {
            Some(inline) => inline,
            None => Arc::new(self.compile_inline(tree, element, source)),
        };

        let mut cascaded = PropertySet::new();
        let matched = self.matching_rules(tree, element);
        let rule_count = matched.len();
        for rule in matched {
            cascaded.merge(&rule.properties);
        }

        let mut current = cascaded.clone();
        current.overlay(&inline);

        self.stats.resolutions += 1;
        log::trace!(
            "CASCADE: element={:?} tag='{}' rules={} inline={} -> {}",
            element,
            tree.tag_name(element),
            rule_count,
            inline.len(),
            current
        );

        StyleNode {
            dirty: false,
            cascaded,
            current,
            inline,
            inline_source: source.to_string(),
        }
    }

    fn compile_inline<T>(&mut self, tree: &T, element: ElementId, source: &str) -> PropertySet
    where
        T: DocumentTree + ?Sized,
    {
        if source.trim().is_empty() {
            return PropertySet::new();
        }
        let options = CompileOptions::new(format!("{}[style]", tree.tag_name(element)))
            .functions(Arc::clone(&self.functions));
        let compilation = compile_inline(source, &options);
        for diagnostic in compilation.diagnostics.into_vec() {
            log::warn!("{}", diagnostic);
            self.inline_diagnostics.push(diagnostic);
        }
        compilation.properties
    }

    // ------------------------------------------------------------------
    // Mutation signals
    // ------------------------------------------------------------------

    /// Marks every resolved element dirty.
    pub fn invalidate_all(&mut self) {
        for node in self.nodes.values_mut() {
            node.dirty = true;
        }
    }

    /// An attribute of `element` changed from `old` to `new`.
    ///
    /// A `style` change only affects the element itself. Any other attribute
    /// can change what matches the element, its subtree and its siblings.
    pub fn attribute_changed<T>(
        &mut self,
        tree: &T,
        element: ElementId,
        name: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) where
        T: DocumentTree + ?Sized,
    {
        if old == new {
            return;
        }
        if name == "style" {
            self.mark(element);
        } else {
            self.mark_affected(tree, element);
        }
    }

    pub fn class_list_changed<T>(&mut self, tree: &T, element: ElementId)
    where
        T: DocumentTree + ?Sized,
    {
        self.mark_affected(tree, element);
    }

    /// `child` was inserted under `parent`. Sibling indices of every child
    /// may have shifted.
    pub fn child_inserted<T>(&mut self, tree: &T, parent: ElementId, child: ElementId)
    where
        T: DocumentTree + ?Sized,
    {
        self.element_detached(tree, child);
        self.mark_children(tree, parent);
    }

    /// `child` was removed from `parent`.
    pub fn child_removed<T>(&mut self, tree: &T, parent: ElementId, child: ElementId)
    where
        T: DocumentTree + ?Sized,
    {
        self.element_detached(tree, child);
        self.mark_children(tree, parent);
    }

    /// Forgets the cached styles of `element` and its subtree.
    pub fn element_detached<T>(&mut self, tree: &T, element: ElementId)
    where
        T: DocumentTree + ?Sized,
    {
        if self.nodes.is_empty() {
            return;
        }
        self.nodes.remove(&element);
        for descendant in tree.descendants(element) {
            self.nodes.remove(&descendant);
        }
    }

    /// A transient state flag of `element` flipped. Ignored unless an
    /// attached sheet uses the matching pseudo-class.
    pub fn pseudo_state_changed<T>(&mut self, tree: &T, element: ElementId, flag: ElementFlags)
    where
        T: DocumentTree + ?Sized,
    {
        let mut pseudos = StatePseudos::empty();
        if flag.contains(ElementFlags::HOVERED) {
            pseudos |= StatePseudos::HOVER;
        }
        if flag.contains(ElementFlags::ACTIVE) {
            pseudos |= StatePseudos::ACTIVE;
        }
        if self.state_pseudos.intersects(pseudos) {
            self.mark_affected(tree, element);
        }
    }

    fn mark(&mut self, element: ElementId) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.dirty = true;
        }
    }

    fn mark_subtree<T>(&mut self, tree: &T, element: ElementId)
    where
        T: DocumentTree + ?Sized,
    {
        self.mark(element);
        for descendant in tree.descendants(element) {
            self.mark(descendant);
        }
    }

    fn mark_children<T>(&mut self, tree: &T, parent: ElementId)
    where
        T: DocumentTree + ?Sized,
    {
        for child in tree.children(parent) {
            self.mark_subtree(tree, child);
        }
    }

    /// Marks `element`, its siblings and all their descendants. Siblings are
    /// included in both directions since `nth-last-*` counts later siblings.
    fn mark_affected<T>(&mut self, tree: &T, element: ElementId)
    where
        T: DocumentTree + ?Sized,
    {
        if self.nodes.is_empty() {
            return;
        }
        match tree.parent(element) {
            Some(parent) => self.mark_children(tree, parent),
            None => self.mark_subtree(tree, element),
        }
    }
}

//! Compiled stylesheets.
//!
//! A [`Stylesheet`] is an immutable, ordered list of [`Rule`]s. Rules that
//! came from one comma-separated selector group share their property set and
//! declaration index.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ChimeraError;
use crate::properties::PropertySet;
use crate::selector::{Selector, Specificity, StatePseudos};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Where a stylesheet comes from. Default-origin rules lose every cascade
/// tie against user rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Origin {
    /// The engine's built-in sheet.
    Default,
    #[default]
    User,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    /// A single alternative; never a [`Selector::Group`].
    pub selector: Selector,
    pub specificity: Specificity,
    pub properties: Arc<PropertySet>,
    /// Declaration order within the sheet.
    pub index: usize,
}

impl Rule {
    pub fn new(selector: Selector, properties: Arc<PropertySet>, index: usize) -> Self {
        Self {
            specificity: selector.specificity(),
            selector,
            properties,
            index,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.properties.is_empty() {
            write!(f, "{} {{}}", self.selector)
        } else {
            write!(f, "{} {{ {} }}", self.selector, self.properties)
        }
    }
}

#[derive(Clone, Debug)]
pub struct Stylesheet {
    name: String,
    origin: Origin,
    generation: u64,
    rules: Vec<Rule>,
    state_pseudos: StatePseudos,
}

impl Stylesheet {
    /// Creates a sheet with a fresh generation id.
    pub fn new(name: impl Into<String>, origin: Origin, rules: Vec<Rule>) -> Self {
        let state_pseudos = rules
            .iter()
            .fold(StatePseudos::empty(), |acc, rule| acc | rule.selector.state_pseudos());
        Self {
            name: name.into(),
            origin,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            rules,
            state_pseudos,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Unique per compiled sheet and increasing in creation order.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// State pseudo-classes referenced by any rule.
    pub fn state_pseudos(&self) -> StatePseudos {
        self.state_pseudos
    }

    /// One rule per line, in source order.
    pub fn dump(&self) -> String {
        self.rules
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Builds a user stylesheet in code.
///
/// ```
/// use chimera::properties::PropertyKey;
/// use chimera::stylesheet::StylesheetBuilder;
/// use chimera::types::Value;
///
/// let sheet = StylesheetBuilder::new("builder")
///     .add_rule("button, .clickable", |props| {
///         props.set(PropertyKey::PaddingLeft, Value::px(2.0))
///     })?
///     .build();
///
/// assert_eq!(sheet.len(), 2);
/// assert_eq!(sheet.rules()[1].index, 0);
/// # Ok::<(), chimera::ChimeraError>(())
/// ```
#[derive(Debug)]
pub struct StylesheetBuilder {
    name: String,
    origin: Origin,
    rules: Vec<Rule>,
    next_index: usize,
}

impl StylesheetBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: Origin::User,
            rules: Vec::new(),
            next_index: 0,
        }
    }

    pub fn origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Adds one rule per alternative of `selector`, with the properties set
    /// by `declare`.
    pub fn add_rule<F>(mut self, selector: &str, declare: F) -> Result<Self, ChimeraError>
    where
        F: FnOnce(&mut PropertySet) -> Result<(), ChimeraError>,
    {
        let selector = crate::parse_selector(selector)?;
        let mut properties = PropertySet::new();
        declare(&mut properties)?;

        let properties = Arc::new(properties);
        let index = self.next_index;
        self.next_index += 1;
        for alternative in selector.into_alternatives() {
            self.rules.push(Rule::new(alternative, Arc::clone(&properties), index));
        }
        Ok(self)
    }

    pub fn build(self) -> Stylesheet {
        Stylesheet::new(self.name, self.origin, self.rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::PropertyKey;
    use crate::types::Value;

    #[test]
    fn test_generations_increase() {
        let first = StylesheetBuilder::new("a").build();
        let second = StylesheetBuilder::new("b").build();
        assert!(second.generation() > first.generation());
    }

    #[test]
    fn test_builder_rejects_bad_selector() {
        let result = StylesheetBuilder::new("test").add_rule("div:nope", |_| Ok(()));
        assert!(matches!(result, Err(ChimeraError::InvalidSelector(_))));

        let result = StylesheetBuilder::new("test").add_rule("div", |props| {
            props.set_named("padding", &[Value::String("wide".into())], false)
        });
        assert!(matches!(result, Err(ChimeraError::InvalidValue { .. })));
    }

    #[test]
    fn test_state_pseudos_collected() {
        let sheet = StylesheetBuilder::new("test")
            .add_rule("div", |_| Ok(()))
            .unwrap()
            .add_rule("a:not(:hover)", |_| Ok(()))
            .unwrap()
            .build();
        assert_eq!(sheet.state_pseudos(), StatePseudos::HOVER);
    }

    #[test]
    fn test_dump() {
        let sheet = StylesheetBuilder::new("test")
            .add_rule(".a > b, #c", |props| {
                props.set(PropertyKey::MarginTop, Value::px(1.0))?;
                props.set_important(PropertyKey::Bold, Value::Keyword(crate::types::Keyword::True))
            })
            .unwrap()
            .add_rule("*", |_| Ok(()))
            .unwrap()
            .build();

        insta::assert_snapshot!(sheet.dump(), @r"
        .a > b { bold: true !important; margin-top: 1px; }
        #c { bold: true !important; margin-top: 1px; }
        * {}
        ");
    }
}

//! Stylesheet compilation.
//!
//! [`compile`] runs text through the parser and evaluator and returns a
//! [`Stylesheet`] together with every diagnostic raised on the way. There is
//! no failed outcome: rules and declarations that could not be compiled are
//! dropped and reported, the rest take effect.
//!
//! ```
//! use chimera::compiler::{compile, CompileOptions};
//!
//! let source = r#"
//!     $gap: 2px;
//!     .list, .grid {
//!         padding: $gap $gap * 2;
//!         &:hover { paddi: 4px; }
//!     }
//! "#;
//!
//! let compilation = compile(source, &CompileOptions::new("list.scss"));
//! assert_eq!(compilation.stylesheet.len(), 2);
//! assert_eq!(compilation.diagnostics.len(), 1);
//! ```

mod flatten;

use std::sync::Arc;

use crate::ast::{InlineStyleStatement, PropertyDecl, RuleStatement, SheetStatement, Statement, VariableDecl};
use crate::diagnostics::{Diagnostics, ErrorKind};
use crate::eval::{BUILTINS, Environment, EvalError, FunctionRegistry, LocatedError, ScopeArena, ScopeId};
use crate::parser::Parser;
use crate::properties::{PropertyKey, PropertySet, Shorthand};
use crate::selector::Selector;
use crate::stylesheet::{Origin, Rule, Stylesheet};

/// Settings for one compile call.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// Name used in diagnostics.
    pub source_name: String,
    pub origin: Origin,
    pub functions: Arc<FunctionRegistry>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            source_name: "<stylesheet>".to_string(),
            origin: Origin::User,
            functions: Arc::clone(&BUILTINS),
        }
    }
}

impl CompileOptions {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            ..Self::default()
        }
    }

    pub fn origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    pub fn functions(mut self, functions: Arc<FunctionRegistry>) -> Self {
        self.functions = functions;
        self
    }
}

#[derive(Debug)]
pub struct Compilation {
    pub stylesheet: Stylesheet,
    pub diagnostics: Diagnostics,
}

#[derive(Debug)]
pub struct InlineCompilation {
    pub properties: PropertySet,
    pub diagnostics: Diagnostics,
}

/// Parses and compiles stylesheet text.
pub fn compile(source: &str, options: &CompileOptions) -> Compilation {
    let mut parser = Parser::new(source, options.source_name.as_str());
    let sheet = parser.stylesheet();
    compile_ast(&sheet, options, parser.into_diagnostics())
}

/// Compiles an already parsed sheet, adding to `diagnostics`.
pub fn compile_ast(sheet: &SheetStatement, options: &CompileOptions, diagnostics: Diagnostics) -> Compilation {
    let mut compiler = Compiler::new(&options.functions, diagnostics);
    let root = compiler.scopes.root();
    for variable in &sheet.variables {
        compiler.define(root, variable);
    }

    let mut rules = Vec::new();
    for (index, (selectors, properties)) in sheet
        .rules
        .iter()
        .flat_map(|rule| compiler.rule(rule, None, root))
        .enumerate()
    {
        let properties = Arc::new(properties);
        rules.extend(
            selectors
                .into_iter()
                .map(|selector| Rule::new(selector, Arc::clone(&properties), index)),
        );
    }

    let stylesheet = Stylesheet::new(options.source_name.as_str(), options.origin, rules);
    log::debug!(
        "compiled '{}': {} rules, {} diagnostics, generation {}",
        stylesheet.name(),
        stylesheet.len(),
        compiler.diagnostics.len(),
        stylesheet.generation()
    );
    Compilation {
        stylesheet,
        diagnostics: compiler.diagnostics,
    }
}

/// Parses and compiles the declarations of a `style` attribute.
pub fn compile_inline(source: &str, options: &CompileOptions) -> InlineCompilation {
    let mut parser = Parser::new(source, options.source_name.as_str());
    let statement: InlineStyleStatement = parser.inline_style();

    let mut compiler = Compiler::new(&options.functions, parser.into_diagnostics());
    let root = compiler.scopes.root();
    let mut properties = PropertySet::new();
    for declaration in &statement.properties {
        compiler.declare(root, &mut properties, declaration);
    }
    InlineCompilation {
        properties,
        diagnostics: compiler.diagnostics,
    }
}

/// Flattened selector alternatives and the properties they share.
type CompiledRule = (Vec<Selector>, PropertySet);

struct Compiler<'a> {
    scopes: ScopeArena,
    functions: &'a FunctionRegistry,
    diagnostics: Diagnostics,
}

impl<'a> Compiler<'a> {
    fn new(functions: &'a FunctionRegistry, diagnostics: Diagnostics) -> Self {
        Self {
            scopes: ScopeArena::new(),
            functions,
            diagnostics,
        }
    }

    /// Compiles `rule` and its nested rules, parent first.
    ///
    /// Nested rules are compiled where they appear, so they see only the
    /// variables declared before them.
    fn rule(&mut self, rule: &RuleStatement, parents: Option<&[Selector]>, scope: ScopeId) -> Vec<CompiledRule> {
        let selectors = match parents {
            Some(parents) => flatten::combine(parents, rule.selector.alternatives()),
            None => rule.selector.alternatives().to_vec(),
        };

        let scope = self.scopes.child(scope);
        let mut properties = PropertySet::new();
        let mut nested = Vec::new();
        for statement in &rule.body {
            match statement {
                Statement::Variable(variable) => self.define(scope, variable),
                Statement::Property(declaration) => self.declare(scope, &mut properties, declaration),
                Statement::Rule(child) => nested.extend(self.rule(child, Some(&selectors), scope)),
            }
        }

        let mut compiled = Vec::with_capacity(nested.len() + 1);
        if !properties.is_empty() {
            compiled.push((selectors, properties));
        }
        compiled.append(&mut nested);
        compiled
    }

    fn define(&mut self, scope: ScopeId, variable: &VariableDecl) {
        let result = Environment::new(&self.scopes, scope, self.functions).evaluate_list(&variable.value);
        match result {
            Ok(values) => self.scopes.define(scope, variable.name.as_str(), values),
            Err(error) => self.report(error),
        }
    }

    /// Evaluates one declaration into `properties`. A declaration that fails
    /// is reported and leaves `properties` untouched.
    fn declare(&mut self, scope: ScopeId, properties: &mut PropertySet, declaration: &PropertyDecl) {
        let name = declaration.name.as_str();
        let evaluating: Vec<PropertyKey> = match (PropertyKey::from_name(name), Shorthand::from_name(name)) {
            (Some(key), _) => vec![key],
            (None, Some(shorthand)) => shorthand.longhands().to_vec(),
            (None, None) => {
                self.diagnostics.error(
                    declaration.location,
                    ErrorKind::Semantic,
                    format!("unknown property '{}'", name),
                );
                return;
            }
        };

        let result = Environment::new(&self.scopes, scope, self.functions)
            .with_properties(properties, &evaluating)
            .evaluate_list(&declaration.value);
        let values = match result {
            Ok(values) => values,
            Err(error) => return self.report(error),
        };

        if properties.set_named(name, &values, declaration.important).is_err() {
            let text = values.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
            self.report(LocatedError::new(
                declaration.value.location,
                EvalError::InvalidPropertyValue {
                    property: name.to_string(),
                    value: text,
                },
            ));
        }
    }

    fn report(&mut self, located: LocatedError) {
        let LocatedError { location, error } = located;
        if error.is_reportable() {
            self.diagnostics
                .report(location, error.severity(), error.kind(), error.to_string());
        }
    }
}

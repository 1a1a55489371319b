use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use log::debug;
use thiserror::Error;

use super::expr::{Expr, Keyword, KeywordClass, Name};

/// The deepest expression tree the analyzer will walk.
///
/// Trees are expected to be finite and shallow; anything deeper than this is
/// assumed to be cyclic or otherwise out of contract.
pub const MAX_DEPTH: usize = 512;

// ----------------------------------------------------------------------------

/// Why an analysis call failed.
///
/// All three abort just the analysis in progress; none is ever collapsed
/// into a default boolean.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A binding-class keyword with no form after it at all. Everything else
    /// malformed is walked best-effort; see [`free_variables`].
    #[error("malformed `{0}` form: nothing follows the keyword")]
    MalformedExpression(Keyword),

    /// Nesting exceeded [`MAX_DEPTH`]; the input is not a finite tree.
    #[error("expression nesting exceeds {MAX_DEPTH} levels")]
    CyclicExpression,

    /// The global-resolution oracle itself failed.
    #[error("global resolution unavailable: {0}")]
    ResolutionUnavailable(String),
}

/// A failure of the oracle, as opposed to a "not defined" answer.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct Unavailable(pub String);

impl From<Unavailable> for AnalysisError {
    fn from(e: Unavailable) -> Self { Self::ResolutionUnavailable(e.0) }
}

// ----------------------------------------------------------------------------

/// The ambient global environment, asked whether a free-standing name
/// already has a meaning.
///
/// Queried for every candidate identifier that is not lexically bound. Must
/// behave as a read-only lookup: consistent answers within one analysis run,
/// no observable side effects.
pub trait Globals {
    fn is_defined(&self, name: &str) -> Result<bool, Unavailable>;
}

/// An ambient environment with nothing defined.
pub struct NoGlobals;

impl Globals for NoGlobals {
    fn is_defined(&self, _name: &str) -> Result<bool, Unavailable> { Ok(false) }
}

impl Globals for HashSet<String> {
    fn is_defined(&self, name: &str) -> Result<bool, Unavailable> { Ok(self.contains(name)) }
}

// ----------------------------------------------------------------------------

/// An ordered sequence of lexical scopes, innermost first.
///
/// Persistent: [`ScopeStack::pushed`] returns a new stack sharing the outer
/// frames, so sibling subtrees never observe each other's bindings.
#[derive(Debug, Clone, Default)]
pub struct ScopeStack(Vec<Arc<HashSet<Name>>>);

impl ScopeStack {
    /// An empty stack, as passed to the outermost analysis call.
    pub fn new() -> Self { Self::default() }

    /// A new stack with `scope` in front of the existing frames.
    pub fn pushed(&self, scope: HashSet<Name>) -> Self {
        let mut frames = Vec::with_capacity(self.0.len() + 1);
        frames.push(Arc::new(scope));
        frames.extend(self.0.iter().cloned());
        Self(frames)
    }

    /// Whether `name` is bound in any frame.
    pub fn binds(&self, name: &str) -> bool {
        self.0.iter().any(|frame| frame.contains(name))
    }
}

// ----------------------------------------------------------------------------

/// Computes the free identifiers of `expr`: names referenced but neither
/// bound in `scopes` nor defined according to `globals`.
///
/// Call with [`ScopeStack::new`] for a whole-expression analysis. The walk
/// is lenient: a special form with too few arguments is destructured as far
/// as it will go, with one exception — a binding-class keyword followed by
/// nothing at all is rejected as [`AnalysisError::MalformedExpression`].
pub fn free_variables(
    expr: &Expr,
    scopes: &ScopeStack,
    globals: &impl Globals,
) -> Result<BTreeSet<Name>, AnalysisError> {
    let free = walk(expr, scopes, globals, 0)?;
    debug!("free variables of {}: {:?}", expr, free);
    Ok(free)
}

/// Whether `expr` is closed: no free identifiers under an empty scope stack.
pub fn is_closed(expr: &Expr, globals: &impl Globals) -> Result<bool, AnalysisError> {
    Ok(free_variables(expr, &ScopeStack::new(), globals)?.is_empty())
}

fn walk(
    expr: &Expr,
    scopes: &ScopeStack,
    globals: &impl Globals,
    depth: usize,
) -> Result<BTreeSet<Name>, AnalysisError> {
    if depth > MAX_DEPTH { return Err(AnalysisError::CyclicExpression); }
    match expr {
        Expr::Atom(_) => Ok(BTreeSet::new()),
        Expr::Identifier(name) => {
            if scopes.binds(name) || globals.is_defined(name)? {
                Ok(BTreeSet::new())
            } else {
                Ok(std::iter::once(name.clone()).collect())
            }
        },
        Expr::Application(elements) => {
            if let Some(keyword) = expr.head_keyword() {
                special_form(keyword, &elements[1..], scopes, globals, depth)
            } else {
                // A generic combination: head and arguments alike, under the
                // unchanged stack.
                let mut free = BTreeSet::new();
                for element in elements {
                    free.append(&mut walk(element, scopes, globals, depth + 1)?);
                }
                Ok(free)
            }
        },
    }
}

/// Analyzes the forms after a recognized keyword.
fn special_form(
    keyword: Keyword,
    rest: &[Expr],
    scopes: &ScopeStack,
    globals: &impl Globals,
    depth: usize,
) -> Result<BTreeSet<Name>, AnalysisError> {
    if keyword.class() == KeywordClass::Quoted {
        // Quoted data is never code; nothing inside is a reference.
        return Ok(BTreeSet::new());
    }
    let (binder, body) = rest.split_first()
        .ok_or(AnalysisError::MalformedExpression(keyword))?;
    let scope = match keyword.class() {
        KeywordClass::Lambda => parameter_names(binder),
        // One flat scope over all bound names. The binding initializers are
        // not walked; only the body forms are.
        KeywordClass::LetLike => let_bound_names(binder),
        KeywordClass::Define => {
            let mut names = HashSet::new();
            target_names(binder, &mut names);
            names
        },
        KeywordClass::Set => match binder.as_identifier() {
            Some(name) => std::iter::once(name.clone()).collect(),
            None => HashSet::new(),
        },
        KeywordClass::Quoted => unreachable!(),
    };
    let scopes = scopes.pushed(scope);
    let mut free = BTreeSet::new();
    for form in body {
        free.append(&mut walk(form, &scopes, globals, depth + 1)?);
    }
    Ok(free)
}

/// The names bound by a `lambda` parameter list: either a bare name or the
/// identifier elements of a list.
fn parameter_names(params: &Expr) -> HashSet<Name> {
    match params {
        Expr::Identifier(name) => std::iter::once(name.clone()).collect(),
        Expr::Application(elements) => {
            elements.iter().filter_map(Expr::as_identifier).cloned().collect()
        },
        Expr::Atom(_) => HashSet::new(),
    }
}

/// The names bound by a `let`-class binding list: each entry is a bare name
/// or a `(name initializer...)` pair.
fn let_bound_names(bindings: &Expr) -> HashSet<Name> {
    match bindings {
        Expr::Identifier(name) => std::iter::once(name.clone()).collect(),
        Expr::Application(entries) => {
            entries.iter()
                .filter_map(|entry| match entry {
                    Expr::Identifier(name) => Some(name),
                    Expr::Application(pair) => pair.first()?.as_identifier(),
                    Expr::Atom(_) => None,
                })
                .cloned()
                .collect()
        },
        Expr::Atom(_) => HashSet::new(),
    }
}

/// Every identifier appearing anywhere in a `define` target; a compound
/// target (function-style definition) binds them all.
fn target_names(target: &Expr, names: &mut HashSet<Name>) {
    match target {
        Expr::Identifier(name) => { names.insert(name.clone()); },
        Expr::Application(elements) => {
            for element in elements { target_names(element, names); }
        },
        Expr::Atom(_) => {},
    }
}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::expr::Atom;

    /// An oracle that always fails.
    struct Offline;

    impl Globals for Offline {
        fn is_defined(&self, _name: &str) -> Result<bool, Unavailable> {
            Err(Unavailable("oracle offline".into()))
        }
    }

    fn ident(name: &str) -> Expr { Expr::identifier(name) }

    fn app(elements: Vec<Expr>) -> Expr { Expr::Application(elements) }

    fn names(free: &BTreeSet<Name>) -> Vec<&str> {
        free.iter().map(|n| &**n).collect()
    }

    fn free(expr: &Expr, globals: &impl Globals) -> BTreeSet<Name> {
        free_variables(expr, &ScopeStack::new(), globals).unwrap()
    }

    #[test]
    fn atoms_are_never_free() {
        assert!(free(&Expr::Atom(Atom::Int(42)), &NoGlobals).is_empty());
    }

    #[test]
    fn unbound_identifier_is_free() {
        assert_eq!(names(&free(&ident("x"), &NoGlobals)), ["x"]);
    }

    #[test]
    fn globally_defined_identifier_is_not_free() {
        let globals: std::collections::HashSet<String> = ["x".to_string()].into();
        assert!(free(&ident("x"), &globals).is_empty());
    }

    #[test]
    fn lambda_parameters_shadow() {
        // (lambda (x) x)
        let e = app(vec![ident("lambda"), app(vec![ident("x")]), ident("x")]);
        assert!(free(&e, &NoGlobals).is_empty());
        // (lambda (x) y)
        let e = app(vec![ident("lambda"), app(vec![ident("x")]), ident("y")]);
        assert_eq!(names(&free(&e, &NoGlobals)), ["y"]);
    }

    #[test]
    fn lambda_bare_parameter_binds() {
        // (lambda args args)
        let e = app(vec![ident("lambda"), ident("args"), ident("args")]);
        assert!(free(&e, &NoGlobals).is_empty());
    }

    #[test]
    fn sibling_subtrees_do_not_share_bindings() {
        // ((lambda (x) x) x): the second x is outside the lambda's scope.
        let e = app(vec![
            app(vec![ident("lambda"), app(vec![ident("x")]), ident("x")]),
            ident("x"),
        ]);
        assert_eq!(names(&free(&e, &NoGlobals)), ["x"]);
    }

    #[test]
    fn let_binds_a_flat_scope_over_the_body() {
        // (let ((a 1) (b 2)) (f a b))
        let e = app(vec![
            ident("let"),
            app(vec![
                app(vec![ident("a"), Expr::Atom(Atom::Int(1))]),
                app(vec![ident("b"), Expr::Atom(Atom::Int(2))]),
            ]),
            app(vec![ident("f"), ident("a"), ident("b")]),
        ]);
        assert_eq!(names(&free(&e, &NoGlobals)), ["f"]);
    }

    #[test]
    fn let_initializers_are_not_analyzed() {
        // (let ((x y)) x): y appears only in an initializer, which this
        // pass never walks, so the expression reports no free variables.
        let e = app(vec![
            ident("let"),
            app(vec![app(vec![ident("x"), ident("y")])]),
            ident("x"),
        ]);
        assert!(free(&e, &NoGlobals).is_empty());
    }

    #[test]
    fn fluid_let_and_parameterize_behave_like_let() {
        for kw in ["let*", "letrec", "parameterize", "fluid-let"] {
            let e = app(vec![
                ident(kw),
                app(vec![app(vec![ident("p"), Expr::Atom(Atom::Int(0))])]),
                ident("p"),
            ]);
            assert!(free(&e, &NoGlobals).is_empty(), "{} did not bind", kw);
        }
    }

    #[test]
    fn define_bare_name_binds_over_the_body() {
        // (define x x)
        let e = app(vec![ident("define"), ident("x"), ident("x")]);
        assert!(free(&e, &NoGlobals).is_empty());
    }

    #[test]
    fn define_compound_target_binds_every_name() {
        // (define (f a) (f a b))
        let e = app(vec![
            ident("define"),
            app(vec![ident("f"), ident("a")]),
            app(vec![ident("f"), ident("a"), ident("b")]),
        ]);
        assert_eq!(names(&free(&e, &NoGlobals)), ["b"]);
    }

    #[test]
    fn set_binds_the_assigned_name_over_the_rest() {
        // (set! x x)
        let e = app(vec![ident("set!"), ident("x"), ident("x")]);
        assert!(free(&e, &NoGlobals).is_empty());
    }

    #[test]
    fn quote_suppresses_analysis() {
        for kw in ["quote", "quasiquote"] {
            let e = app(vec![ident(kw), ident("y")]);
            assert!(free(&e, &NoGlobals).is_empty(), "{} leaked a reference", kw);
        }
    }

    #[test]
    fn unrecognized_head_is_a_generic_combination() {
        // (when x y): `when` is not primitive, so all three are analyzed.
        let e = app(vec![ident("when"), ident("x"), ident("y")]);
        assert_eq!(names(&free(&e, &NoGlobals)), ["when", "x", "y"]);
    }

    #[test]
    fn duplicates_merge_across_subtrees() {
        let e = app(vec![ident("f"), ident("x"), app(vec![ident("f"), ident("x")])]);
        assert_eq!(names(&free(&e, &NoGlobals)), ["f", "x"]);
    }

    #[test]
    fn empty_application_is_walked_without_error() {
        assert!(free(&app(vec![]), &NoGlobals).is_empty());
    }

    #[test]
    fn bare_binding_keyword_is_malformed() {
        for kw in ["lambda", "let", "define", "set!"] {
            let result = free_variables(&app(vec![ident(kw)]), &ScopeStack::new(), &NoGlobals);
            assert!(
                matches!(result, Err(AnalysisError::MalformedExpression(_))),
                "bare ({}) was accepted", kw,
            );
        }
    }

    #[test]
    fn binding_form_without_a_body_is_vacuously_closed() {
        // (lambda (x)): nothing to walk.
        let e = app(vec![ident("lambda"), app(vec![ident("x")])]);
        assert!(free(&e, &NoGlobals).is_empty());
    }

    #[test]
    fn oracle_failure_is_surfaced_not_defaulted() {
        let result = free_variables(&ident("x"), &ScopeStack::new(), &Offline);
        assert!(matches!(result, Err(AnalysisError::ResolutionUnavailable(_))));
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let mut e = ident("x");
        for _ in 0..(MAX_DEPTH + 2) {
            e = app(vec![ident("f"), e]);
        }
        let result = free_variables(&e, &ScopeStack::new(), &NoGlobals);
        assert!(matches!(result, Err(AnalysisError::CyclicExpression)));
    }

    #[test]
    fn analysis_is_deterministic() {
        let e = app(vec![ident("f"), ident("x"), ident("y")]);
        let first = free(&e, &NoGlobals);
        let second = free(&e, &NoGlobals);
        assert_eq!(first, second);
    }
}

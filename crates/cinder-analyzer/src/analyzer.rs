//! Form analysis

use crate::ns::parse_ns;
use crate::{AnalysisEnv, AnalysisError};
use cinder_ast::{ExprContext, Form, FormKind, Node, NodeKind, Symbol, CORE_NS};
use cinder_symbols::NamespaceRegistry;

/// Turns reader forms into annotated nodes, recording namespace metadata in
/// the registry as it goes
#[derive(Debug, Default, Clone, Copy)]
pub struct Analyzer;

impl Analyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze one top-level form
    pub fn analyze(
        &self,
        form: &Form,
        env: &AnalysisEnv,
        registry: &mut NamespaceRegistry,
    ) -> Result<Node, AnalysisError> {
        let mut scope = Scope {
            env,
            registry,
            locals: Vec::new(),
        };
        scope.analyze(form, env.context)
    }
}

struct Scope<'a> {
    env: &'a AnalysisEnv,
    registry: &'a mut NamespaceRegistry,
    locals: Vec<Symbol>,
}

impl Scope<'_> {
    fn node(&self, kind: NodeKind, context: ExprContext, form: &Form) -> Node {
        Node::new(kind, context, form.span, form.pos)
    }

    fn analyze(&mut self, form: &Form, context: ExprContext) -> Result<Node, AnalysisError> {
        let kind = match &form.kind {
            FormKind::Symbol(sym) => self.resolve(sym),
            FormKind::List(items) if items.is_empty() => NodeKind::Const(form.clone()),
            FormKind::List(items) => return self.analyze_seq(form, items, context),
            FormKind::Vector(items) => NodeKind::Vector(self.analyze_all(items)?),
            FormKind::Set(items) => NodeKind::Set(self.analyze_all(items)?),
            FormKind::Map(entries) => {
                let mut pairs = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    pairs.push((
                        self.analyze(key, ExprContext::Expr)?,
                        self.analyze(value, ExprContext::Expr)?,
                    ));
                }
                NodeKind::Map(pairs)
            }
            _ => NodeKind::Const(form.clone()),
        };
        Ok(self.node(kind, context, form))
    }

    fn analyze_all(&mut self, forms: &[Form]) -> Result<Vec<Node>, AnalysisError> {
        forms
            .iter()
            .map(|form| self.analyze(form, ExprContext::Expr))
            .collect()
    }

    /// Analyze a body: every form but the last is a statement
    fn analyze_body(&mut self, forms: &[Form], context: ExprContext) -> Result<Vec<Node>, AnalysisError> {
        let last = forms.len().saturating_sub(1);
        forms
            .iter()
            .enumerate()
            .map(|(i, form)| {
                let ctx = if i == last { context } else { ExprContext::Statement };
                self.analyze(form, ctx)
            })
            .collect()
    }

    fn analyze_seq(&mut self, form: &Form, items: &[Form], context: ExprContext) -> Result<Node, AnalysisError> {
        let special = items[0]
            .as_symbol()
            .filter(|sym| !self.locals.contains(sym))
            .map(|sym| sym.as_str());

        let kind = match special {
            Some("ns") => {
                let decl = parse_ns(items, form.span, self.env.macros_ns)?;
                self.registry.declare(&decl);
                NodeKind::Ns(decl)
            }
            Some("def") => self.analyze_def(form, items)?,
            Some("defn") => self.analyze_defn(form, items, false)?,
            Some("defmacro") => self.analyze_defn(form, items, true)?,
            Some("fn") | Some("fn*") => self.analyze_fn(form, &items[1..], None)?,
            Some("let") | Some("let*") => self.analyze_let(form, items, context)?,
            Some("if") => {
                if items.len() < 3 || items.len() > 4 {
                    return Err(AnalysisError::malformed(
                        "if",
                        "expected (if test then else?)",
                        form.span,
                    ));
                }
                NodeKind::If {
                    test: Box::new(self.analyze(&items[1], ExprContext::Expr)?),
                    then: Box::new(self.analyze(&items[2], context)?),
                    otherwise: match items.get(3) {
                        Some(form) => Some(Box::new(self.analyze(form, context)?)),
                        None => None,
                    },
                }
            }
            Some("do") => NodeKind::Do(self.analyze_body(&items[1..], context)?),
            Some("quote") => match items.get(1) {
                Some(quoted) if items.len() == 2 => NodeKind::Const(quoted.clone()),
                _ => return Err(AnalysisError::malformed("quote", "expected one form", form.span)),
            },
            _ => NodeKind::Invoke {
                callee: Box::new(self.analyze(&items[0], ExprContext::Expr)?),
                args: self.analyze_all(&items[1..])?,
            },
        };
        Ok(self.node(kind, context, form))
    }

    fn def_name<'f>(&self, what: &str, form: &Form, items: &'f [Form]) -> Result<&'f Symbol, AnalysisError> {
        match items.get(1).and_then(Form::as_symbol) {
            Some(name) if name.namespace().is_none() => Ok(name),
            _ => Err(AnalysisError::malformed(
                what,
                "expected an unqualified name",
                form.span,
            )),
        }
    }

    /// `(def name docstring? init?)`
    fn analyze_def(&mut self, form: &Form, items: &[Form]) -> Result<NodeKind, AnalysisError> {
        let name = self.def_name("def", form, items)?;
        let init = match &items[2..] {
            [] => None,
            [init] | [Form { kind: FormKind::Str(_), .. }, init] => Some(init),
            _ => return Err(AnalysisError::malformed("def", "too many forms", form.span)),
        };

        // Interned before the init so the init can refer to it
        let qualified = self
            .registry
            .define(&self.env.ns, name.as_str(), false, form.span);
        let init = match init {
            Some(init) => Some(Box::new(self.analyze(init, ExprContext::Expr)?)),
            None => None,
        };

        Ok(NodeKind::Def {
            name: qualified,
            init,
            emits_var: self.env.def_emits_var,
        })
    }

    /// `(defn name docstring? [params] body*)`, likewise `defmacro`
    fn analyze_defn(&mut self, form: &Form, items: &[Form], is_macro: bool) -> Result<NodeKind, AnalysisError> {
        let what = if is_macro { "defmacro" } else { "defn" };
        let name = self.def_name(what, form, items)?.clone();
        let mut rest = &items[2..];
        if let [Form { kind: FormKind::Str(_), .. }, tail @ ..] = rest {
            rest = tail;
        }

        let qualified = self
            .registry
            .define(&self.env.ns, name.as_str(), is_macro, form.span);
        let fun = self.analyze_fn(form, rest, Some(name))?;

        Ok(NodeKind::Def {
            name: qualified,
            init: Some(Box::new(self.node(fun, ExprContext::Expr, form))),
            emits_var: self.env.def_emits_var,
        })
    }

    /// `name? [params] body*`, single arity
    fn analyze_fn(&mut self, form: &Form, rest: &[Form], name: Option<Symbol>) -> Result<NodeKind, AnalysisError> {
        let (name, rest) = match rest {
            [Form { kind: FormKind::Symbol(sym), .. }, tail @ ..] if name.is_none() => {
                (Some(sym.clone()), tail)
            }
            _ => (name, rest),
        };
        let (params, body) = match rest {
            [Form { kind: FormKind::Vector(params), .. }, body @ ..] => (params, body),
            [Form { kind: FormKind::List(_), .. }, ..] => {
                return Err(AnalysisError::Unsupported {
                    what: "multi-arity fn".to_string(),
                    span: form.span,
                })
            }
            _ => return Err(AnalysisError::malformed("fn", "expected a parameter vector", form.span)),
        };

        let mut fixed = Vec::new();
        let mut variadic = None;
        let mut iter = params.iter();
        while let Some(param) = iter.next() {
            let sym = param.as_symbol().ok_or_else(|| AnalysisError::Unsupported {
                what: "destructuring".to_string(),
                span: param.span,
            })?;
            if sym.as_str() == "&" {
                let rest_param = iter.next().and_then(Form::as_symbol).ok_or_else(|| {
                    AnalysisError::malformed("fn", "expected a symbol after &", param.span)
                })?;
                variadic = Some(rest_param.clone());
                if iter.next().is_some() {
                    return Err(AnalysisError::malformed(
                        "fn",
                        "only one parameter may follow &",
                        param.span,
                    ));
                }
                break;
            }
            fixed.push(sym.clone());
        }

        let saved = self.locals.len();
        self.locals.extend(name.iter().cloned());
        self.locals.extend(fixed.iter().cloned());
        self.locals.extend(variadic.iter().cloned());
        let body = self.analyze_body(body, ExprContext::Return);
        self.locals.truncate(saved);

        Ok(NodeKind::Fn {
            name,
            params: fixed,
            variadic,
            body: body?,
        })
    }

    /// `(let [name init ...] body*)`
    fn analyze_let(&mut self, form: &Form, items: &[Form], context: ExprContext) -> Result<NodeKind, AnalysisError> {
        let bindings = match items.get(1).map(|f| &f.kind) {
            Some(FormKind::Vector(bindings)) if bindings.len() % 2 == 0 => bindings,
            _ => {
                return Err(AnalysisError::malformed(
                    "let",
                    "expected a binding vector with an even number of forms",
                    form.span,
                ))
            }
        };

        let saved = self.locals.len();
        let result = self.analyze_let_bindings(bindings, &items[2..], context);
        self.locals.truncate(saved);
        result
    }

    fn analyze_let_bindings(
        &mut self,
        bindings: &[Form],
        body: &[Form],
        context: ExprContext,
    ) -> Result<NodeKind, AnalysisError> {
        let mut analyzed = Vec::with_capacity(bindings.len() / 2);
        for pair in bindings.chunks(2) {
            let name = pair[0].as_symbol().ok_or_else(|| AnalysisError::Unsupported {
                what: "destructuring".to_string(),
                span: pair[0].span,
            })?;
            let init = self.analyze(&pair[1], ExprContext::Expr)?;
            self.locals.push(name.clone());
            analyzed.push((name.clone(), init));
        }
        Ok(NodeKind::Let {
            bindings: analyzed,
            body: self.analyze_body(body, context)?,
        })
    }

    fn resolve(&self, sym: &Symbol) -> NodeKind {
        if self.locals.contains(sym) {
            return NodeKind::Local(sym.clone());
        }

        let current = self.registry.get(&self.env.ns);
        if let Some(ns) = sym.namespace() {
            if ns == "js" {
                return NodeKind::Var(sym.clone());
            }
            let lib = current
                .and_then(|info| info.resolve_alias(ns))
                .map(|lib| lib.as_str())
                .unwrap_or(ns);
            return NodeKind::Var(Symbol::qualified(lib, sym.name()));
        }

        let name = sym.as_str();
        match current {
            Some(info) if info.defines(name) => {
                NodeKind::Var(Symbol::qualified(self.env.ns.as_str(), name))
            }
            Some(info) => match info.uses.get(sym) {
                Some(lib) => NodeKind::Var(Symbol::qualified(lib.as_str(), name)),
                None => NodeKind::Var(Symbol::qualified(CORE_NS, name)),
            },
            None => NodeKind::Var(Symbol::qualified(CORE_NS, name)),
        }
    }
}

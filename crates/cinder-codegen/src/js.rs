//! JavaScript emission

use crate::{Emission, Mapping};
use cinder_ast::{munge, Form, FormKind, Node, NodeKind, NsDecl, Symbol};

/// Emits one top-level node at a time
#[derive(Debug, Default, Clone, Copy)]
pub struct JsEmitter;

impl JsEmitter {
    pub fn new() -> Self {
        Self
    }

    /// Emit a top-level node as one or more statements
    pub fn emit(&self, node: &Node) -> Emission {
        let mut w = JsWriter::default();
        match &node.kind {
            NodeKind::Ns(decl) => emit_ns(&mut w, node, decl),
            NodeKind::Def {
                name,
                init,
                emits_var,
            } => {
                w.mark(node, Some(name.name()));
                emit_def(&mut w, name, init.as_deref());
                w.write(";\n");
                if *emits_var {
                    w.write(&var_object(name));
                    w.write(";\n");
                }
            }
            _ => {
                emit_expr(&mut w, node);
                w.write(";\n");
            }
        }
        w.finish()
    }

    /// Module declaration for a namespace
    pub fn emit_provide(&self, ns: &Symbol) -> Emission {
        let mut w = JsWriter::default();
        w.write(&provide(ns));
        w.finish()
    }
}

fn provide(ns: &Symbol) -> String {
    format!("goog.provide({});\n", js_string(&munge(ns.as_str())))
}

fn emit_ns(w: &mut JsWriter, node: &Node, decl: &NsDecl) {
    w.mark(node, None);
    w.write(&provide(&decl.name));
    for dep in &decl.deps {
        w.write(&format!("goog.require({});\n", js_string(&munge(dep.as_str()))));
    }
}

fn emit_def(w: &mut JsWriter, name: &Symbol, init: Option<&Node>) {
    w.write(&name.munged());
    match init {
        Some(init) => {
            w.write(" = ");
            emit_expr(w, init);
        }
        None => w.write(" = undefined"),
    }
}

fn var_object(name: &Symbol) -> String {
    format!(
        "new cljs.core.Var(function () {{ return {}; }}, cljs.core.symbol({}))",
        name.munged(),
        js_string(name.as_str())
    )
}

fn emit_expr(w: &mut JsWriter, node: &Node) {
    match &node.kind {
        NodeKind::Ns(decl) => {
            // Only meaningful at top level; as an expression it is the ns name
            w.write(&js_string(decl.name.as_str()));
        }
        NodeKind::Def { name, init, .. } => {
            w.mark(node, Some(name.name()));
            w.write("(");
            emit_def(w, name, init.as_deref());
            w.write(")");
        }
        NodeKind::Fn {
            name,
            params,
            variadic,
            body,
        } => {
            w.mark(node, name.as_ref().map(|n| n.as_str()));
            w.write("(function ");
            if let Some(name) = name {
                w.write(&munge(name.as_str()));
            }
            let params: Vec<String> = params.iter().map(|p| munge(p.as_str())).collect();
            w.write(&format!("({}) {{\n", params.join(", ")));
            if let Some(rest) = variadic {
                w.write(&format!(
                    "var {} = cljs.core.array_seq(Array.prototype.slice.call(arguments, {}));\n",
                    munge(rest.as_str()),
                    params.len()
                ));
            }
            emit_block(w, body);
            w.write("})");
        }
        NodeKind::Let { bindings, body } => {
            w.mark(node, None);
            w.write("(function () {\n");
            for (name, init) in bindings {
                w.write(&format!("var {} = ", munge(name.as_str())));
                emit_expr(w, init);
                w.write(";\n");
            }
            emit_block(w, body);
            w.write("})()");
        }
        NodeKind::If {
            test,
            then,
            otherwise,
        } => {
            w.mark(node, None);
            w.write("(cljs.core.truth_(");
            emit_expr(w, test);
            w.write(") ? ");
            emit_expr(w, then);
            w.write(" : ");
            match otherwise {
                Some(otherwise) => emit_expr(w, otherwise),
                None => w.write("null"),
            }
            w.write(")");
        }
        NodeKind::Do(body) => match body.as_slice() {
            [] => w.write("null"),
            [only] => emit_expr(w, only),
            _ => {
                w.write("(");
                emit_list(w, body);
                w.write(")");
            }
        },
        NodeKind::Invoke { callee, args } => {
            w.mark(node, None);
            let wrap = matches!(callee.kind, NodeKind::Fn { .. });
            if wrap {
                w.write("(");
            }
            emit_expr(w, callee);
            if wrap {
                w.write(")");
            }
            w.write(".call(null");
            for arg in args {
                w.write(", ");
                emit_expr(w, arg);
            }
            w.write(")");
        }
        NodeKind::Var(sym) => {
            w.mark(node, Some(sym.name()));
            w.write(&var_path(sym));
        }
        NodeKind::Local(sym) => {
            w.mark(node, Some(sym.as_str()));
            w.write(&munge(sym.as_str()));
        }
        NodeKind::Const(form) => {
            w.mark(node, None);
            w.write(&constant(form));
        }
        NodeKind::Vector(items) => {
            w.write("cljs.core.vector(");
            emit_list(w, items);
            w.write(")");
        }
        NodeKind::Set(items) => {
            w.write("cljs.core.hash_set(");
            emit_list(w, items);
            w.write(")");
        }
        NodeKind::Map(entries) => {
            w.write("cljs.core.hash_map(");
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    w.write(", ");
                }
                emit_expr(w, key);
                w.write(", ");
                emit_expr(w, value);
            }
            w.write(")");
        }
    }
}

fn emit_list(w: &mut JsWriter, nodes: &[Node]) {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            w.write(", ");
        }
        emit_expr(w, node);
    }
}

/// Function body: statements then `return` of the last node
fn emit_block(w: &mut JsWriter, body: &[Node]) {
    match body.split_last() {
        Some((last, init)) => {
            for node in init {
                emit_expr(w, node);
                w.write(";\n");
            }
            w.write("return ");
            emit_expr(w, last);
            w.write(";\n");
        }
        None => w.write("return null;\n"),
    }
}

fn var_path(sym: &Symbol) -> String {
    match sym.namespace() {
        // host globals keep their dotted path
        Some("js") => sym.name().to_string(),
        _ => sym.munged(),
    }
}

fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

fn constant(form: &Form) -> String {
    match &form.kind {
        FormKind::Nil => "null".to_string(),
        FormKind::Bool(b) => b.to_string(),
        FormKind::Int(n) => n.to_string(),
        FormKind::Float(f) => {
            if f.is_nan() {
                "NaN".to_string()
            } else if f.is_infinite() {
                let sign = if *f > 0.0 { "" } else { "-" };
                format!("{}Infinity", sign)
            } else {
                f.to_string()
            }
        }
        FormKind::Str(s) => js_string(s),
        FormKind::Char(c) => js_string(&c.to_string()),
        FormKind::Regex(pattern) => format!("/{}/", pattern.replace('/', "\\/")),
        FormKind::Keyword(kw) => match kw.namespace() {
            Some(ns) => format!(
                "cljs.core.keyword({}, {})",
                js_string(ns),
                js_string(kw.name())
            ),
            None => format!("cljs.core.keyword({})", js_string(kw.as_str())),
        },
        FormKind::Symbol(sym) => format!("cljs.core.symbol({})", js_string(sym.as_str())),
        FormKind::List(items) => format!("cljs.core.list({})", constants(items)),
        FormKind::Vector(items) => format!("cljs.core.vector({})", constants(items)),
        FormKind::Set(items) => format!("cljs.core.hash_set({})", constants(items)),
        FormKind::Map(entries) => {
            let flat: Vec<String> = entries
                .iter()
                .flat_map(|(k, v)| [constant(k), constant(v)])
                .collect();
            format!("cljs.core.hash_map({})", flat.join(", "))
        }
        FormKind::Tagged { tag, form } => match (tag.as_str(), &form.kind) {
            ("js", FormKind::Vector(items)) => format!("[{}]", constants(items)),
            ("js", FormKind::Map(entries)) => {
                let fields: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| {
                        let key = match &k.kind {
                            FormKind::Keyword(kw) | FormKind::Symbol(kw) => js_string(kw.as_str()),
                            FormKind::Str(s) => js_string(s),
                            _ => js_string(&k.to_string()),
                        };
                        format!("{}: {}", key, constant(v))
                    })
                    .collect();
                format!("({{{}}})", fields.join(", "))
            }
            _ => format!(
                "cljs.core.tagged_literal(cljs.core.symbol({}), {})",
                js_string(tag.as_str()),
                constant(form)
            ),
        },
    }
}

fn constants(items: &[Form]) -> String {
    items.iter().map(constant).collect::<Vec<_>>().join(", ")
}

/// Output buffer that tracks the generated line/column of everything written
#[derive(Debug, Default)]
struct JsWriter {
    out: String,
    line: u32,
    col: u32,
    mappings: Vec<Mapping>,
}

impl JsWriter {
    fn write(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += c.len_utf16() as u32;
            }
        }
        self.out.push_str(text);
    }

    /// Map the current generated position to the node's source position.
    /// Synthesized nodes have an empty span and are not mapped.
    fn mark(&mut self, node: &Node, name: Option<&str>) {
        if node.span.end <= node.span.start {
            return;
        }
        self.mappings.push(Mapping {
            gen_line: self.line,
            gen_col: self.col,
            source_line: node.pos.line,
            source_col: node.pos.column,
            name: name.map(str::to_string),
        });
    }

    fn finish(self) -> Emission {
        Emission {
            text: self.out,
            mappings: self.mappings,
        }
    }
}

//! `ns` form parsing

use crate::AnalysisError;
use cinder_ast::{Form, FormKind, NsDecl, Reload, Span, Symbol};

/// Which clause a lib spec appeared in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clause {
    Require,
    RequireMacros,
    Use,
    UseMacros,
}

impl Clause {
    fn keyword(self) -> &'static str {
        match self {
            Clause::Require => ":require",
            Clause::RequireMacros => ":require-macros",
            Clause::Use => ":use",
            Clause::UseMacros => ":use-macros",
        }
    }

    fn is_macros(self) -> bool {
        matches!(self, Clause::RequireMacros | Clause::UseMacros)
    }
}

/// One parsed lib spec, e.g. `[app.util :as u :refer [f] :reload]`
#[derive(Debug, Default)]
struct LibSpec {
    lib: Symbol,
    alias: Option<Symbol>,
    refer: Vec<Symbol>,
    refer_macros: Vec<Symbol>,
    include_macros: bool,
    only: Option<Vec<Symbol>>,
    reload: Option<Reload>,
}

/// Parse `(ns name docstring? attr-map? clauses*)`. `items` includes the head.
pub(crate) fn parse_ns(items: &[Form], span: Span, macros_ns: bool) -> Result<NsDecl, AnalysisError> {
    let name = items
        .get(1)
        .and_then(Form::as_symbol)
        .ok_or_else(|| AnalysisError::ns("expected a namespace name", span))?;
    if name.namespace().is_some() {
        return Err(AnalysisError::ns(
            format!("namespace name {} must not be qualified", name),
            items[1].span,
        ));
    }

    let name = if macros_ns {
        name.macros_ns()
    } else {
        name.clone()
    };
    let mut decl = NsDecl::new(name);

    for clause in &items[2..] {
        match &clause.kind {
            // docstring and attribute map
            FormKind::Str(_) | FormKind::Map(_) => continue,
            FormKind::List(parts) => parse_clause(&mut decl, parts, clause.span)?,
            _ => {
                return Err(AnalysisError::ns(
                    format!("unexpected {} in ns form", clause),
                    clause.span,
                ))
            }
        }
    }

    Ok(decl)
}

fn parse_clause(decl: &mut NsDecl, parts: &[Form], span: Span) -> Result<(), AnalysisError> {
    let head = parts
        .first()
        .and_then(Form::as_keyword)
        .ok_or_else(|| AnalysisError::ns("clause must start with a keyword", span))?;

    let clause = match head.as_str() {
        "require" => Clause::Require,
        "require-macros" => Clause::RequireMacros,
        "use" => Clause::Use,
        "use-macros" => Clause::UseMacros,
        "import" => return parse_import(decl, &parts[1..]),
        "refer-clojure" => return Ok(()),
        other => {
            return Err(AnalysisError::ns(
                format!("unsupported clause :{}", other),
                span,
            ))
        }
    };

    let mut flag = None;
    let mut libs = Vec::new();
    for spec in &parts[1..] {
        if let Some(reload) = reload_flag(spec) {
            flag = Some(reload);
            continue;
        }
        let spec = parse_lib_spec(spec, clause)?;
        libs.push(spec.lib.clone());
        apply_lib_spec(decl, spec, clause);
    }

    match flag {
        // macro clauses share one directive table, so a clause flag only
        // reaches the libs of its own clause
        Some(reload) if clause.is_macros() => {
            for lib in libs {
                decl.macro_reload.libs.entry(lib).or_insert(reload);
            }
        }
        Some(reload) => decl.reload.clause = Some(reload),
        None => {}
    }

    Ok(())
}

fn reload_flag(form: &Form) -> Option<Reload> {
    match form.as_keyword()?.as_str() {
        "reload" => Some(Reload::Reload),
        "reload-all" => Some(Reload::ReloadAll),
        _ => None,
    }
}

fn lib_name(form: &Form) -> Option<Symbol> {
    match &form.kind {
        FormKind::Symbol(sym) => Some(sym.clone()),
        FormKind::Str(s) => Some(Symbol::new(s.as_str())),
        _ => None,
    }
}

fn symbol_vector(form: Option<&Form>, option: &str, span: Span) -> Result<Vec<Symbol>, AnalysisError> {
    let items = match form.map(|f| &f.kind) {
        Some(FormKind::Vector(items)) | Some(FormKind::List(items)) => items,
        _ => {
            return Err(AnalysisError::ns(
                format!(":{} expects a vector of symbols", option),
                span,
            ))
        }
    };
    items
        .iter()
        .map(|item| {
            item.as_symbol().cloned().ok_or_else(|| {
                AnalysisError::ns(format!(":{} expects a vector of symbols", option), item.span)
            })
        })
        .collect()
}

fn parse_lib_spec(form: &Form, clause: Clause) -> Result<LibSpec, AnalysisError> {
    if let Some(lib) = lib_name(form) {
        if clause == Clause::Use || clause == Clause::UseMacros {
            return Err(AnalysisError::ns(
                format!("{} requires [lib :only [names]]", clause.keyword()),
                form.span,
            ));
        }
        return Ok(LibSpec {
            lib,
            ..LibSpec::default()
        });
    }

    let items = match &form.kind {
        FormKind::Vector(items) if !items.is_empty() => items,
        _ => {
            return Err(AnalysisError::ns(
                format!("invalid lib spec {} in {}", form, clause.keyword()),
                form.span,
            ))
        }
    };
    let lib = lib_name(&items[0])
        .ok_or_else(|| AnalysisError::ns("lib spec must start with a lib name", items[0].span))?;

    let mut spec = LibSpec {
        lib,
        ..LibSpec::default()
    };
    let mut i = 1;
    while i < items.len() {
        let option = &items[i];
        if let Some(reload) = reload_flag(option) {
            spec.reload = Some(reload);
            i += 1;
            continue;
        }
        let key = option.as_keyword().ok_or_else(|| {
            AnalysisError::ns(format!("expected an option keyword, found {}", option), option.span)
        })?;
        let value = items.get(i + 1);
        match key.as_str() {
            "as" => {
                let alias = value.and_then(Form::as_symbol).ok_or_else(|| {
                    AnalysisError::ns(":as expects a symbol", option.span)
                })?;
                spec.alias = Some(alias.clone());
            }
            "refer" => spec.refer = symbol_vector(value, "refer", option.span)?,
            "refer-macros" if clause == Clause::Require => {
                spec.refer_macros = symbol_vector(value, "refer-macros", option.span)?
            }
            "include-macros" if clause == Clause::Require => {
                spec.include_macros = matches!(value.map(|f| &f.kind), Some(FormKind::Bool(true)));
            }
            "only" if clause == Clause::Use || clause == Clause::UseMacros => {
                spec.only = Some(symbol_vector(value, "only", option.span)?)
            }
            other => {
                return Err(AnalysisError::ns(
                    format!("unsupported option :{} in {}", other, clause.keyword()),
                    option.span,
                ))
            }
        }
        i += 2;
    }

    if (clause == Clause::Use || clause == Clause::UseMacros) && spec.only.is_none() {
        return Err(AnalysisError::ns(
            format!("{} requires [lib :only [names]]", clause.keyword()),
            form.span,
        ));
    }

    Ok(spec)
}

fn apply_lib_spec(decl: &mut NsDecl, spec: LibSpec, clause: Clause) {
    let lib = spec.lib;
    match clause {
        Clause::Require | Clause::Use => {
            decl.add_dep(lib.clone());
            decl.requires.insert(lib.clone(), lib.clone());
            if let Some(alias) = &spec.alias {
                decl.requires.insert(alias.clone(), lib.clone());
            }
            for sym in spec.refer.into_iter().chain(spec.only.into_iter().flatten()) {
                decl.uses.insert(sym, lib.clone());
            }
            let with_macros = spec.include_macros || !spec.refer_macros.is_empty();
            if with_macros {
                decl.require_macros.insert(lib.clone(), lib.clone());
                if let Some(alias) = &spec.alias {
                    decl.require_macros.insert(alias.clone(), lib.clone());
                }
                for sym in spec.refer_macros {
                    decl.use_macros.insert(sym, lib.clone());
                }
            }
            if let Some(reload) = spec.reload {
                decl.reload.libs.insert(lib.clone(), reload);
                if with_macros {
                    decl.macro_reload.libs.insert(lib, reload);
                }
            }
        }
        Clause::RequireMacros => {
            decl.require_macros.insert(lib.clone(), lib.clone());
            if let Some(alias) = spec.alias {
                decl.require_macros.insert(alias, lib.clone());
            }
            for sym in spec.refer {
                decl.use_macros.insert(sym, lib.clone());
            }
            if let Some(reload) = spec.reload {
                decl.macro_reload.libs.insert(lib, reload);
            }
        }
        Clause::UseMacros => {
            for sym in spec.only.into_iter().flatten() {
                decl.use_macros.insert(sym, lib.clone());
            }
            if let Some(reload) = spec.reload {
                decl.macro_reload.libs.insert(lib, reload);
            }
        }
    }
}

/// `(:import goog.Uri [goog.string StringBuffer])`
fn parse_import(decl: &mut NsDecl, specs: &[Form]) -> Result<(), AnalysisError> {
    for spec in specs {
        match &spec.kind {
            FormKind::Symbol(class) => {
                let short = class.as_str().rsplit('.').next().unwrap_or(class.as_str());
                decl.add_dep(class.clone());
                decl.requires.insert(Symbol::new(short), class.clone());
            }
            FormKind::Vector(items) | FormKind::List(items) if !items.is_empty() => {
                let package = items[0]
                    .as_symbol()
                    .ok_or_else(|| AnalysisError::ns("import spec must start with a package", spec.span))?;
                for class in &items[1..] {
                    let class = class
                        .as_symbol()
                        .ok_or_else(|| AnalysisError::ns("imported class must be a symbol", class.span))?;
                    let full = Symbol::new(format!("{}.{}", package, class));
                    decl.add_dep(full.clone());
                    decl.requires.insert(class.clone(), full);
                }
            }
            _ => return Err(AnalysisError::ns(format!("invalid import spec {}", spec), spec.span)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_reader::read_str;

    fn decl(source: &str) -> NsDecl {
        let form = read_str(source).unwrap().remove(0);
        parse_ns(form.as_seq().unwrap(), form.span, false).unwrap()
    }

    fn err(source: &str) -> AnalysisError {
        let form = read_str(source).unwrap().remove(0);
        parse_ns(form.as_seq().unwrap(), form.span, false).unwrap_err()
    }

    fn sym(s: &str) -> Symbol {
        Symbol::new(s)
    }

    #[test]
    fn test_require_aliases_and_refers() {
        let decl = decl("(ns app.core \"docs\" (:require [app.util :as u :refer [helper]] app.db))");

        assert_eq!(decl.name, sym("app.core"));
        assert_eq!(decl.deps, vec![sym("app.util"), sym("app.db")]);
        assert_eq!(decl.requires.get(&sym("u")), Some(&sym("app.util")));
        assert_eq!(decl.requires.get(&sym("app.db")), Some(&sym("app.db")));
        assert_eq!(decl.uses.get(&sym("helper")), Some(&sym("app.util")));
        assert!(decl.require_macros.is_empty());
    }

    #[test]
    fn test_refer_macros_and_include_macros() {
        let decl = decl(
            "(ns a (:require [m.one :refer-macros [when-ok]] [m.two :as two :include-macros true]))",
        );

        assert_eq!(decl.use_macros.get(&sym("when-ok")), Some(&sym("m.one")));
        assert_eq!(decl.require_macros.get(&sym("two")), Some(&sym("m.two")));
        assert_eq!(decl.require_macros.get(&sym("m.one")), Some(&sym("m.one")));
        assert_eq!(decl.deps, vec![sym("m.one"), sym("m.two")]);
    }

    #[test]
    fn test_require_macros_and_use() {
        let decl = decl(
            "(ns a (:require-macros [m.core :as mc :refer [defthing]]) (:use [lib.x :only [f g]]) (:use-macros [m.other :only [mac]]))",
        );

        assert_eq!(decl.require_macros.get(&sym("mc")), Some(&sym("m.core")));
        assert_eq!(decl.use_macros.get(&sym("defthing")), Some(&sym("m.core")));
        assert_eq!(decl.use_macros.get(&sym("mac")), Some(&sym("m.other")));
        assert_eq!(decl.uses.get(&sym("g")), Some(&sym("lib.x")));
        assert_eq!(decl.deps, vec![sym("lib.x")]);
    }

    #[test]
    fn test_reload_directives() {
        let decl = decl("(ns a (:require [b :reload] c :reload-all) (:require-macros [m :reload]))");

        assert_eq!(decl.reload.clause, Some(Reload::ReloadAll));
        assert_eq!(decl.reload.libs.get(&sym("b")), Some(&Reload::Reload));
        assert_eq!(decl.macro_reload.libs.get(&sym("m")), Some(&Reload::Reload));
        assert_eq!(decl.macro_reload.clause, None);
    }

    #[test]
    fn test_macro_clause_reload_stays_in_its_clause() {
        let decl = decl(
            "(ns a (:require-macros m [n :reload]) (:use-macros [u :only [mac]] :reload-all) (:require-macros later :reload))",
        );

        let reload = &decl.macro_reload;
        assert_eq!(reload.clause, None);
        assert_eq!(reload.libs.get(&sym("m")), None);
        assert_eq!(reload.libs.get(&sym("n")), Some(&Reload::Reload));
        assert_eq!(reload.libs.get(&sym("u")), Some(&Reload::ReloadAll));
        assert_eq!(reload.libs.get(&sym("later")), Some(&Reload::Reload));
    }

    #[test]
    fn test_import() {
        let decl = decl("(ns a (:import goog.Uri [goog.string StringBuffer]))");

        assert_eq!(decl.deps, vec![sym("goog.Uri"), sym("goog.string.StringBuffer")]);
        assert_eq!(decl.requires.get(&sym("StringBuffer")), Some(&sym("goog.string.StringBuffer")));
    }

    #[test]
    fn test_macros_ns_name() {
        let form = read_str("(ns m.core)").unwrap().remove(0);
        let decl = parse_ns(form.as_seq().unwrap(), form.span, true).unwrap();
        assert_eq!(decl.name, sym("m.core$macros"));
    }

    #[test]
    fn test_invalid_ns_forms() {
        assert!(matches!(err("(ns)"), AnalysisError::InvalidNs { .. }));
        assert!(matches!(err("(ns a (:bogus b))"), AnalysisError::InvalidNs { .. }));
        assert!(matches!(err("(ns a (:use b))"), AnalysisError::InvalidNs { .. }));
        assert!(matches!(err("(ns a (:require [b :as]))"), AnalysisError::InvalidNs { .. }));
    }
}

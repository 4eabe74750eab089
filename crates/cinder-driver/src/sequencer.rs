//! Namespace side-effect sequencing
//!
//! A namespace declaration moves through
//! `Start -> DepsResolved -> UsesChecked -> MacrosLoaded -> Done`, one stage at
//! a time. Any failure aborts the whole sequence.

use crate::deps::{resolve_deps, Mode};
use crate::macros::load_macros;
use crate::{Context, DriverError, UseKind};
use cinder_ast::{Node, NodeKind, NsDecl};
use futures_util::future::{BoxFuture, FutureExt};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    DepsResolved,
    UsesChecked,
    MacrosLoaded,
    Done,
}

/// Run a node through the sequence. Non-declaration nodes pass straight
/// through. Returns the declaration with any aliased libs rewritten.
///
/// `mode` decides whether dependencies are loaded or only analyzed; macro
/// namespaces are loaded either way.
pub fn sequence(ctx: Context, node: Node, mode: Mode) -> BoxFuture<'static, Result<Node, DriverError>> {
    async move {
        let Node {
            kind,
            context,
            span,
            pos,
        } = node;
        let mut decl = match kind {
            NodeKind::Ns(decl) => decl,
            kind => return Ok(Node::new(kind, context, span, pos)),
        };

        let ctx = ctx.with_path_entry(decl.name.clone());
        let mut stage = Stage::Start;
        while stage != Stage::Done {
            stage = match stage {
                Stage::Start => {
                    resolve_declared_deps(&ctx, &mut decl, mode).await?;
                    Stage::DepsResolved
                }
                Stage::DepsResolved => {
                    if ctx.analyze_deps && !decl.uses.is_empty() {
                        check_uses(&ctx, &decl)?;
                    }
                    Stage::UsesChecked
                }
                Stage::UsesChecked => {
                    if ctx.load_macros {
                        load_declared_macros(&ctx, &decl).await?;
                        check_use_macros(&ctx, &decl)?;
                    }
                    Stage::MacrosLoaded
                }
                Stage::MacrosLoaded | Stage::Done => Stage::Done,
            };
            debug!("{}: {:?}", decl.name, stage);
        }

        Ok(Node::new(NodeKind::Ns(decl), context, span, pos))
    }
    .boxed()
}

async fn resolve_declared_deps(ctx: &Context, decl: &mut NsDecl, mode: Mode) -> Result<(), DriverError> {
    if !ctx.analyze_deps || decl.deps.is_empty() {
        return Ok(());
    }
    let aliases = resolve_deps(
        ctx.clone(),
        decl.name.clone(),
        decl.deps.clone(),
        decl.reload.clone(),
        mode,
    )
    .await?;
    for (from, to) in &aliases {
        decl.rewrite_lib(from, to);
    }
    Ok(())
}

/// `use-macros` libs first, then `require-macros` libs
async fn load_declared_macros(ctx: &Context, decl: &NsDecl) -> Result<(), DriverError> {
    let mut libs = NsDecl::macro_libs(&decl.use_macros);
    for lib in NsDecl::macro_libs(&decl.require_macros) {
        if !libs.contains(&lib) {
            libs.push(lib);
        }
    }
    if libs.is_empty() {
        return Ok(());
    }
    load_macros(
        ctx.clone(),
        decl.name.clone(),
        libs,
        decl.macro_reload.clone(),
    )
    .await
}

/// Every used var must be defined by its lib. Libs the registry has no
/// record of (foreign `js` libraries) are taken on trust.
fn check_uses(ctx: &Context, decl: &NsDecl) -> Result<(), DriverError> {
    ctx.state.with_namespaces(|registry| {
        for (sym, lib) in &decl.uses {
            if let Some(info) = registry.get(lib) {
                if !info.defines(sym.as_str()) {
                    return Err(DriverError::UndeclaredUse {
                        ns: decl.name.clone(),
                        lib: lib.clone(),
                        sym: sym.clone(),
                        kind: UseKind::Var,
                    });
                }
            }
        }
        Ok(())
    })
}

/// Every used macro must be a macro of `lib$macros`. A macro namespace that
/// was loaded without an analysis record is taken on trust.
fn check_use_macros(ctx: &Context, decl: &NsDecl) -> Result<(), DriverError> {
    for (sym, lib) in &decl.use_macros {
        let key = lib.macros_ns();
        let defined = ctx
            .state
            .with_namespaces(|registry| registry.get(&key).map(|info| info.defines_macro(sym.as_str())));
        let ok = match defined {
            Some(defined) => defined,
            None => ctx.loaded.contains(&key),
        };
        if !ok {
            return Err(DriverError::UndeclaredUse {
                ns: decl.name.clone(),
                lib: lib.clone(),
                sym: sym.clone(),
                kind: UseKind::Macro,
            });
        }
    }
    Ok(())
}

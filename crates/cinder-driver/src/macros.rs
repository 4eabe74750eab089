//! Macro namespace loading

use crate::deps::{load_namespace, Mode};
use crate::{Context, DriverError};
use cinder_ast::{Reload, ReloadDirectives, Symbol};
use futures_util::future::{BoxFuture, FutureExt};
use log::{debug, info};

/// Load the macro namespaces `libs`, in order, on behalf of the declaration
/// `decl_name`. Each is resolved with `macros: true` and recorded as
/// `lib$macros`. Macro namespaces are always evaluated, even when the
/// declaration itself is only being analyzed.
pub fn load_macros(
    ctx: Context,
    decl_name: Symbol,
    libs: Vec<Symbol>,
    directives: ReloadDirectives,
) -> BoxFuture<'static, Result<(), DriverError>> {
    async move {
        let mut cleared = false;
        for lib in libs {
            let key = lib.macros_ns();
            match effective_reload(&ctx, &decl_name, &lib, &directives) {
                Some(Reload::Reload) => {
                    ctx.loaded.remove(&key);
                }
                Some(Reload::ReloadAll) if !cleared => {
                    ctx.loaded.clear();
                    cleared = true;
                }
                _ => {}
            }

            if ctx.path.contains(&key) {
                return Err(DriverError::circular(ctx.path.closed_by(&key)));
            }
            if ctx.loaded.contains(&key) {
                debug!("{}: macros of {} already loaded", decl_name, lib);
                continue;
            }
            if ctx.verbose {
                info!("Loading macros {} for {}", lib, decl_name);
            }
            if !load_namespace(ctx.clone(), lib.clone(), true, Mode::Load).await? {
                return Err(DriverError::UndeclaredNamespace {
                    requester: decl_name.clone(),
                    ns: lib,
                    macros: true,
                });
            }
        }
        Ok(())
    }
    .boxed()
}

/// Directive recorded for `lib`, else the clause-level directive, else
/// `Reload` when `lib` is the namespace being redefined and the context asks
/// for macro reloads
fn effective_reload(
    ctx: &Context,
    decl_name: &Symbol,
    lib: &Symbol,
    directives: &ReloadDirectives,
) -> Option<Reload> {
    directives
        .libs
        .get(lib)
        .copied()
        .or(directives.clause)
        .or_else(|| {
            let redefining = decl_name.without_macros_suffix() == *lib;
            (redefining && ctx.reload_macros).then_some(Reload::Reload)
        })
}

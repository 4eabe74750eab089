//! Incremental unit driver
//!
//! Reads one form at a time, analyzes it, routes namespace declarations
//! through the sequencer and then emits and/or evaluates, depending on the
//! mode. A declaration's whole sequence completes before the next form is
//! read.

use crate::deps::Mode;
use crate::sequencer::sequence;
use crate::source_map::{inline_directives, Accumulator};
use crate::toolchain::EncodeRequest;
use crate::{Context, DriverError, EvalRequest, Language};
use cinder_ast::{munge, Form, Node, Symbol};
use cinder_codegen::Emission;
use cinder_reader::Read;
use futures_util::future::{BoxFuture, FutureExt};
use log::{debug, trace};
use serde::Serialize;
use serde_json::Value;

/// Result of evaluating a unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluated {
    /// Namespace the unit ended in
    pub ns: Symbol,
    /// Value of the last evaluated form, `null` for an empty unit
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitMode {
    Analyze,
    Compile,
    Eval,
}

/// Analyze every form of a unit; dependencies are only analyzed
pub fn analyze_unit(ctx: Context, source: String, unit: String) -> BoxFuture<'static, Result<(), DriverError>> {
    async move {
        drive(ctx, source, unit, UnitMode::Analyze).await?;
        Ok(())
    }
    .boxed()
}

/// Compile a unit to JavaScript text
pub fn compile_unit(ctx: Context, source: String, unit: String) -> BoxFuture<'static, Result<String, DriverError>> {
    async move {
        let driver = drive(ctx, source, unit, UnitMode::Compile).await?;
        Ok(driver.text)
    }
    .boxed()
}

/// Evaluate a unit form by form, loading its dependencies
pub fn eval_unit(ctx: Context, source: String, unit: String) -> BoxFuture<'static, Result<Evaluated, DriverError>> {
    async move {
        let driver = drive(ctx, source, unit, UnitMode::Eval).await?;
        Ok(Evaluated {
            ns: driver.ns,
            value: driver.value,
        })
    }
    .boxed()
}

/// Evaluate a single form that has already been read
pub fn eval_form(ctx: Context, form: Form, unit: String) -> BoxFuture<'static, Result<Evaluated, DriverError>> {
    async move {
        let mut driver = UnitDriver::new(ctx, unit, UnitMode::Eval);
        driver.step(form).await?;
        if let Some(acc) = driver.acc.take() {
            driver.ctx.state.store_source_map(driver.unit.as_str(), acc.finish());
        }
        Ok(Evaluated {
            ns: driver.ns,
            value: driver.value,
        })
    }
    .boxed()
}

async fn drive(ctx: Context, source: String, unit: String, mode: UnitMode) -> Result<UnitDriver, DriverError> {
    debug!("{:?} unit {} in {}", mode, unit, ctx.ns);
    let mut forms = ctx
        .toolchain
        .reader
        .open(source.clone(), &unit, ctx.data_readers.clone());
    let mut driver = UnitDriver::new(ctx, unit, mode);

    loop {
        let form = match forms.next_form() {
            Ok(Read::Form(form)) => form,
            Ok(Read::Eof) => break,
            Err(source) => {
                return Err(DriverError::Read {
                    unit: driver.unit,
                    source,
                })
            }
        };
        driver.step(form).await?;
    }

    driver.finish(&source)?;
    Ok(driver)
}

/// State local to one unit
struct UnitDriver {
    ctx: Context,
    unit: String,
    mode: UnitMode,
    /// Current namespace, changed only by a completed declaration sequence
    ns: Symbol,
    text: String,
    value: Value,
    acc: Option<Accumulator>,
}

impl UnitDriver {
    fn new(ctx: Context, unit: String, mode: UnitMode) -> Self {
        let acc = (mode != UnitMode::Analyze && ctx.source_map).then(Accumulator::new);
        Self {
            ns: ctx.ns.clone(),
            ctx,
            unit,
            mode,
            text: String::new(),
            value: Value::Null,
            acc,
        }
    }

    async fn step(&mut self, form: Form) -> Result<(), DriverError> {
        trace!("{}: {}", self.unit, form);
        let node = self.analyze(&form)?;

        match node.as_ns().map(|decl| decl.name.clone()) {
            Some(name) => {
                let ctx = self.ctx.with_ns(self.ns.clone());
                let node = match self.mode {
                    UnitMode::Analyze => sequence(ctx, node, Mode::AnalyzeOnly).await?,
                    UnitMode::Compile => {
                        let node = sequence(ctx, node, Mode::AnalyzeOnly).await?;
                        let chunk = self.ctx.toolchain.emitter.emit(&node);
                        self.append(chunk);
                        node
                    }
                    UnitMode::Eval => {
                        let chunk = self.ctx.toolchain.emitter.emit_provide(&name);
                        self.evaluate(chunk).await?;
                        sequence(ctx, node, Mode::Load).await?
                    }
                };
                debug!("{}: now in {}", self.unit, name);
                self.ns = node.as_ns().map(|decl| decl.name.clone()).unwrap_or(name);
            }
            None => match self.mode {
                UnitMode::Analyze => {}
                UnitMode::Compile => {
                    let chunk = self.ctx.toolchain.emitter.emit(&node);
                    self.append(chunk);
                }
                UnitMode::Eval => {
                    let chunk = self.ctx.toolchain.emitter.emit(&node);
                    self.evaluate(chunk).await?;
                }
            },
        }
        Ok(())
    }

    fn analyze(&self, form: &Form) -> Result<Node, DriverError> {
        let env = self.ctx.with_ns(self.ns.clone()).analysis_env();
        let analyzer = &self.ctx.toolchain.analyzer;
        self.ctx
            .state
            .update_namespaces(|registry| analyzer.analyze(form, &env, registry))
            .map_err(|source| DriverError::Analysis {
                unit: self.unit.clone(),
                source,
            })
    }

    fn append(&mut self, chunk: Emission) {
        if let Some(acc) = &mut self.acc {
            acc.push(&chunk);
        }
        self.text.push_str(&chunk.text);
    }

    async fn evaluate(&mut self, chunk: Emission) -> Result<(), DriverError> {
        if let Some(acc) = &mut self.acc {
            acc.push(&chunk);
        }
        let request = EvalRequest {
            language: Language::Clj,
            name: self.ns.to_string(),
            source: chunk.text,
            path: None,
        };
        self.value = self
            .ctx
            .evaluator
            .evaluate(request)
            .await
            .map_err(|err| DriverError::capability("evaluator", self.unit.as_str(), err))?;
        Ok(())
    }

    /// Flush the source map, appending the inline directive to compiled text
    fn finish(&mut self, source: &str) -> Result<(), DriverError> {
        let Some(acc) = self.acc.take() else {
            return Ok(());
        };
        let table = acc.finish();

        if self.mode == UnitMode::Compile {
            let file = format!("{}.js", munge(&self.unit));
            let request = EncodeRequest {
                file: &file,
                source_name: &self.unit,
                source,
            };
            let json = self
                .ctx
                .toolchain
                .encoder
                .encode(&table, &request)
                .map_err(|source| DriverError::SourceMap {
                    unit: self.unit.clone(),
                    source,
                })?;
            self.text.push_str(&inline_directives(&file, &json));
        }

        self.ctx.state.store_source_map(self.unit.as_str(), table);
        Ok(())
    }
}

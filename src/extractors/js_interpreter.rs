use rquickjs::{Context, Ctx, Object, Runtime, Value};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::Config;
use crate::core::error::{ResolveError, Result};

const MAX_STACK_SIZE: usize = 1024 * 1024;

/// The only values a challenge script can see besides ECMAScript built-ins.
#[derive(Debug, Clone)]
pub struct SandboxBindings {
    pub user_agent: String,
    pub page_url: String,
    pub cookie: String,
}

/// Runs untrusted page scripts in a fresh QuickJS runtime.
///
/// Each evaluation gets its own runtime and context, so nothing a script does
/// survives the call. The context has no host functions: no module loader,
/// no timers, no filesystem or network. The global object carries exactly
/// `window`, `global`, `navigator`, `location` and `document`, and execution
/// is bounded by a memory limit, a stack limit and a wall-clock deadline.
#[derive(Debug, Clone, Copy)]
pub struct ScriptSandbox {
    timeout: Duration,
    memory_limit: usize,
}

impl ScriptSandbox {
    pub fn new(config: &Config) -> Self {
        Self {
            timeout: Duration::from_millis(config.script_timeout_ms),
            memory_limit: config.script_memory_limit,
        }
    }

    /// Strip null bytes, which QuickJS rejects in source text.
    fn clean_source(source: &str) -> String {
        source.replace('\0', "")
    }

    /// Evaluate `source` against the fabricated bindings, then hand whatever
    /// the script left at `window[export]` to `inspect`. The exported value
    /// cannot escape the closure; `inspect` must convert it to a Rust value.
    pub fn evaluate<R, F>(
        &self,
        source: &str,
        bindings: &SandboxBindings,
        export: &str,
        inspect: F,
    ) -> Result<R>
    where
        F: for<'js> FnOnce(Ctx<'js>, Value<'js>) -> Result<R>,
    {
        let runtime = Runtime::new()?;
        runtime.set_memory_limit(self.memory_limit);
        runtime.set_max_stack_size(MAX_STACK_SIZE);
        let deadline = Instant::now() + self.timeout;
        runtime.set_interrupt_handler(Some(Box::new(move || Instant::now() >= deadline)));

        let context = Context::full(&runtime)?;
        let source = Self::clean_source(source);

        context.with(|ctx| {
            let global = ctx.globals();
            Self::install_bindings(&ctx, &global, bindings)?;

            let _: Value = ctx.eval(source.as_bytes()).map_err(|e| {
                debug!("Challenge script failed to evaluate: {}", e);
                debug!("Challenge script length: {}", source.len());
                ResolveError::ChallengeUnsolvable(format!("script evaluation failed: {}", e))
            })?;

            let exported: Value = global.get(export)?;
            debug!("Script exported '{}' as {:?}", export, exported.type_of());
            inspect(ctx.clone(), exported)
        })
    }

    fn install_bindings<'js>(
        ctx: &Ctx<'js>,
        global: &Object<'js>,
        bindings: &SandboxBindings,
    ) -> Result<()> {
        let navigator = Object::new(ctx.clone())?;
        navigator.set("userAgent", bindings.user_agent.as_str())?;

        let location = Object::new(ctx.clone())?;
        location.set("href", bindings.page_url.as_str())?;
        location.set("protocol", "https:")?;

        let document = Object::new(ctx.clone())?;
        document.set("cookie", bindings.cookie.as_str())?;

        global.set("navigator", navigator)?;
        global.set("location", location)?;
        global.set("document", document)?;
        global.set("window", global.clone())?;
        global.set("global", global.clone())?;
        Ok(())
    }
}

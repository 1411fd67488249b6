use http::Method;

use super::ResponseContext;

const DEFAULT_MAX_IDLE: usize = 64;

/// Free-list of [`ResponseContext`] values.
///
/// Contexts churn once per proxied request, so the proxy keeps finished ones
/// around instead of reallocating. A checked-out context is always freshly
/// [`reset`][ResponseContext::reset]; whatever state it was checked in with
/// does not leak into the next exchange.
pub struct ContextPool {
    idle: Vec<ResponseContext>,
    max_idle: usize,
}

impl ContextPool {
    pub fn new() -> Self {
        Self::with_max_idle(DEFAULT_MAX_IDLE)
    }

    /// A pool keeping at most `max_idle` contexts around.
    pub fn with_max_idle(max_idle: usize) -> Self {
        ContextPool {
            idle: Vec::new(),
            max_idle,
        }
    }

    /// A context armed for the response to a `method` request. Reuses an
    /// idle context when one is available.
    pub fn checkout(&mut self, method: Method, upgrade_requested: bool) -> ResponseContext {
        match self.idle.pop() {
            Some(mut ctx) => {
                ctx.reset(method, upgrade_requested);
                ctx
            }
            None => ResponseContext::new(method, upgrade_requested),
        }
    }

    /// Return a finished context. Dropped instead when the pool is full.
    pub fn checkin(&mut self, ctx: ResponseContext) {
        if self.idle.len() < self.max_idle {
            self.idle.push(ctx);
        }
    }

    /// Number of contexts currently held.
    pub fn idle(&self) -> usize {
        self.idle.len()
    }
}

impl Default for ContextPool {
    fn default() -> Self {
        Self::new()
    }
}

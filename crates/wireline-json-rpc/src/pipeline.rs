//! Per-method execution pipeline.
//!
//! Each registered method runs through an ordered pipeline before its
//! handler body executes:
//!
//! 1. **Pipes** — left to right, each transforming (or rejecting) the params.
//! 2. **Guards** — first denial short-circuits with a 403-coded failure.
//! 3. **Interceptors** — nested outermost-first, each wrapping the rest of
//!    the chain through [`Next`] and able to short-circuit by not invoking it.
//! 4. The handler body.
//!
//! Any stage failing aborts everything downstream; the failing stage's own
//! error (not a wrapper) is what reaches the dispatcher. Stages for one
//! request run sequentially and share no state with concurrent requests —
//! all per-request data flows through the params and the [`RequestContext`].

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::context::RequestContext;
use crate::error::RpcError;
use crate::registry::HandlerDescriptor;

/// Input stage: transforms or validates params before invocation.
#[async_trait]
pub trait Pipe: Send + Sync {
    async fn transform(&self, params: Value, ctx: &RequestContext) -> Result<Value, RpcError>;
}

/// Authorization stage. Returning `Ok(false)` denies the request with the
/// default 403 code; returning `Err` denies it with the supplied error.
#[async_trait]
pub trait Guard: Send + Sync {
    async fn allow(&self, params: &Value, ctx: &RequestContext) -> Result<bool, RpcError>;
}

/// Wrapping stage. Runs logic before and after the inner call, and may
/// short-circuit by returning without invoking `next`.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(
        &self,
        params: Value,
        ctx: &RequestContext,
        next: Next<'_>,
    ) -> Result<Value, RpcError>;
}

/// The handler body at the center of the pipeline.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn invoke(&self, params: Value, ctx: &RequestContext) -> Result<Value, RpcError>;
}

/// Continuation handed to an interceptor: the remaining interceptors plus
/// the handler body. Consuming it with [`Next::run`] invokes the rest of
/// the chain; dropping it short-circuits.
pub struct Next<'a> {
    interceptors: &'a [Arc<dyn Interceptor>],
    handler: &'a dyn Handler,
    ctx: &'a RequestContext,
}

impl<'a> Next<'a> {
    pub fn run(self, params: Value) -> BoxFuture<'a, Result<Value, RpcError>> {
        Box::pin(async move {
            match self.interceptors.split_first() {
                Some((outer, rest)) => {
                    let next = Next {
                        interceptors: rest,
                        handler: self.handler,
                        ctx: self.ctx,
                    };
                    outer.intercept(params, self.ctx, next).await
                }
                None => self.handler.invoke(params, self.ctx).await,
            }
        })
    }
}

/// Run a descriptor's full pipeline for one request.
pub async fn execute(
    descriptor: &HandlerDescriptor,
    mut params: Value,
    ctx: &RequestContext,
) -> Result<Value, RpcError> {
    for pipe in descriptor.pipes() {
        params = pipe.transform(params, ctx).await?;
    }

    for guard in descriptor.guards() {
        if !guard.allow(&params, ctx).await? {
            return Err(RpcError::denied("Access denied"));
        }
    }

    let next = Next {
        interceptors: descriptor.interceptors(),
        handler: descriptor.handler(),
        ctx,
    };
    next.run(params).await
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Value, RequestContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, RpcError>> + Send,
{
    async fn invoke(&self, params: Value, ctx: &RequestContext) -> Result<Value, RpcError> {
        (self.0)(params, ctx.clone()).await
    }
}

/// Adapt an async closure into a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn Handler>
where
    F: Fn(Value, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, RpcError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

struct PerRequest<F>(F);

#[async_trait]
impl<F, I> Interceptor for PerRequest<F>
where
    F: Fn() -> I + Send + Sync,
    I: Interceptor,
{
    async fn intercept(
        &self,
        params: Value,
        ctx: &RequestContext,
        next: Next<'_>,
    ) -> Result<Value, RpcError> {
        let stage = (self.0)();
        stage.intercept(params, ctx, next).await
    }
}

/// Wrap a factory so a fresh interceptor instance is built for every
/// request, its lifetime bounded to that request's processing. Use this for
/// stages that carry per-call state.
pub fn per_request<F, I>(factory: F) -> Arc<dyn Interceptor>
where
    F: Fn() -> I + Send + Sync + 'static,
    I: Interceptor + 'static,
{
    Arc::new(PerRequest(factory))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::HandlerDescriptor;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct AppendPipe(&'static str);

    #[async_trait]
    impl Pipe for AppendPipe {
        async fn transform(&self, params: Value, _ctx: &RequestContext) -> Result<Value, RpcError> {
            let s = params.as_str().unwrap_or_default();
            Ok(json!(format!("{}{}", s, self.0)))
        }
    }

    struct RejectPipe;

    #[async_trait]
    impl Pipe for RejectPipe {
        async fn transform(
            &self,
            _params: Value,
            _ctx: &RequestContext,
        ) -> Result<Value, RpcError> {
            Err(RpcError::new(422, "validation failed"))
        }
    }

    struct StaticGuard(bool);

    #[async_trait]
    impl Guard for StaticGuard {
        async fn allow(&self, _params: &Value, _ctx: &RequestContext) -> Result<bool, RpcError> {
            Ok(self.0)
        }
    }

    struct TraceInterceptor {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Interceptor for TraceInterceptor {
        async fn intercept(
            &self,
            params: Value,
            _ctx: &RequestContext,
            next: Next<'_>,
        ) -> Result<Value, RpcError> {
            self.log.lock().unwrap().push(format!("before_{}", self.name));
            let result = next.run(params).await;
            self.log.lock().unwrap().push(format!("after_{}", self.name));
            result
        }
    }

    struct ShortCircuit;

    #[async_trait]
    impl Interceptor for ShortCircuit {
        async fn intercept(
            &self,
            _params: Value,
            _ctx: &RequestContext,
            _next: Next<'_>,
        ) -> Result<Value, RpcError> {
            Ok(json!("cached"))
        }
    }

    fn tracking_handler(invoked: Arc<AtomicBool>) -> Arc<dyn Handler> {
        handler_fn(move |params, _ctx| {
            let invoked = invoked.clone();
            async move {
                invoked.store(true, Ordering::SeqCst);
                Ok(params)
            }
        })
    }

    #[tokio::test]
    async fn pipes_run_left_to_right() {
        let descriptor = HandlerDescriptor::new("concat", handler_fn(|p, _| async move { Ok(p) }))
            .pipe(Arc::new(AppendPipe("a")))
            .pipe(Arc::new(AppendPipe("b")));

        let result = execute(&descriptor, json!(""), &RequestContext::new())
            .await
            .unwrap();
        assert_eq!(result, json!("ab"));
    }

    #[tokio::test]
    async fn failing_pipe_aborts_with_its_own_error() {
        let invoked = Arc::new(AtomicBool::new(false));
        let descriptor = HandlerDescriptor::new("x", tracking_handler(invoked.clone()))
            .pipe(Arc::new(RejectPipe))
            .pipe(Arc::new(AppendPipe("never")));

        let err = execute(&descriptor, json!("in"), &RequestContext::new())
            .await
            .unwrap_err();
        assert_eq!(err, RpcError::new(422, "validation failed"));
        assert!(!invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn denying_guard_short_circuits() {
        let invoked = Arc::new(AtomicBool::new(false));
        let descriptor = HandlerDescriptor::new("x", tracking_handler(invoked.clone()))
            .guard(Arc::new(StaticGuard(true)))
            .guard(Arc::new(StaticGuard(false)));

        let err = execute(&descriptor, json!({}), &RequestContext::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, 403);
        assert!(!invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn interceptors_nest_outermost_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_handler = log.clone();
        let descriptor = HandlerDescriptor::new(
            "x",
            handler_fn(move |p, _| {
                let log = log_handler.clone();
                async move {
                    log.lock().unwrap().push("handler".to_string());
                    Ok(p)
                }
            }),
        )
        .interceptor(Arc::new(TraceInterceptor {
            name: "outer",
            log: log.clone(),
        }))
        .interceptor(Arc::new(TraceInterceptor {
            name: "inner",
            log: log.clone(),
        }));

        execute(&descriptor, json!(null), &RequestContext::new())
            .await
            .unwrap();

        let log = log.lock().unwrap();
        assert_eq!(
            *log,
            vec!["before_outer", "before_inner", "handler", "after_inner", "after_outer"]
        );
    }

    #[tokio::test]
    async fn interceptor_can_short_circuit() {
        let invoked = Arc::new(AtomicBool::new(false));
        let descriptor = HandlerDescriptor::new("x", tracking_handler(invoked.clone()))
            .interceptor(Arc::new(ShortCircuit));

        let result = execute(&descriptor, json!({}), &RequestContext::new())
            .await
            .unwrap();
        assert_eq!(result, json!("cached"));
        assert!(!invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn per_request_builds_a_fresh_stage_each_call() {
        let built = Arc::new(AtomicUsize::new(0));
        let built_factory = built.clone();
        let descriptor = HandlerDescriptor::new("x", handler_fn(|p, _| async move { Ok(p) }))
            .interceptor(per_request(move || {
                built_factory.fetch_add(1, Ordering::SeqCst);
                ShortCircuit
            }));

        for _ in 0..2 {
            execute(&descriptor, json!({}), &RequestContext::new())
                .await
                .unwrap();
        }
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }
}

//! Method registry: name → handler descriptor, frozen before serving.

use std::collections::HashMap;
use std::sync::Arc;

use crate::pipeline::{Guard, Handler, Interceptor, Pipe};

/// A registered method: its name, pipeline stages, and handler body.
/// Immutable once handed to the registry builder.
pub struct HandlerDescriptor {
    name: String,
    pipes: Vec<Arc<dyn Pipe>>,
    guards: Vec<Arc<dyn Guard>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    handler: Arc<dyn Handler>,
}

impl HandlerDescriptor {
    pub fn new(name: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        Self {
            name: name.into(),
            pipes: Vec::new(),
            guards: Vec::new(),
            interceptors: Vec::new(),
            handler,
        }
    }

    /// Append an input pipe. Pipes run in the order added.
    pub fn pipe(mut self, pipe: Arc<dyn Pipe>) -> Self {
        self.pipes.push(pipe);
        self
    }

    /// Append a guard to the guard chain.
    pub fn guard(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guards.push(guard);
        self
    }

    /// Append an interceptor. The first added is the outermost.
    pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn pipes(&self) -> &[Arc<dyn Pipe>] {
        &self.pipes
    }

    pub(crate) fn guards(&self) -> &[Arc<dyn Guard>] {
        &self.guards
    }

    pub(crate) fn interceptors(&self) -> &[Arc<dyn Interceptor>] {
        &self.interceptors
    }

    pub(crate) fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }
}

/// Read-only method table. Built once at startup via [`MethodRegistry::builder`],
/// then safe for unsynchronized concurrent lookup for the server's lifetime.
#[derive(Default)]
pub struct MethodRegistry {
    methods: HashMap<String, Arc<HandlerDescriptor>>,
}

impl MethodRegistry {
    pub fn builder() -> MethodRegistryBuilder {
        MethodRegistryBuilder::default()
    }

    /// Exact-string, case-sensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<&HandlerDescriptor> {
        self.methods.get(name).map(Arc::as_ref)
    }

    pub fn method_names(&self) -> Vec<&str> {
        self.methods.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Startup-time assembly of the method table. Registering the same name
/// twice replaces the earlier descriptor.
#[derive(Default)]
pub struct MethodRegistryBuilder {
    methods: HashMap<String, Arc<HandlerDescriptor>>,
}

impl MethodRegistryBuilder {
    pub fn register(mut self, descriptor: HandlerDescriptor) -> Self {
        self.methods
            .insert(descriptor.name().to_string(), Arc::new(descriptor));
        self
    }

    pub fn build(self) -> MethodRegistry {
        MethodRegistry {
            methods: self.methods,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::handler_fn;

    fn noop() -> Arc<dyn crate::pipeline::Handler> {
        handler_fn(|params, _ctx| async move { Ok(params) })
    }

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        let registry = MethodRegistry::builder()
            .register(HandlerDescriptor::new("echo", noop()))
            .build();

        assert!(registry.lookup("echo").is_some());
        assert!(registry.lookup("Echo").is_none());
        assert!(registry.lookup("echo ").is_none());
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let registry = MethodRegistry::builder()
            .register(HandlerDescriptor::new("echo", noop()))
            .register(HandlerDescriptor::new("echo", noop()))
            .build();

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn empty_registry() {
        let registry = MethodRegistry::builder().build();
        assert!(registry.is_empty());
        assert!(registry.lookup("anything").is_none());
    }
}

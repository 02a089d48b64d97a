//! Handler mapping.
//!
//! Binds method names to [`Handler`]s. A call is resolved in this order:
//!
//! 1. the `system.*` introspection methods, when enabled
//! 2. an exact registration for the full method name
//! 3. the handler of the longest registered namespace prefix, so that
//!    `"calc.basic.add"` falls back to `"calc.basic"` and then `"calc"`
//!
//! The mapping is built up front and then shared read-only by every call.

use futures::future::{BoxFuture, Future};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

use xmlrpc_common::faults::INVALID_PARAMS;
use xmlrpc_common::handler::{async_handler_fn, handler_fn};
use xmlrpc_common::{Fault, Handler, Request, Result, Value, XmlRpcError};

pub const LIST_METHODS: &str = "system.listMethods";
pub const METHOD_HELP: &str = "system.methodHelp";
pub const METHOD_SIGNATURE: &str = "system.methodSignature";

/// Returned by `system.methodSignature` when no signature was declared.
pub const UNDEFINED_SIGNATURE: &str = "undef";

struct Registration {
    handler: Arc<dyn Handler>,
    help: String,
    /// Each signature lists the return type followed by the parameter types
    signatures: Vec<Vec<String>>,
}

#[derive(Default)]
pub struct HandlerMapping {
    methods: BTreeMap<String, Registration>,
    namespaces: HashMap<String, Arc<dyn Handler>>,
    introspection: bool,
}

impl HandlerMapping {
    /// Creates an empty mapping with introspection enabled.
    pub fn new() -> Self {
        Self {
            introspection: true,
            ..Self::default()
        }
    }

    pub fn with_introspection(mut self, enabled: bool) -> Self {
        self.introspection = enabled;
        self
    }

    pub fn introspection(&self) -> bool {
        self.introspection
    }

    /// Registers a handler under an exact method name, replacing any
    /// previous registration.
    pub fn register<H>(&mut self, name: impl Into<String>, handler: H) -> &mut Self
    where
        H: Handler + 'static,
    {
        let name = name.into();
        debug!(method = %name, "Registering handler");
        self.methods.insert(
            name,
            Registration {
                handler: Arc::new(handler),
                help: String::new(),
                signatures: Vec::new(),
            },
        );
        self
    }

    /// Registers a synchronous closure over the call's parameters.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(name, handler_fn(f))
    }

    /// Registers an async closure receiving owned parameters.
    pub fn register_async_fn<F, Fut>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.register(name, async_handler_fn(f))
    }

    /// Registers a handler for every `namespace.*` method without an exact
    /// registration. The handler receives the full request.
    pub fn register_namespace<H>(&mut self, namespace: impl Into<String>, handler: H) -> &mut Self
    where
        H: Handler + 'static,
    {
        let namespace = namespace.into();
        debug!(namespace = %namespace, "Registering namespace handler");
        self.namespaces.insert(namespace, Arc::new(handler));
        self
    }

    /// Attaches introspection metadata to a registered method.
    ///
    /// # Errors
    ///
    /// [`XmlRpcError::NoSuchHandler`] if `name` has no exact registration.
    pub fn describe(
        &mut self,
        name: &str,
        help: impl Into<String>,
        signatures: Vec<Vec<String>>,
    ) -> Result<&mut Self> {
        let registration = self
            .methods
            .get_mut(name)
            .ok_or_else(|| XmlRpcError::NoSuchHandler(name.to_string()))?;
        registration.help = help.into();
        registration.signatures = signatures;
        Ok(self)
    }

    /// Resolves the handler for a method name.
    pub fn lookup(&self, method_name: &str) -> Result<Arc<dyn Handler>> {
        if let Some(registration) = self.methods.get(method_name) {
            return Ok(registration.handler.clone());
        }

        let mut prefix = method_name;
        while let Some((namespace, _)) = prefix.rsplit_once('.') {
            if let Some(handler) = self.namespaces.get(namespace) {
                return Ok(handler.clone());
            }
            prefix = namespace;
        }

        Err(XmlRpcError::NoSuchHandler(method_name.to_string()))
    }

    /// Sorted names of all exactly registered methods, plus the
    /// introspection methods when enabled.
    pub fn list_methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.keys().cloned().collect();
        if self.introspection {
            names.extend([LIST_METHODS, METHOD_HELP, METHOD_SIGNATURE].map(String::from));
            names.sort();
        }
        names
    }

    pub fn method_help(&self, name: &str) -> Result<String> {
        match self.methods.get(name) {
            Some(registration) => Ok(registration.help.clone()),
            None => Err(XmlRpcError::NoSuchHandler(name.to_string())),
        }
    }

    /// Declared signatures as an array of type-name arrays, or the string
    /// `"undef"` when none were declared.
    pub fn method_signature(&self, name: &str) -> Result<Value> {
        let registration = self
            .methods
            .get(name)
            .ok_or_else(|| XmlRpcError::NoSuchHandler(name.to_string()))?;
        if registration.signatures.is_empty() {
            return Ok(Value::from(UNDEFINED_SIGNATURE));
        }
        Ok(Value::Array(
            registration
                .signatures
                .iter()
                .map(|signature| {
                    Value::Array(signature.iter().map(|name| Value::from(name.as_str())).collect())
                })
                .collect(),
        ))
    }

    fn introspect(&self, request: &Request) -> Option<Result<Value>> {
        if !self.introspection {
            return None;
        }
        let result = match request.method_name() {
            LIST_METHODS => Ok(Value::Array(
                self.list_methods().into_iter().map(Value::from).collect(),
            )),
            METHOD_HELP => method_name_param(request).and_then(|name| self.method_help(name).map(Value::from)),
            METHOD_SIGNATURE => method_name_param(request).and_then(|name| self.method_signature(name)),
            _ => return None,
        };
        Some(result)
    }
}

fn method_name_param(request: &Request) -> Result<&str> {
    match request.params() {
        [Value::String(name)] => Ok(name),
        _ => Err(Fault::new(
            INVALID_PARAMS,
            format!("{} expects a single method name", request.method_name()),
        )
        .into()),
    }
}

impl Handler for HandlerMapping {
    fn execute<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Value>> {
        Box::pin(async move {
            if let Some(result) = self.introspect(request) {
                return result;
            }
            let handler = self.lookup(request.method_name())?;
            handler.execute(request).await
        })
    }
}

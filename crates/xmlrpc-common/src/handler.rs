//! The dispatch capability.
//!
//! Everything that can answer a call implements [`Handler`]: a single
//! registered function, the server's handler mapping, the server itself,
//! and a client forwarding calls to another server.

use futures::future::{self, BoxFuture, Future};
use std::sync::Arc;

use crate::protocol::error::Result;
use crate::protocol::Request;
use crate::value::Value;

/// Executes one request and produces its result.
///
/// Returning [`XmlRpcError::Fault`](crate::XmlRpcError::Fault) sends that
/// fault to the caller verbatim; any other error is converted by the server.
pub trait Handler: Send + Sync {
    fn execute<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Value>>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn execute<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Value>> {
        (**self).execute(request)
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn execute<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Value>> {
        (**self).execute(request)
    }
}

/// A synchronous closure over the call's parameters.
pub struct FnHandler<F> {
    f: F,
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(&[Value]) -> Result<Value> + Send + Sync,
{
    fn execute<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Value>> {
        Box::pin(future::ready((self.f)(request.params())))
    }
}

/// Wraps a synchronous closure as a [`Handler`].
///
/// # Example
///
/// ```
/// use xmlrpc_common::handler::{handler_fn, Handler};
/// use xmlrpc_common::{Request, Value};
///
/// let add = handler_fn(|params: &[Value]| {
///     let sum: i32 = params.iter().filter_map(Value::as_i32).sum();
///     Ok(Value::Int(sum))
/// });
///
/// let request = Request::new("add", vec![Value::Int(2), Value::Int(3)]);
/// let result = futures::executor::block_on(add.execute(&request)).unwrap();
/// assert_eq!(result, Value::Int(5));
/// ```
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&[Value]) -> Result<Value> + Send + Sync,
{
    FnHandler { f }
}

/// An asynchronous closure receiving owned parameters.
pub struct AsyncFnHandler<F> {
    f: F,
}

impl<F, Fut> Handler for AsyncFnHandler<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    fn execute<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Value>> {
        Box::pin((self.f)(request.params().to_vec()))
    }
}

/// Wraps an async closure as a [`Handler`].
pub fn async_handler_fn<F, Fut>(f: F) -> AsyncFnHandler<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    AsyncFnHandler { f }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::error::XmlRpcError;
    use crate::protocol::Fault;

    #[tokio::test]
    async fn test_sync_handler() {
        let echo = handler_fn(|params: &[Value]| Ok(Value::Array(params.to_vec())));
        let request = Request::new("echo", vec![Value::from("a")]);
        assert_eq!(
            echo.execute(&request).await.unwrap(),
            Value::Array(vec![Value::from("a")])
        );
    }

    #[tokio::test]
    async fn test_async_handler_through_arc() {
        let handler: Arc<dyn Handler> = Arc::new(async_handler_fn(|params: Vec<Value>| async move {
            tokio::task::yield_now().await;
            Ok::<_, XmlRpcError>(Value::Int(params.len() as i32))
        }));
        let request = Request::new("count", vec![Value::Nil, Value::Nil]);
        assert_eq!(handler.execute(&request).await.unwrap(), Value::Int(2));
    }

    #[tokio::test]
    async fn test_handler_fault_is_preserved() {
        let failing = handler_fn(|_: &[Value]| Err(Fault::new(7, "Not found").into()));
        let err = failing.execute(&Request::new("x", Vec::new())).await.unwrap_err();
        assert!(matches!(err, XmlRpcError::Fault(Fault { code: 7, .. })));
    }
}

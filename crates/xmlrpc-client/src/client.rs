use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

use xmlrpc_common::extensions;
use xmlrpc_common::{Handler, Request, Result, Value, WorkerPool, XmlRpcCodec, XmlRpcError};

use crate::config::ClientConfig;
use crate::transport::{HttpTransportFactory, LocalTransportFactory, TransportFactory};

/// XML-RPC client.
///
/// Every call takes a worker from the client's pool for its whole duration
/// and gets a fresh transport from the factory, so calls on clones of the
/// same client run in parallel up to `max_concurrency` and fail fast with
/// [`XmlRpcError::Overloaded`] beyond it.
///
/// # Example
///
/// ```no_run
/// use xmlrpc_client::{ClientConfig, XmlRpcClient};
/// use xmlrpc_common::Value;
///
/// # async fn example() -> xmlrpc_common::Result<()> {
/// let client = XmlRpcClient::new(ClientConfig::new("http://127.0.0.1:8080/RPC2"))?;
/// let sum = client.execute("calc.add", vec![Value::Int(2), Value::Int(3)]).await?;
/// assert_eq!(sum, Value::Int(5));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct XmlRpcClient {
    config: Arc<ClientConfig>,
    factory: Arc<dyn TransportFactory>,
    pool: WorkerPool,
}

impl XmlRpcClient {
    /// Creates a client talking HTTP to `config.server_url`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate().map_err(XmlRpcError::Config)?;
        let factory = HttpTransportFactory::new(&config, XmlRpcCodec::new())?;
        Self::with_transport_factory(config, Arc::new(factory))
    }

    /// Creates a client calling `handler` in-process through the codec.
    ///
    /// `server_url` is not used.
    pub fn local(handler: Arc<dyn Handler>, config: ClientConfig) -> Result<Self> {
        Self::with_transport_factory(config, Arc::new(LocalTransportFactory::new(handler)))
    }

    /// Creates a client on a caller-supplied transport factory.
    pub fn with_transport_factory(
        config: ClientConfig,
        factory: Arc<dyn TransportFactory>,
    ) -> Result<Self> {
        if config.max_concurrency == 0 {
            return Err(XmlRpcError::Config(
                "max_concurrency must be greater than zero".to_string(),
            ));
        }
        config.stream.validate().map_err(XmlRpcError::Config)?;
        let pool = WorkerPool::new(config.max_concurrency, config.max_idle_workers)?;
        Ok(Self {
            config: Arc::new(config),
            factory,
            pool,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Calls `method` with the client's own stream config.
    pub async fn execute(&self, method: impl Into<String>, params: Vec<Value>) -> Result<Value> {
        let request = Request::new(method, params).with_config(self.config.stream.clone());
        self.execute_request(&request).await
    }

    /// Sends a prepared request; its config overrides the client's.
    ///
    /// The request's config is validated before a worker is taken.
    pub async fn execute_request(&self, request: &Request) -> Result<Value> {
        request.config().validate().map_err(XmlRpcError::Config)?;
        let _worker = self.pool.acquire()?;
        self.send(request).await
    }

    /// Starts a call on its own task.
    ///
    /// The worker is taken before spawning, so an exhausted pool is
    /// reported here rather than through the handle.
    pub fn spawn_execute(
        &self,
        method: impl Into<String>,
        params: Vec<Value>,
    ) -> Result<JoinHandle<Result<Value>>> {
        let worker = self.pool.acquire()?;
        let request = Request::new(method, params).with_config(self.config.stream.clone());
        let client = self.clone();
        Ok(tokio::spawn(async move {
            let _worker = worker;
            client.send(&request).await
        }))
    }

    async fn send(&self, request: &Request) -> Result<Value> {
        extensions::check_params(request.config(), request.params())?;
        debug!(
            method = %request.method_name(),
            params = request.params().len(),
            "Executing call"
        );
        let transport = self.factory.create();
        transport.send_request(request).await
    }
}

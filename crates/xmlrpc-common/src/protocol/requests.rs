use crate::config::StreamConfig;
use crate::value::Value;

/// A method call: name, ordered parameters and the config it travels with.
///
/// Built once by the caller and consumed by a single send.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method_name: String,
    params: Vec<Value>,
    config: StreamConfig,
}

impl Request {
    pub fn new(method_name: impl Into<String>, params: Vec<Value>) -> Self {
        Request {
            method_name: method_name.into(),
            params,
            config: StreamConfig::default(),
        }
    }

    pub fn with_config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Splits a dotted method name into `(namespace, method)`.
    ///
    /// `"calc.add"` yields `Some(("calc", "add"))`; an undotted name yields `None`.
    pub fn namespace(&self) -> Option<(&str, &str)> {
        self.method_name.rsplit_once('.')
    }

    pub fn into_params(self) -> Vec<Value> {
        self.params
    }
}

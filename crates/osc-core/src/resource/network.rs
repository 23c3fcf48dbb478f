//! Services and routes.

use super::facade;
use crate::error::Result;
use crate::registry::keys;
use crate::value::Value;
use std::collections::BTreeMap;

facade!(
    /// Stable virtual address in front of a set of pods.
    Service,
    [keys::CLUSTER_IP, keys::SELECTOR, keys::PORTS, keys::SERVICE_TYPE]
);

impl Service {
    /// Virtual IP. `spec.portalIP` before `v1`, `spec.clusterIP` after.
    pub fn cluster_ip(&self) -> Result<String> {
        self.string(keys::CLUSTER_IP)
    }

    /// Label selector. Empty when the service selects nothing.
    pub fn selector(&self) -> Result<BTreeMap<String, String>> {
        self.string_map(keys::SELECTOR)
    }

    pub fn service_type(&self) -> Result<String> {
        self.string(keys::SERVICE_TYPE)
    }

    /// Exposed port numbers
    pub fn ports(&self) -> Result<Vec<i64>> {
        Ok(self
            .list(keys::PORTS)?
            .iter()
            .filter_map(|p| p.get("port").and_then(Value::as_i64))
            .collect())
    }
}

facade!(
    /// External host name routed to a service.
    Route,
    [keys::HOST, keys::PATH, keys::SERVICE_NAME, keys::TLS_TERMINATION]
);

impl Route {
    pub fn host(&self) -> Result<String> {
        self.string(keys::HOST)
    }

    pub fn path(&self) -> Result<String> {
        self.string(keys::PATH)
    }

    /// Name of the target service
    pub fn service_name(&self) -> Result<String> {
        self.string(keys::SERVICE_NAME)
    }

    /// TLS termination (`edge`, `passthrough`, `reencrypt`), `None` for plain HTTP.
    pub fn tls_termination(&self) -> Result<Option<String>> {
        let termination = self.string(keys::TLS_TERMINATION)?;
        Ok(Some(termination).filter(|t| !t.is_empty()))
    }

    /// URL the route answers on.
    pub fn url(&self) -> Result<String> {
        let scheme = if self.tls_termination()?.is_some() {
            "https"
        } else {
            "http"
        };
        Ok(format!("{}://{}{}", scheme, self.host()?, self.path()?))
    }
}

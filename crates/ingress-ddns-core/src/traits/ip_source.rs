// # IP Source Trait
//
// Defines the interface for resolving the process's current public IP.
//
// ## Implementations
//
// - HTTP-based: `ingress-ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ingress_ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let current_ip = source.current().await?;
//     println!("public IP: {}", current_ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// IP version (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// The IP version of an address
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }
}

/// Trait for IP source implementations
///
/// The reconciler calls [`IpSource::current`] exactly once per pass. The
/// address is never cached across passes by the reconciler, and
/// implementations should not cache it either.
///
/// # Failure
///
/// An error aborts the whole pass before any record is touched. An
/// implementation must never return an unspecified (`0.0.0.0` / `::`)
/// address in place of an error.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current IP address
    /// - `Err(Error)`: If unable to determine the current IP
    async fn current(&self) -> Result<IpAddr, crate::Error>;

    /// Get the IP version this source resolves
    ///
    /// Returns `None` if the implementation may return either version.
    fn version(&self) -> Option<IpVersion> {
        None
    }
}

//! Multi-unit registry and subnet scanning.
//!
//! A [`Registry`] owns shared handles to every known unit, keyed by IP
//! address with an alias from the unit name each device reports.
//! [`Registry::scan`] sweeps an IPv4 subnet and registers every host
//! that answers like an ESPEasy unit.

use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::client::Esp;
use crate::config::NetworkSettings;
use crate::error::{Error, Result};
use crate::transport::HttpConfig;
use crate::transport::http::DEFAULT_PORT;

/// Default per-host probe timeout during a scan.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(3);

/// Default number of hosts probed concurrently.
pub const DEFAULT_SCAN_CONCURRENCY: usize = 64;

// ==================== Subnets ====================

/// An IPv4 subnet in `address/prefix` notation, e.g. `192.168.0.0/24`.
///
/// Host bits in the address are masked off on construction. Serializes
/// as the string form, matching how it is written in saved settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Network {
    address: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Network {
    /// Creates a network from an address and prefix length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNetwork`] if the prefix exceeds 32.
    pub fn new(address: Ipv4Addr, prefix: u8) -> Result<Self> {
        if prefix > 32 {
            return Err(Error::InvalidNetwork {
                input: format!("{address}/{prefix}"),
            });
        }
        let masked = Ipv4Addr::from(u32::from(address) & Self::mask_bits(prefix));
        Ok(Self {
            address: masked,
            prefix,
        })
    }

    /// Network address (host bits zeroed).
    #[must_use]
    pub const fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Prefix length.
    #[must_use]
    pub const fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Whether the address falls inside this subnet.
    #[must_use]
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        u32::from(ip) & Self::mask_bits(self.prefix) == u32::from(self.address)
    }

    /// Iterates the usable host addresses.
    ///
    /// For prefixes shorter than /31 the network and broadcast
    /// addresses are excluded; /31 yields both addresses and /32 the
    /// single one.
    pub fn hosts(&self) -> impl Iterator<Item = Ipv4Addr> {
        let network = u32::from(self.address);
        let broadcast = network | !Self::mask_bits(self.prefix);
        let range = if self.prefix >= 31 {
            network..=broadcast
        } else {
            network + 1..=broadcast - 1
        };
        range.map(Ipv4Addr::from)
    }

    const fn mask_bits(prefix: u8) -> u32 {
        if prefix == 0 {
            0
        } else {
            u32::MAX << (32 - prefix)
        }
    }
}

impl fmt::Display for Ipv4Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix)
    }
}

impl FromStr for Ipv4Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidNetwork {
            input: s.to_string(),
        };
        let (address, prefix) = s.split_once('/').ok_or_else(invalid)?;
        let address: Ipv4Addr = address.parse().map_err(|_| invalid())?;
        let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
        Self::new(address, prefix)
    }
}

impl From<Ipv4Network> for String {
    fn from(network: Ipv4Network) -> Self {
        network.to_string()
    }
}

impl TryFrom<String> for Ipv4Network {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

// ==================== Scan Options ====================

/// Tuning for [`Registry::scan`].
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// HTTP port probed on every host.
    pub port: u16,
    /// Per-host timeout; hosts that do not answer in time are skipped.
    pub timeout: Duration,
    /// Upper bound on concurrent probes.
    pub concurrency: usize,
}

impl ScanOptions {
    /// Options with the defaults: port 80, 3 s timeout, 64 concurrent
    /// probes.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout: DEFAULT_SCAN_TIMEOUT,
            concurrency: DEFAULT_SCAN_CONCURRENCY,
        }
    }

    /// Sets the probe port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the per-host timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the concurrency limit.
    #[must_use]
    pub const fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== Registry ====================

#[derive(Default)]
struct Inner {
    by_ip: HashMap<IpAddr, Arc<Esp>>,
    names: HashMap<String, IpAddr>,
}

/// Shared collection of known units.
///
/// Handles are `Arc<Esp>`: every lookup for the same unit returns the
/// same instance, so cached status and device entries are shared
/// between callers. The registry itself is `Send + Sync` and can sit
/// behind an `Arc` in concurrent code.
#[derive(Default)]
pub struct Registry {
    inner: RwLock<Inner>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects to a unit on the default port and registers it.
    ///
    /// Re-adding an already-registered address replaces the previous
    /// handle and its name alias.
    pub async fn add(&self, ip: IpAddr) -> Result<Arc<Esp>> {
        self.add_with_config(HttpConfig::new(ip.to_string())).await
    }

    /// Connects with explicit transport settings and registers the
    /// unit. The configured host must be an IP address.
    pub async fn add_with_config(&self, config: HttpConfig) -> Result<Arc<Esp>> {
        let ip: IpAddr = config.host.parse().map_err(|_| Error::InvalidAddress {
            input: config.host.clone(),
        })?;

        let esp = Esp::with_http_config(config)?;
        esp.connect().await?;
        Ok(self.register(ip, Arc::new(esp)).await)
    }

    /// Looks up a unit by IP address.
    pub async fn get(&self, ip: IpAddr) -> Result<Arc<Esp>> {
        self.inner
            .read()
            .await
            .by_ip
            .get(&ip)
            .cloned()
            .ok_or_else(|| Error::EspNotFound {
                query: ip.to_string(),
            })
    }

    /// Looks up a unit by its reported unit name.
    pub async fn by_name(&self, name: &str) -> Result<Arc<Esp>> {
        let inner = self.inner.read().await;
        inner
            .names
            .get(name)
            .and_then(|ip| inner.by_ip.get(ip))
            .cloned()
            .ok_or_else(|| Error::EspNotFound {
                query: name.to_string(),
            })
    }

    /// Looks up a unit by IP address or unit name.
    pub async fn find(&self, query: &str) -> Result<Arc<Esp>> {
        match query.parse::<IpAddr>() {
            Ok(ip) => self.get(ip).await,
            Err(_) => self.by_name(query).await,
        }
    }

    /// Removes a unit, returning its handle.
    pub async fn remove(&self, ip: IpAddr) -> Result<Arc<Esp>> {
        let mut inner = self.inner.write().await;
        let esp = inner.by_ip.remove(&ip).ok_or_else(|| Error::EspNotFound {
            query: ip.to_string(),
        })?;
        inner.names.retain(|_, mapped| *mapped != ip);
        debug!("Removed {ip} from registry");
        Ok(esp)
    }

    /// Removes a unit by its reported unit name.
    pub async fn remove_by_name(&self, name: &str) -> Result<Arc<Esp>> {
        let mut inner = self.inner.write().await;
        let ip = inner
            .names
            .remove(name)
            .ok_or_else(|| Error::EspNotFound {
                query: name.to_string(),
            })?;
        let esp = inner.by_ip.remove(&ip).ok_or_else(|| Error::EspNotFound {
            query: name.to_string(),
        })?;
        debug!("Removed {name} ({ip}) from registry");
        Ok(esp)
    }

    /// Registered IP addresses.
    pub async fn ips(&self) -> Vec<IpAddr> {
        self.inner.read().await.by_ip.keys().copied().collect()
    }

    /// Registered unit names.
    pub async fn names(&self) -> Vec<String> {
        self.inner.read().await.names.keys().cloned().collect()
    }

    /// Number of registered units.
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_ip.len()
    }

    /// Whether the registry is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.by_ip.is_empty()
    }

    async fn register(&self, ip: IpAddr, esp: Arc<Esp>) -> Arc<Esp> {
        let name = esp.name().await;
        let mut inner = self.inner.write().await;

        if inner.by_ip.insert(ip, Arc::clone(&esp)).is_some() {
            // Re-add: drop the stale alias before inserting the new one.
            inner.names.retain(|_, mapped| *mapped != ip);
        }
        if let Some(name) = name {
            if let Some(previous) = inner.names.insert(name.clone(), ip) {
                if previous != ip {
                    warn!("Unit name {name} moved from {previous} to {ip}");
                }
            }
            debug!("Registered {name} at {ip}");
        } else {
            debug!("Registered {ip} (no unit name)");
        }
        esp
    }

    // ==================== Scanning ====================

    /// Sweeps a subnet and registers every host that answers the
    /// status endpoint within the probe timeout.
    ///
    /// Probes run concurrently, bounded by
    /// [`ScanOptions::concurrency`]. Hosts whose reported unit name is
    /// already registered for a different address are skipped. Returns
    /// the handles discovered by this sweep.
    pub async fn scan(&self, network: Ipv4Network, options: &ScanOptions) -> Result<Vec<Arc<Esp>>> {
        self.scan_inner(network, options, None).await
    }

    /// Like [`Registry::scan`], but takes the subnet from the saved
    /// settings and re-applies each discovered unit's saved device
    /// entries.
    pub async fn scan_with_settings(
        &self,
        settings: &NetworkSettings,
        options: &ScanOptions,
    ) -> Result<Vec<Arc<Esp>>> {
        let network = settings.ipv4network.ok_or_else(|| Error::InvalidNetwork {
            input: "ipv4network not set in settings".to_string(),
        })?;
        self.scan_inner(network, options, Some(settings)).await
    }

    async fn scan_inner(
        &self,
        network: Ipv4Network,
        options: &ScanOptions,
        settings: Option<&NetworkSettings>,
    ) -> Result<Vec<Arc<Esp>>> {
        info!("Scanning {network} on port {}", options.port);

        let port = options.port;
        let timeout = options.timeout;
        let mut probes = stream::iter(network.hosts())
            .map(|host| {
                let config = HttpConfig::new(host.to_string()).port(port).timeout(timeout);
                async move {
                    let esp = Esp::with_http_config(config).ok()?;
                    esp.connect().await.ok()?;
                    let document = esp.status().await?;
                    Some((host, document))
                }
            })
            .buffer_unordered(options.concurrency);

        let mut discovered = Vec::new();
        while let Some(probe) = probes.next().await {
            let Some((host, document)) = probe else {
                continue;
            };

            if let Some(name) = document.unit_name() {
                let inner = self.inner.read().await;
                if let Some(existing) = inner.names.get(name) {
                    if *existing != IpAddr::V4(host) {
                        warn!(
                            "Skipping {host}: unit name {name} already registered at {existing}"
                        );
                        continue;
                    }
                }
            }

            // Register a handle with the default request timeout,
            // seeded with the document the probe already fetched.
            let esp = Esp::with_http_config(HttpConfig::new(host.to_string()).port(port))?;
            esp.prime(document).await;
            if let Some(saved) = settings {
                let applied = esp.load_settings(saved).await;
                if applied > 0 {
                    debug!("Applied {applied} saved device entries to {host}");
                }
            }
            discovered.push(self.register(IpAddr::V4(host), Arc::new(esp)).await);
        }

        info!("Scan of {network} found {} unit(s)", discovered.len());
        Ok(discovered)
    }
}

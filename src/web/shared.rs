//! Shared state for signal-relay
//!
//! Holds the configuration, the room registry and relay counters. One
//! instance is created at startup and handed to every request handler.

use crate::config::Config;
use crate::relay::RoomRegistry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Relay counters exported on `/metrics`
#[derive(Debug, Default)]
pub struct RelayStats {
    pub connections_total: AtomicU64,
    pub messages_relayed: AtomicU64,
    pub messages_dropped: AtomicU64,
    pub messages_malformed: AtomicU64,
    pub slow_peer_disconnects: AtomicU64,
}

/// Point-in-time copy of `RelayStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStatsSnapshot {
    pub connections_total: u64,
    pub messages_relayed: u64,
    pub messages_dropped: u64,
    pub messages_malformed: u64,
    pub slow_peer_disconnects: u64,
}

impl RelayStats {
    pub fn snapshot(&self) -> RelayStatsSnapshot {
        RelayStatsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            messages_relayed: self.messages_relayed.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            messages_malformed: self.messages_malformed.load(Ordering::Relaxed),
            slow_peer_disconnects: self.slow_peer_disconnects.load(Ordering::Relaxed),
        }
    }
}

/// Shared state for the application
#[derive(Debug, Clone)]
pub struct SharedState {
    /// Configuration
    pub config: Arc<Config>,

    /// Active rooms
    pub registry: Arc<RoomRegistry>,

    /// Relay counters
    pub stats: Arc<RelayStats>,

    /// Server start time
    pub start_time: Instant,
}

impl SharedState {
    /// Create a new shared state with an empty registry
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(RoomRegistry::new()),
            stats: Arc::new(RelayStats::default()),
            start_time: Instant::now(),
        }
    }

    /// Get uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn record_connection(&self) {
        self.stats.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_relayed(&self) {
        self.stats.messages_relayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.stats.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.stats.messages_malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_slow_peer(&self) {
        self.stats.slow_peer_disconnects.fetch_add(1, Ordering::Relaxed);
    }
}

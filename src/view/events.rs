use std::{
    collections::BTreeMap,
    io::BufRead,
    str::FromStr,
    sync::{Arc, Mutex, Weak},
};

use anyhow::{anyhow, Context};

use crate::map::basemap::BasemapKind;

/// Signals external UI sends to the map view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    ShowCandidateLocation { lat: f64, lng: f64 },
    RefreshData,
    /// Applies to whatever candidate is currently shown.
    FinalizeCandidate,
    SelectBasemap(BasemapKind),
}

impl MapEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MapEvent::ShowCandidateLocation { .. } => "show-candidate-location",
            MapEvent::RefreshData => "refresh-data",
            MapEvent::FinalizeCandidate => "finalize-candidate",
            MapEvent::SelectBasemap(_) => "select-basemap",
        }
    }
}

/// Parse a "lat,lng" pair.
pub fn parse_coordinates(text: &str) -> anyhow::Result<(f64, f64)> {
    let (lat, lng) = text
        .split_once(',')
        .ok_or_else(|| anyhow!("Expected 'lat,lng', got '{}'", text))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .with_context(|| format!("Invalid latitude '{}'", lat.trim()))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .with_context(|| format!("Invalid longitude '{}'", lng.trim()))?;
    Ok((lat, lng))
}

impl FromStr for MapEvent {
    type Err = anyhow::Error;

    /// Accepts the signal names as well as the short forms `show <lat>,<lng>`, `refresh`,
    /// `finalize` and `basemap <street|imagery>`.
    fn from_str(command: &str) -> anyhow::Result<Self> {
        let command = command.trim();
        let (verb, argument) = match command.split_once(char::is_whitespace) {
            Some((verb, argument)) => (verb, argument.trim()),
            None => (command, ""),
        };
        match verb {
            "show" | "show-candidate-location" => {
                let (lat, lng) = parse_coordinates(argument)?;
                Ok(MapEvent::ShowCandidateLocation { lat, lng })
            }
            "refresh" | "refresh-data" => Ok(MapEvent::RefreshData),
            "finalize" | "finalize-candidate" => Ok(MapEvent::FinalizeCandidate),
            "basemap" | "select-basemap" => Ok(MapEvent::SelectBasemap(argument.parse()?)),
            _ => Err(anyhow!("Unknown command '{}'", command)),
        }
    }
}

type Listener = Arc<dyn Fn(MapEvent) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: usize,
    by_id: BTreeMap<usize, Listener>,
}

/// Publish/subscribe channel between external UI and the map view. Owned by whoever hosts
/// the view and handed to the producers; cloning shares the same listeners.
#[derive(Clone, Default)]
pub struct EventBridge {
    listeners: Arc<Mutex<Listeners>>,
}

impl EventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered until the returned guard is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(MapEvent) + Send + Sync + 'static,
    {
        let mut listeners = lock(&self.listeners);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.by_id.insert(id, Arc::new(listener));
        Subscription {
            listeners: Arc::downgrade(&self.listeners),
            id,
        }
    }

    /// Deliver `event` to every listener registered at the time of the call. Returns how many
    /// received it. Listeners run without the lock held, so they may use the bridge themselves.
    pub fn publish(&self, event: MapEvent) -> usize {
        let listeners: Vec<Listener> = lock(&self.listeners).by_id.values().cloned().collect();
        log::debug!("Publishing {} to {} listeners", event.name(), listeners.len());
        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).by_id.len()
    }
}

// A listener that panicked cannot leave the map inconsistent, so a poisoned lock is still usable.
fn lock(listeners: &Mutex<Listeners>) -> std::sync::MutexGuard<'_, Listeners> {
    listeners
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Keeps a listener registered on an [`EventBridge`]; dropping it unsubscribes.
pub struct Subscription {
    listeners: Weak<Mutex<Listeners>>,
    id: usize,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            lock(&listeners).by_id.remove(&self.id);
        }
    }
}

/// Read one command per line from `input` and publish it, until EOF or `quit`. Lines that
/// are not commands are logged and skipped.
pub fn forward_commands<R: BufRead>(input: R, bridge: &EventBridge) -> anyhow::Result<()> {
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        match line.parse::<MapEvent>() {
            Ok(event) => {
                bridge.publish(event);
            }
            Err(err) => log::warn!("Ignoring input: {:#}", err),
        }
    }
    Ok(())
}

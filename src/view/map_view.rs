use std::sync::{
    mpsc::{self, Receiver, Sender},
    Arc,
};

use crate::{
    cache::feature_cache::FeatureCache,
    error::MapError,
    geofile::{feature::GeoFeature, geojson::ParsedCollection},
    map::renderer::MapRenderer,
    remote::feature_source::RemoteFeatureSource,
};

use super::{
    events::{EventBridge, MapEvent, Subscription},
    placement::PlacementWorkflow,
    tasks::TaskRunner,
};

/// Result of background network work, delivered back to the view's thread.
#[derive(Debug)]
pub enum Completion {
    Fetched(Result<ParsedCollection, MapError>),
    Submitted {
        feature: GeoFeature,
        result: Result<(), MapError>,
    },
}

#[derive(Debug)]
pub enum Message {
    Event(MapEvent),
    Completion(Completion),
    Shutdown,
}

/// At most one refresh is in flight. Further refresh requests are dropped, not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

/// The map view: keeps the renderer, the cache and the server in sync and runs the
/// placement workflow. All state is mutated on the thread that calls [`MapView::run`];
/// network calls run on the task runner and report back as [`Message::Completion`].
pub struct MapView<R: MapRenderer> {
    renderer: R,
    cache: FeatureCache,
    source: Arc<dyn RemoteFeatureSource>,
    tasks: Box<dyn TaskRunner>,
    placement: PlacementWorkflow,
    refresh_state: RefreshState,
    alive: bool,
    sender: Sender<Message>,
    receiver: Receiver<Message>,
    subscription: Option<Subscription>,
}

impl<R: MapRenderer> MapView<R> {
    /// Subscribe to `bridge`, paint the cached snapshot, start the first refresh and, if
    /// given, show `initial_candidate` as (lat, lng).
    pub fn open(
        renderer: R,
        cache: FeatureCache,
        source: Arc<dyn RemoteFeatureSource>,
        tasks: Box<dyn TaskRunner>,
        bridge: &EventBridge,
        initial_candidate: Option<(f64, f64)>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel();
        let event_sender = sender.clone();
        let subscription = bridge.subscribe(move |event| {
            // The view is gone once its receiver is dropped; nothing left to notify.
            let _ = event_sender.send(Message::Event(event));
        });
        let mut view = Self {
            renderer,
            cache,
            source,
            tasks,
            placement: PlacementWorkflow::new(),
            refresh_state: RefreshState::Idle,
            alive: true,
            sender,
            receiver,
            subscription: Some(subscription),
        };
        view.refresh(false);
        if let Some((lat, lng)) = initial_candidate {
            view.handle_event(MapEvent::ShowCandidateLocation { lat, lng });
        }
        view
    }

    /// Sender for messages into this view, e.g. [`Message::Shutdown`] from another thread.
    pub fn sender(&self) -> Sender<Message> {
        self.sender.clone()
    }

    /// Handle messages until shutdown, then tear down.
    pub fn run(&mut self) {
        while let Ok(message) = self.receiver.recv() {
            if !self.handle(message) {
                break;
            }
        }
        self.teardown();
    }

    /// Returns false when the view should stop.
    pub fn handle(&mut self, message: Message) -> bool {
        match message {
            Message::Event(event) => {
                self.handle_event(event);
                true
            }
            Message::Completion(completion) => {
                self.handle_completion(completion);
                true
            }
            Message::Shutdown => false,
        }
    }

    pub fn handle_event(&mut self, event: MapEvent) {
        if !self.alive {
            log::debug!("Ignoring {} after teardown", event.name());
            return;
        }
        match event {
            MapEvent::ShowCandidateLocation { lat, lng } => {
                self.placement.show_candidate(&mut self.renderer, lat, lng)
            }
            MapEvent::RefreshData => {
                log::info!("Refreshing features on request");
                self.refresh(true)
            }
            MapEvent::FinalizeCandidate => self.finalize_candidate(),
            MapEvent::SelectBasemap(kind) => {
                if !self.renderer.select_basemap(kind) {
                    log::warn!("No {:?} basemap installed", kind);
                }
            }
        }
    }

    /// Paint from cache unless `force`, then fetch the authoritative collection in the
    /// background. Dropped while another refresh is in flight.
    pub fn refresh(&mut self, force: bool) {
        if !self.alive {
            return;
        }
        if self.refresh_state == RefreshState::Refreshing {
            log::debug!("Refresh already in flight, dropping request");
            return;
        }
        if !force {
            if let Some(cached) = self.cache.load() {
                self.renderer.set_features(&cached);
                log::info!("Rendered {} features from cache", cached.len());
            }
        }
        self.refresh_state = RefreshState::Refreshing;
        let source = self.source.clone();
        let sender = self.sender.clone();
        self.tasks.spawn(Box::new(move || {
            let result = source.fetch_all();
            let _ = sender.send(Message::Completion(Completion::Fetched(result)));
        }));
    }

    fn finalize_candidate(&mut self) {
        let Some(feature) = self.placement.finalize(&mut self.renderer) else {
            log::debug!("Finalize without a candidate, nothing to do");
            return;
        };
        // The candidate is already gone from the map before the submission starts.
        let source = self.source.clone();
        let sender = self.sender.clone();
        self.tasks.spawn(Box::new(move || {
            let result = source.submit(&feature);
            let _ = sender.send(Message::Completion(Completion::Submitted { feature, result }));
        }));
    }

    fn handle_completion(&mut self, completion: Completion) {
        if !self.alive {
            log::debug!("Discarding completion that arrived after teardown");
            return;
        }
        match completion {
            Completion::Fetched(result) => {
                self.refresh_state = RefreshState::Idle;
                match result {
                    Ok(parsed) => {
                        if let Err(err) = self.cache.store(&parsed.collection) {
                            log::warn!("Could not update cached snapshot: {}", err);
                        }
                        self.renderer.set_features(&parsed.collection);
                        log::info!(
                            "Refreshed {} features from backend ({} without geometry dropped)",
                            parsed.collection.len(),
                            parsed.dropped
                        );
                    }
                    Err(err) => {
                        log::warn!("Failed to fetch features, keeping current map: {}", err)
                    }
                }
            }
            Completion::Submitted { feature, result } => match result {
                Ok(()) => {
                    log::info!("Saved feature {}", feature.id);
                    self.refresh(true);
                }
                // The optimistic marker stays until a later refresh reconciles it.
                Err(err) => log::error!("Failed to save feature {}: {}", feature.id, err),
            },
        }
    }

    /// Unsubscribe and release the renderer. Completions still in flight are discarded when
    /// they arrive. Safe to call more than once.
    pub fn teardown(&mut self) {
        if !self.alive {
            return;
        }
        self.alive = false;
        self.subscription = None;
        self.placement.discard(&mut self.renderer);
        self.renderer.teardown();
        log::info!("Map view closed");
    }
}

#[cfg(test)]
impl<R: MapRenderer> MapView<R> {
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn cache(&self) -> &FeatureCache {
        &self.cache
    }

    pub fn placement(&self) -> &PlacementWorkflow {
        &self.placement
    }

    pub fn refresh_state(&self) -> RefreshState {
        self.refresh_state
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Handle every message already queued without waiting. Returns how many were handled.
    pub fn run_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.receiver.try_recv() {
            handled += 1;
            if !self.handle(message) {
                self.teardown();
                break;
            }
        }
        handled
    }
}

impl<R: MapRenderer> Drop for MapView<R> {
    fn drop(&mut self) {
        self.teardown();
    }
}

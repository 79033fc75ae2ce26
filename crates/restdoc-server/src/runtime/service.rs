//! Document service: settings, frozen endpoints and the snapshot cache.
//!
//! One snapshot exists per settings generation, held in a [`OnceCell`] so
//! concurrent first requests join one in-flight build. The requesting host
//! never keys the cache: when the settings list it, its server entries are
//! spliced into a copy of the snapshot per response. A reload swaps the
//! settings, bumps the generation and drops the previous snapshot.
//!
//! ```text
//! Unbuilt --request--> Building --ok--> Served --reload--> Stale --request--> Building
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use restdoc::{AssembledDocument, DocumentSettings, Endpoints, TypeCatalog};
use tokio::sync::OnceCell;

use super::access::{authorize, Resource};
use super::error::ServeError;
use super::request::DocumentRequest;
use super::viewer::viewer_page;

type Snapshot = Arc<OnceCell<Arc<AssembledDocument>>>;

/// Lifecycle of the cached document for the current settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentState {
    /// Nothing has been built yet.
    Unbuilt,
    /// A build is in flight.
    Building,
    /// The snapshot is ready.
    Served,
    /// Settings changed since the last snapshot; the next request rebuilds.
    Stale,
}

#[derive(Debug)]
struct State {
    settings: Arc<DocumentSettings>,
    generation: u64,
    snapshot: Option<Snapshot>,
    stale: bool,
}

#[derive(Debug)]
struct Inner {
    endpoints: Endpoints,
    catalog: TypeCatalog,
    state: Mutex<State>,
    builds: AtomicU64,
}

/// Serves documents and the viewer page for one frozen set of endpoints.
///
/// Cheap to clone; clones share the cache.
#[derive(Debug, Clone)]
pub struct DocumentService {
    inner: Arc<Inner>,
}

impl DocumentService {
    /// Validate `settings` against the endpoints and catalog and create the
    /// service.
    ///
    /// Every registration error surfaces here, before anything is served.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by [`restdoc::validate`].
    pub fn new(
        settings: DocumentSettings,
        endpoints: Endpoints,
        catalog: TypeCatalog,
    ) -> restdoc::Result<Self> {
        restdoc::validate(&settings, &endpoints, &catalog)?;
        tracing::info!(
            endpoints = endpoints.len(),
            version = settings.version.document_version(),
            "document service ready; state: unbuilt"
        );
        Ok(Self {
            inner: Arc::new(Inner {
                endpoints,
                catalog,
                state: Mutex::new(State {
                    settings: Arc::new(settings),
                    generation: 0,
                    snapshot: None,
                    stale: false,
                }),
                builds: AtomicU64::new(0),
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Settings currently in effect.
    #[must_use]
    pub fn settings(&self) -> Arc<DocumentSettings> {
        Arc::clone(&self.lock().settings)
    }

    /// Number of settings reloads so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Number of document builds started so far.
    #[must_use]
    pub fn build_count(&self) -> u64 {
        self.inner.builds.load(Ordering::SeqCst)
    }

    /// Endpoints the service documents.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.inner.endpoints
    }

    /// Current [`DocumentState`].
    #[must_use]
    pub fn state(&self) -> DocumentState {
        let state = self.lock();
        if state.snapshot.as_ref().is_some_and(|cell| cell.initialized()) {
            DocumentState::Served
        } else if state.snapshot.is_some() {
            DocumentState::Building
        } else if state.stale {
            DocumentState::Stale
        } else {
            DocumentState::Unbuilt
        }
    }

    /// Serve the document for `request`, building it if no snapshot exists
    /// for the current settings.
    ///
    /// Every caller of the same snapshot receives the same bytes.
    ///
    /// # Errors
    ///
    /// Returns the refusal from [`authorize`], or [`ServeError::Build`] when
    /// assembly fails.
    pub async fn serve_document(
        &self,
        request: &DocumentRequest,
    ) -> Result<Arc<AssembledDocument>, ServeError> {
        loop {
            let (settings, generation) = self.current();
            authorize(&settings, request, Resource::Document)?;

            let Some(cell) = self.snapshot(generation) else {
                tracing::debug!(generation, "settings reloaded mid-request; retrying");
                continue;
            };

            let document = match cell
                .get_or_try_init(|| async { self.build(&settings, generation) })
                .await
            {
                Ok(document) => Arc::clone(document),
                Err(err) => {
                    self.discard(generation, &cell);
                    return Err(ServeError::Build(err));
                }
            };

            let requesting = request
                .origin()
                .filter(|_| settings.uses_requesting_host());
            return match requesting {
                Some(origin) => document
                    .for_requesting(&settings, &origin)
                    .map(Arc::new)
                    .map_err(ServeError::Build),
                None => Ok(document),
            };
        }
    }

    /// Serve the viewer page for `request`.
    ///
    /// When an API key is configured, the page forwards the key query
    /// parameter from its own address to the document request client-side.
    ///
    /// # Errors
    ///
    /// Returns the refusal from [`authorize`].
    pub fn serve_viewer(&self, request: &DocumentRequest) -> Result<String, ServeError> {
        let settings = self.settings();
        authorize(&settings, request, Resource::Viewer)?;

        let key_param = settings
            .api_key
            .is_some()
            .then_some(settings.api_key_query.as_str());
        Ok(viewer_page(&settings.doc_title, "../swagger.json", key_param))
    }

    /// Replace the settings.
    ///
    /// The new settings are validated first; on failure nothing changes.
    /// On success every snapshot becomes stale and the next request builds
    /// a fresh one.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by [`restdoc::validate`].
    pub fn reload(&self, settings: DocumentSettings) -> restdoc::Result<()> {
        restdoc::validate(&settings, &self.inner.endpoints, &self.inner.catalog)?;

        let mut state = self.lock();
        let had_snapshot = state.snapshot.as_ref().is_some_and(|cell| cell.initialized());
        state.settings = Arc::new(settings);
        state.generation += 1;
        state.snapshot = None;
        state.stale |= had_snapshot;
        tracing::info!(
            generation = state.generation,
            "settings reloaded; state: stale"
        );
        Ok(())
    }

    fn current(&self) -> (Arc<DocumentSettings>, u64) {
        let state = self.lock();
        (Arc::clone(&state.settings), state.generation)
    }

    /// Snapshot cell of `generation`, or `None` if a reload moved past it.
    fn snapshot(&self, generation: u64) -> Option<Snapshot> {
        let mut state = self.lock();
        if state.generation != generation {
            return None;
        }
        Some(Arc::clone(state.snapshot.get_or_insert_with(Snapshot::default)))
    }

    /// Drop a failed cell so the state does not report a build in flight.
    fn discard(&self, generation: u64, cell: &Snapshot) {
        let mut state = self.lock();
        if state.generation != generation {
            return;
        }
        let failed = state
            .snapshot
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, cell) && !current.initialized());
        if failed {
            state.snapshot = None;
        }
    }

    fn build(
        &self,
        settings: &DocumentSettings,
        generation: u64,
    ) -> restdoc::Result<Arc<AssembledDocument>> {
        let builds = self.inner.builds.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(generation, builds, "state: building");
        let started = Instant::now();

        let document = restdoc::assemble(
            settings,
            &self.inner.endpoints,
            &self.inner.catalog,
            None,
        )?;

        tracing::info!(
            generation,
            builds,
            elapsed_ms = started.elapsed().as_millis(),
            "state: served"
        );
        Ok(Arc::new(document))
    }
}

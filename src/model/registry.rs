//! Lazily loaded, cached inference sessions keyed by style.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::OnceCell;

use crate::error::{Error, Result};

use super::backend::{InferenceBackend, ModelSession};
use super::StyleId;

/// Lifecycle of one registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not loaded; the next `acquire` loads it.
    Absent,
    /// A load is in flight.
    Loading,
    /// Cached and ready to run.
    Ready,
}

/// A ready session for one style.
///
/// The backend session sits behind a mutex so concurrent requests on the same
/// style run one at a time.
pub struct StyleSession {
    style: StyleId,
    input_name: String,
    output_name: String,
    session: Mutex<Box<dyn ModelSession>>,
}

impl StyleSession {
    /// Style this session was loaded for.
    #[must_use]
    pub const fn style(&self) -> StyleId {
        self.style
    }

    /// Input slot the tensor is bound to.
    #[must_use]
    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    /// Output slot read back after a run.
    #[must_use]
    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    pub(crate) fn lock(&self) -> parking_lot::MutexGuard<'_, Box<dyn ModelSession>> {
        self.session.lock()
    }
}

impl std::fmt::Debug for StyleSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleSession")
            .field("style", &self.style)
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct Entry {
    cell: OnceCell<Arc<StyleSession>>,
    loaders: AtomicUsize,
}

/// Counts an in-flight load for as long as it lives, including when the
/// loading future is dropped.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Owns one session per style for the registry's lifetime.
pub struct SessionRegistry {
    backend: Arc<dyn InferenceBackend>,
    models_dir: PathBuf,
    entries: RwLock<HashMap<StyleId, Arc<Entry>>>,
}

impl SessionRegistry {
    /// Empty registry loading artifacts from `models_dir` through `backend`.
    pub fn new(backend: Arc<dyn InferenceBackend>, models_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            models_dir: models_dir.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Directory artifacts are resolved against.
    #[must_use]
    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Where the artifact for `style` is expected.
    #[must_use]
    pub fn artifact_path(&self, style: StyleId) -> PathBuf {
        self.models_dir.join(style.artifact_file_name())
    }

    /// Return the cached session for `style`, loading it on first use.
    ///
    /// Concurrent first calls share a single load. The load runs as its own
    /// task, so a caller that is cancelled mid-load leaves it running for the
    /// others and the cache is still filled. A failed load leaves the style
    /// unregistered, so the next call retries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelLoad`] if the artifact is missing or the backend
    /// rejects it.
    pub async fn acquire(&self, style: StyleId) -> Result<Arc<StyleSession>> {
        let entry = self.entry(style);

        if let Some(session) = entry.cell.get() {
            tracing::debug!("Session cache hit for style {style}");
            return Ok(Arc::clone(session));
        }

        let backend = Arc::clone(&self.backend);
        let path = self.artifact_path(style);
        let init = tokio::spawn(async move {
            let loaders = &entry.loaders;
            entry
                .cell
                .get_or_try_init(|| async move {
                    let _loading = LoadingGuard::new(loaders);
                    load(style, backend, path).await
                })
                .await
                .map(Arc::clone)
        });

        init.await.map_err(|join| Error::ModelLoad {
            style,
            path: self.artifact_path(style),
            source: Box::new(join),
        })?
    }

    /// Current lifecycle state of `style`.
    #[must_use]
    pub fn state(&self, style: StyleId) -> SessionState {
        let Some(entry) = self.entries.read().get(&style).cloned() else {
            return SessionState::Absent;
        };

        if entry.cell.initialized() {
            SessionState::Ready
        } else if entry.loaders.load(Ordering::Acquire) > 0 {
            SessionState::Loading
        } else {
            SessionState::Absent
        }
    }

    /// Styles with a ready session, in picker order.
    #[must_use]
    pub fn cached_styles(&self) -> Vec<StyleId> {
        StyleId::ALL
            .into_iter()
            .filter(|&style| self.state(style) == SessionState::Ready)
            .collect()
    }

    /// Drop every cached session. The next `acquire` reloads from disk.
    pub fn evict_all(&self) {
        let evicted = {
            let mut entries = self.entries.write();
            let count = entries.values().filter(|e| e.cell.initialized()).count();
            entries.clear();
            count
        };
        tracing::info!("Evicted {evicted} cached session(s)");
    }

    fn entry(&self, style: StyleId) -> Arc<Entry> {
        if let Some(entry) = self.entries.read().get(&style) {
            return Arc::clone(entry);
        }
        Arc::clone(self.entries.write().entry(style).or_default())
    }
}

async fn load(
    style: StyleId,
    backend: Arc<dyn InferenceBackend>,
    path: PathBuf,
) -> Result<Arc<StyleSession>> {
    tracing::info!("Loading model: {}", path.display());

    if !path.is_file() {
        return Err(Error::ModelLoad {
            style,
            path,
            source: Box::new(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "model artifact not found",
            )),
        });
    }

    let name = backend.name();
    let load_path = path.clone();
    let loaded = tokio::task::spawn_blocking(move || backend.load(&load_path))
        .await
        .map_err(|join| Error::ModelLoad {
            style,
            path: path.clone(),
            source: Box::new(join),
        })?;

    let session = loaded.map_err(|source| Error::ModelLoad {
        style,
        path: path.clone(),
        source,
    })?;

    let session = bind(style, &path, session)?;
    tracing::info!(
        "Inference session created for style {style} on {name} (input {:?}, output {:?})",
        session.input_name,
        session.output_name
    );

    Ok(Arc::new(session))
}

/// Pick the single input and output slot of a freshly loaded session.
fn bind(style: StyleId, path: &Path, session: Box<dyn ModelSession>) -> Result<StyleSession> {
    let inputs = session.input_names();
    let outputs = session.output_names();

    if inputs.len() > 1 || outputs.len() > 1 {
        tracing::debug!(
            "Model for {style} declares {} inputs and {} outputs, using the first of each",
            inputs.len(),
            outputs.len()
        );
    }

    let (Some(input_name), Some(output_name)) =
        (inputs.into_iter().next(), outputs.into_iter().next())
    else {
        return Err(Error::ModelLoad {
            style,
            path: path.to_path_buf(),
            source: "model declares no input or no output".into(),
        });
    };

    Ok(StyleSession {
        style,
        input_name,
        output_name,
        session: Mutex::new(session),
    })
}

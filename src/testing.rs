//! In-process backend for tests; no ONNX Runtime models involved.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::codec::Tensor;
use crate::error::BackendError;
use crate::model::{InferenceBackend, ModelSession, StyleId};

/// Write a placeholder artifact for `style` into `dir`.
pub fn write_artifact(dir: &Path, style: StyleId) {
    std::fs::write(dir.join(style.artifact_file_name()), b"mock onnx").unwrap();
}

/// Run counters shared by every session of one backend.
#[derive(Default)]
struct RunStats {
    total: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
}

/// Backend whose sessions invert every value around 255.
#[derive(Default)]
pub struct MockBackend {
    loads: AtomicUsize,
    runs: Arc<RunStats>,
    load_delay: Duration,
    fail_next_load: AtomicBool,
    no_outputs: bool,
    run_delay: Duration,
    run_failure: Option<String>,
    truncate_output: bool,
}

impl MockBackend {
    pub fn slow(load_delay: Duration) -> Self {
        Self {
            load_delay,
            ..Self::default()
        }
    }

    pub fn without_outputs() -> Self {
        Self {
            no_outputs: true,
            ..Self::default()
        }
    }

    pub fn failing_runs(message: &str) -> Self {
        Self {
            run_failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn truncating_output() -> Self {
        Self {
            truncate_output: true,
            ..Self::default()
        }
    }

    pub fn with_run_delay(mut self, run_delay: Duration) -> Self {
        self.run_delay = run_delay;
        self
    }

    pub fn fail_next_load(&self) {
        self.fail_next_load.store(true, Ordering::SeqCst);
    }

    /// Number of `load` calls that reached the backend.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Number of `run` calls across all sessions.
    pub fn runs(&self) -> usize {
        self.runs.total.load(Ordering::SeqCst)
    }

    /// Most `run` calls ever in flight at once.
    pub fn peak_concurrent_runs(&self) -> usize {
        self.runs.peak.load(Ordering::SeqCst)
    }
}

impl InferenceBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn load(&self, _path: &Path) -> Result<Box<dyn ModelSession>, BackendError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.load_delay);

        if self.fail_next_load.swap(false, Ordering::SeqCst) {
            return Err("corrupt model".into());
        }

        Ok(Box::new(MockSession {
            outputs: if self.no_outputs {
                Vec::new()
            } else {
                vec!["output1".to_string()]
            },
            stats: Arc::clone(&self.runs),
            run_delay: self.run_delay,
            run_failure: self.run_failure.clone(),
            truncate_output: self.truncate_output,
        }))
    }
}

struct MockSession {
    outputs: Vec<String>,
    stats: Arc<RunStats>,
    run_delay: Duration,
    run_failure: Option<String>,
    truncate_output: bool,
}

impl ModelSession for MockSession {
    fn input_names(&self) -> Vec<String> {
        vec!["input1".to_string()]
    }

    fn output_names(&self) -> Vec<String> {
        self.outputs.clone()
    }

    fn run(
        &mut self,
        input_name: &str,
        output_name: &str,
        input: &Tensor,
    ) -> Result<Tensor, BackendError> {
        let active = self.stats.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak.fetch_max(active, Ordering::SeqCst);
        self.stats.total.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.run_delay);
        self.stats.active.fetch_sub(1, Ordering::SeqCst);

        assert_eq!((input_name, output_name), ("input1", "output1"));

        if let Some(message) = &self.run_failure {
            return Err(message.clone().into());
        }

        let mut data: Vec<f32> = input.as_slice().iter().map(|v| 255.0 - v).collect();
        if self.truncate_output {
            data.truncate(data.len() / 2);
            return Ok(Tensor::from_shape_vec(&[data.len()], data)?);
        }
        Ok(Tensor::from_shape_vec(input.shape(), data)?)
    }
}

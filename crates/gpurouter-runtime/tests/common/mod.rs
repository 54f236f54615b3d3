//! In-memory backends shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream;
use gpurouter_core::{
    BackendError, FrameStream, GenerateRequest, HomeBackendPort, HomeHealthReport, JobHandle,
    Operation, PreprocessRequest, QueueBackendPort, RemoteJobSnapshot, RemoteJobState,
    RouterSettings,
};
use gpurouter_runtime::{FailoverRouter, StatsCollector};
use serde_json::{Value, json};

/// Scripted Home worker.
pub struct FakeHome {
    pub ready: AtomicBool,
    pub fail_with: Mutex<Option<BackendError>>,
    pub frames: Mutex<Vec<Result<String, BackendError>>>,
    pub health_calls: AtomicU32,
    pub work_calls: AtomicU32,
}

impl FakeHome {
    pub fn ready() -> Arc<Self> {
        Arc::new(Self {
            ready: AtomicBool::new(true),
            fail_with: Mutex::new(None),
            frames: Mutex::new(Vec::new()),
            health_calls: AtomicU32::new(0),
            work_calls: AtomicU32::new(0),
        })
    }

    pub fn failing(err: BackendError) -> Arc<Self> {
        let home = Self::ready();
        *home.fail_with.lock().unwrap() = Some(err);
        home
    }

    pub fn set_frames(&self, frames: &[&str]) {
        *self.frames.lock().unwrap() = frames.iter().map(|f| Ok((*f).to_string())).collect();
    }

    pub fn push_frame_error(&self, err: BackendError) {
        self.frames.lock().unwrap().push(Err(err));
    }

    fn work(&self, result: Value) -> Result<Value, BackendError> {
        self.work_calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_with.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(result),
        }
    }
}

#[async_trait]
impl HomeBackendPort for FakeHome {
    async fn health(&self) -> Result<HomeHealthReport, BackendError> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        Ok(HomeHealthReport {
            gpu_available: self.ready.load(Ordering::SeqCst),
            gpu_busy: false,
        })
    }

    async fn preprocess(&self, _request: &PreprocessRequest) -> Result<Value, BackendError> {
        self.work(json!({"status": "success", "cached": true}))
    }

    async fn generate(&self, _request: &GenerateRequest) -> Result<Value, BackendError> {
        self.work(json!({"status": "success", "sequence": [0, 7, 3]}))
    }

    async fn generate_stream(&self, _request: &GenerateRequest) -> Result<FrameStream, BackendError> {
        self.work(Value::Null)?;
        let frames = std::mem::take(&mut *self.frames.lock().unwrap());
        Ok(Box::pin(stream::iter(frames)))
    }
}

/// Scripted job queue.
pub struct FakeQueue {
    pub submit_result: Mutex<Result<String, BackendError>>,
    pub statuses: Mutex<VecDeque<RemoteJobSnapshot>>,
    pub submissions: Mutex<Vec<(Operation, Value)>>,
    pub cancels: AtomicU32,
}

impl FakeQueue {
    pub fn accepting(job_id: &str) -> Arc<Self> {
        Arc::new(Self {
            submit_result: Mutex::new(Ok(job_id.to_string())),
            statuses: Mutex::new(VecDeque::new()),
            submissions: Mutex::new(Vec::new()),
            cancels: AtomicU32::new(0),
        })
    }

    pub fn rejecting(err: BackendError) -> Arc<Self> {
        let queue = Self::accepting("");
        *queue.submit_result.lock().unwrap() = Err(err);
        queue
    }

    /// Queue up status responses; the last one repeats.
    pub fn script(&self, states: Vec<RemoteJobSnapshot>) {
        *self.statuses.lock().unwrap() = states.into();
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }
}

#[async_trait]
impl QueueBackendPort for FakeQueue {
    async fn submit(&self, operation: Operation, input: Value) -> Result<JobHandle, BackendError> {
        self.submissions.lock().unwrap().push((operation, input));
        self.submit_result
            .lock()
            .unwrap()
            .clone()
            .map(|id| JobHandle::new(id, operation))
    }

    async fn status(&self, _job_id: &str) -> Result<RemoteJobSnapshot, BackendError> {
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            Ok(statuses.pop_front().unwrap())
        } else {
            Ok(statuses.front().cloned().unwrap_or(RemoteJobSnapshot {
                status: RemoteJobState::InQueue,
                output: None,
                error: None,
            }))
        }
    }

    async fn cancel(&self, _job_id: &str) -> Result<(), BackendError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn snapshot(status: RemoteJobState, output: Option<Value>) -> RemoteJobSnapshot {
    RemoteJobSnapshot {
        status,
        output,
        error: None,
    }
}

pub fn router(home: Option<&Arc<FakeHome>>, queue: Option<&Arc<FakeQueue>>) -> FailoverRouter {
    FailoverRouter::new(
        &RouterSettings::default(),
        home.map(|h| Arc::clone(h) as Arc<dyn HomeBackendPort>),
        queue.map(|q| Arc::clone(q) as Arc<dyn QueueBackendPort>),
        Arc::new(StatsCollector::new()),
    )
}

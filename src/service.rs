//! Background worker that owns the story backend.
//!
//! The UI thread never touches the backend directly: it sends [`ServiceRequest`]s and polls
//! [`ServiceReply`]s once per frame. Dropping the handle closes the request channel, which
//! ends the worker loop, and then joins the thread.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::story::{
    BackendError, Consequence, ConsequenceId, IngestReport, ProjectSnapshot, SceneAnalysis,
    StatusUpdate, StoryBackend, StoryQuery,
};

#[derive(Debug)]
pub enum ServiceRequest {
    Reload { query: StoryQuery },
    UpdateStatus { id: ConsequenceId, update: StatusUpdate },
    Ingest(SceneAnalysis),
}

#[derive(Debug)]
pub enum ServiceReply {
    Snapshot(Result<ProjectSnapshot, BackendError>),
    StatusUpdated {
        id: ConsequenceId,
        result: Result<Consequence, BackendError>,
    },
    Ingested(Result<IngestReport, BackendError>),
}

pub struct ServiceHandle {
    requests: Option<Sender<ServiceRequest>>,
    replies: Receiver<ServiceReply>,
    worker: Option<JoinHandle<()>>,
}

impl ServiceHandle {
    pub fn spawn<B>(backend: B) -> Self
    where
        B: StoryBackend + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel();
        let (reply_tx, reply_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("plotweb-service".to_owned())
            .spawn(move || run_worker(backend, request_rx, reply_tx));
        let worker = match worker {
            Ok(worker) => Some(worker),
            Err(error) => {
                tracing::error!(%error, "failed to start story service thread");
                None
            }
        };

        Self {
            requests: Some(request_tx),
            replies: reply_rx,
            worker,
        }
    }

    /// Queues a request. Returns false once the worker is gone.
    pub fn send(&self, request: ServiceRequest) -> bool {
        match &self.requests {
            Some(requests) => requests.send(request).is_ok(),
            None => false,
        }
    }

    pub fn try_recv(&self) -> Result<ServiceReply, TryRecvError> {
        self.replies.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<ServiceReply, RecvTimeoutError> {
        self.replies.recv_timeout(timeout)
    }
}

impl Drop for ServiceHandle {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::error!("story service thread panicked");
        }
    }
}

fn run_worker<B: StoryBackend>(
    mut backend: B,
    requests: Receiver<ServiceRequest>,
    replies: Sender<ServiceReply>,
) {
    tracing::debug!("story service started");

    while let Ok(request) = requests.recv() {
        let reply = handle_request(&mut backend, request);
        if replies.send(reply).is_err() {
            break;
        }
    }

    tracing::debug!("story service stopped");
}

fn handle_request<B: StoryBackend>(backend: &mut B, request: ServiceRequest) -> ServiceReply {
    match request {
        ServiceRequest::Reload { query } => {
            let snapshot = fetch_snapshot(backend, &query);
            if let Err(error) = &snapshot {
                tracing::warn!(%error, project = query.project_id, "fetch failed");
            }
            ServiceReply::Snapshot(snapshot)
        }
        ServiceRequest::UpdateStatus { id, update } => {
            let target = update.status;
            let result = backend.update_status(id, update);
            match &result {
                Ok(_) => tracing::info!(%id, status = %target, "consequence updated"),
                Err(error) => tracing::info!(%id, %error, "status change rejected"),
            }
            ServiceReply::StatusUpdated { id, result }
        }
        ServiceRequest::Ingest(analysis) => {
            let result = backend.ingest_analysis(analysis);
            if let Ok(report) = &result {
                tracing::info!(
                    events = report.events.len(),
                    consequences = report.consequences.len(),
                    rejected = report.rejected.len(),
                    "scene analysis ingested"
                );
            }
            ServiceReply::Ingested(result)
        }
    }
}

fn fetch_snapshot<B: StoryBackend>(
    backend: &mut B,
    query: &StoryQuery,
) -> Result<ProjectSnapshot, BackendError> {
    backend.refresh()?;
    Ok(ProjectSnapshot {
        project_id: query.project_id,
        events: backend.fetch_events(query)?,
        consequences: backend.fetch_consequences(query)?,
    })
}

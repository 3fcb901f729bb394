//! Background thread that runs API calls off the UI loop.
//!
//! Each submission gets a `Ticket` stamped with the page mount it was issued
//! from. The UI compares that stamp with its current mount when the reply
//! arrives and drops replies for pages that are no longer on screen.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use super::{ApiError, BlogApi, Credentials, LoginResponse, PostDraft, Registration};
use crate::posts::{PostId, PostRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    LoadFeed,
    LoadMyPosts,
    Login(Credentials),
    Signup(Registration),
    CreatePost(PostDraft),
    UpdatePost { id: PostId, draft: PostDraft },
    DeletePost(PostId),
}

impl ApiRequest {
    pub fn label(&self) -> &'static str {
        match self {
            ApiRequest::LoadFeed => "load-feed",
            ApiRequest::LoadMyPosts => "load-my-posts",
            ApiRequest::Login(_) => "login",
            ApiRequest::Signup(_) => "signup",
            ApiRequest::CreatePost(_) => "create-post",
            ApiRequest::UpdatePost { .. } => "update-post",
            ApiRequest::DeletePost(_) => "delete-post",
        }
    }
}

#[derive(Debug, Clone)]
pub enum ApiReply {
    Feed(Result<Vec<PostRecord>, ApiError>),
    MyPosts(Result<Vec<PostRecord>, ApiError>),
    Login(Result<LoginResponse, ApiError>),
    Signup(Result<(), ApiError>),
    Created(Result<(), ApiError>),
    Updated {
        id: PostId,
        result: Result<PostRecord, ApiError>,
    },
    Deleted {
        id: PostId,
        result: Result<(), ApiError>,
    },
}

/// Runs one request to completion on the calling thread.
pub fn dispatch(api: &dyn BlogApi, request: ApiRequest) -> ApiReply {
    match request {
        ApiRequest::LoadFeed => ApiReply::Feed(api.list_posts()),
        ApiRequest::LoadMyPosts => ApiReply::MyPosts(api.list_my_posts()),
        ApiRequest::Login(credentials) => ApiReply::Login(api.login(&credentials)),
        ApiRequest::Signup(registration) => ApiReply::Signup(api.signup(&registration)),
        ApiRequest::CreatePost(draft) => ApiReply::Created(api.create_post(&draft)),
        ApiRequest::UpdatePost { id, draft } => {
            let result = api.update_post(&id, &draft);
            ApiReply::Updated { id, result }
        }
        ApiRequest::DeletePost(id) => {
            let result = api.delete_post(&id);
            ApiReply::Deleted { id, result }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub id: u64,
    pub mount: u64,
}

#[derive(Debug)]
pub struct Completion {
    pub ticket: Ticket,
    pub reply: ApiReply,
}

struct Envelope {
    ticket: Ticket,
    request: ApiRequest,
}

pub struct ApiWorker {
    requests: Option<Sender<Envelope>>,
    completions: Receiver<Completion>,
    next_id: u64,
    handle: Option<JoinHandle<()>>,
}

impl ApiWorker {
    pub fn spawn(api: Arc<dyn BlogApi>) -> Result<Self> {
        let (request_tx, request_rx) = unbounded::<Envelope>();
        let (completion_tx, completion_rx) = unbounded();
        let handle = thread::Builder::new()
            .name("blogtui-api".into())
            .spawn(move || {
                for Envelope { ticket, request } in request_rx.iter() {
                    let label = request.label();
                    tracing::debug!(ticket = ticket.id, mount = ticket.mount, label, "running request");
                    let reply = dispatch(api.as_ref(), request);
                    if completion_tx.send(Completion { ticket, reply }).is_err() {
                        break;
                    }
                }
                tracing::debug!("api worker stopped");
            })
            .context("spawning api worker thread")?;

        Ok(Self {
            requests: Some(request_tx),
            completions: completion_rx,
            next_id: 0,
            handle: Some(handle),
        })
    }

    pub fn submit(&mut self, mount: u64, request: ApiRequest) -> Ticket {
        self.next_id += 1;
        let ticket = Ticket {
            id: self.next_id,
            mount,
        };
        let sent = self
            .requests
            .as_ref()
            .map(|tx| tx.send(Envelope { ticket, request }).is_ok())
            .unwrap_or(false);
        if !sent {
            tracing::error!(ticket = ticket.id, "api worker is gone, request dropped");
        }
        ticket
    }

    pub fn try_recv(&self) -> Option<Completion> {
        self.completions.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<Completion> {
        match self.completions.recv_timeout(timeout) {
            Ok(completion) => Some(completion),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for ApiWorker {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("api worker panicked");
            }
        }
    }
}

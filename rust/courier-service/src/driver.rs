//! Runs one [`Session`] inside a tokio task.
//!
//! Commands arrive over an mpsc channel; between commands the task sleeps until
//! the session's next timer deadline. The session clock is wall time since the
//! task started. After every batch the view is republished through `ArcSwap`.

use std::sync::Arc;

use anyhow::anyhow;
use arc_swap::ArcSwap;
use courier_core::{CoreError, Layout, Session, SessionConfig};
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::state::{GridView, SessionView, ViewPresenter};

const COMMAND_BUFFER: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapLayout {
    #[default]
    Native,
    Canvas,
}

type Reply<T> = oneshot::Sender<Result<T, CoreError>>;

pub enum Command {
    Start { reply: Reply<SessionView> },
    Randomize { reply: Reply<SessionView> },
    LoadMap { bytes: Vec<u8>, layout: MapLayout, reply: Reply<SessionView> },
    Grid { reply: Reply<GridView> },
}

#[derive(Clone)]
pub struct DriverHandle {
    tx: mpsc::Sender<Command>,
    view: Arc<ArcSwap<SessionView>>,
}

impl DriverHandle {
    pub fn view(&self) -> Arc<SessionView> {
        self.view.load_full()
    }

    pub async fn start(&self) -> Result<SessionView, AppError> {
        self.request(|reply| Command::Start { reply }).await
    }

    pub async fn randomize(&self) -> Result<SessionView, AppError> {
        self.request(|reply| Command::Randomize { reply }).await
    }

    pub async fn load_map(&self, bytes: Vec<u8>, layout: MapLayout) -> Result<SessionView, AppError> {
        self.request(|reply| Command::LoadMap { bytes, layout, reply }).await
    }

    pub async fn grid(&self) -> Result<GridView, AppError> {
        self.request(|reply| Command::Grid { reply }).await
    }

    async fn request<T, F>(&self, make: F) -> Result<T, AppError>
    where
        F: FnOnce(Reply<T>) -> Command,
    {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| AppError::Internal(anyhow!("session driver stopped")))?;
        let res = rx.await.map_err(|_| AppError::Internal(anyhow!("session driver dropped the request")))?;
        res.map_err(AppError::from)
    }
}

/// Spawns the driver task. Must be called from within a tokio runtime.
pub fn spawn(config: SessionConfig) -> DriverHandle {
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let view = Arc::new(ArcSwap::from_pointee(SessionView::default()));
    let session = Session::new(config, ViewPresenter::default());
    tokio::spawn(run(session, rx, Arc::clone(&view)));
    DriverHandle { tx, view }
}

async fn run(mut session: Session<ViewPresenter>, mut rx: mpsc::Receiver<Command>, shared: Arc<ArcSwap<SessionView>>) {
    let origin = Instant::now();
    publish(&mut session, &shared);
    loop {
        let wake = session.next_deadline().map(|d| origin + d);
        tokio::select! {
            cmd = rx.recv() => {
                let Some(cmd) = cmd else { break };
                session.advance_to(origin.elapsed());
                handle(&mut session, cmd, &shared);
            }
            _ = sleep_until(wake) => {
                session.advance_to(origin.elapsed());
                publish(&mut session, &shared);
            }
        }
    }
    info!("session driver stopped");
}

fn handle(session: &mut Session<ViewPresenter>, cmd: Command, shared: &ArcSwap<SessionView>) {
    match cmd {
        Command::Start { reply } => {
            let res = session.start();
            let view = publish(session, shared);
            let _ = reply.send(res.map(|_| view));
        }
        Command::Randomize { reply } => {
            let res = session.randomize();
            let view = publish(session, shared);
            let _ = reply.send(res.map(|_| view));
        }
        Command::LoadMap { bytes, layout, reply } => {
            let layout = match layout {
                MapLayout::Native => Layout::Native,
                MapLayout::Canvas => session.config().canvas_layout(),
            };
            debug!(bytes = bytes.len(), ?layout, "loading map");
            let res = session.load_image(&bytes, layout);
            if let Err(e) = &res {
                warn!(error = %e, "map load failed");
            }
            let view = publish(session, shared);
            let _ = reply.send(res.map(|_| view));
        }
        Command::Grid { reply } => {
            let res = session.grid().map(GridView::from).ok_or(CoreError::NotReady);
            let _ = reply.send(res);
        }
    }
}

fn publish(session: &mut Session<ViewPresenter>, shared: &ArcSwap<SessionView>) -> SessionView {
    let snap = session.snapshot();
    let presenter = session.presenter_mut();
    presenter.view.absorb(snap);
    let view = presenter.view.clone();
    shared.store(Arc::new(view.clone()));
    view
}

async fn sleep_until(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

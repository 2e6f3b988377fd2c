use super::swipe_engine::{DeckView, EngineInput, EngineSettings, SwipeEngine};
use crate::animation::{PhaseTimer, PhaseToken};
use crate::api::{ApiError, DeckDataSource, IdeaSubmission, VoteClient};
use crate::deck::{Card, LoadTicket, VoteDispatcher};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const INPUT_BUFFER: usize = 256;
const COMPLETION_BUFFER: usize = 16;

// Results of background network work, handed back to the loop
#[derive(Debug)]
enum Completion {
    Loaded {
        ticket: LoadTicket,
        result: Result<Vec<Card>, ApiError>,
    },
    Submitted(Result<Card, ApiError>),
}

/// Owner of the running engine task.
///
/// Inputs go in through [`EngineHandle::sender`], snapshots come out through
/// [`EngineHandle::subscribe`]. All state lives on the task; network results
/// are delivered back to it instead of being applied from elsewhere.
///
/// ```text
/// UI ─[EngineInput]→ engine task ─[DeckView]→ UI
///                      ↑      │
///          Completion  │      └─ load / submit / vote tasks
/// ```
pub struct EngineHandle {
    input: mpsc::Sender<EngineInput>,
    view: watch::Receiver<DeckView>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl EngineHandle {
    /// Starts the engine task and its initial deck load
    pub fn spawn<B>(settings: EngineSettings, backend: Arc<B>) -> Self
    where
        B: DeckDataSource + VoteClient + IdeaSubmission,
    {
        info!("Starting swipe engine with settings: {:?}", settings);
        let dispatcher = VoteDispatcher::new(backend.clone(), settings.vote_retry.clone());
        let engine = SwipeEngine::new(settings, dispatcher);

        let (input_tx, input_rx) = mpsc::channel(INPUT_BUFFER);
        let (view_tx, view_rx) = watch::channel(engine.view());
        let shutdown = CancellationToken::new();

        let task = tokio::spawn(run_engine(
            engine,
            backend,
            input_rx,
            view_tx,
            shutdown.clone(),
        ));

        Self {
            input: input_tx,
            view: view_rx,
            shutdown,
            task,
        }
    }

    pub fn sender(&self) -> mpsc::Sender<EngineInput> {
        self.input.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DeckView> {
        self.view.clone()
    }

    pub fn view(&self) -> DeckView {
        self.view.borrow().clone()
    }

    /// Stops the loop and waits for it to exit. Pending phase timers are dropped.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            error!("Engine task ended abnormally: {}", e);
        }
    }
}

fn schedule(timer: PhaseTimer) -> (PhaseToken, Instant) {
    (timer.token, Instant::now() + timer.delay)
}

async fn wait_for_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn fetch_deck<B>(ticket: LoadTicket, backend: &Arc<B>, completions: &mpsc::Sender<Completion>)
where
    B: DeckDataSource,
{
    let backend = backend.clone();
    let completions = completions.clone();
    tokio::spawn(async move {
        let result = backend.load_released().await;
        if completions
            .send(Completion::Loaded { ticket, result })
            .await
            .is_err()
        {
            debug!("Engine stopped before load {:?} finished", ticket);
        }
    });
}

fn start_submit<B>(backend: &Arc<B>, text: String, completions: &mpsc::Sender<Completion>)
where
    B: IdeaSubmission,
{
    let backend = backend.clone();
    let completions = completions.clone();
    tokio::spawn(async move {
        let result = backend.create(&text).await;
        if completions
            .send(Completion::Submitted(result))
            .await
            .is_err()
        {
            debug!("Engine stopped before idea submission finished");
        }
    });
}

fn publish<V: VoteClient>(engine: &SwipeEngine<V>, view_tx: &watch::Sender<DeckView>) {
    let view = engine.view();
    view_tx.send_if_modified(|current| {
        if *current == view {
            false
        } else {
            *current = view;
            true
        }
    });
}

async fn run_engine<B>(
    mut engine: SwipeEngine<B>,
    backend: Arc<B>,
    mut input_rx: mpsc::Receiver<EngineInput>,
    view_tx: watch::Sender<DeckView>,
    shutdown: CancellationToken,
) where
    B: DeckDataSource + VoteClient + IdeaSubmission,
{
    let (completion_tx, mut completion_rx) = mpsc::channel(COMPLETION_BUFFER);
    let mut deadline: Option<(PhaseToken, Instant)> = None;

    fetch_deck(engine.begin_reload(), &backend, &completion_tx);
    publish(&engine, &view_tx);

    loop {
        let wake_at = deadline.map(|(_, at)| at);

        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Swipe engine shutting down");
                break;
            }
            input = input_rx.recv() => {
                let Some(input) = input else {
                    info!("All engine inputs dropped, stopping");
                    break;
                };
                match input {
                    EngineInput::Pointer(event) => {
                        if let Some(timer) = engine.handle_pointer(event) {
                            deadline = Some(schedule(timer));
                        }
                    }
                    EngineInput::Vote(direction) => {
                        if let Some(timer) = engine.vote(direction) {
                            deadline = Some(schedule(timer));
                        }
                    }
                    EngineInput::Reload => {
                        info!("Reload requested");
                        deadline = None;
                        fetch_deck(engine.begin_reload(), &backend, &completion_tx);
                    }
                    EngineInput::SubmitIdea(text) => match engine.begin_submit(&text) {
                        Ok(text) => start_submit(&backend, text, &completion_tx),
                        Err(e) => warn!("Idea not submitted: {}", e),
                    },
                    EngineInput::Resize { viewport_width } => {
                        engine.set_viewport_width(viewport_width);
                    }
                }
            }
            Some(completion) = completion_rx.recv() => match completion {
                Completion::Loaded { ticket, result } => {
                    if let Err(e) = engine.finish_load(ticket, result) {
                        debug!("Load {:?} not applied: {}", ticket, e);
                    }
                }
                Completion::Submitted(result) => {
                    if let Some(ticket) = engine.finish_submit(result) {
                        deadline = None;
                        fetch_deck(ticket, &backend, &completion_tx);
                    }
                }
            },
            _ = wait_for_deadline(wake_at) => {
                if let Some((token, _)) = deadline.take() {
                    deadline = engine.on_timer(token).map(schedule);
                }
            }
        }

        publish(&engine, &view_tx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationPhase;
    use crate::api::MemoryBackend;
    use crate::deck::{DeckStatus, VoteDirection};
    use crate::engine::{SubmitOutcome, SubmitReceipt};
    use crate::gesture::PointerEvent;
    use chrono::Local;
    use std::time::Duration;

    async fn wait_for_status(handle: &EngineHandle, status: DeckStatus) -> DeckView {
        let mut rx = handle.subscribe();
        let view = rx
            .wait_for(|view| view.status == status)
            .await
            .unwrap()
            .clone();
        view
    }

    #[tokio::test(start_paused = true)]
    async fn loads_on_start_and_exhausts_after_swipe() {
        let backend = Arc::new(MemoryBackend::new(vec![Card::new("a", "X")]));
        let handle = EngineHandle::spawn(EngineSettings::default(), backend.clone());

        let view = wait_for_status(&handle, DeckStatus::Reviewing).await;
        assert_eq!(view.current.unwrap().id, "a");

        let start = Local::now();
        let input = handle.sender();
        input
            .send(EngineInput::Pointer(PointerEvent::Down {
                x: 10.0,
                y: 10.0,
                pointer_id: 0,
                timestamp: start,
            }))
            .await
            .unwrap();
        input
            .send(EngineInput::Pointer(PointerEvent::Move {
                x: 210.0,
                y: 12.0,
                pointer_id: 0,
                timestamp: start + chrono::Duration::milliseconds(400),
            }))
            .await
            .unwrap();
        input
            .send(EngineInput::Pointer(PointerEvent::Up {
                pointer_id: 0,
                timestamp: start + chrono::Duration::milliseconds(400),
            }))
            .await
            .unwrap();

        let view = wait_for_status(&handle, DeckStatus::Exhausted).await;
        assert_eq!(view.position, 1);
        assert!(view.current.is_none());

        let mut rx = handle.subscribe();
        rx.wait_for(|view| view.phase == AnimationPhase::Idle)
            .await
            .unwrap();
        assert_eq!(backend.votes_received(), 1);
        assert_eq!(backend.card("a").await.unwrap().yes_count, 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_load_recovers_on_reload() {
        let backend = Arc::new(MemoryBackend::new(vec![Card::new("a", "X")]));
        backend.fail_next_loads(1);
        let handle = EngineHandle::spawn(EngineSettings::default(), backend);

        let mut rx = handle.subscribe();
        let failed = rx
            .wait_for(|view| matches!(view.status, DeckStatus::Failed(_)))
            .await
            .unwrap()
            .clone();
        assert!(failed.notice.unwrap().is_error());

        handle.sender().send(EngineInput::Reload).await.unwrap();
        let view = wait_for_status(&handle, DeckStatus::Reviewing).await;
        assert_eq!(view.total, 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn reload_during_throw_drops_the_pending_phase() {
        let backend = Arc::new(
            MemoryBackend::new(vec![Card::new("a", "X"), Card::new("b", "Y")])
                .with_latency(Duration::from_millis(50)),
        );
        let handle = EngineHandle::spawn(EngineSettings::default(), backend.clone());
        wait_for_status(&handle, DeckStatus::Reviewing).await;

        let input = handle.sender();
        input
            .send(EngineInput::Vote(VoteDirection::Yes))
            .await
            .unwrap();
        let mut rx = handle.subscribe();
        rx.wait_for(|view| view.phase == AnimationPhase::ThrowingOut)
            .await
            .unwrap();

        input.send(EngineInput::Reload).await.unwrap();
        rx.wait_for(|view| view.status == DeckStatus::Loading)
            .await
            .unwrap();
        let view = rx
            .wait_for(|view| view.status == DeckStatus::Reviewing)
            .await
            .unwrap()
            .clone();
        assert_eq!(view.phase, AnimationPhase::Idle);

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        let view = handle.view();
        assert_eq!(view.position, 0);
        assert_eq!(view.current.unwrap().id, "a");
        assert_eq!(backend.votes_received(), 0);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn accepted_idea_reloads_deck() {
        let backend = Arc::new(MemoryBackend::new(vec![Card::new("a", "X")]).with_auto_release());
        let handle = EngineHandle::spawn(EngineSettings::default(), backend);
        wait_for_status(&handle, DeckStatus::Reviewing).await;

        handle
            .sender()
            .send(EngineInput::SubmitIdea("  More plants in the office ".to_string()))
            .await
            .unwrap();

        let mut rx = handle.subscribe();
        let view = rx
            .wait_for(|view| view.total == 2 && view.status == DeckStatus::Reviewing)
            .await
            .unwrap()
            .clone();
        assert_eq!(view.current.unwrap().text, "More plants in the office");
        assert!(!view.submitting);
        assert_eq!(
            view.last_submit,
            Some(SubmitReceipt {
                attempt: 1,
                outcome: SubmitOutcome::Accepted,
            })
        );

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let backend = Arc::new(MemoryBackend::default());
        let handle = EngineHandle::spawn(EngineSettings::default(), backend);
        let input = handle.sender();
        handle.shutdown().await;
        assert!(input.send(EngineInput::Reload).await.is_err());
    }
}

use std::sync::Arc;
use serde_json::Value;
use tokio::select;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use crate::handlers::source::{ChangeSource, SnapshotStream, SourceEvent};
use crate::handlers::tracker::Tracker;
use crate::models::commands::LifecycleEvent;
use crate::models::error::Result;
use crate::models::flag::HohohoFlag;
use crate::models::position::Position;

pub(crate) struct AutoCancelTask<T>(pub JoinHandle<T>);

impl<T> Drop for AutoCancelTask<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

type SharedTracker = Arc<Mutex<Tracker>>;

/// Keeps one screen's marker and sound in step with the store.
///
/// Unsubscribed until `start`, subscribed until `stop`. While subscribed a
/// session task handles deliveries from both paths one at a time.
pub struct LocationSyncController {
    source: Arc<dyn ChangeSource>,
    tracker: SharedTracker,
    location_path: String,
    flag_path: String,
    session: Option<AutoCancelTask<()>>,
}

impl LocationSyncController {
    pub fn new(source: Arc<dyn ChangeSource>, tracker: Tracker) -> Self {
        let location_path = tracker.config().location_path.clone();
        let flag_path = tracker.config().flag_path.clone();
        Self {
            source,
            tracker: Arc::new(Mutex::new(tracker)),
            location_path,
            flag_path,
            session: None,
        }
    }

    /// True while the session task is alive.
    ///
    /// The session lives until both paths are closed. If the source cancels
    /// only one path, that path stays silent and `start` is a no-op until the
    /// other path ends too or `stop` is called.
    pub fn is_subscribed(&self) -> bool {
        self.session.as_ref().map_or(false, |task| !task.0.is_finished())
    }

    pub async fn start(&mut self) -> Result<()> {
        if self.is_subscribed() {
            warn!("Already tracking {} and {}, ignoring start", self.location_path, self.flag_path);
            return Ok(());
        }
        if self.session.take().is_some() {
            debug!("Previous session ended on its own, resubscribing");
        }

        let positions = self.source.subscribe(&self.location_path).await?;
        // On failure `positions` is dropped here, which releases it.
        let flags = self.source.subscribe(&self.flag_path).await?;

        let tracker = self.tracker.clone();
        self.session = Some(AutoCancelTask(tokio::spawn(run_session(positions, flags, tracker))));
        info!("Tracking {} and {}", self.location_path, self.flag_path);
        Ok(())
    }

    /// Returns once the session task is gone, so no callback fires afterwards.
    pub async fn stop(&mut self) {
        let Some(mut task) = self.session.take() else {
            debug!("Stop without an active session");
            return;
        };
        task.0.abort();
        match (&mut task.0).await {
            Err(e) if e.is_panic() => error!("Tracking session panicked: {}", e),
            _ => info!("Stopped tracking {} and {}", self.location_path, self.flag_path),
        }
    }

    /// Maps host lifecycle hooks onto `start` and `stop`.
    pub async fn on_lifecycle(&mut self, event: LifecycleEvent) -> Result<()> {
        match event {
            LifecycleEvent::Start | LifecycleEvent::Resume => self.start().await,
            LifecycleEvent::Pause | LifecycleEvent::Stop => {
                self.stop().await;
                Ok(())
            }
        }
    }

    pub async fn on_position_snapshot(&self, raw: &Value) -> Result<Position> {
        self.tracker.lock().await.on_position_snapshot(raw)
    }

    pub async fn on_flag_snapshot(&self, raw: &Value) -> Result<HohohoFlag> {
        self.tracker.lock().await.on_flag_snapshot(raw)
    }

    pub async fn on_position_changed(&self, position: Position) {
        self.tracker.lock().await.on_position_changed(position)
    }

    pub async fn on_hohoho_triggered(&self) {
        self.tracker.lock().await.on_hohoho_triggered()
    }

    pub async fn last_position(&self) -> Option<Position> {
        self.tracker.lock().await.last_position()
    }
}

async fn run_session(mut positions: SnapshotStream, mut flags: SnapshotStream, tracker: SharedTracker) {
    let mut positions_open = true;
    let mut flags_open = true;

    while positions_open || flags_open {
        select! {
            event = positions.recv(), if positions_open => match event {
                Some(SourceEvent::Snapshot(raw)) => {
                    if let Err(e) = tracker.lock().await.on_position_snapshot(&raw) {
                        warn!("Dropping position snapshot: {}", e);
                    }
                }
                Some(SourceEvent::Cancelled(reason)) => warn!("Position subscription cancelled: {}", reason),
                None => positions_open = false,
            },
            event = flags.recv(), if flags_open => match event {
                Some(SourceEvent::Snapshot(raw)) => {
                    if let Err(e) = tracker.lock().await.on_flag_snapshot(&raw) {
                        warn!("Dropping flag snapshot: {}", e);
                    }
                }
                Some(SourceEvent::Cancelled(reason)) => warn!("Flag subscription cancelled: {}", reason),
                None => flags_open = false,
            },
        }
    }
    info!("Both subscriptions closed by the source");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use serde_json::json;
    use tokio::sync::mpsc;
    use tokio::time::timeout;
    use crate::config::TrackerConfig;
    use crate::handlers::presenter::CommandChannel;
    use crate::handlers::source::MemoryStore;
    use crate::models::commands::PresentationCommand;
    use crate::models::error::SyncError;
    use super::*;

    fn controller(store: &Arc<MemoryStore>) -> (LocationSyncController, mpsc::UnboundedReceiver<PresentationCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let channel = CommandChannel::new(tx);
        let tracker = Tracker::new(Box::new(channel.clone()), Box::new(channel), TrackerConfig::default());
        (LocationSyncController::new(store.clone(), tracker), rx)
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<PresentationCommand>) -> PresentationCommand {
        timeout(Duration::from_secs(1), rx.recv()).await
            .expect("timed out waiting for a command")
            .expect("command channel closed")
    }

    async fn assert_quiet(rx: &mut mpsc::UnboundedReceiver<PresentationCommand>) {
        assert!(timeout(Duration::from_millis(50), rx.recv()).await.is_err());
    }

    #[tokio::test]
    async fn stop_without_start_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let (mut controller, _rx) = controller(&store);
        controller.stop().await;
        assert!(!controller.is_subscribed());
    }

    #[tokio::test]
    async fn double_start_subscribes_once() {
        let store = Arc::new(MemoryStore::new());
        let (mut controller, _rx) = controller(&store);

        controller.start().await.unwrap();
        controller.start().await.unwrap();

        assert!(controller.is_subscribed());
        assert_eq!(store.listener_count("current_location"), 1);
        assert_eq!(store.listener_count("ho_ho_hoing"), 1);
    }

    #[tokio::test]
    async fn bad_snapshot_does_not_end_the_session() {
        let store = Arc::new(MemoryStore::new());
        let (mut controller, mut rx) = controller(&store);
        controller.start().await.unwrap();

        store.set("current_location", json!({"lng": -84.51})).unwrap();
        store.set("current_location", json!({"lat": 39.10, "lng": -84.51})).unwrap();

        let position = Position::new(39.10, -84.51);
        assert_eq!(next(&mut rx).await, PresentationCommand::RecenterCamera { position, zoom: 9.0 });
        assert!(matches!(next(&mut rx).await, PresentationCommand::CreateMarker { .. }));
        assert_eq!(controller.last_position().await, Some(position));
    }

    #[tokio::test]
    async fn stop_silences_pending_deliveries() {
        let store = Arc::new(MemoryStore::new());
        let (mut controller, mut rx) = controller(&store);
        controller.start().await.unwrap();
        controller.stop().await;

        assert_eq!(store.set("ho_ho_hoing", json!(true)).unwrap(), 0);
        assert_eq!(store.set("current_location", json!({"lat": 1.0, "lng": 2.0})).unwrap(), 0);
        assert_quiet(&mut rx).await;
        assert!(!controller.is_subscribed());
    }

    #[tokio::test]
    async fn stop_drops_deliveries_already_queued() {
        let store = Arc::new(MemoryStore::new());
        let (mut controller, mut rx) = controller(&store);
        controller.start().await.unwrap();

        // Queued on the session's streams before it gets a chance to run.
        assert_eq!(store.set("current_location", json!({"lat": 39.10, "lng": -84.51})).unwrap(), 1);
        assert_eq!(store.set("ho_ho_hoing", json!(true)).unwrap(), 1);
        controller.stop().await;

        assert_quiet(&mut rx).await;
        assert_eq!(controller.last_position().await, None);
    }

    #[tokio::test]
    async fn lifecycle_hooks_drive_subscriptions() {
        let store = Arc::new(MemoryStore::new());
        let (mut controller, _rx) = controller(&store);

        controller.on_lifecycle(LifecycleEvent::Start).await.unwrap();
        assert!(controller.is_subscribed());
        assert_eq!(store.listener_count("ho_ho_hoing"), 1);

        controller.on_lifecycle(LifecycleEvent::Pause).await.unwrap();
        assert!(!controller.is_subscribed());
        assert_eq!(store.listener_count("ho_ho_hoing"), 0);

        controller.on_lifecycle(LifecycleEvent::Resume).await.unwrap();
        controller.on_lifecycle(LifecycleEvent::Resume).await.unwrap();
        assert_eq!(store.listener_count("current_location"), 1);

        controller.on_lifecycle(LifecycleEvent::Stop).await.unwrap();
        assert!(!controller.is_subscribed());
        assert_eq!(store.listener_count("current_location"), 0);
    }

    #[tokio::test]
    async fn one_cancelled_path_keeps_the_session() {
        let store = Arc::new(MemoryStore::new());
        let (mut controller, mut rx) = controller(&store);
        controller.start().await.unwrap();

        store.cancel("ho_ho_hoing", "permission denied").unwrap();
        store.set("current_location", json!({"lat": 40.0, "lng": -85.0})).unwrap();
        assert!(matches!(next(&mut rx).await, PresentationCommand::RecenterCamera { .. }));
        assert!(controller.is_subscribed());

        controller.start().await.unwrap();
        assert_eq!(store.listener_count("ho_ho_hoing"), 0);
    }

    #[tokio::test]
    async fn marker_survives_pause_and_resume() {
        let store = Arc::new(MemoryStore::new());
        store.set("current_location", json!({"lat": 39.10, "lng": -84.51})).unwrap();
        let (mut controller, mut rx) = controller(&store);

        controller.start().await.unwrap();
        next(&mut rx).await;
        let created = match next(&mut rx).await {
            PresentationCommand::CreateMarker { marker, .. } => marker,
            other => panic!("unexpected command {other:?}"),
        };
        controller.stop().await;

        controller.start().await.unwrap();
        next(&mut rx).await;
        assert_eq!(next(&mut rx).await, PresentationCommand::MoveMarker {
            marker: created,
            position: Position::new(39.10, -84.51),
        });
    }

    #[tokio::test]
    async fn cancelled_source_allows_restart() {
        let store = Arc::new(MemoryStore::new());
        let (mut controller, _rx) = controller(&store);
        controller.start().await.unwrap();

        store.cancel("current_location", "permission denied").unwrap();
        store.cancel("ho_ho_hoing", "permission denied").unwrap();
        timeout(Duration::from_secs(1), async {
            while controller.is_subscribed() {
                tokio::task::yield_now().await;
            }
        }).await.expect("session did not end");

        controller.start().await.unwrap();
        assert!(controller.is_subscribed());
        assert_eq!(store.listener_count("ho_ho_hoing"), 1);
    }

    #[tokio::test]
    async fn failed_subscription_surfaces() {
        let store = Arc::new(MemoryStore::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let channel = CommandChannel::new(tx);
        let mut config = TrackerConfig::default();
        config.flag_path = "ho.ho".to_string();
        let tracker = Tracker::new(Box::new(channel.clone()), Box::new(channel), config);
        let mut controller = LocationSyncController::new(store.clone(), tracker);

        assert!(matches!(controller.start().await, Err(SyncError::InvalidPath(_))));
        assert!(!controller.is_subscribed());
        assert_eq!(store.listener_count("current_location"), 0);
    }

    #[tokio::test]
    async fn direct_calls_reach_the_tracker() {
        let store = Arc::new(MemoryStore::new());
        let (controller, mut rx) = controller(&store);

        controller.on_hohoho_triggered().await;
        assert!(matches!(next(&mut rx).await, PresentationCommand::PlaySound(_)));

        assert!(controller.on_flag_snapshot(&json!(false)).await.is_ok());
        controller.on_position_changed(Position::new(1.0, 2.0)).await;
        assert!(matches!(next(&mut rx).await, PresentationCommand::RecenterCamera { .. }));
    }
}

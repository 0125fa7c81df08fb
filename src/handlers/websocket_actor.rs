use std::sync::Arc;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use crate::config::TrackerConfig;
use crate::handlers::controller::{AutoCancelTask, LocationSyncController};
use crate::handlers::presenter::CommandChannel;
use crate::handlers::source::ChangeSource;
use crate::handlers::tracker::Tracker;
use crate::models::commands::LifecycleEvent;

/// One connected map screen.
///
/// Presentation commands flow out as JSON text frames. Lifecycle events flow
/// in and drive the screen's controller.
pub struct ScreenSession {
    controller: LocationSyncController,
    send_task: AutoCancelTask<()>,
}

impl ScreenSession {
    pub fn new(socket: WebSocket, source: Arc<dyn ChangeSource>, config: TrackerConfig) -> (Self, futures_util::stream::SplitStream<WebSocket>) {
        let (mut ws_sender, ws_receiver) = socket.split();
        let (outbound, mut commands) = mpsc::unbounded_channel();

        let channel = CommandChannel::new(outbound);
        let tracker = Tracker::new(Box::new(channel.clone()), Box::new(channel), config);

        let send_task = tokio::spawn(async move {
            while let Some(command) = commands.recv().await {
                let text = match serde_json::to_string(&command) {
                    Ok(text) => text,
                    Err(e) => {
                        error!("Unable to serialize {:?}: {}", command, e);
                        continue;
                    }
                };
                debug!("Sending command to screen: {}", text);
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            ws_sender.send(Message::Close(None)).await.ok();
        });

        let session = Self {
            controller: LocationSyncController::new(source, tracker),
            send_task: AutoCancelTask(send_task),
        };
        (session, ws_receiver)
    }

    pub async fn run_actor(mut self, mut ws_receiver: futures_util::stream::SplitStream<WebSocket>) {
        self.start().await;

        loop {
            tokio::select! {
                _ = &mut self.send_task.0 => {
                    debug!("Screen stopped accepting commands");
                    break;
                }
                message = ws_receiver.next() => match message {
                    Some(Ok(Message::Text(text))) => self.on_lifecycle_message(&text).await,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Screen socket error: {}", e);
                        break;
                    }
                },
            }
        }

        self.controller.stop().await;
        info!("Screen disconnected");
    }

    async fn on_lifecycle_message(&mut self, text: &str) {
        match serde_json::from_str::<LifecycleEvent>(text) {
            Ok(event) => {
                if let Err(e) = self.controller.on_lifecycle(event).await {
                    error!("Unable to apply {:?}: {}", event, e);
                }
            }
            Err(e) => debug!("Ignoring screen message {:?}: {}", text, e),
        }
    }

    async fn start(&mut self) {
        if let Err(e) = self.controller.start().await {
            error!("Unable to start tracking: {}", e);
        }
    }
}

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use crate::handlers::tracker::{MapView, SoundTrigger};
use crate::models::commands::{PresentationCommand, SoundRequest};
use crate::models::marker::MarkerHandle;
use crate::models::position::Position;

/// Map view and sound trigger that forward every request as a
/// `PresentationCommand` to whoever renders the screen.
#[derive(Clone)]
pub struct CommandChannel {
    outbound: mpsc::UnboundedSender<PresentationCommand>,
    next_marker: Arc<AtomicU64>,
}

impl CommandChannel {
    pub fn new(outbound: mpsc::UnboundedSender<PresentationCommand>) -> Self {
        Self {
            outbound,
            next_marker: Arc::new(AtomicU64::new(1)),
        }
    }

    fn send(&self, command: PresentationCommand) {
        // The screen may already be gone; its commands have nowhere to go.
        if self.outbound.send(command).is_err() {
            debug!("Dropping presentation command for closed screen");
        }
    }
}

impl MapView for CommandChannel {
    fn recenter_camera(&mut self, position: Position, zoom: f32) {
        self.send(PresentationCommand::RecenterCamera { position, zoom });
    }

    fn create_marker(&mut self, position: Position, icon: &str) -> MarkerHandle {
        let marker = MarkerHandle::new(self.next_marker.fetch_add(1, Ordering::Relaxed));
        self.send(PresentationCommand::CreateMarker { marker, position, icon: icon.to_string() });
        marker
    }

    fn move_marker(&mut self, marker: MarkerHandle, position: Position) {
        self.send(PresentationCommand::MoveMarker { marker, position });
    }
}

impl SoundTrigger for CommandChannel {
    fn play(&mut self, request: &SoundRequest) {
        self.send(PresentationCommand::PlaySound(request.clone()));
    }
}

//! # Push Channel
//!
//! Server-Sent Events at `/events`.
//!
//! ## Events
//! - `connected`: `{ message }`, sent once to each new subscriber
//! - `data_update`: `{ count }`, after every `/data` read
//! - `new_sale`: the sale record, relayed from `/notify-new-sale`
//!
//! ## Delivery
//! - Fan out through one `tokio::sync::broadcast` channel
//! - Nothing is replayed, a client only sees events published while connected
//! - A subscriber that falls behind by more than the channel capacity skips ahead
//! - [`Notifier::close`] ends every open stream so graceful shutdown can finish
use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::Stream;
use ledger::models::SalesRecord;
use serde_json::{Value, json};
use tokio::sync::{
    broadcast::{self, Receiver, Sender, error::RecvError},
    watch,
};
use tracing::{debug, info, warn};

use crate::state::AppState;

pub const CONNECTED_EVENT: &str = "connected";
pub const DATA_UPDATE_EVENT: &str = "data_update";
pub const NEW_SALE_EVENT: &str = "new_sale";

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    DataUpdate { count: usize },
    NewSale(SalesRecord),
}

impl Notification {
    pub fn name(&self) -> &'static str {
        match self {
            Notification::DataUpdate { .. } => DATA_UPDATE_EVENT,
            Notification::NewSale(_) => NEW_SALE_EVENT,
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            Notification::DataUpdate { count } => json!({ "count": count }),
            Notification::NewSale(sale) => json!(sale),
        }
    }

    fn into_event(self) -> Event {
        Event::default().event(self.name()).data(self.payload().to_string())
    }
}

#[derive(Clone)]
pub struct Notifier {
    sender: Sender<Notification>,
    closed: Arc<watch::Sender<bool>>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        let (closed, _) = watch::channel(false);

        Self {
            sender,
            closed: Arc::new(closed),
        }
    }

    /// Ends every event stream, current and future.
    pub fn close(&self) {
        if !self.closed.send_replace(true) {
            info!("Closing event streams");
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    pub fn subscribe(&self) -> Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Returns how many subscribers the notification reached.
    pub fn publish(&self, notification: Notification) -> usize {
        let name = notification.name();

        match self.sender.send(notification) {
            Ok(receivers) => {
                debug!(event = name, receivers, "Published notification");
                receivers
            }
            Err(_) => {
                debug!(event = name, "No subscribers for notification");
                0
            }
        }
    }
}

pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.notifier.subscribe();
    let closed = state.notifier.closed.subscribe();

    Sse::new(event_stream(receiver, closed)).keep_alive(KeepAlive::default())
}

fn event_stream(
    mut receiver: Receiver<Notification>,
    mut closed: watch::Receiver<bool>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        let connected = json!({ "message": "Event stream established" });
        yield Ok(Event::default().event(CONNECTED_EVENT).data(connected.to_string()));

        loop {
            let received = tokio::select! {
                received = receiver.recv() => Some(received),
                () = wait_closed(&mut closed) => None,
            };

            match received {
                Some(Ok(notification)) => yield Ok(notification.into_event()),
                Some(Err(RecvError::Lagged(skipped))) => {
                    warn!("Event subscriber lagged, skipped {skipped} notifications");
                }
                Some(Err(RecvError::Closed)) | None => break,
            }
        }

        debug!("Event stream ended");
    }
}

/// Resolves once the notifier is closed or dropped.
async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    loop {
        let is_closed = *closed.borrow_and_update();
        if is_closed || closed.changed().await.is_err() {
            return;
        }
    }
}

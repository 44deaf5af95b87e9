use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;
use log::{info, warn, error};

use crate::board::message::BoardMessage;

/// Central notification hub. Producers (poller, push handler, heartbeat)
/// publish into one unbounded inbound queue; a dispatcher task consumes
/// it exactly once, in FIFO order, and copies each message into the
/// bounded channel of every connected client.
///
/// A client that closed its channel is unregistered at the next delivery
/// attempt. A client whose channel is full has that one message dropped;
/// the shared queue itself never drops.
pub struct NotificationHub {
    inbound: mpsc::UnboundedSender<BoardMessage>,
    clients: Arc<Mutex<HashMap<Uuid, mpsc::Sender<BoardMessage>>>>,
    client_capacity: usize,
}

impl NotificationHub {
    /// Creates the hub and spawns its dispatcher task. Must be called
    /// from within the runtime.
    pub fn new(client_capacity: usize) -> Arc<Self> {
        let (inbound, inbound_rx) = mpsc::unbounded_channel();
        let clients: Arc<Mutex<HashMap<Uuid, mpsc::Sender<BoardMessage>>>> =
            Arc::new(Mutex::new(HashMap::new()));

        tokio::spawn(Self::dispatch_loop(inbound_rx, clients.clone()));

        Arc::new(Self {
            inbound,
            clients,
            client_capacity,
        })
    }

    /// Appends a message to the inbound queue. Never blocks.
    pub fn publish(&self, message: BoardMessage) {
        if self.inbound.send(message).is_err() {
            error!("Dispatcher task is gone - message dropped");
        }
    }

    /// Registers a new client and returns its id and receiving end.
    /// Registration happens before the caller reads its state snapshot,
    /// so nothing published afterwards can be missed.
    pub fn register(&self) -> Result<(Uuid, mpsc::Receiver<BoardMessage>), String> {
        let (tx, rx) = mpsc::channel(self.client_capacity);
        let client_id = Uuid::new_v4();

        let mut clients = self.clients.lock().map_err(|_| "Lock poisoned".to_string())?;
        clients.insert(client_id, tx);
        info!("Client {} connected ({} active)", client_id, clients.len());

        Ok((client_id, rx))
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().map(|clients| clients.len()).unwrap_or(0)
    }

    async fn dispatch_loop(
        mut inbound_rx: mpsc::UnboundedReceiver<BoardMessage>,
        clients: Arc<Mutex<HashMap<Uuid, mpsc::Sender<BoardMessage>>>>,
    ) {
        while let Some(message) = inbound_rx.recv().await {
            let targets: Vec<(Uuid, mpsc::Sender<BoardMessage>)> = match clients.lock() {
                Ok(clients) => clients
                    .iter()
                    .map(|(id, tx)| (*id, tx.clone()))
                    .collect(),
                Err(_) => {
                    error!("Client registry lock poisoned - message dropped");
                    continue;
                }
            };

            let mut disconnected = Vec::new();
            for (client_id, tx) in targets {
                match tx.try_send(message.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        warn!("Client {} not keeping up - message dropped for it", client_id);
                    }
                    Err(TrySendError::Closed(_)) => {
                        disconnected.push(client_id);
                    }
                }
            }

            if !disconnected.is_empty() {
                if let Ok(mut clients) = clients.lock() {
                    for client_id in disconnected {
                        clients.remove(&client_id);
                        info!(
                            "Client {} disconnected ({} active)",
                            client_id,
                            clients.len()
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    async fn recv(rx: &mut mpsc::Receiver<BoardMessage>) -> BoardMessage {
        timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for message")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn test_messages_arrive_in_publish_order() {
        let hub = NotificationHub::new(10);
        let (_id, mut rx) = hub.register().unwrap();

        for i in 0..5 {
            hub.publish(BoardMessage::Text(format!("line {}", i)));
        }

        for i in 0..5 {
            assert_eq!(recv(&mut rx).await, BoardMessage::Text(format!("line {}", i)));
        }
    }

    #[tokio::test]
    async fn test_every_client_receives_every_message() {
        let hub = NotificationHub::new(10);
        let (_a, mut rx_a) = hub.register().unwrap();
        let (_b, mut rx_b) = hub.register().unwrap();

        hub.publish(BoardMessage::Text("to everyone".to_string()));

        assert_eq!(recv(&mut rx_a).await, BoardMessage::Text("to everyone".to_string()));
        assert_eq!(recv(&mut rx_b).await, BoardMessage::Text("to everyone".to_string()));
    }

    #[tokio::test]
    async fn test_closed_client_is_unregistered() {
        let hub = NotificationHub::new(10);
        let (_id, rx) = hub.register().unwrap();
        assert_eq!(hub.client_count(), 1);

        drop(rx);
        hub.publish(BoardMessage::Text("probe".to_string()));

        // Removal happens at the next delivery attempt.
        for _ in 0..50 {
            if hub.client_count() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("closed client was never unregistered");
    }

    #[tokio::test]
    async fn test_late_joiner_sees_no_backlog() {
        let hub = NotificationHub::new(10);
        hub.publish(BoardMessage::Text("before join".to_string()));
        tokio::time::sleep(Duration::from_millis(20)).await;

        let (_id, mut rx) = hub.register().unwrap();
        hub.publish(BoardMessage::Text("after join".to_string()));

        assert_eq!(recv(&mut rx).await, BoardMessage::Text("after join".to_string()));
    }

    #[tokio::test]
    async fn test_slow_client_loses_overflow_but_stays_registered() {
        let hub = NotificationHub::new(1);
        let (_id, mut rx) = hub.register().unwrap();

        // Client is not reading; only one message fits its channel.
        hub.publish(BoardMessage::Text("first".to_string()));
        hub.publish(BoardMessage::Text("second".to_string()));
        hub.publish(BoardMessage::Text("third".to_string()));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(recv(&mut rx).await, BoardMessage::Text("first".to_string()));
        assert!(timeout(Duration::from_millis(100), rx.recv()).await.is_err());
        assert_eq!(hub.client_count(), 1);
    }
}

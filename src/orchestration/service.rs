//! # Service Mode
//!
//! Runs the orchestrator as a single task fed by a command inbox. The loop
//! drains every pending command, then runs one unit of the next runnable
//! job, and repeats; with nothing runnable it waits for the next command.
//! A unit in flight is never raced against the inbox, so commands are only
//! ever observed at unit boundaries.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sellerbot_core::config::SellerbotConfig;
//! use sellerbot_core::constants::{messages, MessageType};
//! use sellerbot_core::events::Topic;
//! use sellerbot_core::messaging::Message;
//! use sellerbot_core::orchestration::{CollaboratorRegistry, Orchestrator};
//!
//! # async fn example(registry: CollaboratorRegistry) -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator =
//!     Orchestrator::from_config(Arc::new(SellerbotConfig::default()), registry).await?;
//! let (handle, service) = orchestrator.spawn();
//!
//! let (listener, mut events) = handle.connect("popup").await?;
//! handle.subscribe(listener, Topic::All).await?;
//!
//! let start = MessageType::from_wire(messages::START_MONITOR).expect("catalog member");
//! let reply = handle.send(Message::new(start, serde_json::json!({}))).await?;
//! assert!(reply.ok);
//!
//! while let Some(event) = events.recv().await {
//!     println!("{} {}", event.message_type(), event.payload());
//! }
//!
//! handle.shutdown().await?;
//! service.await??;
//! # Ok(())
//! # }
//! ```

use super::errors::{OrchestrationError, OrchestrationResult};
use super::orchestrator::Orchestrator;
use crate::constants::JobType;
use crate::events::{ListenerId, Topic};
use crate::messaging::{Message, Reply};
use crate::models::JobStatus;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::info;

/// Requests accepted by a running orchestrator
#[derive(Debug)]
pub enum Command {
    Control {
        message: Message,
        reply: oneshot::Sender<Reply>,
    },
    Connect {
        name: String,
        reply: oneshot::Sender<(ListenerId, mpsc::UnboundedReceiver<Message>)>,
    },
    Subscribe {
        listener: ListenerId,
        topic: Topic,
    },
    Unsubscribe {
        listener: ListenerId,
        topic: Topic,
    },
    Disconnect {
        listener: ListenerId,
    },
    Snapshot {
        job_type: JobType,
        reply: oneshot::Sender<JobStatus>,
    },
    /// Flush every snapshot and stop; the reply is sent after the flush
    Shutdown { reply: oneshot::Sender<()> },
}

/// Cloneable sender side of the orchestrator's inbox
///
/// Commands sent through one handle are handled in send order.
#[derive(Debug, Clone)]
pub struct OrchestratorHandle {
    sender: mpsc::Sender<Command>,
}

impl OrchestratorHandle {
    pub fn new(sender: mpsc::Sender<Command>) -> Self {
        Self { sender }
    }

    /// Send a control message and wait for its reply
    pub async fn send(&self, message: Message) -> OrchestrationResult<Reply> {
        let (reply, response) = oneshot::channel();
        self.command(Command::Control { message, reply }).await?;
        response
            .await
            .map_err(|_| OrchestrationError::ServiceUnavailable)
    }

    pub async fn connect(
        &self,
        name: impl Into<String>,
    ) -> OrchestrationResult<(ListenerId, mpsc::UnboundedReceiver<Message>)> {
        let (reply, response) = oneshot::channel();
        self.command(Command::Connect {
            name: name.into(),
            reply,
        })
        .await?;
        response
            .await
            .map_err(|_| OrchestrationError::ServiceUnavailable)
    }

    pub async fn subscribe(&self, listener: ListenerId, topic: Topic) -> OrchestrationResult<()> {
        self.command(Command::Subscribe { listener, topic }).await
    }

    pub async fn unsubscribe(&self, listener: ListenerId, topic: Topic) -> OrchestrationResult<()> {
        self.command(Command::Unsubscribe { listener, topic }).await
    }

    pub async fn disconnect(&self, listener: ListenerId) -> OrchestrationResult<()> {
        self.command(Command::Disconnect { listener }).await
    }

    pub async fn snapshot(&self, job_type: JobType) -> OrchestrationResult<JobStatus> {
        let (reply, response) = oneshot::channel();
        self.command(Command::Snapshot { job_type, reply }).await?;
        response
            .await
            .map_err(|_| OrchestrationError::ServiceUnavailable)
    }

    /// Ask the service to flush and stop; resolves once the flush is done
    pub async fn shutdown(&self) -> OrchestrationResult<()> {
        let (reply, response) = oneshot::channel();
        self.command(Command::Shutdown { reply }).await?;
        response
            .await
            .map_err(|_| OrchestrationError::ServiceUnavailable)
    }

    async fn command(&self, command: Command) -> OrchestrationResult<()> {
        self.sender
            .send(command)
            .await
            .map_err(|_| OrchestrationError::ServiceUnavailable)
    }
}

impl Orchestrator {
    /// Run the service loop on a new task
    pub fn spawn(self) -> (OrchestratorHandle, JoinHandle<OrchestrationResult<()>>) {
        let (sender, inbox) = mpsc::channel(self.config().execution.command_buffer.max(1));
        let service = tokio::spawn(self.run(inbox));
        (OrchestratorHandle::new(sender), service)
    }

    /// Serve commands until `Shutdown` or until every handle is dropped;
    /// returns the result of the final flush
    pub async fn run(mut self, mut inbox: mpsc::Receiver<Command>) -> OrchestrationResult<()> {
        info!("Orchestrator service started");

        loop {
            loop {
                match inbox.try_recv() {
                    Ok(command) => {
                        if let Some(reply) = self.dispatch(command).await {
                            return self.stop(Some(reply)).await;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return self.stop(None).await,
                }
            }

            if self.step().await.is_some() {
                tokio::task::yield_now().await;
                continue;
            }

            match inbox.recv().await {
                Some(command) => {
                    if let Some(reply) = self.dispatch(command).await {
                        return self.stop(Some(reply)).await;
                    }
                }
                None => return self.stop(None).await,
            }
        }
    }

    /// Handle one command; hands back the reply channel of a shutdown
    async fn dispatch(&mut self, command: Command) -> Option<oneshot::Sender<()>> {
        match command {
            Command::Control { message, reply } => {
                let _ = reply.send(self.handle_message(message).await);
            }
            Command::Connect { name, reply } => {
                let _ = reply.send(self.connect(name));
            }
            Command::Subscribe { listener, topic } => {
                self.subscribe(listener, topic);
            }
            Command::Unsubscribe { listener, topic } => {
                self.unsubscribe(listener, topic);
            }
            Command::Disconnect { listener } => {
                self.disconnect(listener);
            }
            Command::Snapshot { job_type, reply } => {
                let _ = reply.send(self.snapshot(job_type));
            }
            Command::Shutdown { reply } => return Some(reply),
        }
        None
    }

    async fn stop(self, reply: Option<oneshot::Sender<()>>) -> OrchestrationResult<()> {
        let result = self.flush().await;
        info!(clean = result.is_ok(), "Orchestrator service stopped");
        if let Some(reply) = reply {
            let _ = reply.send(());
        }
        result
    }
}

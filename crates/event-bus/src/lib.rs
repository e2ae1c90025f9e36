#![allow(dead_code)]
//! In-process broadcast bus carrying [`ExecutionEvent`]s, and the bus
//! abstraction it is built on.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use agentcore_core_types::{ActionId, CoreError, TaskId};

/// Trait implemented by payload types that can be carried on a bus.
pub trait Event: Clone + Send + Sync + std::fmt::Debug + 'static {}

impl<T> Event for T where T: Clone + Send + Sync + std::fmt::Debug + 'static {}

#[async_trait]
pub trait EventBus<E>: Send + Sync
where
    E: Event,
{
    async fn publish(&self, event: E) -> Result<(), CoreError>;
    fn subscribe(&self) -> broadcast::Receiver<E>;
}

/// Broadcast-channel backed bus. Publishing never blocks on subscribers and
/// never fails because a subscriber panicked or dropped its receiver.
pub struct InMemoryBus<E>
where
    E: Event,
{
    sender: broadcast::Sender<E>,
}

impl<E> InMemoryBus<E>
where
    E: Event,
{
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }
}

#[async_trait]
impl<E> EventBus<E> for InMemoryBus<E>
where
    E: Event,
{
    async fn publish(&self, event: E) -> Result<(), CoreError> {
        // `send` only errors when there are zero receivers; that is not a
        // failure from the publisher's point of view.
        let _ = self.sender.send(event);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }
}

/// Materialises an mpsc receiver from a bus subscription so callers can
/// await events without handling broadcast lag semantics directly.
pub fn to_mpsc<E>(bus: Arc<InMemoryBus<E>>, capacity: usize) -> mpsc::Receiver<E>
where
    E: Event,
{
    let mut rx = bus.subscribe();
    let (tx, out_rx) = mpsc::channel(capacity.max(1));
    tokio::spawn(async move {
        while let Ok(ev) = rx.recv().await {
            if tx.send(ev).await.is_err() {
                break;
            }
        }
    });
    out_rx
}

/// Who emitted an [`ExecutionEvent`].
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EventActor {
    System,
    Navigator,
    Planner,
    Validator,
}

/// What happened. `Start`/`Ok`/`Fail` apply to both task-level and
/// action-level events; `Cancel`/`Pause` are task-level only.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EventState {
    Start,
    Ok,
    Fail,
    Cancel,
    Pause,
}

/// One entry on the `EXECUTION` channel. `payload` is a short human-readable
/// message (an action's intent string, a failure reason); it never carries
/// structured data that a subscriber is expected to parse.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutionEvent {
    pub task_id: TaskId,
    pub action_id: Option<ActionId>,
    pub actor: EventActor,
    pub state: EventState,
    pub payload: String,
}

impl ExecutionEvent {
    pub fn system(task_id: TaskId, state: EventState, payload: impl Into<String>) -> Self {
        Self {
            task_id,
            action_id: None,
            actor: EventActor::System,
            state,
            payload: payload.into(),
        }
    }

    pub fn action(
        task_id: TaskId,
        action_id: ActionId,
        actor: EventActor,
        state: EventState,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            task_id,
            action_id: Some(action_id),
            actor,
            state,
            payload: payload.into(),
        }
    }
}

/// The bus type the rest of the core depends on: a fixed `ExecutionEvent`
/// payload rather than a generic one, matching the closed taxonomy in
/// the external interfaces contract.
pub type EventManager = InMemoryBus<ExecutionEvent>;

pub fn new_event_manager(capacity: usize) -> Arc<EventManager> {
    InMemoryBus::new(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_without_subscribers_does_not_error() {
        let bus = new_event_manager(16);
        let result = bus
            .publish(ExecutionEvent::system(
                TaskId::new(),
                EventState::Start,
                "starting",
            ))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn subscriber_receives_published_event_in_order() {
        let bus = new_event_manager(16);
        let mut rx = bus.subscribe();
        let task_id = TaskId::new();
        bus.publish(ExecutionEvent::system(task_id.clone(), EventState::Start, "a"))
            .await
            .unwrap();
        bus.publish(ExecutionEvent::system(task_id, EventState::Ok, "b"))
            .await
            .unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.payload, "a");
        assert_eq!(second.payload, "b");
    }

    #[tokio::test]
    async fn to_mpsc_forwards_events() {
        let bus = new_event_manager(16);
        let mut rx = to_mpsc(bus.clone(), 16);
        bus.publish(ExecutionEvent::system(
            TaskId::new(),
            EventState::Start,
            "hello",
        ))
        .await
        .unwrap();
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.payload, "hello");
    }
}

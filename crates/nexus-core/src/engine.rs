//! Engine state shared by every command.
//!
//! All stores live behind one mutex: a command locks, drains any timers that
//! have come due, applies its mutation, persists, and unlocks. Scheduled
//! tasks run under the same lock, so they never interleave with a command.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use nexus_shared::constants::{
    BOT_ID, KEY_COMMENTS, KEY_GROUPS, KEY_MESSAGES, KEY_POSTS, KEY_SESSION, KEY_USERS,
    NOTIFICATION_TTL_MS,
};
use nexus_shared::{DeliveryStatus, MessageKind, Role, Severity};
use nexus_store::{Comment, Group, Message, Post, SnapshotBackend, Snapshots, User};

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::credentials::{CredentialVerifier, RoleCredentials};
use crate::error::{EngineError, Result};
use crate::events::{EngineEvent, EventBus};
use crate::scheduler::{DueTask, ScheduledTask, Scheduler};
use crate::seed;
use crate::stores::{
    ContentStore, MessagingStore, Notification, NotificationBroker, SessionStore, SocialGraph,
};

/// How long the driver sleeps when no timer is pending.
const IDLE_WAIT: StdDuration = StdDuration::from_secs(60);

/// Everything guarded by the engine lock.
pub(crate) struct Inner {
    pub(crate) session: SessionStore,
    pub(crate) social: SocialGraph,
    pub(crate) content: ContentStore,
    pub(crate) messaging: MessagingStore,
    pub(crate) notifications: NotificationBroker,
    pub(crate) scheduler: Scheduler,
    snapshots: Snapshots,
    pub(crate) events: EventBus,
}

pub struct Engine {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
    pub(crate) credentials: Box<dyn CredentialVerifier>,
    events: EventBus,
    wake: Notify,
    shutdown: watch::Sender<bool>,
    pub(crate) login_latency: StdDuration,
}

pub struct EngineBuilder {
    snapshots: Snapshots,
    config: EngineConfig,
    clock: Option<Arc<dyn Clock>>,
    credentials: Option<Box<dyn CredentialVerifier>>,
}

impl EngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replace the role-keyed default credential policy.
    pub fn credentials(mut self, verifier: impl CredentialVerifier + 'static) -> Self {
        self.credentials = Some(Box::new(verifier));
        self
    }

    /// Load every collection (falling back to the seed dataset) and build
    /// the engine.
    pub fn build(self) -> Engine {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let credentials = self
            .credentials
            .unwrap_or_else(|| Box::new(RoleCredentials::from_config(&self.config)));
        let now = clock.now();
        let snapshots = self.snapshots;

        let social = SocialGraph::new(snapshots.load_or_else(KEY_USERS, seed::users));
        let content = ContentStore::new(
            snapshots.load_or_else(KEY_POSTS, || seed::posts(now)),
            snapshots.load(KEY_COMMENTS, Vec::new()),
        );
        let messaging = MessagingStore::new(
            snapshots.load_or_else(KEY_MESSAGES, || seed::messages(now)),
            snapshots.load(KEY_GROUPS, Vec::new()),
        );

        // The stored principal may predate later profile changes.
        let principal = snapshots
            .load::<Option<User>>(KEY_SESSION, None)
            .map(|p| social.user(&p.id).cloned().unwrap_or(p));
        if let Some(ref p) = principal {
            info!(user = %p.id, "restored session");
        }

        let events = EventBus::new();
        let (shutdown, _) = watch::channel(false);

        info!(
            users = social.users().len(),
            posts = content.posts().len(),
            messages = messaging.messages().len(),
            groups = messaging.groups().len(),
            "engine ready"
        );

        Engine {
            inner: Mutex::new(Inner {
                session: SessionStore::new(principal),
                social,
                content,
                messaging,
                notifications: NotificationBroker::new(),
                scheduler: Scheduler::new(),
                snapshots,
                events: events.clone(),
            }),
            clock,
            credentials,
            events,
            wake: Notify::new(),
            shutdown,
            login_latency: self.config.login_latency,
        }
    }
}

impl Engine {
    pub fn builder(backend: impl SnapshotBackend + 'static) -> EngineBuilder {
        EngineBuilder {
            snapshots: Snapshots::new(backend),
            config: EngineConfig::default(),
            clock: None,
            credentials: None,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Run `f` as one atomic command against the current state.
    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut Inner, DateTime<Utc>) -> R) -> R {
        let now = self.clock.now();
        let mut inner = self.lock();
        inner.run_due(now);

        let before = inner.scheduler.next_due();
        let out = f(&mut *inner, now);
        let after = inner.scheduler.next_due();
        drop(inner);

        if before != after {
            self.wake.notify_one();
        }
        out
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fire every task that is due by now; returns how many ran.
    pub fn tick(&self) -> usize {
        let now = self.clock.now();
        self.lock().run_due(now)
    }

    /// Time until the earliest pending task, if any.
    pub fn until_next_due(&self) -> Option<StdDuration> {
        let next = self.lock().scheduler.next_due()?;
        Some((next - self.clock.now()).to_std().unwrap_or_default())
    }

    pub fn pending_tasks(&self) -> usize {
        self.lock().scheduler.len()
    }

    /// Save every collection, reporting the first storage failure.
    pub fn checkpoint(&self) -> Result<()> {
        self.with_state(|inner, _| -> Result<()> {
            inner.snapshots.save(KEY_USERS, inner.social.users())?;
            inner.snapshots.save(KEY_POSTS, inner.content.posts())?;
            inner.snapshots.save(KEY_COMMENTS, inner.content.comments())?;
            inner.snapshots.save(KEY_MESSAGES, inner.messaging.messages())?;
            inner.snapshots.save(KEY_GROUPS, inner.messaging.groups())?;
            match inner.session.principal() {
                Some(p) if p.role != Role::Guest => inner.snapshots.save(KEY_SESSION, p)?,
                _ => inner.snapshots.remove(KEY_SESSION)?,
            }
            Ok(())
        })
    }

    /// Background task that fires timers on wall-clock time until
    /// [`Engine::shutdown`] is called.
    pub fn spawn_driver(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        let mut shutdown = self.shutdown.subscribe();

        tokio::spawn(async move {
            loop {
                if *shutdown.borrow_and_update() {
                    break;
                }
                let wait = engine.until_next_due().unwrap_or(IDLE_WAIT);

                tokio::select! {
                    _ = tokio::time::sleep(wait) => {
                        let fired = engine.tick();
                        if fired > 0 {
                            debug!(fired, "scheduler fired tasks");
                        }
                    }
                    _ = engine.wake.notified() => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("scheduler driver stopped");
        })
    }

    /// Stop the driver and abort any login still waiting out its latency.
    pub fn shutdown(&self) {
        info!("engine shutting down");
        self.shutdown.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Sleep for the configured login latency unless shutdown interrupts.
    pub(crate) async fn login_delay(&self) -> Result<()> {
        let mut shutdown = self.shutdown.subscribe();
        if *shutdown.borrow_and_update() {
            return Err(EngineError::ShuttingDown);
        }
        if self.login_latency.is_zero() {
            return Ok(());
        }

        tokio::select! {
            _ = tokio::time::sleep(self.login_latency) => Ok(()),
            _ = shutdown.changed() => Err(EngineError::ShuttingDown),
        }
    }
}

impl Inner {
    /// The signed-in user, refreshed from the social graph when known.
    pub(crate) fn actor(&self) -> Result<User> {
        let principal = self.session.principal().ok_or(EngineError::Unauthenticated)?;
        Ok(self
            .social
            .user(&principal.id)
            .cloned()
            .unwrap_or_else(|| principal.clone()))
    }

    /// Raise a notification and schedule its expiry.
    pub(crate) fn notify(
        &mut self,
        message: &str,
        severity: Severity,
        now: DateTime<Utc>,
    ) -> Notification {
        let notification = self.notifications.raise(message, severity, now);
        let expiry = self.scheduler.schedule(
            now + Duration::milliseconds(NOTIFICATION_TTL_MS),
            ScheduledTask::ExpireNotification {
                id: notification.id.clone(),
            },
        );
        self.notifications.track_expiry(&notification.id, expiry);
        self.events.emit(EngineEvent::NotificationRaised {
            id: notification.id.clone(),
            severity,
        });
        notification
    }

    pub(crate) fn run_due(&mut self, now: DateTime<Utc>) -> usize {
        let mut fired = 0;
        while let Some(due) = self.scheduler.pop_due(now) {
            self.fire(due);
            fired += 1;
        }
        fired
    }

    fn fire(&mut self, due: DueTask) {
        match due.task {
            ScheduledTask::BotReply { recipient_id, body } => {
                let reply = self.messaging.append(
                    BOT_ID,
                    &recipient_id,
                    &body,
                    MessageKind::Text,
                    DeliveryStatus::Read,
                    due.due,
                );
                debug!(to = %recipient_id, message = %reply.id, "bot replied");
                self.persist_messages();
                self.events.emit(EngineEvent::MessageAppended {
                    message_id: reply.id,
                    recipient_id,
                });
            }
            ScheduledTask::ExpireNotification { id } => {
                if self.notifications.dismiss(&id).is_some() {
                    self.events.emit(EngineEvent::NotificationRetired { id });
                }
            }
        }
    }

    /// Re-read the principal from the graph and store it.
    pub(crate) fn refresh_principal(&mut self) {
        let fresh = self
            .session
            .principal()
            .and_then(|p| self.social.user(&p.id).cloned());
        if let Some(fresh) = fresh {
            self.session.begin(fresh);
            self.persist_session();
        }
    }

    fn persist<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.snapshots.save(key, value) {
            warn!(key, error = %e, "snapshot save failed, continuing with in-memory state");
        }
    }

    pub(crate) fn persist_users(&self) {
        self.persist(KEY_USERS, self.social.users());
    }

    pub(crate) fn persist_posts(&self) {
        self.persist(KEY_POSTS, self.content.posts());
    }

    pub(crate) fn persist_comments(&self) {
        self.persist(KEY_COMMENTS, self.content.comments());
    }

    pub(crate) fn persist_messages(&self) {
        self.persist(KEY_MESSAGES, self.messaging.messages());
    }

    pub(crate) fn persist_groups(&self) {
        self.persist(KEY_GROUPS, self.messaging.groups());
    }

    /// Guests are never written out.
    pub(crate) fn persist_session(&self) {
        match self.session.principal() {
            Some(p) if p.role != Role::Guest => self.persist(KEY_SESSION, p),
            _ => self.forget_session(),
        }
    }

    pub(crate) fn forget_session(&self) {
        if let Err(e) = self.snapshots.remove(KEY_SESSION) {
            warn!(error = %e, "could not remove stored session");
        }
    }
}

// Read-only views shared by several command modules.
impl Engine {
    pub fn posts(&self) -> Vec<Post> {
        self.with_state(|inner, _| inner.content.posts().to_vec())
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.with_state(|inner, _| inner.content.comments().to_vec())
    }

    pub fn messages(&self) -> Vec<Message> {
        self.with_state(|inner, _| inner.messaging.messages().to_vec())
    }

    pub fn groups(&self) -> Vec<Group> {
        self.with_state(|inner, _| inner.messaging.groups().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration as StdDuration;

    use nexus_shared::constants::{BOT_ID, KEY_POSTS, KEY_USERS};
    use nexus_shared::{Category, MessageKind};
    use nexus_store::{Database, MemoryBackend};

    use super::*;
    use crate::clock::ManualClock;
    use crate::testing::{Harness, MEMBER_SECRET};

    #[test]
    fn fresh_engine_serves_the_seed() {
        let h = Harness::new();
        let posts = h.engine.posts();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, "p-2");
        assert_eq!(h.engine.users().len(), 5);
        assert_eq!(h.engine.messages()[0].id, "m-0");
        assert!(h.engine.current_principal().is_none());
    }

    #[test]
    fn corrupt_snapshots_fall_back_to_the_seed() {
        let backend = MemoryBackend::new();
        backend.put_raw(KEY_POSTS, "{ not json");
        backend.put_raw(KEY_USERS, "[{\"id\": 7}]");

        let h = Harness::over(backend, Arc::new(ManualClock::at_epoch()));
        assert_eq!(h.engine.posts().len(), 2);
        assert!(h.engine.user("admin-1").is_some());
    }

    #[tokio::test]
    async fn storage_outage_does_not_abort_commands() {
        let h = Harness::signed_in("alex@nexus.com").await;
        h.backend.set_unavailable(true);

        let post = h
            .engine
            .create_post("offline but fine", Vec::new(), Category::Community)
            .unwrap();
        h.engine.add_comment(&post.id, "still works").unwrap();
        assert_eq!(h.engine.post(&post.id).unwrap().comments_count, 1);
        assert!(matches!(
            h.engine.checkpoint(),
            Err(EngineError::PersistenceUnavailable(_))
        ));

        h.backend.set_unavailable(false);
        h.engine.checkpoint().unwrap();
        let restarted = h.restart();
        assert_eq!(restarted.engine.post(&post.id).unwrap().comments_count, 1);
    }

    #[tokio::test]
    async fn sqlite_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nexus.db");
        let clock = Arc::new(ManualClock::at_epoch());
        let build = || {
            Engine::builder(Database::open_at(&path).unwrap())
                .config(EngineConfig::default().without_latency())
                .clock(clock.clone())
                .build()
        };

        let post_id = {
            let engine = build();
            engine
                .authenticate("john@nexus.com", MEMBER_SECRET)
                .await
                .unwrap();
            engine.toggle_friendship("user-2").unwrap();
            engine
                .create_post("persisted", Vec::new(), Category::Community)
                .unwrap()
                .id
        };

        let engine = build();
        assert_eq!(engine.current_principal().unwrap().id, "user-3");
        assert_eq!(engine.posts()[0].id, post_id);
        assert!(engine.user("user-2").unwrap().is_friend("user-3"));
    }

    #[tokio::test]
    async fn restored_principal_reflects_the_graph() {
        let h = Harness::signed_in("alex@nexus.com").await;
        h.engine.toggle_friendship("user-3").unwrap();

        let principal = h.restart().engine.current_principal().unwrap();
        assert!(principal.is_friend("user-3"));
    }

    #[tokio::test(start_paused = true)]
    async fn driver_fires_timers_without_further_commands() {
        let clock = Arc::new(ManualClock::at_epoch());
        let engine = Arc::new(
            Engine::builder(MemoryBackend::new())
                .config(EngineConfig::default().without_latency())
                .clock(clock.clone())
                .build(),
        );
        let driver = engine.spawn_driver();

        engine
            .authenticate("alex@nexus.com", MEMBER_SECRET)
            .await
            .unwrap();
        engine
            .send_message(BOT_ID, "hi", MessageKind::Text)
            .unwrap();
        assert_eq!(engine.pending_tasks(), 1);

        clock.advance_ms(1_500);
        tokio::time::sleep(StdDuration::from_millis(1_600)).await;
        assert_eq!(engine.pending_tasks(), 0);

        engine.shutdown();
        driver.await.unwrap();
        assert!(engine.is_shutting_down());
    }
}

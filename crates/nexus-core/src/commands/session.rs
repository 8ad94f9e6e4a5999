use tracing::{info, warn};

use nexus_shared::constants::BOT_ID;
use nexus_store::User;

use crate::engine::{Engine, Inner};
use crate::error::{EngineError, Result};
use crate::events::EngineEvent;
use crate::scheduler::ScheduledTask;
use crate::stores::session::guest_principal;

impl Engine {
    /// Sign in with an email address and secret.
    ///
    /// Waits out the simulated login latency first; only engine shutdown
    /// cuts that wait short. The attempt is then counted against the login
    /// throttle before the credentials are looked at.
    pub async fn authenticate(&self, email: &str, secret: &str) -> Result<User> {
        self.login_delay().await?;

        self.with_state(|inner, now| -> Result<User> {
            if let Err(retry_after) = inner.session.throttle_mut().try_acquire(now) {
                warn!(email, retry_after_ms = retry_after.as_millis() as u64, "login throttled");
                return Err(EngineError::RateLimited { retry_after });
            }

            let user = match inner.social.find_by_email(email) {
                Some(u) if u.id != BOT_ID => u.clone(),
                _ => {
                    warn!(email, "login for unknown address");
                    return Err(EngineError::InvalidCredentials);
                }
            };
            if !self.credentials.verify(&user, secret) {
                warn!(user = %user.id, "login with wrong secret");
                return Err(EngineError::InvalidCredentials);
            }

            end_current(inner);
            inner.social.set_online(&user.id, true);
            inner.persist_users();
            inner.session.begin(user);
            inner.refresh_principal();

            let principal = inner.actor()?;
            info!(user = %principal.id, role = %principal.role, "signed in");
            inner.events.emit(EngineEvent::SessionStarted {
                user_id: principal.id.clone(),
            });
            Ok(principal)
        })
    }

    /// Start a transient guest session. Never throttled, never persisted.
    pub fn authenticate_as_guest(&self) -> User {
        self.with_state(|inner, _| {
            end_current(inner);
            let guest = guest_principal();
            inner.session.begin(guest.clone());
            inner.forget_session();

            info!("guest session started");
            inner.events.emit(EngineEvent::SessionStarted {
                user_id: guest.id.clone(),
            });
            guest
        })
    }

    /// Sign out. Pending bot replies for the session are cancelled.
    pub fn end_session(&self) {
        self.with_state(|inner, _| {
            end_current(inner);
            inner.forget_session();
        })
    }

    pub fn current_principal(&self) -> Option<User> {
        self.with_state(|inner, _| inner.actor().ok())
    }
}

fn end_current(inner: &mut Inner) {
    let Some(previous) = inner.session.end() else {
        return;
    };

    if inner.social.set_online(&previous.id, false) {
        inner.persist_users();
    }
    let cancelled = inner.scheduler.cancel_where(|t| {
        matches!(t, ScheduledTask::BotReply { recipient_id, .. } if *recipient_id == previous.id)
    });

    info!(user = %previous.id, cancelled_replies = cancelled, "session ended");
    inner.events.emit(EngineEvent::SessionEnded {
        user_id: previous.id,
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use nexus_shared::constants::KEY_SESSION;
    use nexus_shared::{MessageKind, Role};
    use nexus_store::MemoryBackend;

    use crate::bot;
    use crate::config::EngineConfig;
    use crate::engine::Engine;
    use crate::error::EngineError;
    use crate::events::EngineEvent;
    use crate::testing::{Harness, MEMBER_SECRET};

    #[tokio::test]
    async fn login_sets_principal_and_presence() {
        let h = Harness::new();
        let mut events = h.engine.subscribe();

        let user = h
            .engine
            .authenticate("Alex@Nexus.com", MEMBER_SECRET)
            .await
            .unwrap();
        assert_eq!(user.id, "user-1");
        assert!(user.is_online);
        assert_eq!(h.engine.current_principal().unwrap().id, "user-1");
        assert!(h.backend.contains(KEY_SESSION));
        assert_eq!(
            events.try_recv().unwrap(),
            EngineEvent::SessionStarted {
                user_id: "user-1".into()
            }
        );
    }

    #[tokio::test]
    async fn bad_credentials_are_rejected() {
        let h = Harness::new();
        let wrong = h.engine.authenticate("alex@nexus.com", "nope").await;
        assert!(matches!(wrong, Err(EngineError::InvalidCredentials)));

        let unknown = h.engine.authenticate("nobody@nexus.com", MEMBER_SECRET).await;
        assert!(matches!(unknown, Err(EngineError::InvalidCredentials)));

        let bot = h.engine.authenticate("ai@binhminhwl.com", MEMBER_SECRET).await;
        assert!(matches!(bot, Err(EngineError::InvalidCredentials)));

        assert!(h.engine.current_principal().is_none());
    }

    #[tokio::test]
    async fn eleventh_attempt_is_throttled_even_with_the_right_secret() {
        let h = Harness::new();
        for _ in 0..10 {
            let res = h.engine.authenticate("alex@nexus.com", "wrong").await;
            assert!(matches!(res, Err(EngineError::InvalidCredentials)));
        }

        let err = h
            .engine
            .authenticate("alex@nexus.com", MEMBER_SECRET)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::RateLimited { .. }));
        assert_eq!(err.retry_after_secs(), Some(600));

        // Guests do not touch the budget.
        assert_eq!(h.engine.authenticate_as_guest().role, Role::Guest);

        h.clock.advance_ms(600_001);
        h.engine
            .authenticate("alex@nexus.com", MEMBER_SECRET)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn guest_sessions_are_not_persisted() {
        let h = Harness::signed_in("alex@nexus.com").await;
        let guest = h.engine.authenticate_as_guest();

        assert_eq!(guest.id, "guest");
        assert!(guest.friend_ids.is_empty() && guest.blocked_ids.is_empty());
        assert!(!h.backend.contains(KEY_SESSION));
        assert!(!h.engine.user("user-1").unwrap().is_online);

        assert!(h.restart().engine.current_principal().is_none());
    }

    #[tokio::test]
    async fn session_survives_restart_and_logout_clears_it() {
        let h = Harness::signed_in("sarah@nexus.com").await;
        let restarted = h.restart();
        assert_eq!(restarted.engine.current_principal().unwrap().id, "user-2");

        restarted.engine.end_session();
        assert!(restarted.engine.current_principal().is_none());
        assert!(!restarted.engine.user("user-2").unwrap().is_online);
        assert!(h.restart().engine.current_principal().is_none());
    }

    #[tokio::test]
    async fn logout_cancels_pending_bot_replies() {
        let h = Harness::signed_in("alex@nexus.com").await;
        h.engine
            .send_message("ai-natch", "hello", MessageKind::Text)
            .unwrap();
        assert_eq!(h.engine.pending_tasks(), 1);

        h.engine.end_session();
        assert_eq!(h.engine.pending_tasks(), 0);

        h.clock.advance_ms(2_000);
        h.engine.tick();
        assert!(h
            .engine
            .messages()
            .iter()
            .all(|m| m.body != bot::GREETING_REPLY));
    }

    #[tokio::test(start_paused = true)]
    async fn login_waits_out_the_simulated_latency() {
        let engine = Engine::builder(MemoryBackend::new()).build();
        let started = tokio::time::Instant::now();

        engine
            .authenticate("john@nexus.com", MEMBER_SECRET)
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(800));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_aborts_a_pending_login() {
        let engine = Arc::new(
            Engine::builder(MemoryBackend::new())
                .config(EngineConfig::default())
                .build(),
        );
        let pending = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.authenticate("john@nexus.com", MEMBER_SECRET).await })
        };
        tokio::task::yield_now().await;

        engine.shutdown();
        let res = pending.await.unwrap();
        assert!(matches!(res, Err(EngineError::ShuttingDown)));
        assert!(engine.current_principal().is_none());
    }
}

use std::fmt;
use std::sync::Arc;

use cookie::CookieJar;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::cookies;
use crate::error::{Error, Result};
use crate::id::{default_minter, IdMinter};
use crate::serializer::{Serializer, TaggedJsonSerializer};
use crate::session::Session;
use crate::store::{RecordStore, SessionRecord};

/// What [`SessionInterface::save_session`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// No store write and no cookie.
    Skipped,
    /// The session was emptied: its record (if any) was deleted and the
    /// cookie cleared.
    Cleared,
    /// An existing record was rewritten and the cookie reissued.
    Updated,
    /// A new record was inserted and the cookie issued.
    Inserted,
}

/// Drives a session through one request: [`open_session`](Self::open_session)
/// before the handler runs and [`save_session`](Self::save_session) after it.
///
/// The interface itself is stateless between requests and can be shared. The
/// record store is passed in per call, since its unit of work belongs to the
/// request.
///
/// # Examples
///
/// ```no_run
/// use cookie::CookieJar;
/// use seaorm_server_sessions::{RecordStore, SessionConfig, SessionInterface};
///
/// # async fn example(store: &dyn RecordStore, mut jar: CookieJar) -> seaorm_server_sessions::Result<()> {
/// let interface = SessionInterface::new(SessionConfig::default().with_cookie_name("sid"));
///
/// let mut session = interface.open_session(store, &jar).await?;
/// session.insert("user", "bob")?;
/// interface.save_session(store, &session, &mut jar).await?;
///
/// for cookie in jar.delta() {
///     println!("Set-Cookie: {cookie}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SessionInterface {
    config: SessionConfig,
    serializer: Arc<dyn Serializer>,
    make_id: IdMinter,
    make_session_id: IdMinter,
}

impl SessionInterface {
    /// Creates an interface using [`TaggedJsonSerializer`] and
    /// [`mint_token`](crate::mint_token) for both identifier spaces.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            serializer: Arc::new(TaggedJsonSerializer),
            make_id: default_minter(),
            make_session_id: default_minter(),
        }
    }

    #[must_use]
    pub fn with_serializer(mut self, serializer: impl Serializer + 'static) -> Self {
        self.serializer = Arc::new(serializer);
        self
    }

    /// Sets the factory for internal record ids (the table's primary key).
    #[must_use]
    pub fn with_record_id_minter(
        mut self,
        minter: impl Fn() -> String + Send + Sync + 'static,
    ) -> Self {
        self.make_id = Arc::new(minter);
        self
    }

    /// Sets the factory for public session ids (the cookie value).
    #[must_use]
    pub fn with_session_id_minter(
        mut self,
        minter: impl Fn() -> String + Send + Sync + 'static,
    ) -> Self {
        self.make_session_id = Arc::new(minter);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Resolves the session for an inbound request from its cookie jar.
    ///
    /// Never fails because of what the client sent: a missing cookie, an
    /// unknown id, an expired record or an undecodable payload all yield a
    /// fresh empty session. Only store failures are returned as errors.
    ///
    /// An expired record is deleted and committed before returning.
    pub async fn open_session<S>(&self, store: &S, jar: &CookieJar) -> Result<Session>
    where
        S: RecordStore + ?Sized,
    {
        match cookies::session_id(jar, &self.config) {
            Some(sid) => self.resume_session(store, sid).await,
            None => {
                debug!("no session cookie, starting a new session");
                Ok(self.fresh_session((self.make_session_id)()))
            }
        }
    }

    /// Same as [`open_session`](Self::open_session), for a session id the
    /// caller already extracted from the request.
    pub async fn resume_session<S>(&self, store: &S, sid: String) -> Result<Session>
    where
        S: RecordStore + ?Sized,
    {
        let now = OffsetDateTime::now_utc();
        let record = match store.find_by_session_id(&sid).await? {
            Some(record) if record.is_expired_at(now) => {
                store.delete(&record).await?;
                store.commit().await?;
                debug!(expired_at = %record.expires_at, "purged expired session record");
                None
            }
            other => other,
        };

        // Unknown or just-purged ids keep the client's cookie value.
        let Some(record) = record else {
            return Ok(self.fresh_session(sid));
        };

        match self.serializer.loads(&record.data) {
            Ok(contents) => Ok(Session::with_contents(sid, contents, self.config.permanent)),
            Err(e) => {
                warn!(error = %e, "discarding undecodable session, starting a new one");
                Ok(self.fresh_session((self.make_session_id)()))
            }
        }
    }

    /// Persists `session` at the end of a request and records the matching
    /// cookie change in `jar`.
    ///
    /// - Empty and modified: the record is deleted and the cookie cleared.
    /// - Empty and untouched: nothing happens.
    /// - Otherwise, if the configured [`CookiePolicy`](crate::CookiePolicy)
    ///   allows it, the record is updated or inserted with a fresh expiry and
    ///   the cookie (re)issued.
    ///
    /// The cookie is only added to `jar` after the store committed. Store
    /// failures are returned as is and leave `jar` untouched, as does an
    /// expiry that cannot be represented ([`Error::Config`]).
    pub async fn save_session<S>(
        &self,
        store: &S,
        session: &Session,
        jar: &mut CookieJar,
    ) -> Result<SaveOutcome>
    where
        S: RecordStore + ?Sized,
    {
        if session.is_empty() {
            if !session.is_modified() {
                return Ok(SaveOutcome::Skipped);
            }

            if let Some(record) = store.find_by_session_id(session.sid()).await? {
                store.delete(&record).await?;
                store.commit().await?;
            }
            jar.add(cookies::clear_session_cookie(&self.config));
            debug!("session emptied, record deleted and cookie cleared");
            return Ok(SaveOutcome::Cleared);
        }

        if !self.config.cookie_policy.should_set_cookie(session) {
            return Ok(SaveOutcome::Skipped);
        }

        let expires_at = OffsetDateTime::now_utc()
            .checked_add(self.config.lifetime)
            .ok_or_else(|| {
                Error::Config(format!(
                    "session lifetime {} overflows the expiry timestamp",
                    self.config.lifetime
                ))
            })?;
        let data = self.serializer.dumps(session.contents())?;

        let outcome = match store.find_by_session_id(session.sid()).await? {
            Some(mut record) => {
                record.data = data;
                record.expires_at = expires_at;
                store.update(&record).await?;
                SaveOutcome::Updated
            }
            None => {
                let record = SessionRecord {
                    record_id: (self.make_id)(),
                    session_id: session.sid().to_string(),
                    expires_at,
                    data,
                    user_id: None,
                };
                store.insert(&record).await?;
                SaveOutcome::Inserted
            }
        };
        store.commit().await?;

        let cookie_expires = session.is_permanent().then_some(expires_at);
        jar.add(cookies::session_cookie(&self.config, session.sid(), cookie_expires));
        debug!(?outcome, permanent = session.is_permanent(), "session saved");

        Ok(outcome)
    }

    fn fresh_session(&self, sid: String) -> Session {
        Session::new(sid, self.config.permanent)
    }
}

impl fmt::Debug for SessionInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionInterface")
            .field("config", &self.config)
            .field("serializer", &self.serializer)
            .finish_non_exhaustive()
    }
}

// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::{MAX_SESSION_TTL_MINUTES, SessionConfig};
use crate::flash::Flash;
use crate::iam::User;
use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};

const SESSION_CHANNEL_DEPTH: usize = 64;
const MAX_SESSION_TTL: Duration = Duration::from_secs(MAX_SESSION_TTL_MINUTES * 60);

#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub user: User,
    pub current_environment: Option<String>,
}

#[derive(Debug)]
pub enum LoginSessionError {
    Unavailable,
}

impl std::fmt::Display for LoginSessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoginSessionError::Unavailable => write!(f, "Session store is unavailable"),
        }
    }
}

impl std::error::Error for LoginSessionError {}

/// Handle to the session actor. Cloning is cheap; every clone talks to the same task.
#[derive(Clone)]
pub struct LoginSessionStore {
    sender: mpsc::Sender<LoginSessionCommand>,
}

impl LoginSessionStore {
    /// Spawns the session actor; must be called inside a tokio runtime.
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        let (sender, receiver) = mpsc::channel(SESSION_CHANNEL_DEPTH);
        tokio::spawn(async move {
            let mut state = LoginSessionState::new(ttl, max_sessions);
            state.run(receiver).await;
        });
        Self { sender }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            Duration::from_secs(config.ttl_minutes.saturating_mul(60)),
            config.max_sessions,
        )
    }

    pub async fn create(&self, user: User) -> Result<String, LoginSessionError> {
        let (reply, receive) = oneshot::channel();
        self.sender
            .send(LoginSessionCommand::Create { user, reply })
            .await
            .map_err(|_| LoginSessionError::Unavailable)?;
        receive.await.map_err(|_| LoginSessionError::Unavailable)
    }

    /// Looks up a live session and extends its lifetime.
    pub async fn get(&self, session_id: &str) -> Option<SessionSnapshot> {
        let (reply, receive) = oneshot::channel();
        let command = LoginSessionCommand::Get {
            session_id: session_id.to_string(),
            reply,
        };
        if self.sender.send(command).await.is_err() {
            return None;
        }
        receive.await.unwrap_or(None)
    }

    pub async fn set_environment(&self, session_id: &str, environment: Option<String>) {
        let _ = self
            .sender
            .send(LoginSessionCommand::SetEnvironment {
                session_id: session_id.to_string(),
                environment,
            })
            .await;
    }

    pub async fn set_flash(&self, session_id: &str, flash: Flash) {
        let _ = self
            .sender
            .send(LoginSessionCommand::SetFlash {
                session_id: session_id.to_string(),
                flash,
            })
            .await;
    }

    /// Removes and returns the pending flash, if any.
    pub async fn take_flash(&self, session_id: &str) -> Option<Flash> {
        let (reply, receive) = oneshot::channel();
        let command = LoginSessionCommand::TakeFlash {
            session_id: session_id.to_string(),
            reply,
        };
        if self.sender.send(command).await.is_err() {
            return None;
        }
        receive.await.unwrap_or(None)
    }

    pub fn invalidate(&self, session_id: &str) {
        let _ = self.sender.try_send(LoginSessionCommand::Invalidate {
            session_id: session_id.to_string(),
        });
    }
}

enum LoginSessionCommand {
    Create {
        user: User,
        reply: oneshot::Sender<String>,
    },
    Get {
        session_id: String,
        reply: oneshot::Sender<Option<SessionSnapshot>>,
    },
    SetEnvironment {
        session_id: String,
        environment: Option<String>,
    },
    SetFlash {
        session_id: String,
        flash: Flash,
    },
    TakeFlash {
        session_id: String,
        reply: oneshot::Sender<Option<Flash>>,
    },
    Invalidate {
        session_id: String,
    },
}

struct LoginSessionRecord {
    user: User,
    current_environment: Option<String>,
    flash: Option<Flash>,
    expires_at: Instant,
}

struct LoginSessionState {
    sessions: HashMap<String, LoginSessionRecord>,
    session_order: VecDeque<String>,
    ttl: Duration,
    max_sessions: usize,
}

impl LoginSessionState {
    fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            session_order: VecDeque::new(),
            ttl: ttl.min(MAX_SESSION_TTL),
            max_sessions,
        }
    }

    async fn run(&mut self, mut receiver: mpsc::Receiver<LoginSessionCommand>) {
        while let Some(command) = receiver.recv().await {
            let now = Instant::now();
            self.cleanup_expired(now);
            match command {
                LoginSessionCommand::Create { user, reply } => {
                    let _ = reply.send(self.create_session(user, now));
                }
                LoginSessionCommand::Get { session_id, reply } => {
                    let _ = reply.send(self.touch_session(&session_id, now));
                }
                LoginSessionCommand::SetEnvironment {
                    session_id,
                    environment,
                } => {
                    if let Some(record) = self.sessions.get_mut(&session_id) {
                        record.current_environment = environment;
                    }
                }
                LoginSessionCommand::SetFlash { session_id, flash } => {
                    if let Some(record) = self.sessions.get_mut(&session_id) {
                        record.flash = Some(flash);
                    }
                }
                LoginSessionCommand::TakeFlash { session_id, reply } => {
                    let flash = self
                        .sessions
                        .get_mut(&session_id)
                        .and_then(|record| record.flash.take());
                    let _ = reply.send(flash);
                }
                LoginSessionCommand::Invalidate { session_id } => {
                    self.invalidate_session(&session_id);
                }
            }
        }
    }

    fn create_session(&mut self, user: User, now: Instant) -> String {
        let session_id = generate_session_id();
        self.sessions.insert(
            session_id.clone(),
            LoginSessionRecord {
                user,
                current_environment: None,
                flash: None,
                expires_at: self.deadline(now),
            },
        );
        self.session_order.push_back(session_id.clone());
        self.prune_overflow();
        session_id
    }

    fn touch_session(&mut self, session_id: &str, now: Instant) -> Option<SessionSnapshot> {
        let deadline = self.deadline(now);
        let record = self.sessions.get_mut(session_id)?;
        record.expires_at = deadline;
        Some(SessionSnapshot {
            user: record.user.clone(),
            current_environment: record.current_environment.clone(),
        })
    }

    fn deadline(&self, now: Instant) -> Instant {
        now.checked_add(self.ttl).unwrap_or(now)
    }

    fn invalidate_session(&mut self, session_id: &str) {
        self.sessions.remove(session_id);
        self.session_order.retain(|id| id != session_id);
    }

    fn cleanup_expired(&mut self, now: Instant) {
        self.sessions.retain(|_, record| record.expires_at > now);
        self.session_order
            .retain(|id| self.sessions.contains_key(id));
    }

    fn prune_overflow(&mut self) {
        while self.sessions.len() > self.max_sessions {
            if let Some(oldest) = self.session_order.pop_front() {
                self.sessions.remove(&oldest);
            } else {
                break;
            }
        }
    }
}

fn generate_session_id() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

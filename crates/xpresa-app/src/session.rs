// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{ActionError, Profile, ProfileId};

pub const DEFAULT_DISPLAY_NAME: &str = "Vendedor";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedUser {
    pub id: i64,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Locally stored session, `{"user": {"id": .., "user_metadata": {..}}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub user: PersistedUser,
}

impl PersistedSession {
    pub fn for_profile(profile: &Profile) -> Self {
        Self {
            user: PersistedUser {
                id: profile.id.get(),
                user_metadata: UserMetadata {
                    full_name: profile.full_name.clone(),
                },
            },
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let session: Self =
            serde_json::from_str(raw).context("parse session file as JSON")?;
        if session.user.id <= 0 {
            anyhow::bail!("session user id must be positive, got {}", session.user.id);
        }
        Ok(session)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialize session")
    }

    pub fn into_profile(self, now: OffsetDateTime) -> Profile {
        Profile {
            id: ProfileId::new(self.user.id),
            full_name: self.user.user_metadata.full_name,
            avatar_url: None,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSource {
    Server,
    Persisted,
}

/// Signed-in seller. Built once at startup from the ranked sources and handed
/// to whatever needs it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    current: Option<(Profile, SessionSource)>,
}

impl Session {
    /// The server profile wins over the persisted fallback.
    pub fn resolve(
        server: Option<Profile>,
        persisted: Option<PersistedSession>,
        now: OffsetDateTime,
    ) -> Self {
        let current = match (server, persisted) {
            (Some(profile), _) => Some((profile, SessionSource::Server)),
            (None, Some(persisted)) => {
                Some((persisted.into_profile(now), SessionSource::Persisted))
            }
            (None, None) => None,
        };
        Self { current }
    }

    /// A server profile that shows up later replaces the fallback.
    pub fn arrive(&mut self, profile: Profile) {
        self.current = Some((profile, SessionSource::Server));
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.current.as_ref().map(|(profile, _)| profile)
    }

    pub fn source(&self) -> Option<SessionSource> {
        self.current.as_ref().map(|(_, source)| *source)
    }

    pub fn user_id(&self) -> Option<ProfileId> {
        self.profile().map(|profile| profile.id)
    }

    pub fn require_user(&self) -> Result<ProfileId, ActionError> {
        self.user_id().ok_or(ActionError::SessionAbsent)
    }

    pub fn display_name(&self) -> &str {
        self.profile()
            .and_then(|profile| profile.full_name.as_deref())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_DISPLAY_NAME)
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.is_some()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

//! Spotify Web API client: library, playback control and the external player

use std::sync::{Arc, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use rspotify::{
    model::{FullTrack, Offset, PlayableId, PlayableItem as SpotifyItem, TrackId},
    prelude::*,
    AuthCodeSpotify, Config,
};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::auth::{self, Session};
use crate::player::{ExternalPlayer, PlaybackControl, PlaybackError};
use super::library_client::{LibraryClient, LibraryPayload};
use super::track::{Artwork, PlayableItem, PREFERRED_ARTWORK_SIZE};
use super::types::{AuthorizationStatus, PlaybackStatus};

/// Refresh once less than this many seconds of access remain
const TOKEN_REFRESH_MARGIN_SECS: i64 = 300;

/// Spotify API client with token refresh and queue polling support
#[derive(Clone)]
pub struct SpotifyClient {
    client: Arc<AuthCodeSpotify>,
    local_device_name: Option<String>,
    status: Arc<std::sync::RwLock<AuthorizationStatus>>,
    session: Arc<RwLock<Option<Session>>>,
    changes: Arc<watch::Sender<u64>>,
}

impl SpotifyClient {
    pub fn new(local_device_name: Option<String>) -> Self {
        let client = AuthCodeSpotify::with_config(
            Default::default(),
            Default::default(),
            Config {
                token_cached: false,
                token_refreshing: false,
                ..Default::default()
            },
        );
        tracing::debug!("rspotify client initialized");

        let (changes, _) = watch::channel(0);
        Self {
            client: Arc::new(client),
            local_device_name,
            status: Arc::new(std::sync::RwLock::new(AuthorizationStatus::NotDetermined)),
            session: Arc::new(RwLock::new(None)),
            changes: Arc::new(changes),
        }
    }

    /// Create a client and restore a cached session without prompting.
    pub async fn connect(local_device_name: Option<String>) -> Self {
        let client = Self::new(local_device_name);
        match auth::restore_session().await {
            Ok(Some(session)) => {
                client.install_session(session).await;
                client.set_status(AuthorizationStatus::Authorized);
            }
            Ok(None) => {}
            Err(e) => {
                // A stale token means asking again, not refusing.
                tracing::warn!(error = %e, "Cached session could not be restored");
            }
        }
        client
    }

    fn set_status(&self, status: AuthorizationStatus) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
    }

    async fn install_session(&self, session: Session) {
        match self.client.token.lock().await {
            Ok(mut token) => {
                *token = Some(session.rspotify_token());
                tracing::debug!(expires_at = %session.expires_at, "rspotify token set");
            }
            Err(_) => tracing::error!("rspotify token lock poisoned, token not updated"),
        }
        *self.session.write().await = Some(session);
    }

    pub async fn token_needs_refresh(&self) -> bool {
        let session = self.session.read().await;
        match session.as_ref() {
            Some(session) => {
                let remaining = session.expires_at - chrono::Utc::now();
                remaining.num_seconds() < TOKEN_REFRESH_MARGIN_SECS
            }
            None => false,
        }
    }

    pub async fn refresh_token_if_needed(&self) -> Result<bool> {
        if !self.token_needs_refresh().await {
            return Ok(false);
        }

        let refresh_token = match self.session.read().await.as_ref() {
            Some(session) => session.refresh_token.clone(),
            None => return Ok(false),
        };

        tracing::info!("Token expiring soon, refreshing...");
        let session = auth::refresh_session(&refresh_token).await?;
        self.install_session(session).await;
        tracing::info!("Token refreshed successfully");
        Ok(true)
    }

    async fn get_device_id(&self) -> Option<String> {
        if let Ok(devices) = self.client.device().await {
            let active_device = devices.iter().find(|d| d.is_active);
            if let Some(device) = active_device {
                tracing::debug!(
                    device_name = %device.name,
                    device_id = ?device.id,
                    "Found active device"
                );
                return device.id.clone();
            }

            if let Some(local_name) = &self.local_device_name {
                let local_device = devices.iter().find(|d| &d.name == local_name);
                if let Some(device) = local_device {
                    tracing::debug!(
                        device_name = %device.name,
                        device_id = ?device.id,
                        "No active device, using local device as fallback"
                    );
                    return device.id.clone();
                }
            }

            tracing::debug!(
                available_devices = devices.len(),
                "No active device found and local device not in list"
            );
            None
        } else {
            tracing::debug!("Failed to get devices list");
            None
        }
    }

    /// Poll the current entry and notify `queue_changes` subscribers when
    /// the playing item changes.
    pub fn spawn_queue_poller(
        &self,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let spotify = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut last_seen: Option<String> = None;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                if spotify.authorization_status() != AuthorizationStatus::Authorized {
                    continue;
                }

                match spotify.current_entry().await {
                    Ok(entry) => {
                        if entry_changed(&mut last_seen, entry.map(|item| item.id)) {
                            tracing::debug!(current = ?last_seen, "Player entry changed");
                            spotify.changes.send_modify(|counter| *counter += 1);
                        }
                    }
                    Err(e) => tracing::trace!(error = %e, "Queue poll failed"),
                }
            }
            tracing::debug!("Queue poller stopped");
        })
    }
}

fn entry_changed(last_seen: &mut Option<String>, current: Option<String>) -> bool {
    if *last_seen == current {
        return false;
    }
    *last_seen = current;
    true
}

/// Images carry no color samples, so live artwork never has a palette.
fn artwork_from_images(images: Vec<rspotify::model::Image>) -> Option<Artwork> {
    let candidates = images
        .into_iter()
        .map(|image| Artwork {
            width: image.width,
            height: image.height,
            ..Artwork::new(image.url)
        })
        .collect();
    Artwork::closest_to(candidates, PREFERRED_ARTWORK_SIZE)
}

fn item_from_track(track: FullTrack) -> Option<PlayableItem> {
    let id = track.id.as_ref()?.id().to_string();
    Some(PlayableItem {
        uri: format!("spotify:track:{}", id),
        id,
        title: track.name,
        artist: track
            .artists
            .first()
            .map(|a| a.name.clone())
            .unwrap_or_default(),
        album: track.album.name,
        duration_ms: track.duration.num_milliseconds().max(0) as u32,
        artwork: artwork_from_images(track.album.images),
    })
}

fn item_from_spotify(item: SpotifyItem) -> Option<PlayableItem> {
    match item {
        SpotifyItem::Track(track) => item_from_track(track),
        SpotifyItem::Episode(episode) => {
            let id = episode.id.id().to_string();
            Some(PlayableItem {
                uri: format!("spotify:episode:{}", id),
                id,
                title: episode.name,
                artist: episode.show.name,
                album: "Podcast".to_string(),
                duration_ms: episode.duration.num_milliseconds().max(0) as u32,
                artwork: artwork_from_images(episode.images),
            })
        }
        _ => None,
    }
}

#[async_trait]
impl LibraryClient for SpotifyClient {
    fn authorization_status(&self) -> AuthorizationStatus {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn request_authorization(&self) -> AuthorizationStatus {
        let status = match auth::authorize_in_browser().await {
            Ok(session) => {
                self.install_session(session).await;
                AuthorizationStatus::Authorized
            }
            Err(e) => {
                tracing::warn!(error = %e, "Authorization refused");
                AuthorizationStatus::Denied
            }
        };
        self.set_status(status.clone());
        status
    }

    async fn fetch_library(&self, limit: usize) -> Result<LibraryPayload> {
        tracing::debug!(limit, "API: current_user_saved_tracks");
        let saved_tracks: Vec<_> = self
            .client
            .current_user_saved_tracks(None)
            .take(limit)
            .try_collect()
            .await
            .context("Could not fetch saved tracks")?;

        let items = saved_tracks
            .into_iter()
            .filter_map(|saved| item_from_track(saved.track))
            .collect();
        Ok(LibraryPayload::from_items(items))
    }
}

#[async_trait]
impl PlaybackControl for SpotifyClient {
    async fn start_playback(
        &self,
        queue: &[PlayableItem],
        starting_at: &PlayableItem,
    ) -> Result<(), PlaybackError> {
        if queue.is_empty() {
            return Err(PlaybackError::MissingQueue);
        }

        let uris = queue
            .iter()
            .map(|item| TrackId::from_id(item.id.as_str()).map(PlayableId::Track))
            .collect::<Result<Vec<_>, _>>()
            .context("Queue contains an invalid track id")?;

        let device_id = self.get_device_id().await;
        tracing::debug!(
            device_id = ?device_id,
            start = %starting_at.uri,
            "API: start_uris_playback"
        );
        let result = self
            .client
            .start_uris_playback(
                uris,
                device_id.as_deref(),
                Some(Offset::Uri(starting_at.uri.clone())),
                None,
            )
            .await;
        crate::log_api_result!("start_uris_playback", result);
        result.context("Could not start playback")?;
        Ok(())
    }
}

#[async_trait]
impl ExternalPlayer for SpotifyClient {
    async fn current_entry(&self) -> Result<Option<PlayableItem>> {
        tracing::trace!("Fetching current playback state");
        let playback = self.client.current_playback(None, None::<Vec<_>>).await?;
        Ok(playback
            .and_then(|context| context.item)
            .and_then(item_from_spotify))
    }

    async fn playback_status(&self) -> Result<PlaybackStatus> {
        let playback = self.client.current_playback(None, None::<Vec<_>>).await?;
        Ok(match playback {
            Some(context) if context.is_playing => PlaybackStatus::Playing,
            Some(_) => PlaybackStatus::Paused,
            None => PlaybackStatus::Other,
        })
    }

    async fn play(&self) -> Result<()> {
        let device_id = self.get_device_id().await;
        tracing::debug!(device_id = ?device_id, "API: resume_playback");
        let result = self.client.resume_playback(device_id.as_deref(), None).await;
        crate::log_api_result!("resume_playback", result);
        Ok(result?)
    }

    async fn pause(&self) -> Result<()> {
        let device_id = self.get_device_id().await;
        tracing::debug!(device_id = ?device_id, "API: pause_playback");
        let result = self.client.pause_playback(device_id.as_deref()).await;
        crate::log_api_result!("pause_playback", result);
        Ok(result?)
    }

    fn queue_changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

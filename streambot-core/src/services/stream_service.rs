// File: streambot-core/src/services/stream_service.rs
//
// Platform-neutral flow behind `/stream` and `/disconnect`: filter the
// catalog, open a picker session, drive it, and dispatch the pick.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use streambot_common::models::{
    CatalogEntry, DisconnectRequest, DisconnectUser, PlayRequest, SelectionOutcome, VoiceChannel,
};
use streambot_common::traits::api::{PlaybackApi, VoicePresence};

use crate::catalog::{filter_catalog, CatalogStore, FilterOptions};
use crate::services::selection::{
    EventResult, IgnoreReason, Navigation, PageView, SelectionConfig, SelectionSession,
    SessionEvent, SessionHandle, SessionKey, SessionOrigin, SessionTable,
};
use crate::Error;

#[derive(Debug, Clone)]
pub struct BrowseRequest {
    pub owner_id: u64,
    pub channel_id: u64,
    pub guild_id: u64,
    pub keyword: Option<String>,
    /// Token of the slash-command interaction, used to redraw the reply later.
    pub interaction_token: String,
}

pub enum BrowseReply {
    NoVoiceChannel,
    NoCandidates { keyword: Option<String> },
    Started {
        handle: Arc<SessionHandle>,
        view: PageView,
        /// The caller's previous picker in this channel, now closed.
        superseded: Option<Arc<SessionHandle>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionReply {
    Render(PageView),
    Ignored(IgnoreReason),
    /// No live session carries this id.
    Gone,
    NotFound,
    NoVoiceChannel,
    Playing { entry: CatalogEntry, channel: VoiceChannel },
    PlaybackFailed { entry: CatalogEntry, reason: String },
}

pub struct StreamService {
    catalog: Arc<CatalogStore>,
    sessions: Arc<SessionTable>,
    playback: Arc<dyn PlaybackApi>,
    voice: Arc<dyn VoicePresence>,
    filter: FilterOptions,
    selection: SelectionConfig,
}

impl StreamService {
    pub fn new(
        catalog: Arc<CatalogStore>,
        sessions: Arc<SessionTable>,
        playback: Arc<dyn PlaybackApi>,
        voice: Arc<dyn VoicePresence>,
        filter: FilterOptions,
        selection: SelectionConfig,
    ) -> Self {
        Self { catalog, sessions, playback, voice, filter, selection }
    }

    pub fn sessions(&self) -> &Arc<SessionTable> {
        &self.sessions
    }

    /// Filters the current catalog snapshot for `keyword`.
    pub fn candidates(&self, keyword: Option<&str>) -> Vec<CatalogEntry> {
        let snapshot = self.catalog.snapshot();
        filter_catalog(&snapshot, &self.filter.with_keyword(keyword))
    }

    pub fn begin_browse(&self, req: BrowseRequest, now: Instant) -> BrowseReply {
        if self.voice.voice_channel_of(req.guild_id, req.owner_id).is_none() {
            return BrowseReply::NoVoiceChannel;
        }

        let candidates = self.candidates(req.keyword.as_deref());
        let key = SessionKey { owner_id: req.owner_id, channel_id: req.channel_id };
        let origin = SessionOrigin {
            guild_id: req.guild_id,
            interaction_token: req.interaction_token,
        };

        let Some(session) = SelectionSession::new(
            self.sessions.allocate_id(),
            key,
            origin,
            candidates,
            self.selection,
            now,
        ) else {
            debug!("No candidates for keyword {:?}", req.keyword);
            return BrowseReply::NoCandidates { keyword: req.keyword };
        };

        let view = session.render();
        info!(
            "Session {} opened by {} with {} candidate(s)",
            session.id(),
            req.owner_id,
            view.total_candidates
        );
        let (handle, superseded) = self.sessions.insert(session);
        BrowseReply::Started { handle, view, superseded }
    }

    pub async fn navigate(
        &self,
        session_id: u64,
        actor_id: u64,
        direction: Navigation,
        now: Instant,
    ) -> InteractionReply {
        let Some(handle) = self.sessions.get(session_id) else {
            return InteractionReply::Gone;
        };
        let result = handle
            .session
            .lock()
            .await
            .handle(actor_id, SessionEvent::Navigate(direction), now);

        match result {
            EventResult::Render(view) => InteractionReply::Render(view),
            EventResult::Ignored(reason) => {
                if reason == IgnoreReason::Expired {
                    self.sessions.remove(session_id);
                }
                InteractionReply::Ignored(reason)
            }
            // Navigation never resolves a session.
            EventResult::Resolved(_) => InteractionReply::Gone,
        }
    }

    pub async fn select(
        &self,
        session_id: u64,
        actor_id: u64,
        token: &str,
        now: Instant,
    ) -> InteractionReply {
        let Some(handle) = self.sessions.get(session_id) else {
            return InteractionReply::Gone;
        };

        let (result, guild_id) = {
            let mut session = handle.session.lock().await;
            let result = session.handle(actor_id, SessionEvent::Select(token.to_string()), now);
            (result, session.origin().guild_id)
        };

        let outcome = match result {
            EventResult::Ignored(IgnoreReason::NotOwner) => {
                return InteractionReply::Ignored(IgnoreReason::NotOwner);
            }
            EventResult::Ignored(_) => {
                self.sessions.remove(session_id);
                SelectionOutcome::NotFound
            }
            EventResult::Resolved(outcome) => {
                self.sessions.remove(session_id);
                outcome
            }
            EventResult::Render(_) => SelectionOutcome::NotFound,
        };

        // The caller may have left voice while browsing.
        let outcome = match outcome {
            SelectionOutcome::Selected(entry) => match self.voice.voice_channel_of(guild_id, actor_id) {
                Some(channel) => return self.dispatch(guild_id, entry, channel).await,
                None => SelectionOutcome::NoVoiceChannel,
            },
            unresolved => unresolved,
        };

        debug!("Session {session_id} closed without playback: {outcome:?}");
        match outcome {
            SelectionOutcome::NoVoiceChannel => InteractionReply::NoVoiceChannel,
            _ => InteractionReply::NotFound,
        }
    }

    async fn dispatch(&self, guild_id: u64, entry: CatalogEntry, channel: VoiceChannel) -> InteractionReply {
        match self.play(guild_id, channel.id, &entry.locator).await {
            Ok(()) => InteractionReply::Playing { entry, channel },
            Err(e) => {
                warn!("Could not start '{}': {e}", entry.display_name);
                InteractionReply::PlaybackFailed { entry, reason: e.to_string() }
            }
        }
    }

    pub async fn play(&self, guild_id: u64, voice_channel_id: u64, locator: &str) -> Result<(), Error> {
        let request = PlayRequest {
            guild_id: guild_id.to_string(),
            channel_id: voice_channel_id.to_string(),
            stream_url: locator.to_string(),
        };
        self.playback.play(&request).await
    }

    pub async fn disconnect(&self, user_name: &str, user_id: u64) -> Result<(), Error> {
        let request = DisconnectRequest {
            user: DisconnectUser {
                name: user_name.to_string(),
                id: user_id.to_string(),
            },
        };
        self.playback.disconnect(&request).await
    }
}

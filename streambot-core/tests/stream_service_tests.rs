// tests/stream_service_tests.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;
use parking_lot::Mutex;
use tokio::time::Instant;

use streambot_common::models::{Catalog, DisconnectRequest, PlayRequest, VoiceChannel};
use streambot_common::traits::api::{PlaybackApi, VoicePresence};
use streambot_core::catalog::{CatalogStore, FilterOptions};
use streambot_core::services::selection::{IgnoreReason, Navigation, SelectionConfig, SessionTable};
use streambot_core::services::{BrowseReply, BrowseRequest, InteractionReply, StreamService};
use streambot_core::Error;

const GUILD: u64 = 10;
const OWNER: u64 = 1;
const OTHER: u64 = 2;
const TEXT_CHANNEL: u64 = 500;
const VOICE_CHANNEL: u64 = 77;

mock! {
    Playback {}
    #[async_trait]
    impl PlaybackApi for Playback {
        async fn play(&self, request: &PlayRequest) -> Result<(), Error>;
        async fn disconnect(&self, request: &DisconnectRequest) -> Result<(), Error>;
    }
}

#[derive(Default)]
struct FakeVoice {
    channels: Mutex<HashMap<u64, VoiceChannel>>,
}

impl FakeVoice {
    fn with_user_in_voice(user_id: u64) -> Self {
        let voice = Self::default();
        voice.join(user_id);
        voice
    }

    fn join(&self, user_id: u64) {
        self.channels.lock().insert(
            user_id,
            VoiceChannel { id: VOICE_CHANNEL, name: "Movie Night".to_string() },
        );
    }

    fn leave(&self, user_id: u64) {
        self.channels.lock().remove(&user_id);
    }
}

impl VoicePresence for FakeVoice {
    fn voice_channel_of(&self, guild_id: u64, user_id: u64) -> Option<VoiceChannel> {
        if guild_id != GUILD {
            return None;
        }
        self.channels.lock().get(&user_id).cloned()
    }
}

fn catalog(count: usize) -> Catalog {
    (0..count)
        .map(|i| (format!("Channel {i:03}"), format!("http://streams/{i}")))
        .collect()
}

fn service(playback: MockPlayback, voice: Arc<FakeVoice>, entries: usize) -> StreamService {
    service_with(playback, voice, entries, SelectionConfig::default())
}

fn service_with(
    playback: MockPlayback,
    voice: Arc<FakeVoice>,
    entries: usize,
    selection: SelectionConfig,
) -> StreamService {
    let store = Arc::new(CatalogStore::new());
    store.replace(catalog(entries));
    StreamService::new(
        store,
        Arc::new(SessionTable::new()),
        Arc::new(playback),
        voice,
        FilterOptions::default(),
        selection,
    )
}

fn browse_request(owner_id: u64, keyword: Option<&str>) -> BrowseRequest {
    BrowseRequest {
        owner_id,
        channel_id: TEXT_CHANNEL,
        guild_id: GUILD,
        keyword: keyword.map(str::to_string),
        interaction_token: format!("token-{owner_id}"),
    }
}

#[tokio::test]
async fn browse_then_select_plays_in_callers_voice_channel() {
    let mut playback = MockPlayback::new();
    playback
        .expect_play()
        .withf(|req| {
            req.guild_id == "10" && req.channel_id == "77" && req.stream_url == "http://streams/30"
        })
        .times(1)
        .returning(|_| Ok(()));

    let svc = service(playback, Arc::new(FakeVoice::with_user_in_voice(OWNER)), 60);
    let now = Instant::now();

    let BrowseReply::Started { handle, view, .. } = svc.begin_browse(browse_request(OWNER, None), now) else {
        panic!("expected a session");
    };
    assert_eq!(view.total_pages, 3);
    assert_eq!(view.entry_count(), 25);

    let page_two = svc.navigate(handle.id(), OWNER, Navigation::Next, now).await;
    let InteractionReply::Render(page_two) = page_two else {
        panic!("expected a render, got {page_two:?}");
    };
    let token = page_two.menus[0][5].token.clone();
    assert_eq!(token, "30");

    let reply = svc.select(handle.id(), OWNER, &token, now).await;
    match reply {
        InteractionReply::Playing { entry, channel } => {
            assert_eq!(entry.display_name, "Channel 030");
            assert_eq!(channel.name, "Movie Night");
        }
        other => panic!("expected playback, got {other:?}"),
    }
    assert!(svc.sessions().is_empty());
}

#[tokio::test]
async fn browse_without_voice_channel_opens_nothing() {
    let svc = service(MockPlayback::new(), Arc::new(FakeVoice::default()), 5);

    let reply = svc.begin_browse(browse_request(OWNER, None), Instant::now());

    assert!(matches!(reply, BrowseReply::NoVoiceChannel));
    assert!(svc.sessions().is_empty());
}

#[tokio::test]
async fn leaving_voice_before_the_pick_skips_playback() {
    let mut playback = MockPlayback::new();
    playback.expect_play().times(0);

    let voice = Arc::new(FakeVoice::with_user_in_voice(OWNER));
    let svc = service(playback, voice.clone(), 5);
    let now = Instant::now();

    let BrowseReply::Started { handle, .. } = svc.begin_browse(browse_request(OWNER, None), now) else {
        panic!("expected a session");
    };
    voice.leave(OWNER);

    let reply = svc.select(handle.id(), OWNER, "0", now).await;

    assert_eq!(reply, InteractionReply::NoVoiceChannel);
    assert!(svc.sessions().is_empty());
}

#[tokio::test]
async fn upstream_failure_is_reported_and_session_ends() {
    let mut playback = MockPlayback::new();
    playback
        .expect_play()
        .times(1)
        .returning(|_| Err(Error::UpstreamUnavailable("http://player/play responded 502".into())));

    let svc = service(playback, Arc::new(FakeVoice::with_user_in_voice(OWNER)), 3);
    let now = Instant::now();
    let BrowseReply::Started { handle, .. } = svc.begin_browse(browse_request(OWNER, None), now) else {
        panic!("expected a session");
    };

    let reply = svc.select(handle.id(), OWNER, "2", now).await;

    match reply {
        InteractionReply::PlaybackFailed { entry, reason } => {
            assert_eq!(entry.locator, "http://streams/2");
            assert!(reason.contains("502"));
        }
        other => panic!("expected a failure, got {other:?}"),
    }
    assert!(svc.sessions().is_empty());
}

#[tokio::test]
async fn non_owner_is_ignored_and_session_survives() {
    let mut playback = MockPlayback::new();
    playback.expect_play().times(0);

    let voice = Arc::new(FakeVoice::with_user_in_voice(OWNER));
    voice.join(OTHER);
    let svc = service(playback, voice, 30);
    let now = Instant::now();
    let BrowseReply::Started { handle, .. } = svc.begin_browse(browse_request(OWNER, None), now) else {
        panic!("expected a session");
    };

    let nav = svc.navigate(handle.id(), OTHER, Navigation::Next, now).await;
    let pick = svc.select(handle.id(), OTHER, "0", now).await;

    assert_eq!(nav, InteractionReply::Ignored(IgnoreReason::NotOwner));
    assert_eq!(pick, InteractionReply::Ignored(IgnoreReason::NotOwner));
    assert_eq!(svc.sessions().len(), 1);
    assert_eq!(handle.session.lock().await.page_index(), 0);
}

#[tokio::test]
async fn keyword_without_matches_reports_no_candidates() {
    let svc = service(MockPlayback::new(), Arc::new(FakeVoice::with_user_in_voice(OWNER)), 10);

    let reply = svc.begin_browse(browse_request(OWNER, Some("weather")), Instant::now());

    match reply {
        BrowseReply::NoCandidates { keyword } => assert_eq!(keyword.as_deref(), Some("weather")),
        _ => panic!("expected no candidates"),
    }
    assert!(svc.sessions().is_empty());
}

#[tokio::test]
async fn keyword_narrows_candidates() {
    let svc = service(MockPlayback::new(), Arc::new(FakeVoice::with_user_in_voice(OWNER)), 30);

    let BrowseReply::Started { view, .. } =
        svc.begin_browse(browse_request(OWNER, Some("channel 02")), Instant::now())
    else {
        panic!("expected a session");
    };

    assert_eq!(view.total_candidates, 10);
    assert_eq!(view.total_pages, 1);
    assert!(!view.has_next);
}

#[tokio::test]
async fn new_browse_supersedes_the_previous_session() {
    let mut playback = MockPlayback::new();
    playback.expect_play().times(1).returning(|_| Ok(()));

    let svc = service(playback, Arc::new(FakeVoice::with_user_in_voice(OWNER)), 5);
    let now = Instant::now();

    let BrowseReply::Started { handle: first, .. } = svc.begin_browse(browse_request(OWNER, None), now) else {
        panic!("expected a session");
    };
    let BrowseReply::Started { handle: second, superseded, .. } =
        svc.begin_browse(browse_request(OWNER, None), now)
    else {
        panic!("expected a session");
    };

    assert_ne!(first.id(), second.id());
    assert_eq!(superseded.map(|old| old.id()), Some(first.id()));
    assert_eq!(svc.sessions().len(), 1);
    assert_eq!(svc.select(first.id(), OWNER, "0", now).await, InteractionReply::Gone);
    assert!(matches!(
        svc.select(second.id(), OWNER, "0", now).await,
        InteractionReply::Playing { .. }
    ));
}

#[tokio::test]
async fn stranger_on_a_superseded_picker_reaches_no_session() {
    let mut playback = MockPlayback::new();
    playback.expect_play().times(0);

    let voice = Arc::new(FakeVoice::with_user_in_voice(OWNER));
    voice.join(OTHER);
    let svc = service(playback, voice, 30);
    let now = Instant::now();

    let BrowseReply::Started { handle: first, superseded: None, .. } =
        svc.begin_browse(browse_request(OWNER, None), now)
    else {
        panic!("expected a fresh session");
    };
    let BrowseReply::Started { handle: second, .. } = svc.begin_browse(browse_request(OWNER, None), now) else {
        panic!("expected a session");
    };

    assert_eq!(svc.navigate(first.id(), OTHER, Navigation::Next, now).await, InteractionReply::Gone);
    assert_eq!(svc.select(first.id(), OTHER, "0", now).await, InteractionReply::Gone);
    assert_eq!(svc.sessions().len(), 1);
    assert_eq!(second.session.lock().await.page_index(), 0);
}

#[tokio::test]
async fn unattended_session_is_dropped_after_the_timeout() {
    let selection = SelectionConfig { inactivity: Duration::from_millis(10), ..Default::default() };
    let svc = service_with(MockPlayback::new(), Arc::new(FakeVoice::with_user_in_voice(OWNER)), 5, selection);

    let BrowseReply::Started { handle, .. } = svc.begin_browse(browse_request(OWNER, None), Instant::now()) else {
        panic!("expected a session");
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(svc.sessions().is_empty());
    assert_eq!(svc.select(handle.id(), OWNER, "0", Instant::now()).await, InteractionReply::Gone);
}

#[tokio::test]
async fn late_events_find_an_expired_session() {
    let mut playback = MockPlayback::new();
    playback.expect_play().times(0);

    let svc = service(playback, Arc::new(FakeVoice::with_user_in_voice(OWNER)), 40);
    let now = Instant::now();
    let BrowseReply::Started { handle, .. } = svc.begin_browse(browse_request(OWNER, None), now) else {
        panic!("expected a session");
    };

    let later = now + Duration::from_secs(61);
    let reply = svc.navigate(handle.id(), OWNER, Navigation::Next, later).await;

    assert_eq!(reply, InteractionReply::Ignored(IgnoreReason::Expired));
    assert!(svc.sessions().is_empty());
    assert_eq!(svc.select(handle.id(), OWNER, "0", later).await, InteractionReply::Gone);
}

#[tokio::test]
async fn garbled_token_resolves_to_not_found() {
    let mut playback = MockPlayback::new();
    playback.expect_play().times(0);

    let svc = service(playback, Arc::new(FakeVoice::with_user_in_voice(OWNER)), 5);
    let now = Instant::now();
    let BrowseReply::Started { handle, .. } = svc.begin_browse(browse_request(OWNER, None), now) else {
        panic!("expected a session");
    };

    assert_eq!(svc.select(handle.id(), OWNER, "99", now).await, InteractionReply::NotFound);
    assert!(svc.sessions().is_empty());
}

#[tokio::test]
async fn disconnect_forwards_the_caller() {
    let mut playback = MockPlayback::new();
    playback
        .expect_disconnect()
        .withf(|req| req.user.name == "viewer" && req.user.id == "1")
        .times(1)
        .returning(|_| Ok(()));

    let svc = service(playback, Arc::new(FakeVoice::default()), 0);

    tokio_test::assert_ok!(svc.disconnect("viewer", OWNER).await);
}

//! Integration tests for Playdeck Core

use bytes::Bytes;
use playdeck_core::headless::MediaOp;
use playdeck_core::media::TextTrackInfo;
use playdeck_core::{
    Command, CommandOutcome, Error, HeadlessMedia, HeadlessStreaming, JsonFileStore,
    MemoryStore, Player, PlayerConfig, SubtitleSelection, Video, VideoFrame, VideoId,
};

type HeadlessPlayer = Player<HeadlessMedia, HeadlessStreaming>;

// =============================================================================
// Helpers
// =============================================================================

fn playlist() -> Vec<Video> {
    vec![
        Video::new("a", "Big Buck Bunny", "/videos/a.mp4").with_poster("/images/a.jpg"),
        Video::new("b", "Sintel", "/videos/b.mp4").with_subtitle_track("/subtitles/b.vtt"),
        Video::new("c", "Tears of Steel", "/streams/c.m3u8"),
    ]
}

fn media() -> HeadlessMedia {
    HeadlessMedia::new()
        .with_duration("/videos/a.mp4", 120.0)
        .with_duration("/videos/b.mp4", 60.0)
        .with_duration("/streams/c.m3u8", 300.0)
}

fn build(media: HeadlessMedia, backend: MemoryStore) -> HeadlessPlayer {
    let engine = HeadlessStreaming::new(media.log());
    Player::new(
        PlayerConfig::default(),
        playlist(),
        Box::new(backend),
        media,
        engine,
    )
    .unwrap()
}

fn select(player: &mut HeadlessPlayer, id: &str) {
    player.dispatch(Command::SelectVideo(VideoId::from(id))).unwrap();
    player.pump().unwrap();
}

fn saved_position(backend: &MemoryStore, id: &str) -> Option<f64> {
    backend
        .raw(&format!("video-{}-history", id))
        .and_then(|raw| raw.parse().ok())
}

// =============================================================================
// Volume & Mute Tests
// =============================================================================

#[test]
fn test_volume_is_clamped() {
    let mut player = build(media(), MemoryStore::new());

    player.dispatch(Command::SetVolume(1.7)).unwrap();
    assert_eq!(player.state().volume, 1.0);

    player.dispatch(Command::SetVolume(-0.3)).unwrap();
    assert_eq!(player.state().volume, 0.0);
    assert_eq!(player.media().volume(), 0.0);
}

#[test]
fn test_mute_silences_element() {
    let mut player = build(media(), MemoryStore::new());
    player.dispatch(Command::SetVolume(0.6)).unwrap();
    player.dispatch(Command::ToggleMute).unwrap();

    assert_eq!(player.state().volume, 0.6);
    assert_eq!(player.state().effective_volume(), 0.0);
    assert_eq!(player.media().volume(), 0.0);

    player.dispatch(Command::ToggleMute).unwrap();
    assert_eq!(player.media().volume(), 0.6);
}

#[test]
fn test_positive_volume_clears_mute() {
    let mut player = build(media(), MemoryStore::new());
    player.dispatch(Command::ToggleMute).unwrap();

    player.dispatch(Command::SetVolume(0.0)).unwrap();
    assert!(player.state().is_muted);
    assert_eq!(player.media().volume(), 0.0);

    player.dispatch(Command::SetVolume(0.5)).unwrap();
    assert!(!player.state().is_muted);
    assert_eq!(player.state().effective_volume(), 0.5);
    assert_eq!(player.media().volume(), 0.5);
}

// =============================================================================
// Playback Position Tests
// =============================================================================

#[test]
fn test_saved_position_restored_on_load() {
    let backend = MemoryStore::new();
    backend.insert_raw("video-a-history", "42.0");
    let mut player = build(media(), backend);

    assert_eq!(player.state().current_time, 0.0);
    player.tick(0.0).unwrap();

    assert_eq!(player.state().duration, 120.0);
    assert_eq!(player.state().current_time, 42.0);
    assert_eq!(player.media().position(), 42.0);
}

#[test]
fn test_saved_position_past_end_ignored() {
    let backend = MemoryStore::new();
    backend.insert_raw("video-b-history", "75");
    let mut player = build(media(), backend);

    select(&mut player, "b");
    player.tick(0.0).unwrap();
    assert_eq!(player.state().current_time, 0.0);
}

#[test]
fn test_saved_position_needs_known_duration() {
    let backend = MemoryStore::new();
    backend.insert_raw("video-a-history", "42.0");
    let media = HeadlessMedia::new().with_duration("/videos/b.mp4", 60.0);
    let mut player = build(media, backend);

    player.tick(0.0).unwrap();
    assert_eq!(player.state().duration, 0.0);
    assert_eq!(player.state().current_time, 0.0);
    assert_eq!(player.media().position(), 0.0);
}

#[test]
fn test_switch_back_restores_position() {
    let backend = MemoryStore::new();
    let mut player = build(media(), backend.clone());

    player.dispatch(Command::Play).unwrap();
    player.tick(0.0).unwrap();
    player.tick(10.0).unwrap();
    assert_eq!(player.state().current_time, 10.0);
    assert_eq!(saved_position(&backend, "a"), Some(10.0));

    select(&mut player, "b");
    player.tick(0.0).unwrap();
    player.tick(3.0).unwrap();
    assert_eq!(player.state().current_time, 3.0);

    select(&mut player, "a");
    assert_eq!(player.state().current_time, 0.0);
    player.tick(0.0).unwrap();
    assert_eq!(player.state().current_time, 10.0);
    assert_eq!(saved_position(&backend, "b"), Some(3.0));
}

#[test]
fn test_restore_happens_once_per_load() {
    let backend = MemoryStore::new();
    backend.insert_raw("video-a-history", "42");
    let mut player = build(media(), backend);
    player.tick(0.0).unwrap();

    player.dispatch(Command::Seek(5.0)).unwrap();
    let listener = player
        .binding()
        .subscriptions()
        .iter()
        .find(|s| s.kind == playdeck_core::MediaEventKind::LoadedMetadata)
        .map(|s| s.id)
        .unwrap();
    player
        .handle_media_event(
            listener,
            playdeck_core::MediaEvent::LoadedMetadata { duration: 120.0 },
        )
        .unwrap();

    assert_eq!(player.state().current_time, 5.0);
}

#[test]
fn test_seek_clamps_to_duration() {
    let mut player = build(media(), MemoryStore::new());
    player.tick(0.0).unwrap();

    player.dispatch(Command::Seek(500.0)).unwrap();
    assert_eq!(player.state().current_time, 120.0);

    player.dispatch(Command::SeekBy(-130.0)).unwrap();
    assert_eq!(player.state().current_time, 0.0);
    assert_eq!(player.media().position(), 0.0);
}

// =============================================================================
// Bookmark Tests
// =============================================================================

#[test]
fn test_bookmarks_are_per_video() {
    let backend = MemoryStore::new();
    let mut player = build(media(), backend.clone());
    player.tick(0.0).unwrap();

    player.dispatch(Command::Seek(12.0)).unwrap();
    player.dispatch(Command::AddBookmark).unwrap();
    assert_eq!(player.state().bookmarks, vec![12.0]);

    select(&mut player, "b");
    assert!(player.state().bookmarks.is_empty());
    player.dispatch(Command::AddBookmark).unwrap();
    assert_eq!(player.state().bookmarks, vec![0.0]);

    let a: Vec<f64> = serde_json::from_str(&backend.raw("video-a-bookmarks").unwrap()).unwrap();
    assert_eq!(a, vec![12.0]);

    select(&mut player, "a");
    assert_eq!(player.state().bookmarks, vec![12.0]);
}

#[test]
fn test_jump_to_bookmark_plays() {
    let mut player = build(media(), MemoryStore::new());
    player.tick(0.0).unwrap();
    player.dispatch(Command::Seek(30.0)).unwrap();
    player.dispatch(Command::AddBookmark).unwrap();
    player.dispatch(Command::Seek(0.0)).unwrap();

    let rows = player.bookmark_view();
    assert_eq!(rows[0].timestamp, "00:30");

    player.select_bookmark(0).unwrap();
    assert_eq!(player.state().current_time, 30.0);
    assert!(player.state().is_playing);
    assert!(player.media().is_playing());

    assert!(matches!(
        player.dispatch(Command::JumpToBookmark(4)),
        Err(Error::BookmarkOutOfRange { index: 4, len: 1 })
    ));
}

#[test]
fn test_legacy_bookmark_record() {
    let backend = MemoryStore::new();
    backend.insert_raw("video-a-bookmarks", r#"{"a": [3.5, 9.0]}"#);
    let player = build(media(), backend);
    assert_eq!(player.state().bookmarks, vec![3.5, 9.0]);
}

// =============================================================================
// Auto-Advance Tests
// =============================================================================

#[test]
fn test_end_advances_to_next() {
    let mut player = build(media(), MemoryStore::new());
    player.dispatch(Command::Play).unwrap();
    player.tick(0.0).unwrap();
    player.tick(200.0).unwrap();

    assert_eq!(player.state().current_index, 1);
    assert_eq!(player.media().source(), Some("/videos/b.mp4"));
    assert!(player.state().is_playing);
    assert!(player.media().is_playing());
}

#[test]
fn test_end_of_last_wraps_to_first() {
    let backend = MemoryStore::new();
    let mut player = build(media(), backend.clone());
    select(&mut player, "c");
    player.dispatch(Command::Play).unwrap();
    player.tick(0.0).unwrap();
    player.tick(150.0).unwrap();
    assert_eq!(saved_position(&backend, "c"), Some(150.0));

    player.tick(200.0).unwrap();

    assert_eq!(player.state().current_index, 0);
    assert_eq!(player.state().current_video.id, VideoId::from("a"));
    assert!(player.state().is_playing);
    assert_eq!(saved_position(&backend, "c"), Some(0.0));
    assert!(!player.binding().has_stream_session());
    assert_eq!(player.binding().engine().active_sessions(), 0);
}

#[test]
fn test_single_entry_playlist_loops() {
    let media = HeadlessMedia::new().with_default_duration(5.0);
    let engine = HeadlessStreaming::new(media.log());
    let mut player = Player::new(
        PlayerConfig::default(),
        vec![Video::new(1, "Loop", "/videos/loop.mp4")],
        Box::new(MemoryStore::new()),
        media,
        engine,
    )
    .unwrap();

    player.dispatch(Command::Play).unwrap();
    player.tick(0.0).unwrap();
    player.tick(6.0).unwrap();
    player.tick(0.0).unwrap();

    assert_eq!(player.state().current_index, 0);
    assert_eq!(player.state().current_time, 0.0);
    assert!(player.media().is_playing());
}

// =============================================================================
// Load & Teardown Tests
// =============================================================================

#[test]
fn test_manifest_source_uses_streaming_engine() {
    let mut player = build(media(), MemoryStore::new());
    select(&mut player, "c");

    assert!(player.binding().has_stream_session());
    assert_eq!(player.binding().engine().active_sessions(), 1);
    assert_eq!(player.media().source(), Some("/streams/c.m3u8"));
    assert!(!player
        .media()
        .ops()
        .contains(&MediaOp::SetSource("/streams/c.m3u8".to_string())));
}

#[test]
fn test_stream_destroyed_before_new_source() {
    let mut player = build(media(), MemoryStore::new());
    select(&mut player, "c");
    player.media().clear_ops();

    select(&mut player, "a");

    let ops = player.media().ops();
    let destroyed = ops
        .iter()
        .position(|op| matches!(op, MediaOp::StreamDestroyed(_)))
        .unwrap();
    let assigned = ops
        .iter()
        .position(|op| *op == MediaOp::SetSource("/videos/a.mp4".to_string()))
        .unwrap();
    assert!(destroyed < assigned);
    assert_eq!(player.binding().engine().active_sessions(), 0);
}

#[test]
fn test_listeners_replaced_on_switch() {
    let mut player = build(media(), MemoryStore::new());
    let before: Vec<_> = player.binding().subscriptions().iter().map(|s| s.id).collect();

    select(&mut player, "b");
    let after: Vec<_> = player.binding().subscriptions().iter().map(|s| s.id).collect();

    assert_eq!(player.media().listener_count(), 3);
    assert!(before.iter().all(|id| !after.contains(id)));
}

#[test]
fn test_stale_events_dropped() {
    let backend = MemoryStore::new();
    let mut player = build(media(), backend.clone());
    player.dispatch(Command::Play).unwrap();
    player.tick(0.0).unwrap();

    player.media_mut().advance(20.0);
    let stale = player.media_mut().take_events();
    assert!(!stale.is_empty());

    select(&mut player, "b");
    for (listener, event) in stale {
        player.handle_media_event(listener, event).unwrap();
    }

    assert_eq!(player.state().current_video.id, VideoId::from("b"));
    assert_eq!(player.state().current_time, 0.0);
    assert_eq!(saved_position(&backend, "a"), None);
    assert_eq!(saved_position(&backend, "b"), None);
}

#[test]
fn test_subtitle_source_follows_video() {
    let mut player = build(media(), MemoryStore::new());
    select(&mut player, "b");
    assert!(player
        .media()
        .ops()
        .contains(&MediaOp::SetSubtitleSource(Some("/subtitles/b.vtt".to_string()))));
}

// =============================================================================
// Controls Tests
// =============================================================================

#[test]
fn test_playback_rate() {
    let mut player = build(media(), MemoryStore::new());
    player.dispatch(Command::SetPlaybackRate(1.5)).unwrap();
    assert_eq!(player.media().playback_rate(), 1.5);

    assert!(matches!(
        player.dispatch(Command::SetPlaybackRate(3.0)),
        Err(Error::UnsupportedPlaybackRate { .. })
    ));
    assert_eq!(player.state().playback_rate, 1.5);
}

#[test]
fn test_rate_survives_video_switch() {
    let mut player = build(media(), MemoryStore::new());
    player.dispatch(Command::SetPlaybackRate(2.0)).unwrap();
    select(&mut player, "b");
    assert_eq!(player.media().playback_rate(), 2.0);
}

#[test]
fn test_subtitle_selection() {
    let media = media().with_text_tracks(vec![
        TextTrackInfo::new("en", "English"),
        TextTrackInfo::new("fr", "Français"),
    ]);
    let mut player = build(media, MemoryStore::new());
    player.media().clear_ops();

    player
        .dispatch(Command::SelectSubtitle(SubtitleSelection::parse("fr")))
        .unwrap();

    let ops = player.media().ops();
    assert!(ops.contains(&MediaOp::SetTrackMode(0, playdeck_core::media::TrackMode::Disabled)));
    assert!(ops.contains(&MediaOp::SetTrackMode(1, playdeck_core::media::TrackMode::Showing)));
    assert_eq!(
        player.state().selected_subtitle,
        SubtitleSelection::Language("fr".to_string())
    );
}

#[test]
fn test_screenshot_download() {
    let frame = VideoFrame::solid(4, 2, [255, 0, 0, 255]).unwrap();
    let mut player = build(media().with_frame(frame), MemoryStore::new());

    let CommandOutcome::Download(download) = player.dispatch(Command::Screenshot).unwrap() else {
        panic!("expected a download");
    };
    assert_eq!(download.file_name, "screenshot.png");
    assert_eq!(download.mime_type, "image/png");
    assert_eq!(&download.bytes[..4], &[0x89, b'P', b'N', b'G']);
}

#[test]
fn test_screenshot_without_capture_ignored() {
    let mut player = build(media(), MemoryStore::new());
    assert_eq!(
        player.dispatch(Command::Screenshot).unwrap(),
        CommandOutcome::Ignored
    );
}

#[test]
fn test_recording_session() {
    let media = media().with_capture(vec![Bytes::from_static(b"-tail")]);
    let mut player = build(media, MemoryStore::new());

    let started = player.dispatch(Command::ToggleRecording).unwrap();
    assert!(matches!(started, CommandOutcome::RecordingStarted(_)));
    assert!(player.is_recording());

    player.handle_recording_data(Bytes::from_static(b"chunk"));
    let CommandOutcome::Download(download) = player.dispatch(Command::ToggleRecording).unwrap()
    else {
        panic!("expected a download");
    };

    assert!(!player.is_recording());
    assert_eq!(download.file_name, "recorded.webm");
    assert_eq!(download.mime_type, "video/webm");
    assert_eq!(&download.bytes[..], b"chunk-tail");
}

#[test]
fn test_failed_recording_stop_releases_session() {
    let media = media().with_failing_capture();
    let mut player = build(media, MemoryStore::new());

    player.dispatch(Command::ToggleRecording).unwrap();
    assert!(player.is_recording());

    let result = player.dispatch(Command::ToggleRecording);
    assert!(matches!(result, Err(Error::Recording(_))));
    assert!(!player.is_recording());

    let restarted = player.dispatch(Command::ToggleRecording).unwrap();
    assert!(matches!(restarted, CommandOutcome::RecordingStarted(_)));
}

#[test]
fn test_picture_in_picture_toggle() {
    let mut player = build(media().with_picture_in_picture(), MemoryStore::new());
    player.dispatch(Command::TogglePictureInPicture).unwrap();
    assert!(player.media().ops().contains(&MediaOp::PictureInPicture(true)));
    player.dispatch(Command::TogglePictureInPicture).unwrap();
    assert!(player.media().ops().contains(&MediaOp::PictureInPicture(false)));

    let mut player = build(media(), MemoryStore::new());
    assert_eq!(
        player.dispatch(Command::TogglePictureInPicture).unwrap(),
        CommandOutcome::Ignored
    );
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_file_store_survives_restart() {
    let path = std::env::temp_dir().join(format!("playdeck-{}.json", uuid::Uuid::new_v4()));

    {
        let media = media();
        let engine = HeadlessStreaming::new(media.log());
        let mut player = Player::new(
            PlayerConfig::default(),
            playlist(),
            Box::new(JsonFileStore::open(&path).unwrap()),
            media,
            engine,
        )
        .unwrap();
        player.dispatch(Command::Play).unwrap();
        player.tick(0.0).unwrap();
        player.tick(33.0).unwrap();
        player.toggle_theme();
    }

    let media = media();
    let engine = HeadlessStreaming::new(media.log());
    let mut player = Player::new(
        PlayerConfig::default(),
        playlist(),
        Box::new(JsonFileStore::open(&path).unwrap()),
        media,
        engine,
    )
    .unwrap();
    player.tick(0.0).unwrap();

    assert_eq!(player.state().current_time, 33.0);
    assert_eq!(player.theme(), playdeck_core::Theme::Dark);

    std::fs::remove_file(&path).unwrap();
}

// =============================================================================
// Subscription Tests
// =============================================================================

#[tokio::test]
async fn test_watch_receives_changes() {
    let mut player = build(media(), MemoryStore::new());
    let mut rx = player.subscribe();
    rx.borrow_and_update();

    player.dispatch(Command::Play).unwrap();
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().is_playing);

    select(&mut player, "b");
    assert_eq!(rx.borrow_and_update().current_video.id, VideoId::from("b"));
}

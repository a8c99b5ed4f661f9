//! CLI command implementations

use crate::output::{optional, render_rows, OutputFormat};
use crate::playlist::{self, PlaylistFileEntry};
use crate::script::{self, Action};
use anyhow::Context as _;
use playdeck_core::source::{classify, SourceKind};
use playdeck_core::theme::ThemeToggle;
use playdeck_core::views::format_time;
use playdeck_core::{
    CommandOutcome, CssVariables, FocusTarget, HeadlessMedia, HeadlessStreaming, JsonFileStore,
    Key, KeyEvent, Persistence, Player, PlayerConfig, PlayerSnapshot, VideoFrame, VideoId,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabled::Tabled;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Interval;
use tracing::{info, warn};

type HeadlessPlayer = Player<HeadlessMedia, HeadlessStreaming>;

/// Options shared by every command
pub struct Context {
    pub format: OutputFormat,
    pub store: PathBuf,
    pub config: PlayerConfig,
}

impl Context {
    fn persistence(&self) -> anyhow::Result<Persistence> {
        let backend = JsonFileStore::open(&self.store)
            .with_context(|| format!("opening store {}", self.store.display()))?;
        Ok(Persistence::new(
            Box::new(backend),
            self.config.storage_namespace.clone(),
        ))
    }
}

fn display_seconds(value: &Option<f64>) -> String {
    value.map(format_time).unwrap_or_else(|| "-".to_string())
}

// =============================================================================
// Playlist
// =============================================================================

#[derive(Serialize, Tabled)]
struct PlaylistRow {
    index: usize,
    id: String,
    title: String,
    kind: &'static str,
    source: String,
    #[tabled(display_with = "optional")]
    poster: Option<String>,
    #[tabled(display_with = "display_seconds")]
    duration: Option<f64>,
}

/// List the entries of a playlist file
pub fn playlist(ctx: &Context, path: &Path) -> anyhow::Result<()> {
    let entries = playlist::load(path)?;
    let rows: Vec<PlaylistRow> = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| PlaylistRow {
            index,
            id: entry.video.id.to_string(),
            title: entry.video.title.clone(),
            kind: match classify(&entry.video.source, &ctx.config.stream_extensions) {
                SourceKind::Direct => "direct",
                SourceKind::AdaptiveStream => "stream",
            },
            source: entry.video.source.clone(),
            poster: entry.video.poster.clone(),
            duration: entry.duration,
        })
        .collect();

    let out = render_rows(&rows, ctx.format, |r| {
        format!("{:>3}. [{}] {} ({}, {})", r.index + 1, r.id, r.title, r.kind, r.source)
    })?;
    println!("{}", out);
    Ok(())
}

// =============================================================================
// History
// =============================================================================

#[derive(Serialize, Tabled)]
struct HistoryRow {
    id: String,
    title: String,
    #[tabled(display_with = "display_seconds")]
    position: Option<f64>,
}

/// Show the saved playback position of every playlist entry
pub fn history(ctx: &Context, path: &Path) -> anyhow::Result<()> {
    let entries = playlist::load(path)?;
    let persistence = ctx.persistence()?;

    let rows: Vec<HistoryRow> = entries
        .iter()
        .map(|entry| HistoryRow {
            id: entry.video.id.to_string(),
            title: entry.video.title.clone(),
            position: persistence.load_history(&entry.video.id),
        })
        .collect();

    let out = render_rows(&rows, ctx.format, |r| {
        format!("[{}] {}: {}", r.id, r.title, display_seconds(&r.position))
    })?;
    println!("{}", out);
    Ok(())
}

// =============================================================================
// Bookmarks
// =============================================================================

#[derive(Serialize, Tabled)]
struct BookmarkRow {
    video: String,
    label: String,
    timestamp: String,
    seconds: f64,
}

/// List bookmarks, optionally appending one to `video` first
pub fn bookmarks(
    ctx: &Context,
    path: &Path,
    video: Option<String>,
    add: Option<f64>,
) -> anyhow::Result<()> {
    let entries = playlist::load(path)?;
    let mut persistence = ctx.persistence()?;

    let selected: Vec<&PlaylistFileEntry> = match &video {
        Some(id) => {
            let id = VideoId::from(id.as_str());
            let entry = entries
                .iter()
                .find(|e| e.video.id == id)
                .with_context(|| format!("video {} is not in the playlist", id))?;
            vec![entry]
        }
        None => entries.iter().collect(),
    };

    if let Some(position) = add {
        anyhow::ensure!(video.is_some(), "--add needs --video");
        anyhow::ensure!(
            position.is_finite() && position >= 0.0,
            "bookmark position must be a non-negative number of seconds"
        );
        let id = &selected[0].video.id;
        let mut list = persistence.load_bookmarks(id);
        list.push(position);
        persistence.save_bookmarks(id, &list);
        info!(video = %id, position, "Bookmark added");
    }

    let rows: Vec<BookmarkRow> = selected
        .iter()
        .flat_map(|entry| {
            persistence
                .load_bookmarks(&entry.video.id)
                .into_iter()
                .enumerate()
                .map(|(index, seconds)| BookmarkRow {
                    video: entry.video.id.to_string(),
                    label: format!("Bookmark {}", index + 1),
                    timestamp: format_time(seconds),
                    seconds,
                })
                .collect::<Vec<_>>()
        })
        .collect();

    if rows.is_empty() && ctx.format == OutputFormat::Text {
        println!("{}", playdeck_core::views::NO_BOOKMARKS);
        return Ok(());
    }

    let out = render_rows(&rows, ctx.format, |r| {
        format!("[{}] {} at {}", r.video, r.label, r.timestamp)
    })?;
    println!("{}", out);
    Ok(())
}

// =============================================================================
// Theme
// =============================================================================

/// Show, and optionally flip, the stored theme
pub fn theme(ctx: &Context, toggle: bool, css: bool) -> anyhow::Result<()> {
    let mut persistence = ctx.persistence()?;
    let mut theme = ThemeToggle::load(&persistence);
    if toggle {
        theme.toggle(&mut persistence);
    }

    match ctx.format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "theme": theme.theme(),
                "palette": theme.theme().palette(),
            }))?
        ),
        OutputFormat::Text | OutputFormat::Table => println!("Theme: {}", theme.theme()),
    }
    if css {
        println!("{}", CssVariables::generate(theme.theme()));
    }
    Ok(())
}

// =============================================================================
// Play
// =============================================================================

/// Options of the `play` command
pub struct PlayOptions {
    pub script: Option<PathBuf>,
    pub seconds: f64,
    pub step: f64,
    pub realtime: bool,
    pub downloads: PathBuf,
}

#[derive(Serialize, Tabled)]
struct Summary {
    index: usize,
    video: String,
    title: String,
    state: String,
    position: String,
    duration: String,
    volume: f64,
    muted: bool,
    rate: f64,
    bookmarks: usize,
}

impl From<&PlayerSnapshot> for Summary {
    fn from(state: &PlayerSnapshot) -> Self {
        Self {
            index: state.current_index,
            video: state.current_video.id.to_string(),
            title: state.current_video.title.clone(),
            state: state.transport().to_string(),
            position: format_time(state.current_time),
            duration: format_time(state.duration),
            volume: state.volume,
            muted: state.is_muted,
            rate: state.playback_rate,
            bookmarks: state.bookmarks.len(),
        }
    }
}

/// Play a playlist on the headless element, driven by a script
pub async fn play(ctx: &Context, path: &Path, opts: PlayOptions) -> anyhow::Result<()> {
    anyhow::ensure!(
        opts.step.is_finite() && opts.step > 0.0,
        "--step must be a positive number of seconds"
    );

    let entries = playlist::load(path)?;
    let steps = match &opts.script {
        Some(script) => script::load(script)?,
        None => script::default_script(opts.seconds),
    };

    let mut player = build_player(ctx, &entries)?;
    let printer = spawn_printer(player.subscribe());
    let mut clock = opts
        .realtime
        .then(|| tokio::time::interval(Duration::from_secs_f64(opts.step)));

    for (n, step) in steps.iter().enumerate() {
        match step.action() {
            Action::Wait(seconds) => {
                run_clock(&mut player, seconds, opts.step, clock.as_mut()).await?;
            }
            Action::Command(command) => {
                let outcome = player
                    .dispatch(command)
                    .with_context(|| format!("script step {}", n + 1))?;
                handle_outcome(outcome, &opts.downloads)?;
            }
            Action::Key(key) => {
                let event = KeyEvent::new(Key::from_dom(&key), FocusTarget::Player);
                match player.handle_key(&event)? {
                    Some(response) => handle_outcome(response.outcome, &opts.downloads)?,
                    None => warn!(key = %key, "Key is not bound to a shortcut"),
                }
            }
        }
        player.pump()?;
        // let the printer observe this step's state
        tokio::task::yield_now().await;
    }

    let summary = Summary::from(player.state());
    drop(player);
    printer.await?;

    let out = render_rows(&[summary], ctx.format, |s| {
        format!(
            "{} [{}] {} {} / {} (volume {}{}, rate {}x, {} bookmarks)",
            s.state,
            s.video,
            s.title,
            s.position,
            s.duration,
            s.volume,
            if s.muted { ", muted" } else { "" },
            s.rate,
            s.bookmarks
        )
    })?;
    println!("{}", out);
    Ok(())
}

fn build_player(ctx: &Context, entries: &[PlaylistFileEntry]) -> anyhow::Result<HeadlessPlayer> {
    let mut media = HeadlessMedia::new()
        .with_frame(VideoFrame::solid(320, 180, [0, 0, 0, 255])?)
        .with_capture(Vec::new())
        .with_fullscreen()
        .with_picture_in_picture();
    for entry in entries {
        media = media.with_duration(entry.video.source.clone(), entry.duration_or_default());
    }
    let engine = HeadlessStreaming::new(media.log());

    let backend = JsonFileStore::open(&ctx.store)
        .with_context(|| format!("opening store {}", ctx.store.display()))?;
    let player = Player::new(
        ctx.config.clone(),
        playlist::videos(entries),
        Box::new(backend),
        media,
        engine,
    )?;
    Ok(player)
}

async fn run_clock(
    player: &mut HeadlessPlayer,
    seconds: f64,
    step: f64,
    mut clock: Option<&mut Interval>,
) -> anyhow::Result<()> {
    let mut remaining = seconds;
    while remaining > 0.0 {
        let dt = remaining.min(step);
        if let Some(clock) = clock.as_mut() {
            clock.tick().await;
        }
        player.tick(dt)?;
        remaining -= dt;
    }
    Ok(())
}

fn handle_outcome(outcome: CommandOutcome, downloads: &Path) -> anyhow::Result<()> {
    match outcome {
        CommandOutcome::Applied => {}
        CommandOutcome::Ignored => warn!("Command ignored: capability unavailable"),
        CommandOutcome::RecordingStarted(session) => info!(%session, "Recording"),
        CommandOutcome::Download(download) => {
            std::fs::create_dir_all(downloads)?;
            let path = downloads.join(&download.file_name);
            std::fs::write(&path, &download.bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), bytes = download.len(), "Saved download");
        }
    }
    Ok(())
}

/// Tracks the current video and transport between printed lines
#[derive(Debug, Default)]
struct Transitions {
    last: Option<(usize, bool)>,
}

impl Transitions {
    /// Line to print for `state`, if its video or transport differs from
    /// the last one printed
    fn observe(&mut self, state: &PlayerSnapshot) -> Option<String> {
        let key = (state.current_index, state.is_playing);
        if self.last == Some(key) {
            return None;
        }
        self.last = Some(key);
        Some(format!(
            "{} [{}] {}",
            state.transport(),
            state.current_video.id,
            state.current_video.title
        ))
    }
}

/// Print a line when the latest published state shows a new video or
/// transport. The watch channel keeps only the newest snapshot, so
/// transitions between two observations are not printed.
fn spawn_printer(mut rx: watch::Receiver<PlayerSnapshot>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut transitions = Transitions::default();
        loop {
            let line = transitions.observe(&rx.borrow_and_update());
            if let Some(line) = line {
                println!("[{}] {}", chrono::Utc::now().format("%H:%M:%S"), line);
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(dir: &Path) -> Context {
        Context {
            format: OutputFormat::Json,
            store: dir.join("store.json"),
            config: PlayerConfig::default(),
        }
    }

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("playdeck-cli-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_playlist(dir: &Path) -> PathBuf {
        let path = dir.join("playlist.json");
        std::fs::write(
            &path,
            r#"[
                {"id": 1, "title": "One", "src": "/videos/1.mp4", "duration": 4},
                {"id": 2, "title": "Two", "src": "/streams/2.m3u8", "duration": 3}
            ]"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn test_transitions_print_video_and_transport_changes() {
        use playdeck_core::{MemoryStore, Persistence, PlayerStore, Video, VideoId};

        let persistence = Persistence::new(Box::new(MemoryStore::new()), "video");
        let videos = vec![
            Video::new(1, "One", "/videos/1.mp4"),
            Video::new(2, "Two", "/videos/2.mp4"),
        ];
        let mut store = PlayerStore::new(&PlayerConfig::default(), videos, persistence).unwrap();
        let mut transitions = Transitions::default();

        assert_eq!(transitions.observe(store.state()).as_deref(), Some("paused [1] One"));

        store.set_duration(10.0);
        store.set_current_time(4.0);
        assert!(transitions.observe(store.state()).is_none());

        store.set_is_playing(true);
        assert_eq!(transitions.observe(store.state()).as_deref(), Some("playing [1] One"));

        store.set_current_video(&VideoId::from(2)).unwrap();
        assert_eq!(transitions.observe(store.state()).as_deref(), Some("playing [2] Two"));
    }

    #[tokio::test]
    async fn test_play_persists_position() {
        let dir = temp_dir();
        let ctx = context(&dir);
        let playlist = write_playlist(&dir);

        let script = dir.join("script.json");
        std::fs::write(
            &script,
            r#"[
                {"action": "play"},
                {"action": "wait", "seconds": 3},
                {"action": "bookmark"},
                {"action": "screenshot"}
            ]"#,
        )
        .unwrap();

        play(
            &ctx,
            &playlist,
            PlayOptions {
                script: Some(script),
                seconds: 0.0,
                step: 1.0,
                realtime: false,
                downloads: dir.join("downloads"),
            },
        )
        .await
        .unwrap();

        let persistence = ctx.persistence().unwrap();
        assert_eq!(persistence.load_history(&VideoId::from(1)), Some(2.0));
        assert_eq!(persistence.load_bookmarks(&VideoId::from(1)), vec![2.0]);
        assert!(dir.join("downloads").join("screenshot.png").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_bookmark_add_requires_video() {
        let dir = temp_dir();
        let ctx = context(&dir);
        let playlist = write_playlist(&dir);

        assert!(bookmarks(&ctx, &playlist, None, Some(3.0)).is_err());
        bookmarks(&ctx, &playlist, Some("2".to_string()), Some(3.0)).unwrap();
        assert_eq!(
            ctx.persistence().unwrap().load_bookmarks(&VideoId::from(2)),
            vec![3.0]
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_theme_toggle_persists() {
        let dir = temp_dir();
        let ctx = context(&dir);

        theme(&ctx, true, false).unwrap();
        let stored = ThemeToggle::load(&ctx.persistence().unwrap());
        assert_eq!(stored.theme(), playdeck_core::Theme::Dark);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}

//! Headless playback example
//!
//! Plays through a short playlist on the simulated media element, showing
//! position restore, bookmarks and cyclic auto-advance.
//!
//! Run with: cargo run -p playdeck-core --example headless

use playdeck_core::views::format_time;
use playdeck_core::{
    Command, HeadlessMedia, HeadlessStreaming, MemoryStore, Player, PlayerConfig, Video,
};

fn main() -> playdeck_core::Result<()> {
    println!("Playdeck Core - Headless Example");
    println!("================================\n");

    let playlist = vec![
        Video::new(1, "Intro", "/videos/intro.mp4"),
        Video::new(2, "Live", "/streams/live.m3u8"),
    ];

    let backend = MemoryStore::new();
    backend.insert_raw("video-1-history", "4.5");

    let media = HeadlessMedia::new()
        .with_duration("/videos/intro.mp4", 10.0)
        .with_duration("/streams/live.m3u8", 6.0);
    let engine = HeadlessStreaming::new(media.log());
    let mut player = Player::new(
        PlayerConfig::default(),
        playlist,
        Box::new(backend.clone()),
        media,
        engine,
    )?;

    player.dispatch(Command::Play)?;
    player.tick(0.0)?;
    println!(
        "Resumed \"{}\" at {}",
        player.state().current_video.title,
        format_time(player.state().current_time)
    );

    player.tick(2.0)?;
    player.dispatch(Command::AddBookmark)?;
    for row in player.bookmark_view() {
        println!("  {} at {}", row.label, row.timestamp);
    }

    for _ in 0..20 {
        player.tick(1.0)?;
        let state = player.state();
        println!(
            "[{}] {} {} / {}",
            state.current_index,
            state.current_video.title,
            format_time(state.current_time),
            format_time(state.duration)
        );
    }

    println!("\nStored records:");
    for key in ["video-1-history", "video-1-bookmarks", "video-2-history"] {
        println!("  {} = {}", key, backend.raw(key).unwrap_or_default());
    }

    Ok(())
}

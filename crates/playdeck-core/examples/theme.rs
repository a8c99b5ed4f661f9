//! Theme example
//!
//! Prints both palettes and the CSS variables a web host injects.
//!
//! Run with: cargo run -p playdeck-core --example theme

use playdeck_core::{CssVariables, Theme};

fn main() {
    println!("Playdeck Core - Theme Example");
    println!("=============================\n");

    for theme in [Theme::Light, Theme::Dark] {
        let palette = theme.palette();

        println!("{} theme:", theme);
        println!("-----------");
        println!("  Background:    {}", palette.background);
        println!("  Surface:       {}", palette.surface);
        println!("  Surface hover: {}", palette.surface_hover);
        println!("  Active row:    {}", palette.active_row);
        println!("  Text:          {}", palette.text);
        println!("  Text soft:     {}", palette.text_soft);
        println!("  Accent:        {}", palette.accent);
        println!(
            "  Root class:    {}",
            theme.root_class().unwrap_or("(none)")
        );
        println!();

        println!("{}\n", CssVariables::generate(theme));
    }
}

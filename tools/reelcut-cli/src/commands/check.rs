//! Check that the media toolchain and pose sidecar are usable.

use reelcut_common::config::AppConfig;
use reelcut_render_engine::tools::{ffmpeg_path, ffprobe_path, is_tool_available};
use reelcut_render_engine::FfmpegToolchain;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Reelcut System Check");
    println!("{}", "=".repeat(50));

    let mut ready = FfmpegToolchain::new().is_available();
    for (name, path) in [("ffmpeg", ffmpeg_path()), ("ffprobe", ffprobe_path())] {
        if is_tool_available(&path) {
            println!("[OK] {name}: {}", path.display());
        } else {
            println!(
                "[MISSING] {name}: {} (install it or set REELCUT_{}_PATH)",
                path.display(),
                name.to_uppercase()
            );
        }
    }

    match &config.pose.command {
        Some(command) => println!(
            "[OK] Pose sidecar: {command} {}",
            config.pose.args.join(" ")
        ),
        None => {
            println!(
                "[MISSING] Pose sidecar: set pose.command in the config or pass --pose-command"
            );
            ready = false;
        }
    }

    println!("     Processing dir: {}", config.processing_dir.display());
    println!("     Output dir: {}", config.output_dir.display());

    println!();
    if ready {
        println!("All required tools are available. Reelcut is ready.");
    } else {
        println!("Some required tools are missing. See above for fixes.");
    }

    Ok(())
}

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use vivid_core::{EnhanceJob, PresetStore, SystemReport, check_ffmpeg, resolve_selection};

#[derive(Parser, Debug)]
#[command(name = "vivid")]
#[command(
    about = "Video enhancement tool combining color presets with itsscale playback-rate tricks"
)]
#[command(version)]
struct Args {
    /// Input video file path
    #[arg(
        short,
        long,
        required_unless_present_any = ["list_presets", "check"]
    )]
    input: Option<PathBuf>,

    /// Output video file path (generated from the input name if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Input timestamp scale factor (e.g., 2.0 stretches perceived duration)
    #[arg(short = 's', long, default_value = "1.0")]
    itsscale: f64,

    /// Comma-separated preset ids to combine (e.g., "cinematic,vibrant")
    #[arg(short, long, value_name = "IDS")]
    presets: Option<String>,

    /// Comma-separated 1-based preset numbers as shown by --list-presets
    /// (e.g., "2,8,6"); invalid numbers are skipped
    #[arg(long, value_name = "NUMBERS", conflicts_with = "presets")]
    select: Option<String>,

    /// Compress with HandBrake (Production Standard, RF 27) before encoding
    #[arg(long)]
    handbrake: bool,

    /// Preset configuration file (falls back to built-in presets)
    #[arg(long, default_value = "color_presets.json")]
    presets_file: PathBuf,

    /// List available presets
    #[arg(long)]
    list_presets: bool,

    /// Check system requirements and exit
    #[arg(long)]
    check: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let store = PresetStore::load_or_builtin(&args.presets_file);

    // List presets if requested
    if args.list_presets {
        println!("\nAvailable presets:");
        println!("{:-<50}", "");
        for (index, preset) in store.iter().enumerate() {
            println!("{:2}. {}", index + 1, preset.name);
            println!("     {}", preset.description);
        }
        println!("\nUsage: vivid -i input.mp4 --presets cinematic,vibrant");
        println!("       vivid -i input.mp4 --select 2,3");
        return Ok(());
    }

    // System requirement report
    if args.check {
        let report = SystemReport::gather();
        match &report.ffmpeg_version {
            Some(version) => println!("✅ FFmpeg: OK ({})", version),
            None => println!("❌ FFmpeg: NOT FOUND (required)"),
        }
        if report.nvidia_gpu {
            println!("✅ NVIDIA GPU: detected (hardware encoding available)");
        } else {
            println!("ℹ️  NVIDIA GPU: not detected (will use CPU encoding)");
        }
        match &report.handbrake_version {
            Some(version) => println!("✅ HandBrake CLI: OK ({})", version),
            None => println!("⚠️  HandBrake CLI: not found (compression unavailable)"),
        }
        if !report.ffmpeg_available() {
            std::process::exit(1);
        }
        return Ok(());
    }

    // Check FFmpeg availability
    match check_ffmpeg() {
        Ok(version) => {
            log::info!("FFmpeg version {} detected", version);
        }
        Err(e) => {
            eprintln!("Error: FFmpeg not found!");
            eprintln!("Please install FFmpeg to use this tool.");
            eprintln!();
            eprintln!("Installation instructions:");
            eprintln!("  Ubuntu/Debian: sudo apt install ffmpeg");
            eprintln!("  macOS:         brew install ffmpeg");
            eprintln!("  Windows:       Download from https://ffmpeg.org/download.html");
            eprintln!();
            eprintln!("Details: {}", e);
            std::process::exit(1);
        }
    }

    let input = args
        .input
        .ok_or_else(|| anyhow::anyhow!("Input file required"))?;

    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    // Resolve the preset selection to an ordered id list
    let preset_ids: Vec<String> = if let Some(selection) = &args.select {
        resolve_selection(selection, &store)
    } else if let Some(presets) = &args.presets {
        let ids: Vec<String> = presets
            .split(',')
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        for id in &ids {
            if store.get(id).is_none() {
                anyhow::bail!(
                    "Unknown preset: {}. Use --list-presets to see available options.",
                    id
                );
            }
        }
        ids
    } else {
        vec!["none".to_string()]
    };

    log::info!("Starting video enhancement...");
    log::info!("Input: {:?}", input);

    let mut job = EnhanceJob::new(&input)
        .itsscale(args.itsscale)
        .presets(preset_ids)
        .handbrake(args.handbrake);

    if let Some(output) = args.output {
        job = job.output(output);
    }

    let outcome = job.run(&store)?;

    println!("\n✅ Video enhancement completed successfully!");
    println!("📁 Output saved to: {:?}", outcome.output);

    if let Some(report) = outcome.size_report {
        println!(
            "📊 File size: {:.1}MB → {:.1}MB ({:.1}% reduction)",
            report.original_mb,
            report.final_mb,
            report.reduction_percent()
        );
    }

    Ok(())
}

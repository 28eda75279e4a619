use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

use clap::Parser;

use captionlens_core::annotation::domain::annotation::AnnotationSnapshot;
use captionlens_core::annotation::domain::face_matcher::FaceContinuityPolicy;
use captionlens_core::pipeline::annotation_pipeline::AnnotationPipeline;
use captionlens_core::pipeline::frame_gate::frame_gate;
use captionlens_core::pipeline::pipeline_logger::LogPipelineLogger;
use captionlens_core::shared::coordinate_mapper::Size;
use captionlens_core::shared::observation::FrameObservations;
use captionlens_core::shared::settings::Settings;

/// Replays recorded text and face observations through the caption and
/// translation pipeline, printing each annotation snapshot as a JSON line.
#[derive(Parser)]
#[command(name = "caption-lens")]
struct Cli {
    /// JSON Lines file, one frame of observations per line.
    input: PathBuf,

    /// Settings file (defaults to the per-user settings location).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Source language code.
    #[arg(long)]
    source: Option<String>,

    /// Target language code.
    #[arg(long)]
    target: Option<String>,

    /// Phrase dictionary JSON used as the last translation stage.
    #[arg(long)]
    dictionary: Option<PathBuf>,

    /// Translation service endpoint (LibreTranslate-compatible).
    #[arg(long)]
    api_url: Option<String>,

    /// API key for the translation service.
    #[arg(long, env = "CAPTION_LENS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Viewport size as WIDTHxHEIGHT, e.g. 1920x1080.
    #[arg(long)]
    viewport: Option<String>,

    /// Seed for caption template selection.
    #[arg(long)]
    seed: Option<u64>,

    /// Face continuity: nearest, tracking or per-frame.
    #[arg(long)]
    continuity: Option<String>,

    /// Seconds before an unseen annotation is evicted.
    #[arg(long)]
    max_age_secs: Option<u64>,

    /// Translation worker threads.
    #[arg(long)]
    workers: Option<usize>,

    /// Known persons as comma-separated id=name pairs.
    #[arg(long, value_delimiter = ',')]
    person: Option<Vec<String>>,

    /// Logical milliseconds between consecutive frames in batch replay.
    #[arg(long, default_value = "33")]
    frame_interval_ms: u64,

    /// Replay in real time at this rate; late frames are dropped.
    #[arg(long)]
    fps: Option<f64>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let settings = build_settings(&cli)?;
    let pipeline = AnnotationPipeline::from_settings(&settings, cli.api_key.clone(), Vec::new())?
        .with_logger(Box::new(LogPipelineLogger::default()));
    for (id, name) in parse_persons(cli.person.as_deref().unwrap_or_default())? {
        pipeline.add_person(id, name);
    }
    log::info!(
        "replaying {} ({}, {} workers)",
        cli.input.display(),
        pipeline.language_pair(),
        settings.translation_workers
    );

    let frames = read_frames(&cli.input)?;
    match cli.fps {
        Some(fps) => replay_realtime(&pipeline, frames, fps),
        None => replay(&pipeline, frames, Duration::from_millis(cli.frame_interval_ms))?,
    }

    pipeline.flush();
    print_snapshot(&pipeline.snapshot())?;

    let stats = pipeline.stats();
    log::info!("final stats: {}", serde_json::to_string(&stats)?);
    log::info!("resolver: {:?}", pipeline.resolver_stats());
    pipeline.log_summary();
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if let Some(path) = &cli.settings {
        if !path.exists() {
            return Err(format!("Settings file not found: {}", path.display()).into());
        }
    }
    if let Some(viewport) = &cli.viewport {
        parse_viewport(viewport)?;
    }
    if let Some(continuity) = &cli.continuity {
        parse_continuity(continuity)?;
    }
    if let Some(fps) = cli.fps {
        if !(fps > 0.0 && fps.is_finite()) {
            return Err(format!("FPS must be positive, got {fps}").into());
        }
    }
    if cli.workers == Some(0) {
        return Err("Workers must be at least 1".into());
    }
    if cli.max_age_secs == Some(0) {
        return Err("Max age must be at least 1 second".into());
    }
    Ok(())
}

/// Settings file first, then command-line overrides.
fn build_settings(cli: &Cli) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.settings {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load(),
    };
    if let Some(source) = &cli.source {
        settings.source_language = source.clone();
    }
    if let Some(target) = &cli.target {
        settings.target_language = target.clone();
    }
    if let Some(path) = &cli.dictionary {
        settings.dictionary_path = Some(path.clone());
    }
    if let Some(url) = &cli.api_url {
        settings.api_url = Some(url.clone());
    }
    if let Some(viewport) = &cli.viewport {
        let size = parse_viewport(viewport)?;
        settings.viewport_width = size.width;
        settings.viewport_height = size.height;
    }
    if let Some(continuity) = &cli.continuity {
        settings.continuity = parse_continuity(continuity)?;
    }
    if cli.seed.is_some() {
        settings.seed = cli.seed;
    }
    if let Some(secs) = cli.max_age_secs {
        settings.max_age_secs = secs;
    }
    if let Some(workers) = cli.workers {
        settings.translation_workers = workers;
    }
    Ok(settings)
}

fn replay(
    pipeline: &AnnotationPipeline,
    frames: Vec<FrameObservations>,
    interval: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    for (i, frame) in frames.iter().enumerate() {
        let now = start + interval * i as u32;
        if pipeline.process_frame_at(frame, now) {
            print_snapshot(&pipeline.snapshot())?;
        }
    }
    Ok(())
}

/// Producer offers frames at `fps` through the frame gate; the consumer
/// processes whatever is newest when it gets to it.
fn replay_realtime(pipeline: &AnnotationPipeline, frames: Vec<FrameObservations>, fps: f64) {
    let (tx, rx) = frame_gate();
    let interval = Duration::from_secs_f64(1.0 / fps);

    std::thread::scope(|scope| {
        scope.spawn(move || {
            for frame in rx {
                if pipeline.process_frame(&frame) {
                    if let Err(e) = print_snapshot(&pipeline.snapshot()) {
                        log::warn!("failed to write snapshot: {e}");
                    }
                }
            }
        });

        for frame in frames {
            if !tx.offer(frame) {
                break;
            }
            std::thread::sleep(interval);
        }
        log::info!("{} frames dropped by the frame gate", tx.dropped());
        drop(tx);
    });
}

fn read_frames(path: &Path) -> Result<Vec<FrameObservations>, Box<dyn std::error::Error>> {
    let reader = BufReader::new(File::open(path)?);
    let mut frames = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: FrameObservations = serde_json::from_str(&line)
            .map_err(|e| format!("{}:{}: {e}", path.display(), i + 1))?;
        frames.push(frame);
    }
    Ok(frames)
}

fn print_snapshot(snapshot: &AnnotationSnapshot) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, snapshot)?;
    writeln!(stdout)?;
    Ok(())
}

fn parse_viewport(value: &str) -> Result<Size, Box<dyn std::error::Error>> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("Viewport must be WIDTHxHEIGHT, got {value}"))?;
    let width: f64 = w.trim().parse()?;
    let height: f64 = h.trim().parse()?;
    if width <= 0.0 || height <= 0.0 {
        return Err(format!("Viewport must be positive, got {value}").into());
    }
    Ok(Size::new(width, height))
}

fn parse_continuity(value: &str) -> Result<FaceContinuityPolicy, Box<dyn std::error::Error>> {
    match value {
        "nearest" => Ok(FaceContinuityPolicy::NearestBox),
        "tracking" => Ok(FaceContinuityPolicy::TrackingOnly),
        "per-frame" => Ok(FaceContinuityPolicy::PerFrame),
        other => Err(format!(
            "Continuity must be nearest, tracking or per-frame, got {other}"
        )
        .into()),
    }
}

fn parse_persons(pairs: &[String]) -> Result<Vec<(String, String)>, Box<dyn std::error::Error>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(id, name)| (id.trim().to_string(), name.trim().to_string()))
                .filter(|(id, name)| !id.is_empty() && !name.is_empty())
                .ok_or_else(|| -> Box<dyn std::error::Error> {
                    format!("Person must be id=name, got {pair}").into()
                })
        })
        .collect()
}

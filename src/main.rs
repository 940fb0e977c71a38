use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use loop_point_finder::api::video::LoopPointFinder;
use loop_point_finder::core::video::{SearchConfig, SearchResult};

#[derive(Parser, Debug)]
#[command(version)]
/// Find the loop point in the video.
struct Cli {
    /// Path to the video file (or a directory of frame images).
    video_path: PathBuf,

    /// Enable debug mode.
    #[arg(short, long)]
    debug: bool,

    /// The base frame index (0 and 1 both mean the first frame).
    #[arg(short, long, visible_alias = "bf", default_value_t = 0)]
    base_frame: u64,

    /// The number of frames to skip from the base frame.
    #[arg(short, long, visible_alias = "sf", default_value_t = 60)]
    skip_frames: u64,

    /// The similarity threshold.
    #[arg(short = 't', long, visible_alias = "st", default_value_t = 0.95)]
    similarity_threshold: f64,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn to_config(&self) -> SearchConfig {
        SearchConfig::new(&self.video_path)
            .with_base_frame(self.base_frame)
            .with_skip_frames(self.skip_frames)
            .with_threshold(self.similarity_threshold)
            .with_debug(self.debug)
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    loop_point_finder::init_logging_with_level(level);

    if cli.debug {
        println!("Video Path: {}", cli.video_path.display());
        println!();
        println!("* Params");
        println!("Base frame index      : {}", cli.base_frame);
        println!("Skip frames           : {}", cli.skip_frames);
        println!("Similarity Threshold  : {}", cli.similarity_threshold);
        println!();
    }

    if !cli.video_path.exists() {
        eprintln!("Error: file not found: {}.", cli.video_path.display());
        return Ok(ExitCode::FAILURE);
    }

    let result = LoopPointFinder::new(cli.to_config()).search();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(exit_code(&result));
    }

    match &result {
        SearchResult::Failure { message } => eprintln!("Error: {}", message),
        SearchResult::Success { matched: Some(idx) } => println!("Similar frame: {}", idx),
        SearchResult::Success { matched: None } => println!("No similar frame found."),
    }

    Ok(exit_code(&result))
}

fn exit_code(result: &SearchResult) -> ExitCode {
    if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

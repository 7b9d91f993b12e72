use clap::{Parser as _, ValueEnum};
use m3u8_stream::{
    Manifest, ParseOptions, Parser, hls::StreamInfo, stream::source::DEFAULT_CHUNK_SIZE,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

#[derive(clap::Parser)]
#[command(name = "m3u8-stream")]
#[command(author, version, about = "Parse an HLS playlist and print the manifest")]
struct Cli {
    /// Playlist file, or `-` for stdin
    input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Bytes pushed into the parser at a time
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// URI the playlist was fetched from (used by EXT-X-DEFINE QUERYPARAM)
    #[arg(long)]
    uri: Option<Url>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "m3u8_stream=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut options = ParseOptions::new();
    if let Some(uri) = cli.uri {
        options = options.with_uri(uri);
    }

    let mut parser = Parser::with_options(options);
    if cli.input.as_os_str() == "-" {
        parser.read_from(tokio::io::stdin(), cli.chunk_size).await?;
    } else {
        let file = tokio::fs::File::open(&cli.input).await?;
        parser.read_from(file, cli.chunk_size).await?;
    }
    parser.end();

    match cli.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(parser.manifest())?),
        Format::Text => print_summary(parser.manifest()),
    }

    Ok(())
}

fn print_summary(manifest: &Manifest) {
    if manifest.is_master_playlist() {
        println!("Master playlist");
        for variant in &manifest.playlists {
            let info = StreamInfo::from_attributes(&variant.attributes);
            let mut line = format!("  {}", variant.uri);
            if let Some(bandwidth) = info.bandwidth {
                line.push_str(&format!(" bandwidth={}", bandwidth));
            }
            if let Some((width, height)) = info.resolution {
                line.push_str(&format!(" resolution={}x{}", width, height));
            }
            if let Some(codecs) = &info.codecs {
                line.push_str(&format!(" codecs={}", codecs));
            }
            println!("{}", line);
        }
        for iframe in &manifest.i_frame_playlists {
            println!("  {} (i-frame)", iframe.uri);
        }
        for (media_type, groups) in &manifest.media_groups {
            for (group_id, renditions) in groups {
                for name in renditions.keys() {
                    println!("  {} group={} name={}", media_type, group_id, name);
                }
            }
        }
        return;
    }

    println!("Media playlist");
    if let Some(version) = manifest.version {
        println!("  version: {}", version);
    }
    if let Some(target) = manifest.target_duration {
        println!("  target duration: {}s", target);
    }
    println!("  media sequence: {}", manifest.media_sequence);
    println!(
        "  segments: {} ({:.3}s)",
        manifest.segments.len(),
        manifest.total_duration()
    );
    println!("  ended: {}", manifest.end_list);

    for segment in &manifest.segments {
        let mut line = format!("  {:>8.3}s {}", segment.duration, segment.uri);
        if let Some(br) = &segment.byterange {
            line.push_str(&format!(" [{}]", br));
        }
        if segment.is_encrypted() {
            line.push_str(" (encrypted)");
        }
        if segment.discontinuity {
            line.push_str(" (discontinuity)");
        }
        println!("{}", line);
    }

    if let Some(preload) = &manifest.preload_segment {
        println!(
            "  preload: {} parts, {} hints",
            preload.parts.len(),
            preload.preload_hints.len()
        );
    }
}

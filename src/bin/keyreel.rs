use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "keyreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render one loop of the active composition as numbered PNGs.
    Frames(FramesArgs),
    /// Print a summary of the project.
    Info(InfoArgs),
}

#[derive(Parser, Debug)]
struct SourceArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory holding `<object id>.png|jpg` stills (defaults to the project's directory).
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Skip video and sound objects.
    #[arg(long, default_value_t = false)]
    skip_media: bool,

    /// TrueType/OpenType font for text objects; repeatable, the first is the fallback.
    #[arg(long = "font")]
    fonts: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Time in milliseconds.
    #[arg(long)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct FramesArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Frames per second.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Output directory.
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Frames(args) => cmd_frames(args),
        Command::Info(args) => cmd_info(args),
    }
}

fn open_session(
    source: &SourceArgs,
) -> anyhow::Result<(keyreel::RenderSession, keyreel::DirMediaProvider)> {
    let project = keyreel::Project::from_path(&source.in_path)?;
    let assets_root = match &source.assets {
        Some(dir) => dir.clone(),
        None => source
            .in_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
    };

    let opts = keyreel::RenderSessionOpts::default().with_media_skip(source.skip_media);
    Ok((
        keyreel::RenderSession::new(project, opts),
        keyreel::DirMediaProvider::new(assets_root),
    ))
}

fn create_surface(
    sess: &keyreel::RenderSession,
    source: &SourceArgs,
) -> anyhow::Result<keyreel::CpuSurface> {
    let mut surface = sess.create_cpu_surface()?;
    for path in &source.fonts {
        let family = surface
            .register_font_file(path)
            .with_context(|| format!("load font '{}'", path.display()))?;
        tracing::info!(family = %family, path = %path.display(), "font loaded");
    }
    Ok(surface)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (mut sess, mut media) = open_session(&args.source)?;
    let mut surface = create_surface(&sess, &args.source)?;
    sess.render_frame(&mut surface, &mut media, args.time)?;
    write_png(&args.out, surface.finish()?)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.fps > 0, "--fps must be > 0");
    let (mut sess, mut media) = open_session(&args.source)?;
    let duration = sess.project().active().duration;
    let step = 1000.0 / f64::from(args.fps);

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let mut surface = create_surface(&sess, &args.source)?;
    let mut index: u64 = 0;
    loop {
        let time = index as f64 * step;
        if time >= duration {
            break;
        }
        sess.render_frame(&mut surface, &mut media, time)?;
        let out = args.out_dir.join(format!("frame_{index:05}.png"));
        write_png(&out, surface.finish()?)?;
        index += 1;
    }

    eprintln!("wrote {index} frame(s) to {}", args.out_dir.display());
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let project = keyreel::Project::from_path(&args.in_path)?;
    println!(
        "canvas {}x{}, active composition {}, loops {}",
        project.canvas.width,
        project.canvas.height,
        project.active,
        if project.loops == 0 {
            "infinite".to_owned()
        } else {
            project.loops.to_string()
        }
    );
    for (i, comp) in project.compositions.iter().enumerate() {
        println!(
            "composition {i}: {} ms, aspect {:.3}, {} object(s)",
            comp.duration,
            comp.aspect,
            comp.objects.len()
        );
        for o in &comp.objects {
            println!(
                "  {:<12} {:<24} [{}, {}){}",
                o.kind.name(),
                o.id,
                o.start,
                o.stop,
                if o.is_fullscreen { " fullscreen" } else { "" }
            );
        }
    }

    let tracker = keyreel::MediaTracker::for_project(&project);
    println!("media objects: {}", tracker.to_load());
    Ok(())
}

fn write_png(path: &Path, frame: keyreel::FrameRgba) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    let frame = frame.into_straight();
    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

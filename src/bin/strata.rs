use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "strata", version)]
struct Cli {
    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the generated WGSL of every pass program.
    Shaders(ShadersArgs),
    /// Bring up a backend and report the init status.
    Init(InitArgs),
    /// Parse a layer list and report the pass plan and resolved params.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct ShadersArgs {
    /// Only this shader type (e.g. `halftone`, `progressive-blur`).
    #[arg(long)]
    shader: Option<String>,
}

#[derive(Parser, Debug)]
struct InitArgs {
    #[arg(long, value_enum, default_value_t = BackendChoice::Cpu)]
    backend: BackendChoice,

    #[arg(long, default_value_t = 64)]
    width: u32,

    #[arg(long, default_value_t = 64)]
    height: u32,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Layer descriptor list (JSON array).
    layers: PathBuf,

    /// Pipeline options JSON.
    #[arg(long)]
    opts: Option<PathBuf>,

    /// Render one CPU frame over a mid-gray base and write it as PNG.
    #[arg(long)]
    preview: Option<PathBuf>,

    #[arg(long, default_value_t = 256)]
    width: u32,

    #[arg(long, default_value_t = 256)]
    height: u32,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    Cpu,
    Gpu,
}

impl From<BackendChoice> for strata::BackendKind {
    fn from(choice: BackendChoice) -> Self {
        match choice {
            BackendChoice::Cpu => strata::BackendKind::Cpu,
            BackendChoice::Gpu => strata::BackendKind::Gpu,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Shaders(args) => cmd_shaders(args),
        Command::Init(args) => cmd_init(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "strata=debug" } else { "strata=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_shaders(args: ShadersArgs) -> anyhow::Result<()> {
    let types: Vec<strata::ShaderType> = match &args.shader {
        Some(name) => vec![
            strata::ShaderType::parse(name)
                .with_context(|| format!("unknown shader type '{name}'"))?,
        ],
        None => strata::ShaderType::BUILTIN.to_vec(),
    };
    let opts = strata::PipelineOpts::default();
    for ty in types {
        let layer = strata::LayerDescriptor::new(ty.name(), ty);
        let pass = strata::create_pass(&layer, &opts);
        for program in pass.programs() {
            println!(
                "// ---- {} / {} ({} instrs, {} inputs)",
                ty.name(),
                program.label(),
                program.instr_count(),
                program.input_slots()
            );
            println!("{}", strata::emit_wgsl(program));
        }
    }
    Ok(())
}

fn cmd_init(args: InitArgs) -> anyhow::Result<()> {
    let opts = strata::PipelineOpts::default().with_env_overrides();
    let mut compositor = strata::Compositor::new(opts);
    compositor.resize(args.width, args.height);
    let status = pollster::block_on(compositor.init(args.backend.into()));
    println!("status: {status:?}");
    if let Some(detail) = compositor.last_error() {
        println!("error: {detail}");
    }
    if status != strata::InitStatus::Ready {
        return Ok(());
    }
    compositor.render(0.0, 0.0);
    if let Some(manager) = compositor.manager() {
        let stats = manager.device_stats();
        println!(
            "frame ok: {} draws, {} live textures, {} texture bytes",
            stats.draws, stats.live_textures, stats.texture_bytes
        );
    }
    compositor.dispose();
    Ok(())
}

fn read_opts(path: Option<&Path>) -> anyhow::Result<strata::PipelineOpts> {
    let opts = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("read options '{}'", path.display()))?;
            strata::PipelineOpts::from_json_str(&json)?
        }
        None => strata::PipelineOpts::default(),
    };
    Ok(opts.with_env_overrides())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(&args.layers)
        .with_context(|| format!("read layers '{}'", args.layers.display()))?;
    let layers = strata::parse_layers_json(&json)?;
    let opts = read_opts(args.opts.as_deref())?;

    for (i, layer) in layers.iter().enumerate() {
        println!(
            "{i}: {} [{}] visible={} opacity={} blend={:?} filter={:?}",
            layer.id,
            layer.shader_type.name(),
            layer.visible,
            layer.opacity,
            layer.blend_mode,
            layer.filter_mode
        );
        let specs = strata::param_specs(layer.shader_type);
        for param in &layer.params {
            match strata::find_spec(specs, &param.key) {
                None => println!("    {} ignored (unknown key)", param.key),
                Some(spec) => match spec.resolve(param) {
                    Some(v) => println!("    {} = {:?}", param.key, &v[..spec.width()]),
                    None => println!("    {} unusable value {:?}", param.key, param.value),
                },
            }
        }
    }

    if let Some(out) = &args.preview {
        write_preview(&layers, opts, args.width, args.height, out)?;
        eprintln!("wrote {}", out.display());
    }
    Ok(())
}

fn write_preview(
    layers: &[strata::LayerDescriptor],
    opts: strata::PipelineOpts,
    width: u32,
    height: u32,
    out: &Path,
) -> anyhow::Result<()> {
    let mut manager =
        strata::PipelineManager::new(Box::new(strata::CpuDevice::default()), opts)?;
    manager.init(width, height)?;
    manager.set_media(&strata::MediaImage::solid(width, height, [128, 128, 128, 255]))?;
    manager.sync_layers(layers)?;
    let report = manager.render(0.0, 1.0 / 60.0)?;
    if report.passes_failed > 0 {
        eprintln!("{} pass(es) failed and were skipped", report.passes_failed);
    }
    let texels = manager.read_surface()?;
    let bytes: Vec<u8> = texels
        .iter()
        .flat_map(|t| t.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
        .collect();
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        out,
        &bytes,
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", out.display()))?;
    manager.dispose();
    Ok(())
}

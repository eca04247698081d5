use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "dnavatar", version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Config JSON. Flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory image URLs are resolved against.
    #[arg(long, global = true)]
    assets: Option<PathBuf>,

    /// Descriptor catalog JSON.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Recent-subjects store JSON.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Draw one avatar as a PNG.
    Draw(DrawArgs),
    /// Inspect or edit the recently viewed users.
    Recent {
        #[command(subcommand)]
        cmd: RecentCommand,
    },
    /// Draw the avatar of every recently viewed user.
    Sidebar(SidebarArgs),
}

#[derive(Args, Debug)]
struct DrawArgs {
    /// DNA string to draw.
    #[arg(long, conflicts_with = "user", required_unless_present = "user")]
    dna: Option<String>,

    /// User id to draw.
    #[arg(long)]
    user: Option<String>,

    /// Display name recorded with a user visit (defaults to the id).
    #[arg(long, requires = "user")]
    name: Option<String>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Subcommand, Debug)]
enum RecentCommand {
    /// Print recent users, most recent first.
    List,
    /// Record a visit without drawing.
    Add { id: String, name: String },
}

#[derive(Args, Debug)]
struct SidebarArgs {
    /// Directory receiving `<id>.png` per recent user.
    #[arg(long)]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let cfg = resolve_config(&cli.global)?;
    match cli.cmd {
        Command::Draw(args) => cmd_draw(&cfg, args),
        Command::Recent { cmd } => cmd_recent(&cfg, cmd),
        Command::Sidebar(args) => cmd_sidebar(&cfg, args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(args: &GlobalArgs) -> anyhow::Result<dnavatar::AvatarConfig> {
    let mut cfg = match &args.config {
        Some(path) => dnavatar::AvatarConfig::load(path)?,
        None => dnavatar::AvatarConfig::default(),
    };
    if let Some(assets) = &args.assets {
        cfg.assets_root = assets.clone();
    }
    if let Some(catalog) = &args.catalog {
        cfg.catalog = Some(catalog.clone());
    }
    if let Some(store) = &args.store {
        cfg.recent_store = Some(store.clone());
    }
    cfg.validate()?;
    Ok(cfg)
}

fn open_recent(
    cfg: &dnavatar::AvatarConfig,
) -> anyhow::Result<dnavatar::RecentSubjects<dnavatar::JsonFileStore>> {
    let store = dnavatar::JsonFileStore::open(cfg.recent_store_path())?;
    Ok(dnavatar::RecentSubjects::with_capacity(
        store,
        cfg.recent_capacity,
    )?)
}

fn load_catalog(cfg: &dnavatar::AvatarConfig) -> anyhow::Result<dnavatar::CatalogDescriptorSource> {
    let path = cfg
        .catalog
        .as_deref()
        .context("no descriptor catalog configured (use --catalog)")?;
    Ok(dnavatar::CatalogDescriptorSource::load(path)?)
}

fn draw_to_png(
    compositor: &dnavatar::AvatarCompositor<'_>,
    subject: &dnavatar::Subject,
    out: &Path,
) -> anyhow::Result<dnavatar::DrawOutcome> {
    let mut surface = compositor.new_surface();
    let outcome = pollster::block_on(compositor.draw_avatar(subject, &mut surface))
        .with_context(|| format!("draw {subject}"))?;

    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    surface
        .to_rgba_image()
        .save_with_format(out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", out.display()))?;
    Ok(outcome)
}

fn describe(outcome: &dnavatar::DrawOutcome) -> String {
    match outcome {
        dnavatar::DrawOutcome::Rendered {
            layers_drawn,
            layers_missing: 0,
        } => format!("rendered {layers_drawn} layers"),
        dnavatar::DrawOutcome::Rendered {
            layers_drawn,
            layers_missing,
        } => format!("rendered {layers_drawn} layers ({layers_missing} missing)"),
        dnavatar::DrawOutcome::Placeholder { part, reason } => {
            format!("placeholder ({part}: {reason})")
        }
        dnavatar::DrawOutcome::Cancelled => "cancelled".to_string(),
    }
}

fn cmd_draw(cfg: &dnavatar::AvatarConfig, args: DrawArgs) -> anyhow::Result<()> {
    let catalog = load_catalog(cfg)?;
    let loader = dnavatar::FsImageLoader::new(&cfg.assets_root);
    let compositor =
        dnavatar::AvatarCompositor::new(&catalog, &loader, cfg.compositor_settings()?);

    let subject = match (args.dna, &args.user) {
        (Some(dna), _) => dnavatar::Subject::Dna(dna),
        (None, Some(user)) => dnavatar::Subject::User(user.clone()),
        (None, None) => anyhow::bail!("either --dna or --user is required"),
    };

    let outcome = draw_to_png(&compositor, &subject, &args.out)?;

    if let Some(user) = &args.user {
        let name = args.name.as_deref().unwrap_or(user);
        open_recent(cfg)?.record_visit(user, name)?;
    }

    eprintln!("wrote {} [{}]", args.out.display(), describe(&outcome));
    Ok(())
}

fn cmd_recent(cfg: &dnavatar::AvatarConfig, cmd: RecentCommand) -> anyhow::Result<()> {
    let mut recent = open_recent(cfg)?;
    match cmd {
        RecentCommand::List => {
            for entry in recent.list_recent()? {
                println!("{}\t{}", entry.subject_id, entry.display_name);
            }
        }
        RecentCommand::Add { id, name } => {
            recent.record_visit(&id, &name)?;
        }
    }
    Ok(())
}

fn cmd_sidebar(cfg: &dnavatar::AvatarConfig, args: SidebarArgs) -> anyhow::Result<()> {
    let catalog = load_catalog(cfg)?;
    let loader = dnavatar::FsImageLoader::new(&cfg.assets_root);
    let compositor =
        dnavatar::AvatarCompositor::new(&catalog, &loader, cfg.compositor_settings()?);

    for entry in open_recent(cfg)?.list_recent()? {
        let out = args.out_dir.join(format!("{}.png", sanitize_file_stem(&entry.subject_id)));
        let subject = dnavatar::Subject::User(entry.subject_id.clone());
        let outcome = match draw_to_png(&compositor, &subject, &out) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(subject = %subject, "skipping sidebar entry: {err:#}");
                continue;
            }
        };
        eprintln!(
            "{} ({}) -> {} [{}]",
            entry.subject_id,
            entry.display_name,
            out.display(),
            describe(&outcome)
        );
    }
    Ok(())
}

/// Map a subject id to a file stem. ASCII alphanumerics and `-` pass through and every
/// other byte becomes `_XX`, so distinct ids never share a file.
fn sanitize_file_stem(id: &str) -> String {
    if id.is_empty() {
        return "_".to_string();
    }
    let mut stem = String::with_capacity(id.len());
    for b in id.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' {
            stem.push(char::from(b));
        } else {
            stem.push_str(&format!("_{b:02x}"));
        }
    }
    stem
}

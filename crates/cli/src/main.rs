//! certgen: generate certificates with QR verification codes

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use pipeline::{
    certificate_file_name, write_single_with, BatchPipeline, CollisionPolicy, Dataset,
    PipelineConfig, PreviewPipeline, Progress,
};
use std::path::{Path, PathBuf};
use template::{AssetSet, CertificateRecord, QrStyle, Renderer, TemplateId, MIN_QR_SIZE_PX};

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate certificates with QR verification codes")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Module style of the verification code (square or rounded)
    #[arg(long, global = true, value_parser = parse_qr_style)]
    qr_style: Option<QrStyle>,

    /// Pixel size of the verification code image
    #[arg(
        long,
        global = true,
        value_parser = clap::value_parser!(u32).range(MIN_QR_SIZE_PX as i64..)
    )]
    qr_size: Option<u32>,

    /// Directory searched first for preview fonts
    #[arg(long, global = true)]
    font_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one certificate
    Single {
        #[command(flatten)]
        record: RecordArgs,

        #[command(flatten)]
        assets: AssetArgs,

        /// Output file (defaults to Certificate_<name>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render one certificate per row of a JSON dataset
    Batch {
        /// Template name or id
        #[arg(short, long, value_parser = parse_template)]
        template: TemplateId,

        /// JSON array of rows with Name, Course, Date and optional Description
        #[arg(short, long)]
        data: PathBuf,

        /// Output directory, created if missing
        #[arg(short, long)]
        output_dir: PathBuf,

        #[command(flatten)]
        assets: AssetArgs,

        /// Worker threads (defaults to available parallelism)
        #[arg(long)]
        workers: Option<usize>,

        /// What to do when two rows share a file name (overwrite or suffix)
        #[arg(long, value_parser = parse_collision_policy)]
        collision: Option<CollisionPolicy>,
    },
    /// Render one certificate as a PNG image
    Preview {
        #[command(flatten)]
        record: RecordArgs,

        #[command(flatten)]
        assets: AssetArgs,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,

        /// Scale relative to the base resolution (0.5 to 2.0)
        #[arg(long, default_value = "1.0")]
        zoom: f32,

        /// Base resolution in dots per inch
        #[arg(long, value_parser = parse_dpi)]
        dpi: Option<f32>,
    },
    /// List the built-in templates
    Templates,
}

#[derive(Args, Debug)]
struct RecordArgs {
    /// Template name or id
    #[arg(short, long, value_parser = parse_template)]
    template: TemplateId,

    /// Recipient name
    #[arg(short, long)]
    name: String,

    /// Course, program or workshop title
    #[arg(short, long)]
    course: String,

    /// Completion date (YYYY-MM-DD)
    #[arg(short, long)]
    date: String,

    /// Extra text for the body paragraph
    #[arg(long)]
    description: Option<String>,
}

impl RecordArgs {
    fn record(&self) -> Result<CertificateRecord> {
        CertificateRecord::new(
            &self.name,
            &self.course,
            &self.date,
            self.description.as_deref(),
        )
        .context("invalid certificate data")
    }
}

#[derive(Args, Debug)]
struct AssetArgs {
    /// Logo image (PNG or JPEG)
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Signature image (PNG or JPEG)
    #[arg(long)]
    signature: Option<PathBuf>,
}

impl AssetArgs {
    fn load(&self, config: &PipelineConfig) -> AssetSet {
        AssetSet::load(
            self.logo.as_deref(),
            self.signature.as_deref(),
            config.decode_timeout(),
        )
    }
}

fn parse_template(s: &str) -> Result<TemplateId, String> {
    s.parse::<TemplateId>().map_err(|_| {
        let known: Vec<_> = TemplateId::ALL.iter().map(|t| t.id()).collect();
        format!("unknown template '{s}' (expected one of: {})", known.join(", "))
    })
}

fn parse_qr_style(s: &str) -> Result<QrStyle, String> {
    match s {
        "square" => Ok(QrStyle::Square),
        "rounded" => Ok(QrStyle::Rounded),
        _ => Err(format!("unknown QR style '{s}' (expected square or rounded)")),
    }
}

fn parse_dpi(s: &str) -> Result<f32, String> {
    match s.parse::<f32>() {
        Ok(dpi) if dpi.is_finite() && dpi > 0.0 => Ok(dpi),
        _ => Err(format!("invalid DPI '{s}' (expected a positive number)")),
    }
}

fn parse_collision_policy(s: &str) -> Result<CollisionPolicy, String> {
    match s {
        "overwrite" => Ok(CollisionPolicy::Overwrite),
        "suffix" => Ok(CollisionPolicy::Suffix),
        _ => Err(format!("unknown collision policy '{s}' (expected overwrite or suffix)")),
    }
}

/// Configuration file, if any, with global flags applied on top
fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(style) = cli.qr_style {
        config.qr_style = style;
    }
    if let Some(size) = cli.qr_size {
        config.qr_size_px = size;
    }
    if let Some(dir) = &cli.font_dir {
        config.font_dir = Some(dir.clone());
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn run_single(
    config: &PipelineConfig,
    record: &RecordArgs,
    assets: &AssetArgs,
    output: Option<&Path>,
) -> Result<()> {
    let certificate = record.record()?;
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(certificate_file_name(certificate.name())));
    let renderer = Renderer::new().with_options(config.render_options());
    write_single_with(
        &renderer,
        record.template,
        &certificate,
        &assets.load(config),
        &path,
    )
    .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Certificate saved to {}", path.display());
    Ok(())
}

fn run_batch(
    config: &PipelineConfig,
    template: TemplateId,
    data: &Path,
    output_dir: &Path,
    assets: &AssetArgs,
) -> Result<()> {
    let dataset = Dataset::from_path(data)
        .with_context(|| format!("failed to load dataset {}", data.display()))?;
    let assets = assets.load(config);
    let report = |p: &Progress| {
        log::info!("[{}/{}] {}", p.completed, p.total, p.name);
    };

    let summary = BatchPipeline::new(config)
        .run(&dataset, template, &assets, Some(output_dir), &report)
        .context("batch failed")?;

    for failure in &summary.failures {
        eprintln!("row {} ({}): {}", failure.index + 1, failure.name, failure.error);
    }
    println!("{summary}");
    if summary.cancelled {
        bail!("batch cancelled after {} of {} records", summary.completed, summary.total);
    }
    Ok(())
}

fn run_preview(
    config: &PipelineConfig,
    record: &RecordArgs,
    assets: &AssetArgs,
    output: &Path,
    zoom: f32,
) -> Result<()> {
    let certificate = record.record()?;
    let preview = PreviewPipeline::new(config)
        .preview(record.template, &certificate, &assets.load(config), zoom)
        .context("failed to render preview")?;
    preview
        .image
        .save(output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "Preview saved to {} ({}x{})",
        output.display(),
        preview.width,
        preview.height
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let cli = Cli::parse();
    let mut config = load_config(&cli)?;

    match &cli.command {
        Command::Single {
            record,
            assets,
            output,
        } => run_single(&config, record, assets, output.as_deref()),
        Command::Batch {
            template,
            data,
            output_dir,
            assets,
            workers,
            collision,
        } => {
            if workers.is_some() {
                config.workers = *workers;
            }
            if let Some(policy) = collision {
                config.collision_policy = *policy;
            }
            run_batch(&config, *template, data, output_dir, assets)
        }
        Command::Preview {
            record,
            assets,
            output,
            zoom,
            dpi,
        } => {
            if let Some(dpi) = dpi {
                config.preview_dpi = *dpi;
            }
            run_preview(&config, record, assets, output, *zoom)
        }
        Command::Templates => {
            for template in TemplateId::ALL {
                let size = template.page_size();
                let orientation = if size.is_landscape() {
                    "landscape"
                } else {
                    "portrait"
                };
                println!("{:<24} {:<22} A4 {orientation}", template.id(), template.display_name());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_batch_arguments() {
        let cli = Cli::try_parse_from([
            "certgen",
            "batch",
            "--template",
            "academic-diploma",
            "--data",
            "rows.json",
            "--output-dir",
            "out",
            "--collision",
            "suffix",
            "--qr-style",
            "square",
        ])
        .unwrap();
        assert_eq!(cli.qr_style, Some(QrStyle::Square));
        match cli.command {
            Command::Batch {
                template,
                collision,
                ..
            } => {
                assert_eq!(template, TemplateId::AcademicDiploma);
                assert_eq!(collision, Some(CollisionPolicy::Suffix));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_template_is_rejected() {
        let result = Cli::try_parse_from([
            "certgen", "single", "-t", "fancy", "-n", "A", "-c", "B", "-d", "2024-01-01",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from(["certgen", "--qr-size", "300", "templates"]).unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.qr_size_px, 300);
        assert_eq!(config.qr_style, QrStyle::Rounded);
    }

    #[test]
    fn test_undersized_qr_flag_is_rejected() {
        assert!(Cli::try_parse_from(["certgen", "--qr-size", "0", "templates"]).is_err());
        assert!(Cli::try_parse_from(["certgen", "--qr-size", "40", "templates"]).is_err());
    }

    #[test]
    fn test_dpi_flag_must_be_positive() {
        let preview = |dpi: &str| {
            Cli::try_parse_from([
                "certgen", "preview", "-t", "classic-elegance", "-n", "A", "-c", "B", "-d",
                "2024-01-01", "-o", "a.png", "--dpi", dpi,
            ])
        };
        assert!(preview("0").is_err());
        assert!(preview("-10").is_err());
        assert!(preview("NaN").is_err());
        assert!(preview("150").is_ok());
    }
}

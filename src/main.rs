use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use photoshelf::output::{self, ListedObject, UploadOutcome};
use photoshelf::storage::LocalDrive;
use photoshelf::{ImageManager, ManagerError, RangeLimit, config};
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "photoshelf")]
#[command(about = "Date-partitioned image storage with on-demand thumbnails")]
#[command(long_about = "\
Date-partitioned image storage with on-demand thumbnails

Uploads are filed under the day they were taken:

  photoshelf-data/
  ├── 2023/05/01/IMG_0042.jpg              # original
  └── .thumbnail/2023/05/01/IMG_0042.jpg   # JPEG thumbnail (bounded box)

Capture date resolution (first available wins):
  EXIF DateTime → DateTimeOriginal → DateTimeDigitized → IFD1 DateTime
  → --date \"YYYY:MM:DD HH:MM:SS\" → current local time

Uploads and deletes run on background workers; the command waits for them
to finish before exiting. Set RUST_LOG=debug to see each action.

Run 'photoshelf gen-config' to generate a documented photoshelf.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Storage root directory (overrides storage.root from the config)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// File local images under their capture date
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Fallback capture time when an image has no usable metadata
        #[arg(long, value_name = "YYYY:MM:DD HH:MM:SS")]
        date: Option<String>,
    },
    /// Fetch a stored original
    Get {
        path: String,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Fetch the thumbnail of a stored original, generating it if missing
    Thumbnail {
        path: String,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Delete stored objects
    Delete {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// List stored originals day by day
    List {
        /// First day to list (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,
        /// Last day to list, inclusive (default: today)
        #[arg(long, conflicts_with = "unbounded")]
        to: Option<NaiveDate>,
        /// Walk past today until --limit images are found or --max-days have been scanned
        #[arg(long, requires = "limit")]
        unbounded: bool,
        /// Stop after this many images
        #[arg(long)]
        limit: Option<usize>,
        /// Days after --from an --unbounded walk may scan
        #[arg(long, default_value_t = 36_500)]
        max_days: u64,
        /// Print JSON instead of a tree
        #[arg(long)]
        json: bool,
    },
    /// Print a stock photoshelf.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing()?;

    match &cli.command {
        Command::Upload { files, date } => {
            let manager = open_manager(&cli)?;
            let outcomes: Vec<UploadOutcome> = files
                .par_iter()
                .map(|file| upload_file(&manager, file, date.as_deref()))
                .collect();
            // Waits for every queued upload before printing.
            manager.shutdown();
            output::print_upload_results(&outcomes);

            let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
            if failed > 0 {
                return Err(format!("{failed} of {} uploads failed", outcomes.len()).into());
            }
        }
        Command::Get { path, out } => {
            let manager = open_manager(&cli)?;
            let image = manager.get_img(path)?;
            write_image(image, out.as_deref())?;
        }
        Command::Thumbnail { path, out } => {
            let manager = open_manager(&cli)?;
            let image = manager.get_thumbnail(path)?;
            write_image(image, out.as_deref())?;
        }
        Command::Delete { paths } => {
            let manager = open_manager(&cli)?;
            manager.delete_img(paths.as_slice());
            let queued = paths.iter().filter(|p| !p.is_empty()).count();
            manager.shutdown();
            println!("{}", output::format_delete_summary(paths.len(), queued));
        }
        Command::List {
            from,
            to,
            unbounded,
            limit,
            max_days,
            json,
        } => {
            let manager = open_manager(&cli)?;
            let range = if *unbounded {
                RangeLimit::days_after(*from, *max_days)
            } else {
                RangeLimit::Through(to.unwrap_or_else(|| chrono::Local::now().date_naive()))
            };

            let objects: Vec<ListedObject> = manager
                .collect_range(*from, range, *limit)?
                .into_iter()
                .map(|(path, size)| ListedObject { path, size })
                .collect();

            if *json {
                println!("{}", output::format_listing_json(&objects)?);
            } else {
                output::print_listing(&objects);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the `info` default.
fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(io::stderr))
        .with(env_filter)
        .try_init()?;
    Ok(())
}

/// Load config and start a manager backed by a local drive.
fn open_manager(cli: &Cli) -> Result<ImageManager, Box<dyn std::error::Error>> {
    let config = config::load_config(&cli.config)?;
    let root = cli
        .root
        .clone()
        .unwrap_or_else(|| config.effective().storage_root);
    let manager = ImageManager::new(&config)?;
    manager.set_drive(Arc::new(LocalDrive::new(root)));
    Ok(manager)
}

fn upload_file(manager: &ImageManager, file: &Path, date: Option<&str>) -> UploadOutcome {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let result = File::open(file)
        .map_err(ManagerError::from)
        .and_then(|f| manager.upload_img(f, &name, date))
        .map_err(|e| e.to_string());
    UploadOutcome {
        file: file.display().to_string(),
        result,
    }
}

fn write_image(mut image: photoshelf::Image, out: Option<&Path>) -> io::Result<()> {
    match out {
        Some(dest) => {
            let mut file = File::create(dest)?;
            io::copy(&mut image, &mut file)?;
            println!("{}", output::format_fetched(&image.path, image.size, dest));
        }
        None => {
            let mut stdout = io::stdout().lock();
            io::copy(&mut image, &mut stdout)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use thiserror::Error;

use labelai::adapter::{TASKS, models_for_task};
use labelai::config::{AppConfig, ConfigError};
use labelai::constants::DEFAULT_RECENT_PROJECTS;
use labelai::format::{ExportResult, FormatError, MaskSource, export_annotations, export_masks};
use labelai::model::ClassMap;
use labelai::project::{Project, ProjectError, ProjectManager};

/// Annotation project manager and dataset exporter.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export a project's annotations for a model
    Export {
        /// Project directory
        #[arg(short, long)]
        project: PathBuf,
        /// Output directory (defaults to the configured export folder)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Model name or format id (e.g. "YOLOv8", "coco")
        #[arg(short, long)]
        model: String,
        /// Name of the exported dataset directory
        #[arg(short, long)]
        name: Option<String>,
        /// Ordered class labels, overriding the project's
        #[arg(long, value_delimiter = ',')]
        labels: Vec<String>,
    },
    /// Write one PNG class mask per annotated image
    Masks {
        #[arg(short, long)]
        project: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_delimiter = ',')]
        labels: Vec<String>,
    },
    /// List annotation tasks and their models
    Models,
    /// Create a new project
    New {
        name: String,
        #[arg(short, long)]
        goal: String,
        #[arg(short, long)]
        model: String,
    },
    /// List projects
    Projects {
        /// Show the most recently modified projects first
        #[arg(long)]
        recent: bool,
        /// Number of recent projects to show
        #[arg(long, requires = "recent")]
        limit: Option<usize>,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error("No output directory given and no export folder configured")]
    NoOutputDir,
}

fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => AppConfig::load(path),
        None => Ok(AppConfig::load_from_default_path().unwrap_or_else(AppConfig::new)),
    }
}

fn init_logging(config: &AppConfig, verbose: u8) {
    let mut level = config.preferences.log_level;
    for _ in 0..verbose {
        level = level.more_verbose();
    }
    env_logger::Builder::new()
        .filter_level(level.to_level_filter())
        .parse_default_env()
        .init();
}

fn output_dir(config: &AppConfig, output: Option<PathBuf>) -> Result<PathBuf, CliError> {
    match output {
        Some(dir) => Ok(dir),
        None if !config.preferences.export_folder.is_empty() => {
            Ok(PathBuf::from(&config.preferences.export_folder))
        }
        None => Err(CliError::NoOutputDir),
    }
}

fn class_map(project: &Project, labels: Vec<String>) -> ClassMap {
    if labels.is_empty() {
        project.class_map()
    } else {
        ClassMap::from_labels(labels)
    }
}

fn print_result(result: &ExportResult) {
    for warning in result.warning_messages() {
        println!("warning: {warning}");
    }
    println!(
        "Exported {} images with {} annotations ({} files)",
        result.images_exported,
        result.annotations_exported,
        result.files_created.len()
    );
}

fn print_models() {
    for task in TASKS {
        println!("{} - {}", task.name, task.description);
        for info in models_for_task(task.name) {
            let target = match info.export() {
                Some(entry) if entry.fallback => format!("{} (fallback)", entry.target.id()),
                Some(entry) => entry.target.id().to_string(),
                None => "-".to_string(),
            };
            println!("  {:<26} {:<9} {}", info.name, info.tool.as_str(), target);
        }
    }
}

fn run(cli: Cli, config: &AppConfig) -> Result<(), CliError> {
    match cli.command {
        Commands::Export {
            project,
            output,
            model,
            name,
            labels,
        } => {
            let project = Project::open(project)?;
            let output = output_dir(config, output)?;
            let units = project.store().load_units();
            let class_map = class_map(&project, labels);
            let name = name.unwrap_or_else(|| config.preferences.default_project_name.clone());

            let result = export_annotations(&units, &output, &model, &class_map, Some(&name))?;
            print_result(&result);
        }
        Commands::Masks {
            project,
            output,
            labels,
        } => {
            let project = Project::open(project)?;
            let output = output_dir(config, output)?;
            let sources: Vec<MaskSource> = project
                .store()
                .load_units()
                .iter()
                .map(MaskSource::from_unit)
                .collect();
            let class_map = class_map(&project, labels);

            let result = export_masks(&sources, &output, &class_map)?;
            print_result(&result);
        }
        Commands::Models => print_models(),
        Commands::New { name, goal, model } => {
            let manager = ProjectManager::new(&config.preferences.projects_dir)?;
            let project = manager.create_project(&name, &goal, &model)?;
            println!("Created project at {}", project.path().display());
        }
        Commands::Projects { recent, limit } => {
            let manager = ProjectManager::new(&config.preferences.projects_dir)?;
            let details = if recent {
                manager.recent_projects(limit.unwrap_or(DEFAULT_RECENT_PROJECTS))
            } else {
                manager.all_project_details()
            };
            for project in details {
                println!(
                    "{:<24} {:<16} {:>5} images",
                    project.name, project.annotation_goal, project.image_count
                );
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config, cli.verbose);

    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

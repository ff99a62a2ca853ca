use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use syllabus::links::{Event, find_links};
use syllabus::material::{LoadOptions, MaterialTree, load_tree};
use syllabus::search::chunk::split_page;
use syllabus::tags::format_tag_list;
use syllabus::{Config, ProblemFact, Scope, resolve, summarize_in};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "syllabus")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the material hierarchy
    Tree,
    /// Resolve section refs to names and URLs
    Resolve {
        /// Dotted refs, e.g. repo.theme.course.section
        refs: Vec<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Summarise problem completion for a section
    Progress {
        /// Section ref
        section: String,
        /// JSON file with the event's completion records
        #[arg(short, long)]
        facts: PathBuf,
        /// Only count this user's records (otherwise every user is counted)
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Show navigation links for a page
    Links {
        /// Section ref of the page
        section: String,
        /// JSON file describing the active event
        #[arg(short, long)]
        event: Option<PathBuf>,
    },
    /// Show the search chunks of a markdown page
    Chunks {
        /// Markdown file
        path: PathBuf,
    },
}

fn load_material(config_path: Option<&Path>) -> Result<(Config, MaterialTree)> {
    let config = match config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let tree = load_tree(&config, LoadOptions { no_markdown: true })?;
    tracing::debug!("Loaded {} sections", tree.section_count());
    Ok((config, tree))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {:?}", path))
}

fn print_tree(tree: &MaterialTree) {
    for theme in &tree.themes {
        println!("{}.{}  {}", theme.repo, theme.id, theme.name);
        for course in &theme.courses {
            println!("  {}  {}", course.id, course.name);
            for section in &course.sections {
                let tags = format_tag_list(&section.tags).join(", ");
                println!(
                    "    {}  {}  [{} problems]{}",
                    section.id,
                    section.name,
                    section.problems.len(),
                    if tags.is_empty() { String::new() } else { format!("  ({tags})") }
                );
            }
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "syllabus=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Tree => {
            let (_, tree) = load_material(config_path)?;
            print_tree(&tree);
        }
        Commands::Resolve { refs, json } => {
            let (config, tree) = load_material(config_path)?;
            let bundles: Vec<_> =
                refs.iter().map(|r| resolve(r, &tree, &config.base_path).display()).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&bundles)?);
            } else {
                for bundle in bundles {
                    let indent = " ".repeat(bundle.indent());
                    println!("{}{}  {}", indent, bundle.display_name, bundle.url);
                }
            }
        }
        Commands::Progress { section, facts, user } => {
            let (config, tree) = load_material(config_path)?;
            let facts: Vec<ProblemFact> = read_json(&facts)?;
            let resolution = resolve(&section, &tree, &config.base_path);
            let scope = user.map_or(Scope::All, |user| Scope::Own { user });
            let summary = summarize_in(&tree, &section, &facts, &scope);
            println!("{} {}", summary.label(), resolution.display().display_name);
            if summary.is_fully_complete {
                println!("complete");
            }
        }
        Commands::Links { section, event } => {
            let (config, tree) = load_material(config_path)?;
            let event = event.as_deref().map(read_json::<Event>).transpose()?;
            let resolution = resolve(&section, &tree, &config.base_path);
            let Some(resolved) = resolution.resolved() else {
                anyhow::bail!("{}", resolution.display().display_name);
            };
            let links = find_links(&tree, &resolved.key, event.as_ref(), &config.base_path);
            println!("{}", serde_json::to_string_pretty(&links)?);
        }
        Commands::Chunks { path } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {:?}", path))?;
            for chunk in split_page(&text) {
                println!("#{}\n{}\n", chunk.anchor, chunk.text);
            }
        }
    }

    Ok(())
}

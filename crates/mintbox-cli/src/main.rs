use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use mintbox_cli::{
    format_asset_table, init_tracing, print_json, print_status, write_export, RepoArgs,
    StdinConfirm,
};
use mintbox_core::EditorConfig;
use mintbox_services::{
    create_store, Confirm, Dispatch, ExportFormat, MintError, NftEditor, NftRenderer,
    RemoveOutcome,
};

#[derive(Parser)]
#[command(name = "mintbox", about = "Generate NFT images and manage them in a GitHub repository")]
struct Cli {
    #[command(flatten)]
    repo: RepoArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw the preview for a title and save it as PNG
    Preview {
        #[arg(long)]
        title: Option<String>,
        /// Directory to write into
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },
    /// Draw the preview and download it in another format
    Export {
        #[arg(long)]
        title: Option<String>,
        /// png, jpg, webp, avif or svg
        #[arg(long, default_value = "png")]
        format: ExportFormat,
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },
    /// Print a random title and description
    Random,
    /// Render an image and push it with its metadata document
    Mint {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Use a random title and description
        #[arg(long, conflicts_with_all = ["title", "description"])]
        random: bool,
    },
    /// List minted assets in repository order (by file name)
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Remove an asset's metadata document and image
    Remove {
        /// Path of the metadata document, e.g. nfts/Title_1700000000000.json
        metadata_path: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Find images without metadata and metadata without images
    Orphans {
        /// Delete every orphan found
        #[arg(long)]
        purge: bool,
        /// Skip the confirmation prompt for --purge
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = EditorConfig::from_env().context("Failed to load configuration")?;
    cli.repo.apply(&mut config);

    let store = create_store(&config).context("Failed to create GitHub store")?;
    let renderer = NftRenderer::new(&config.render).context("Failed to load font")?;
    let editor = NftEditor::new(store, renderer, &config);

    match cli.command {
        Commands::Preview { title, output } => {
            if let Some(title) = title {
                editor.set_title(title).await;
            }
            editor.refresh_preview().await?;
            let file = editor.export(ExportFormat::Png).await?;
            let path = write_export(&output, &file)?;
            print_status(&editor.status().await);
            println!("{}", path.display());
        }
        Commands::Export {
            title,
            format,
            output,
        } => {
            if let Some(title) = title {
                editor.set_title(title).await;
            }
            let result = editor.export(format).await;
            print_status(&editor.status().await);
            let file = result?;
            let path = write_export(&output, &file)?;
            println!("{}", path.display());
        }
        Commands::Random => {
            let draft = editor.regenerate().await?;
            print_json(&draft)?;
        }
        Commands::Mint {
            title,
            description,
            random,
        } => {
            if random {
                editor.regenerate().await?;
            }
            if let Some(title) = title {
                editor.set_title(title).await;
            }
            if let Some(description) = description {
                editor.set_description(description).await;
            }

            let result = match editor.mint().await {
                Dispatch::Ran(result) => result,
                Dispatch::AlreadyRunning => bail!("A mint is already running"),
            };
            print_log(&editor).await;
            print_status(&editor.status().await);
            match result {
                Ok(report) => print_json(&report)?,
                Err(MintError::MetadataUpload { orphaned_image, .. }) => {
                    bail!(
                        "Image {} was uploaded without metadata; run `mintbox orphans` to clean up",
                        orphaned_image.path
                    )
                }
                Err(err) => return Err(err.into()),
            }
        }
        Commands::List { json } => {
            let assets = list(&editor).await?;
            if json {
                print_json(&assets)?;
            } else {
                print!("{}", format_asset_table(&assets));
            }
        }
        Commands::Remove { metadata_path, yes } => {
            let assets = list(&editor).await?;
            let Some(record) = assets.iter().find(|a| a.metadata_path == metadata_path) else {
                bail!("No NFT with metadata at {}", metadata_path);
            };

            let confirm: Box<dyn Confirm> = if yes {
                Box::new(|_: &str| true)
            } else {
                Box::new(StdinConfirm)
            };

            let result = match editor.remove(record, confirm.as_ref()).await {
                Dispatch::Ran(result) => result,
                Dispatch::AlreadyRunning => bail!("A removal is already running"),
            };
            print_log(&editor).await;
            print_status(&editor.status().await);
            match result? {
                RemoveOutcome::Declined => eprintln!("Cancelled."),
                outcome @ RemoveOutcome::Removed { .. } => print_json(&outcome)?,
            }
        }
        Commands::Orphans { purge, yes } => {
            let report = editor.scan_orphans().await?;
            print_json(&report)?;

            if purge && !report.is_empty() {
                let prompt = format!("Delete {} orphaned files?", report.total());
                if !yes && !StdinConfirm.confirm(&prompt) {
                    eprintln!("Cancelled.");
                    return Ok(());
                }
                for entry in report
                    .images_without_metadata
                    .iter()
                    .chain(report.metadata_without_image.iter())
                {
                    editor
                        .purge_orphan(entry)
                        .await
                        .with_context(|| format!("Failed to remove {}", entry.path))?;
                }
            }
            print_log(&editor).await;
        }
    }

    Ok(())
}

async fn list(editor: &NftEditor) -> anyhow::Result<Vec<mintbox_core::AssetRecord>> {
    let result = match editor.list().await {
        Dispatch::Ran(result) => result,
        Dispatch::AlreadyRunning => bail!("A listing is already running"),
    };
    print_status(&editor.status().await);
    Ok(result?)
}

async fn print_log(editor: &NftEditor) {
    let snapshot = editor.snapshot().await;
    for entry in snapshot.log.entries() {
        eprintln!("{} {}", entry.at.format("%H:%M:%S"), entry.message);
    }
}


//! The `altomatic catalog` command: build and inspect the asset catalog.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use altomatic_core::{Asset, CatalogScanner, CatalogStore, TargetField};
use clap::{Args, Subcommand};

use super::context::Context;

/// Arguments for the `catalog` command.
#[derive(Args, Debug)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommand,
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// Build the catalog from a directory, replacing the current one
    Scan {
        /// Directory (or single file) to scan
        dir: PathBuf,

        /// Public URL prefix for the scanned directory
        #[arg(long)]
        base_url: Option<String>,
    },

    /// List catalog assets
    List {
        /// Print assets as a JSON array
        #[arg(long)]
        json: bool,
    },
}

pub async fn execute(args: CatalogArgs, ctx: Context) -> anyhow::Result<()> {
    match args.command {
        CatalogCommand::Scan { dir, base_url } => scan(&ctx, &dir, base_url.as_deref()).await,
        CatalogCommand::List { json } => list(&ctx, json).await,
    }
}

async fn scan(ctx: &Context, dir: &Path, base_url: Option<&str>) -> anyhow::Result<()> {
    if !dir.exists() {
        anyhow::bail!("Path does not exist: {}", dir.display());
    }

    let path = ctx.config.catalog_path();
    let previous = CatalogStore::open(&path).await?.list().await;
    let mut scanner = CatalogScanner::new(base_url);
    if let TargetField::Named(handle) = &ctx.config.generation.target_field {
        scanner = scanner.with_field(handle.as_str());
    }
    let scanned = scanner.scan(dir);
    let assets = carry_over(previous, scanned);

    let images = assets.iter().filter(|a| a.is_image()).count();
    let store = CatalogStore::create(&path, assets).await?;
    tracing::info!(
        "Catalog written to {} ({} assets, {} images)",
        path.display(),
        store.len().await,
        images
    );
    println!("{}", path.display());
    Ok(())
}

/// Keep the id and text attributes of assets already catalogued at the same
/// local path. New files get ids above any previously used one.
fn carry_over(previous: Vec<Asset>, scanned: Vec<Asset>) -> Vec<Asset> {
    let mut next_id = previous.iter().map(|a| a.id).max().unwrap_or(0) + 1;
    let mut by_path: HashMap<PathBuf, Asset> = previous
        .into_iter()
        .filter_map(|a| a.local_path.clone().map(|p| (p, a)))
        .collect();

    scanned
        .into_iter()
        .map(|mut asset| {
            match asset.local_path.as_ref().and_then(|p| by_path.remove(p)) {
                Some(old) => {
                    asset.id = old.id;
                    asset.alt = old.alt;
                    asset.title = old.title;
                    asset.fields.extend(old.fields);
                }
                None => {
                    asset.id = next_id;
                    next_id += 1;
                }
            }
            asset
        })
        .collect()
}

async fn list(ctx: &Context, json: bool) -> anyhow::Result<()> {
    let store = ctx.store().await?;
    let assets = store.list().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&assets)?);
        return Ok(());
    }
    for asset in &assets {
        let target = &ctx.config.generation.target_field;
        println!(
            "{:>6}  {:<5}  {:<32}  {}",
            asset.id,
            if asset.is_image() { "image" } else { "other" },
            asset.filename,
            asset.target_value(target).unwrap_or("")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carry_over_keeps_existing_text() {
        let mut old = Asset::image(9, "cat.jpg");
        old.local_path = Some(PathBuf::from("/srv/cat.jpg"));
        old.alt = Some("A cat".into());
        old.title = "Cat".into();

        let mut cat = Asset::image(1, "cat.jpg");
        cat.local_path = Some(PathBuf::from("/srv/cat.jpg"));
        let mut dog = Asset::image(2, "dog.jpg");
        dog.local_path = Some(PathBuf::from("/srv/dog.jpg"));

        let merged = carry_over(vec![old], vec![cat, dog]);
        assert_eq!(merged[0].id, 9);
        assert_eq!(merged[0].alt.as_deref(), Some("A cat"));
        assert_eq!(merged[0].title, "Cat");
        assert_eq!(merged[1].id, 10);
        assert_eq!(merged[1].alt, None);
    }

    #[test]
    fn test_carry_over_fresh_catalog_keeps_scan_order() {
        let scanned: Vec<Asset> = ["a.jpg", "b.jpg"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut asset = Asset::image(i as u64 + 1, *name);
                asset.local_path = Some(PathBuf::from(format!("/srv/{name}")));
                asset
            })
            .collect();
        let merged = carry_over(Vec::new(), scanned);
        assert_eq!(merged.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_rescan_keeps_ids_for_known_files() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        std::fs::create_dir(&images).unwrap();
        std::fs::write(images.join("b.jpg"), b"x").unwrap();

        let mut config = altomatic_core::Config::default();
        config.storage.catalog_path = dir.path().join("catalog.json").display().to_string();
        let ctx = Context::new(config, dir.path().join("config.toml"));
        scan(&ctx, &images, None).await.unwrap();

        // A file sorting before the known one must not take its id.
        std::fs::write(images.join("a.jpg"), b"x").unwrap();
        scan(&ctx, &images, None).await.unwrap();

        let assets = CatalogStore::open(&ctx.config.catalog_path())
            .await
            .unwrap()
            .list()
            .await;
        let ids: Vec<(u64, &str)> = assets.iter().map(|a| (a.id, a.filename.as_str())).collect();
        assert_eq!(ids, vec![(1, "b.jpg"), (2, "a.jpg")]);
    }

    #[tokio::test]
    async fn test_scan_declares_named_target_field() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        std::fs::create_dir(&images).unwrap();
        std::fs::write(images.join("a.jpg"), b"x").unwrap();

        let mut config = altomatic_core::Config::default();
        config.storage.catalog_path = dir.path().join("catalog.json").display().to_string();
        config.generation.target_field = TargetField::Named("caption".into());
        let ctx = Context::new(config, dir.path().join("config.toml"));
        scan(&ctx, &images, None).await.unwrap();

        let store = CatalogStore::open(&ctx.config.catalog_path()).await.unwrap();
        let mut asset = store.list().await.remove(0);
        asset.fields.insert("caption".into(), "A cat".into());
        altomatic_core::AssetStore::save(&store, &asset).await.unwrap();
    }

    #[tokio::test]
    async fn test_scan_writes_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        std::fs::create_dir(&images).unwrap();
        std::fs::write(images.join("a.jpg"), b"x").unwrap();
        std::fs::write(images.join("b.txt"), b"x").unwrap();

        let mut config = altomatic_core::Config::default();
        config.storage.catalog_path = dir.path().join("catalog.json").display().to_string();
        let ctx = Context::new(config, dir.path().join("config.toml"));

        scan(&ctx, &images, Some("https://cdn.example.com")).await.unwrap();

        let store = CatalogStore::open(&ctx.config.catalog_path()).await.unwrap();
        let assets = store.list().await;
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].url.as_deref(), Some("https://cdn.example.com/a.jpg"));
        assert!(!assets[1].is_image());
    }
}

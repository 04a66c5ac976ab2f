use std::path::{Path, PathBuf};

use clap::Subcommand;
use garden_core::meadow::save_png;
use garden_core::{load_records, render_meadow, AssetIndex, CollectiveRecords, MeadowAggregator};
use serde_json::json;

use super::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum MeadowAction {
    /// Per-flower counts and sticker placements as JSON
    Stats,
    /// Compose the meadow image
    Render {
        /// Output PNG path (default: <data_dir>/meadow.png)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

pub fn run(action: MeadowAction) -> CliResult {
    let ctx = Context::load()?;
    let store = ctx.store();
    let collective = load_records(store.as_deref());
    match &collective {
        CollectiveRecords::NotConfigured => {
            eprintln!("note: no session backend configured; no collective data available")
        }
        CollectiveRecords::Failed { warning } => eprintln!("warning: {warning}"),
        CollectiveRecords::Loaded(_) => {}
    }

    let assets = AssetIndex::scan(&ctx.config.assets_dir()?)?;
    let layout = ctx.config.meadow_layout();
    let snapshot =
        MeadowAggregator::new(layout).aggregate(collective.records(), &ctx.catalog, &assets);

    match action {
        MeadowAction::Stats => {
            print_json(&json!({
                "available": matches!(collective, CollectiveRecords::Loaded(_)),
                "total": snapshot.total(),
                "per_flower_counts": snapshot.per_flower_counts,
                "placements": snapshot.placements,
            }))?;
        }
        MeadowAction::Render { out } => {
            let out = match out {
                Some(path) => path,
                None => garden_core::storage::data_dir()?.join("meadow.png"),
            };
            let background = ctx.config.meadow.background.as_deref().map(Path::new);
            let image = render_meadow(&snapshot, &layout, &assets, background)?;
            save_png(&image, &out)?;
            print_json(&json!({
                "path": out.display().to_string(),
                "flowers": snapshot.placements.len(),
            }))?;
        }
    }
    Ok(())
}

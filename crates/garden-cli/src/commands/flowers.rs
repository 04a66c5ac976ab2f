use clap::Subcommand;
use serde_json::json;

use super::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum FlowersAction {
    /// List flower codes and labels
    List,
    /// Show one flower's intention and tips
    Show {
        /// Flower code
        code: String,
    },
}

pub fn run(action: FlowersAction) -> CliResult {
    let ctx = Context::load()?;

    match action {
        FlowersAction::List => {
            let flowers: Vec<_> = ctx
                .catalog
                .iter()
                .map(|f| json!({ "code": f.code, "label": f.label }))
                .collect();
            print_json(&flowers)?;
        }
        FlowersAction::Show { code } => {
            let flower = ctx.catalog.require(&code)?;
            print_json(flower)?;
        }
    }
    Ok(())
}

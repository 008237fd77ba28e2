//! `pipeline`: write the stage descriptor

use anyhow::Result;
use console::style;

use super::args::PipelineArgs;
use crate::orchestration::{PipelineDescriptor, PipelinePaths};

pub fn run_pipeline(args: &PipelineArgs) -> Result<()> {
    let descriptor = PipelineDescriptor::house_price(
        PipelinePaths {
            data_path: args.data_path.clone(),
            model_path: args.model_path.clone(),
            metrics_path: args.metrics_path.clone(),
        },
        &args.image,
    );
    descriptor.save(&args.output)?;

    println!(
        "\n {} Pipeline descriptor written to {}",
        style("◆").cyan().bold(),
        style(args.output.display()).dim()
    );
    for (i, stage) in descriptor.execution_order()?.iter().enumerate() {
        println!(
            "   {}. {} {}",
            i + 1,
            style(&stage.name).bold(),
            style(stage.command.join(" ")).dim()
        );
    }
    println!();
    Ok(())
}

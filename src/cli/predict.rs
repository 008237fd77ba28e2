//! `predict`: classify the first row of a file from the command line

use anyhow::Result;
use console::style;

use super::args::PredictArgs;
use crate::model::Predictor;

pub fn run_predict(args: &PredictArgs) -> Result<()> {
    let predictor = Predictor::load(&args.model)?;
    let label = predictor.predict_file(&args.input)?;

    println!(
        "The prediction for the first row of {} is: {}",
        args.input.display(),
        style(label).green().bold()
    );

    if args.proba {
        for (bucket, p) in predictor.predict_proba_file(&args.input)? {
            println!("  {:<8} {:.4}", bucket.as_str(), p);
        }
    }
    Ok(())
}

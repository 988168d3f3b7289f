// The stand-in for the simulator's form: load the startup inputs, encode
// one record, predict, and print the income. Everything interesting lives
// in the library; this file only wires the pieces together and turns
// errors into exit codes. Schema and model failures are fatal before any
// request is served; an arity mismatch rejects the request with a
// descriptive message.

use clap::Parser;
use renda::data;
use renda::model::TreeModel;
use renda::predict::PredictionService;
use renda::record::{RawRecord, RecordEncoder};
use std::error::Error;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[clap(
    name = "renda",
    version,
    about = "Income prediction from survey records."
)]
struct Args {
    /// Path to the record TOML file with the survey answers.
    record: PathBuf,

    /// Path to the training feature table (CSV with a header row).
    #[clap(long)]
    features: PathBuf,

    /// Path to the trained model artifact (TOML).
    #[clap(long)]
    model: PathBuf,

    /// Optional target table (CSV); checked for shape against the feature
    /// table, otherwise unused at prediction time.
    #[clap(long)]
    target: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    eprintln!("> Loading feature table: {}", args.features.display());
    let table = data::load_feature_table(&args.features)?;

    if let Some(target) = &args.target {
        eprintln!("> Checking target table: {}", target.display());
        data::validate_target_table(target, table.rows)?;
    }

    eprintln!("> Loading model artifact: {}", args.model.display());
    let model = TreeModel::load(&args.model)?;

    let record = RawRecord::from_toml_file(&args.record)?;
    let vector = RecordEncoder::new().encode(&record);

    let service = PredictionService::new(table.schema, model);
    let renda = service.predict(vector.view())?;

    println!("Renda prevista: R${:.2}", renda);
    Ok(())
}

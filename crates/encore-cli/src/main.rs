use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;
use std::str::FromStr;

use encore_classifiers::config::ModelType;
use encore_cli::train::{load_train_config, run_train, TrainJobConfig};
use encore_cli::util::validate_csv_or_tsv_file;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("ENCORE_LOG", "error,encore=info"))
        .init();

    let matches = Command::new("encore")
        .version(clap::crate_version!())
        .about("Train positive-unlabeled preference models over personal music libraries")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Train a preference model from a labeled song feature table")
                .arg(
                    Arg::new("input")
                        .help("Path to the song feature table (.csv or .tsv)")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help("Path to a training job JSON configuration file")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .help("Path to write per-song scores (CSV)")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("label_column")
                        .long("label-column")
                        .help("Override the 0/1 membership column from the config")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("model_type")
                        .long("model-type")
                        .help("Override the model type from the JSON config.")
                        .value_parser(["gbdt", "random_forest"])
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Fix the random seed for reproducible training")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("rebalance")
                        .long("rebalance")
                        .help("Oversample the minority class before each refit")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("print_config")
                        .long("print-config")
                        .help("Print the effective configuration as JSON and exit")
                        .action(ArgAction::SetTrue),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("train", sub_m)) => handle_train(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let input: &PathBuf = matches.get_one("input").unwrap();
    let output: Option<&PathBuf> = matches.get_one("output_file");

    let mut config = if let Some(config_path) = matches.get_one::<PathBuf>("config") {
        eprintln!("[Encore::Train] Using config: {:?}", config_path);
        load_train_config(config_path)?
    } else {
        eprintln!("[Encore::Train] No config provided; using defaults.");
        TrainJobConfig::default()
    };

    if let Some(label) = matches.get_one::<String>("label_column") {
        config.label_column = label.clone();
    }
    if let Some(model_type) = matches.get_one::<String>("model_type") {
        config.trainer.model.model_type =
            ModelType::from_str(model_type).map_err(anyhow::Error::msg)?;
    }
    if let Some(&seed) = matches.get_one::<u64>("seed") {
        config.trainer.seed = Some(seed);
    }
    if matches.get_flag("rebalance") {
        config.trainer.enable_rebalancing = true;
    }

    if matches.get_flag("print_config") {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    validate_csv_or_tsv_file(input.to_str().unwrap_or_default())?;

    log::info!("[Encore::Train] Training from: {:?}", input);
    match run_train(input, &config, output) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;
use std::sync::Arc;

use cobuy_cli::input;
use cobuy_cli::server::{self, AppState};
use cobuy_engine::config::EngineConfig;
use cobuy_engine::history::{HistoryStore, JsonLinesHistory};
use cobuy_engine::service::{self, RecommendationRequest};
use cobuy_engine::{ProductId, RecommendationEngine};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("COBUY_LOG", "error,cobuy=info"))
        .init();

    let matches = Command::new("cobuy")
        .version(clap::crate_version!())
        .about("\u{1F6D2} cobuy - Co-purchase recommendations from a multi-label forest")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Train a model and list the products it knows about")
                .args(engine_args()),
        )
        .subcommand(
            Command::new("products")
                .about("List every product in the training data")
                .args(engine_args()),
        )
        .subcommand(
            Command::new("recommend")
                .about("Recommend products to go with two input products")
                .arg(
                    Arg::new("products")
                        .help("The two product IDs bought together")
                        .required(true)
                        .num_args(2)
                        .allow_negative_numbers(true)
                        .value_parser(clap::value_parser!(ProductId)),
                )
                .args(engine_args())
                .arg(history_arg()),
        )
        .subcommand(
            Command::new("serve")
                .about("Serve recommendations over HTTP")
                .args(engine_args())
                .arg(history_arg())
                .arg(
                    Arg::new("bind")
                        .short('b')
                        .long("bind")
                        .help("Address to listen on. Overrides the address in the configuration file.")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::Hostname),
                )
                .arg(
                    Arg::new("no_pretrain")
                        .long("no-pretrain")
                        .help("Train on the first request instead of at startup.")
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
        Some(("products", sub_m)) => handle_products(sub_m),
        Some(("recommend", sub_m)) => handle_recommend(sub_m),
        Some(("serve", sub_m)) => handle_serve(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

/// Arguments every subcommand accepts.
fn engine_args() -> Vec<Arg> {
    vec![
        Arg::new("config")
            .short('c')
            .long("config")
            .help("Path to engine JSON configuration file")
            .value_parser(clap::value_parser!(PathBuf))
            .value_hint(ValueHint::FilePath),
        Arg::new("dataset")
            .short('d')
            .long("dataset")
            .help(
                "Path to training data (*.csv or *.tsv). \
                 Overrides the dataset specified in the configuration file.",
            )
            .value_parser(clap::value_parser!(PathBuf))
            .value_hint(ValueHint::FilePath),
        Arg::new("model_type")
            .short('m')
            .long("model-type")
            .help("Override the per-product classifier from the JSON config.")
            .value_parser(["random_forest", "gbdt"])
            .value_hint(ValueHint::Other),
        Arg::new("seed")
            .long("seed")
            .help("Seed for every randomized training step.")
            .value_parser(clap::value_parser!(u64)),
        Arg::new("fallback")
            .long("fallback")
            .help("Comma separated product IDs suggested when the model has nothing to offer.")
            .value_parser(clap::builder::NonEmptyStringValueParser::new()),
    ]
}

fn history_arg() -> Arg {
    Arg::new("history")
        .long("history")
        .help("Append every served recommendation to this JSON-lines file.")
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn history_store(config: &EngineConfig) -> Option<Arc<dyn HistoryStore>> {
    config.history.as_ref().map(|path| {
        log::info!("Recording recommendation history to {}", path.display());
        Arc::new(JsonLinesHistory::new(path)) as Arc<dyn HistoryStore>
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config = input::from_arguments(matches)?;
    let engine = RecommendationEngine::new(config);

    match service::train(&engine) {
        Ok(response) => print_json(&response),
        Err(e) => {
            log::error!("Training failed: {}", e.message);
            std::process::exit(1)
        }
    }
}

fn handle_products(matches: &ArgMatches) -> Result<()> {
    let config = input::from_arguments(matches)?;
    let engine = RecommendationEngine::new(config);

    match service::products(&engine) {
        Ok(response) => print_json(&response),
        Err(e) => {
            log::error!("Listing products failed: {}", e.message);
            std::process::exit(1)
        }
    }
}

fn handle_recommend(matches: &ArgMatches) -> Result<()> {
    let config = input::from_arguments(matches)?;
    let input: Vec<ProductId> = matches
        .get_many::<ProductId>("products")
        .map(|ids| ids.copied().collect())
        .unwrap_or_default();

    let history = history_store(&config);
    let engine = RecommendationEngine::new(config);
    let request = RecommendationRequest { input };

    match service::recommend(&engine, history.as_deref(), &request) {
        Ok(response) => print_json(&response),
        Err(e) => {
            log::error!("Recommendation failed: {}", e.message);
            std::process::exit(1)
        }
    }
}

fn handle_serve(matches: &ArgMatches) -> Result<()> {
    let config = input::from_arguments(matches)?;
    let bind = config.bind.clone();
    let pretrain = config.pretrain;
    let history = history_store(&config);
    let engine = Arc::new(RecommendationEngine::new(config));

    if pretrain {
        if let Err(e) = engine.train(None) {
            log::error!("Training failed: {}", e);
            std::process::exit(1)
        }
    }

    let state = AppState::new(engine, history);
    actix_web::rt::System::new().block_on(server::run(state, &bind))?;
    Ok(())
}

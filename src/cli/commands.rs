//! Command implementations for the triage CLI.

use std::fs;
use std::time::Instant;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::TrainingConfig;
use crate::corpus::{clean, load_dataset, load_raw, save_dataset};
use crate::error::{Result, TriageError};
use crate::ml::metrics::evaluate;
use crate::ml::pipeline::TextPipeline;
use crate::ml::search::train_pipeline;

/// Execute a CLI command.
pub fn execute_command(args: TriageArgs) -> Result<()> {
    match &args.command {
        Command::Prepare(prepare_args) => prepare(prepare_args, &args),
        Command::Train(train_args) => train(train_args, &args),
        Command::Classify(classify_args) => classify(classify_args, &args),
    }
}

/// Join, clean and store the raw tables.
fn prepare(args: &PrepareArgs, cli_args: &TriageArgs) -> Result<()> {
    for path in [&args.messages, &args.categories] {
        if !path.exists() {
            return Err(TriageError::missing_input(path));
        }
    }

    progress(
        cli_args,
        &format!(
            "Loading data...\n    MESSAGES: {}\n    CATEGORIES: {}",
            args.messages.display(),
            args.categories.display()
        ),
    );
    let raw = load_raw(&args.messages, &args.categories)?;
    let unmatched = raw.unmatched();

    progress(cli_args, "Cleaning data...");
    let (dataset, summary) = clean(raw)?;

    progress(
        cli_args,
        &format!("Saving data...\n    DATABASE: {}", args.database.display()),
    );
    save_dataset(&dataset, &args.database)?;
    progress(cli_args, "Cleaned data saved to database!");

    let result = PrepareResult {
        database: args.database.display().to_string(),
        rows_in: summary.rows_in,
        rows_out: dataset.len(),
        unmatched_messages: unmatched,
        duplicates_dropped: summary.duplicates_dropped,
        coerced_values: summary.coerced_values,
        categories: dataset.categories().len(),
    };
    output_result(&result, cli_args)
}

/// Split, fit, evaluate and save.
fn train(args: &TrainArgs, cli_args: &TriageArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => TrainingConfig::from_file(path)?,
        None => TrainingConfig::default(),
    };
    config.search.enabled = args.grid_search;
    if args.jobs.is_some() {
        config.search.n_jobs = args.jobs;
    }
    config.validate()?;

    progress(
        cli_args,
        &format!("Loading data...\n    DATABASE: {}", args.database.display()),
    );
    let dataset = load_dataset(&args.database, &config.dataset)?;
    let (train_set, test_set) = dataset.train_test_split(&config.split)?;
    log::info!(
        "Split {} rows into {} training and {} test rows",
        dataset.len(),
        train_set.len(),
        test_set.len()
    );

    progress(cli_args, "Building model...");
    progress(cli_args, "Training model...");
    let start = Instant::now();
    let (pipeline, search) = train_pipeline(&config, &train_set)?;
    log::info!("Training finished in {:.1}s", start.elapsed().as_secs_f64());

    progress(cli_args, "Evaluating model...");
    let evaluation = evaluate(
        &pipeline,
        &test_set.texts(),
        test_set.labels(),
        test_set.categories(),
    )?;
    progress(cli_args, evaluation.to_text().trim_end());

    if let Some(report_path) = &args.report {
        if let Some(parent) = report_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(report_path, serde_json::to_string_pretty(&evaluation)?)?;
    }

    progress(
        cli_args,
        &format!("Saving model...\n    MODEL: {}", args.model.display()),
    );
    pipeline.save(&args.model)?;
    progress(cli_args, "Trained model saved!");

    let model_id = pipeline
        .metadata()
        .map(|m| m.model_id.to_string())
        .unwrap_or_default();
    let result = TrainResult {
        model: args.model.display().to_string(),
        model_id,
        training_rows: train_set.len(),
        test_rows: test_set.len(),
        vocabulary_size: pipeline.vectorizer().vocabulary_size(),
        degenerate_categories: pipeline
            .degenerate_labels()
            .into_iter()
            .map(String::from)
            .collect(),
        search,
        evaluation,
    };
    output_result(&result, cli_args)
}

/// Predict the categories of each text.
fn classify(args: &ClassifyArgs, cli_args: &TriageArgs) -> Result<()> {
    let pipeline = TextPipeline::load(&args.model)?;
    let categories = pipeline
        .categories()
        .ok_or_else(|| TriageError::not_fitted("model has no categories"))?;

    let predicted = pipeline.predict(&args.texts)?;
    let probabilities = if args.probabilities {
        Some(pipeline.predict_proba(&args.texts)?)
    } else {
        None
    };

    let messages = args
        .texts
        .iter()
        .enumerate()
        .map(|(row, text)| Classification {
            text: text.clone(),
            categories: categories
                .iter()
                .zip(predicted.row(row))
                .filter(|(_, value)| **value == 1)
                .map(|(name, _)| name.to_string())
                .collect(),
            probabilities: probabilities.as_ref().map(|per_category| {
                categories
                    .iter()
                    .zip(per_category)
                    .map(|(name, column)| (name.to_string(), column[row]))
                    .collect()
            }),
        })
        .collect();

    let result = ClassifyResult {
        model_id: pipeline.metadata().map(|m| m.model_id.to_string()),
        messages,
    };
    output_result(&result, cli_args)
}

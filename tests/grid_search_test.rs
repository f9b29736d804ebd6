//! Integration tests for the cross-validated grid search.

use triage::ml::search::{ParamGrid, ScoringMetric};
use triage::prelude::*;

fn corpus() -> (Vec<String>, LabelMatrix, CategorySet) {
    let water = [
        "we need drinking water",
        "water supply is contaminated",
        "please send bottled water",
        "no clean water since the storm",
    ];
    let roads = [
        "the road to the village is blocked",
        "bridge collapsed on the main road",
        "roads are flooded and closed",
        "the highway bridge is damaged",
    ];
    let both = [
        "road blocked so water trucks cannot reach us",
        "water pipes broke under the collapsed bridge",
    ];
    let neither = ["thank you for your help", "what is the weather tomorrow"];

    let mut texts = Vec::new();
    let mut rows = Vec::new();
    for _ in 0..2 {
        for text in water {
            texts.push(text.to_string());
            rows.push(vec![1, 0]);
        }
        for text in roads {
            texts.push(text.to_string());
            rows.push(vec![0, 1]);
        }
        for text in both {
            texts.push(text.to_string());
            rows.push(vec![1, 1]);
        }
        for text in neither {
            texts.push(text.to_string());
            rows.push(vec![0, 0]);
        }
    }

    let labels = LabelMatrix::from_rows(rows, 2).unwrap();
    let categories = CategorySet::new(["water", "transport"]).unwrap();
    (texts, labels, categories)
}

fn search_config(n_jobs: usize) -> SearchConfig {
    SearchConfig {
        folds: 3,
        n_jobs: Some(n_jobs),
        scoring: ScoringMetric::HammingAccuracy,
        grid: ParamGrid {
            ngram_range: vec![(1, 1), (1, 2)],
            max_df: vec![0.5, 1.0],
            max_features: vec![None, Some(10)],
            use_idf: vec![true],
            n_estimators: vec![5],
            min_samples_split: vec![2, 4],
        },
        ..SearchConfig::default()
    }
}

#[test]
fn test_same_winner_with_one_and_many_workers() -> Result<()> {
    let (texts, labels, categories) = corpus();

    let single = GridSearch::new(search_config(1), AnalyzerConfig::default(), ForestConfig::default())?;
    let (single_pipeline, single_report) = single.fit(&texts, &labels, &categories)?;

    let parallel = GridSearch::new(search_config(4), AnalyzerConfig::default(), ForestConfig::default())?;
    let (parallel_pipeline, parallel_report) = parallel.fit(&texts, &labels, &categories)?;

    assert_eq!(single_report.scores.len(), 16);
    assert_eq!(single_report.best_index, parallel_report.best_index);
    assert_eq!(single_report.scores, parallel_report.scores);

    let unseen = ["water for the village", "bridge closed", "hello"];
    assert_eq!(single_pipeline.predict(&unseen)?, parallel_pipeline.predict(&unseen)?);
    assert_eq!(
        single_pipeline.predict_proba(&unseen)?,
        parallel_pipeline.predict_proba(&unseen)?
    );

    Ok(())
}

#[test]
fn test_winner_has_highest_mean() -> Result<()> {
    let (texts, labels, categories) = corpus();
    let search = GridSearch::new(search_config(2), AnalyzerConfig::default(), ForestConfig::default())?;
    let (_, report) = search.fit(&texts, &labels, &categories)?;

    let best = report.best().mean_score;
    for (i, score) in report.scores.iter().enumerate() {
        assert!(score.mean_score <= best);
        if i < report.best_index {
            assert!(score.mean_score < best);
        }
        assert_eq!(score.fold_scores.len(), 3);
    }
    assert_eq!(report.scoring, ScoringMetric::HammingAccuracy);

    Ok(())
}

#[test]
fn test_oversized_grid_fails_before_training() -> Result<()> {
    let (texts, labels, categories) = corpus();
    let config = SearchConfig {
        max_candidates: Some(8),
        ..search_config(1)
    };
    let search = GridSearch::new(config, AnalyzerConfig::default(), ForestConfig::default())?;

    let err = search.fit(&texts, &labels, &categories).unwrap_err();
    assert!(matches!(err, TriageError::ResourceExhausted(_)));

    Ok(())
}

#[test]
fn test_train_pipeline_without_search() -> Result<()> {
    let (texts, labels, categories) = corpus();
    let messages = texts
        .iter()
        .enumerate()
        .map(|(i, text)| Message::new(i as i64, text.as_str()))
        .collect();
    let dataset = Dataset::new(messages, labels, categories)?;

    let mut config = TrainingConfig::default();
    config.search.enabled = false;
    config.forest.n_estimators = 10;

    let (pipeline, report) = train_pipeline(&config, &dataset)?;
    assert!(report.is_none());
    assert!(pipeline.is_fitted());

    let metadata = pipeline.metadata().unwrap();
    assert_eq!(metadata.n_training_rows, dataset.len());
    assert_eq!(metadata.forest.n_estimators, 10);
    assert_eq!(metadata.search_score, None);

    Ok(())
}

//! Criterion benchmarks for the triage pipeline.
//!
//! Covers the three hot stages:
//! - Message analysis
//! - TF-IDF fitting and transformation
//! - Forest fitting and prediction

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use triage::analysis::{Analyzer, MessageAnalyzer};
use triage::corpus::{CategorySet, LabelMatrix};
use triage::features::{TfidfVectorizer, VectorizerConfig};
use triage::ml::{ForestConfig, MultiOutputClassifier};

const WORDS: &[&str] = &[
    "water", "food", "shelter", "medical", "help", "need", "please", "road", "bridge", "flood",
    "storm", "earthquake", "fire", "children", "hospital", "tents", "village", "camp", "missing",
    "people", "supplies", "electricity", "aid", "urgent", "rain", "damaged", "blocked", "send",
];

/// Generate messages of varying length from a fixed vocabulary.
fn generate_messages(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let length = 8 + (i % 24);
            let mut words: Vec<&str> = (0..length)
                .map(|j| WORDS[(i * 7 + j * 13) % WORDS.len()])
                .collect();
            if i % 5 == 0 {
                words.push("http://example.org/report");
            }
            words.join(" ")
        })
        .collect()
}

fn generate_labels(messages: &[String]) -> (LabelMatrix, CategorySet) {
    let rows = messages
        .iter()
        .map(|m| {
            vec![
                u8::from(m.contains("water")),
                u8::from(m.contains("food")),
                u8::from(m.contains("road") || m.contains("bridge")),
            ]
        })
        .collect();
    let labels = LabelMatrix::from_rows(rows, 3).unwrap();
    let categories = CategorySet::new(["water", "food", "transport"]).unwrap();
    (labels, categories)
}

fn bench_text_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_analysis");
    let analyzer = MessageAnalyzer::new().unwrap();
    let messages = generate_messages(100);

    group.bench_function("analyze_single_message", |b| {
        b.iter(|| black_box(analyzer.terms(black_box(&messages[0])).unwrap()))
    });

    group.throughput(Throughput::Elements(messages.len() as u64));
    group.bench_function("analyze_batch_messages", |b| {
        b.iter(|| {
            for message in &messages {
                black_box(analyzer.terms(message).unwrap());
            }
        })
    });

    group.finish();
}

fn bench_vectorizer(c: &mut Criterion) {
    let mut group = c.benchmark_group("vectorizer");
    let analyzer = MessageAnalyzer::new().unwrap();
    let tokens: Vec<Vec<String>> = generate_messages(1000)
        .iter()
        .map(|m| analyzer.terms(m).unwrap())
        .collect();

    for ngram_range in [(1, 1), (1, 2)] {
        let config = VectorizerConfig {
            ngram_range,
            ..VectorizerConfig::default()
        };
        group.throughput(Throughput::Elements(tokens.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("fit_transform", format!("{}-{}", ngram_range.0, ngram_range.1)),
            &config,
            |b, config| {
                b.iter(|| {
                    let mut vectorizer = TfidfVectorizer::new(config.clone()).unwrap();
                    black_box(vectorizer.fit_transform(&tokens).unwrap())
                })
            },
        );
    }

    group.finish();
}

fn bench_forest(c: &mut Criterion) {
    let mut group = c.benchmark_group("forest");
    group.sample_size(10);

    let analyzer = MessageAnalyzer::new().unwrap();
    let messages = generate_messages(500);
    let tokens: Vec<Vec<String>> = messages.iter().map(|m| analyzer.terms(m).unwrap()).collect();
    let mut vectorizer = TfidfVectorizer::new(VectorizerConfig::default()).unwrap();
    let features = vectorizer.fit_transform(&tokens).unwrap();
    let (labels, categories) = generate_labels(&messages);

    for n_estimators in [10, 50] {
        let config = ForestConfig {
            n_estimators,
            ..ForestConfig::default()
        };
        group.bench_with_input(
            BenchmarkId::new("fit", n_estimators),
            &config,
            |b, config| {
                b.iter(|| {
                    let mut classifier = MultiOutputClassifier::new(config.clone()).unwrap();
                    classifier.fit(&features, &labels, &categories).unwrap();
                    black_box(classifier)
                })
            },
        );
    }

    let mut classifier = MultiOutputClassifier::new(ForestConfig {
        n_estimators: 50,
        ..ForestConfig::default()
    })
    .unwrap();
    classifier.fit(&features, &labels, &categories).unwrap();

    group.throughput(Throughput::Elements(features.n_rows() as u64));
    group.bench_function("predict", |b| {
        b.iter(|| black_box(classifier.predict(black_box(&features)).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_text_analysis, bench_vectorizer, bench_forest);
criterion_main!(benches);

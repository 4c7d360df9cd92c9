//! 集計ビューの性質。
use review_sentiment::classification::{LabelSet, SentimentLabel, build_classifier};
use review_sentiment::config::{ClassifierKind, Config};
use review_sentiment::dataset::RecordSet;
use review_sentiment::pipeline::{BatchPipeline, LabeledResultSet};
use review_sentiment::summary::{ResultAggregator, Summary};

fn labeled(rows: &[(&str, &str)]) -> LabeledResultSet {
    let mut grid = vec![vec!["review".to_string(), "gender".to_string()]];
    grid.extend(
        rows.iter()
            .map(|(review, gender)| vec![(*review).to_string(), (*gender).to_string()]),
    );
    let config = Config::default().with_classifier_kind(ClassifierKind::Lexicon);
    let classifier = build_classifier(&config).expect("builtin lexicon");
    BatchPipeline::from_config(&config, classifier)
        .run(RecordSet::from_value_grid(grid).expect("grid"), "review")
        .expect("run succeeds")
}

#[test]
fn proportions_sum_to_one_hundred() {
    let results = labeled(&[
        ("I love this product", "F"),
        ("This is terrible", "M"),
        ("It is a box", "F"),
        ("Great battery", "M"),
        ("Awful screen", "F"),
        ("Excellent", "F"),
        ("Arrived Tuesday", "M"),
    ]);

    let summary = ResultAggregator.proportions(&results);
    let Summary::Ready(proportions) = summary else {
        panic!("non-empty results must produce proportions");
    };

    let total: f64 = proportions.iter().map(|entry| entry.percentage).sum();
    assert!((total - 100.0).abs() <= 0.01);
    assert_eq!(proportions.len(), LabelSet::Ternary.labels().len());
    assert!(
        proportions
            .iter()
            .all(|entry| (0.0..=100.0).contains(&entry.percentage))
    );
}

#[test]
fn empty_results_return_the_no_data_signal() {
    let empty = LabeledResultSet::new(vec!["review".into()], LabelSet::Binary, Vec::new())
        .expect("empty set");

    assert_eq!(ResultAggregator.proportions(&empty), Summary::NoData);
    assert_eq!(ResultAggregator.label_counts(&empty), Summary::NoData);
}

#[test]
fn joint_distribution_counts_every_row_once() {
    let results = labeled(&[
        ("I love this product", "F"),
        ("Great battery", "F"),
        ("This is terrible", "M"),
        ("It is a box", "M"),
    ]);

    let summary = ResultAggregator
        .joint_distribution(&results, "gender")
        .expect("gender column");
    let joint = summary.ready().expect("data");

    assert_eq!(joint.total(), results.len());
    assert_eq!(joint.count("F", SentimentLabel::Positive), 2);
    assert_eq!(joint.count("M", SentimentLabel::Negative), 1);
    assert_eq!(joint.count("M", SentimentLabel::Neutral), 1);
}

#[test]
fn aggregation_does_not_mutate_results() {
    let results = labeled(&[("I love this product", "F"), ("This is terrible", "M")]);
    let before = results.clone();

    let _ = ResultAggregator.proportions(&results);
    let _ = ResultAggregator.scatter_pairs(&results, "gender");
    let _ = ResultAggregator.joint_distribution(&results, "review");

    assert_eq!(results, before);
}

#[test]
fn summaries_serialize_for_charting() {
    let results = labeled(&[("I love this product", "F"), ("This is terrible", "M")]);

    let json = serde_json::to_value(ResultAggregator.label_counts(&results)).expect("json");

    assert_eq!(json["status"], "ready");
    assert_eq!(json["data"][0]["label"], "Positive");
    assert_eq!(json["data"][0]["count"], 1);
    assert_eq!(json["data"][2]["label"], "Neutral");
    assert_eq!(json["data"][2]["count"], 0);
}

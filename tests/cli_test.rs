//! `analyze` → `summarize` の一連の流れ。モデルを使わずレキシコンで実行する。
use std::fs;

use clap::Parser;

use review_sentiment::classification::{LabelSet, SentimentLabel};
use review_sentiment::cli::{self, Cli, Command};
use review_sentiment::config::Config;
use review_sentiment::export::load_results;
use review_sentiment::summary::Summary;

fn parse(args: &[&str]) -> Command {
    Cli::try_parse_from(std::iter::once("review-sentiment").chain(args.iter().copied()))
        .expect("arguments parse")
        .command
}

#[test]
fn analyze_csv_then_summarize() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("reviews.csv");
    let output = dir.path().join("results.csv");
    fs::write(
        &input,
        "review,gender\nI love this product,F\nThis is terrible,M\nIt is a box,F\n",
    )
    .expect("write input");

    let Command::Analyze(args) = parse(&[
        "analyze",
        "--input",
        input.to_str().expect("utf-8 path"),
        "--column",
        "review",
        "--classifier",
        "lexicon",
        "--output",
        output.to_str().expect("utf-8 path"),
    ]) else {
        panic!("expected analyze");
    };
    let report = cli::analyze(&args, &Config::default(), None).expect("analyze succeeds");

    assert_eq!(report.classifier, "lexicon");
    assert_eq!(report.rows, 3);
    assert_eq!(report.output, output);
    let written = load_results(&output, LabelSet::Ternary).expect("results file");
    assert_eq!(
        written.labels().collect::<Vec<_>>(),
        vec![
            SentimentLabel::Positive,
            SentimentLabel::Negative,
            SentimentLabel::Neutral
        ]
    );

    let Command::Summarize(args) = parse(&[
        "summarize",
        "--results",
        output.to_str().expect("utf-8 path"),
        "--by",
        "gender",
        "--scatter",
        "review",
    ]) else {
        panic!("expected summarize");
    };
    let summary = cli::summarize(&args, &Config::default()).expect("summarize succeeds");

    assert_eq!(summary.rows, 3);
    let joint = summary
        .joint_distribution
        .as_ref()
        .and_then(Summary::ready)
        .expect("joint distribution");
    assert_eq!(joint.count("F", SentimentLabel::Neutral), 1);
    assert!(matches!(summary.scatter, Some(Summary::Ready(ref points)) if points.len() == 3));
}

#[test]
fn analyze_accepts_a_spreadsheet_value_grid() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("sheet.json");
    let output = dir.path().join("out.csv");
    fs::write(
        &input,
        r#"{"range": "Sheet1!A1:C4", "majorDimension": "ROWS", "values": [["review", "age", "gender"], ["Great battery", "31", "F"], ["Awful screen", "45"]]}"#,
    )
    .expect("write input");

    let Command::Analyze(args) = parse(&[
        "analyze",
        "--input",
        input.to_str().expect("utf-8 path"),
        "--column",
        "review",
        "--classifier",
        "lexicon",
        "--output",
        output.to_str().expect("utf-8 path"),
    ]) else {
        panic!("expected analyze");
    };
    cli::analyze(&args, &Config::default(), None).expect("analyze succeeds");

    let text = fs::read_to_string(&output).expect("results file");
    assert_eq!(
        text,
        "review,age,gender,Sentiment\nGreat battery,31,F,Positive\nAwful screen,45,,Negative\n"
    );
}

#[test]
fn analyze_reports_unknown_columns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("reviews.csv");
    fs::write(&input, "comment\nfine\n").expect("write input");

    let Command::Analyze(args) = parse(&[
        "analyze",
        "--input",
        input.to_str().expect("utf-8 path"),
        "--column",
        "review",
        "--classifier",
        "lexicon",
        "--output",
        dir.path().join("out.csv").to_str().expect("utf-8 path"),
    ]) else {
        panic!("expected analyze");
    };
    let error = cli::analyze(&args, &Config::default(), None).expect_err("unknown column");

    assert!(format!("{error:#}").contains("`review`"));
    assert!(!dir.path().join("out.csv").exists());
}

#[test]
fn summarize_without_results_file_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("results.csv");

    let Command::Summarize(args) = parse(&[
        "summarize",
        "--results",
        missing.to_str().expect("utf-8 path"),
    ]) else {
        panic!("expected summarize");
    };

    assert!(cli::summarize(&args, &Config::default()).is_err());
}

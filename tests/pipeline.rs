//! End-to-end quality smoke tests over the full pipeline.

use std::io::Write;

use treelin::data::{read_classification_csv, train_test_split, CsvOptions};
use treelin::embedding::{LeafEmbedder, SparseRowMatrix};
use treelin::linear::{LinearParams, LinearTrainer};
use treelin::model_selection::{grid_search_linear, KFold};
use treelin::testing::two_cluster_dataset;
use treelin::training::{
    Accuracy, Auc, ConfusionMatrix, F1, GBDTParams, HingeLoss, LogisticLoss, MetricFn,
};
use treelin::utils::Parallelism;

#[test]
fn leaf_embedding_plus_logistic_beats_ninety_percent() {
    let train = two_cluster_dataset(300, 3, 0);
    let test = two_cluster_dataset(100, 3, 1);

    let embedder = LeafEmbedder::new(GBDTParams { n_trees: 20, max_depth: 3, ..Default::default() });
    let (embedding, train_rows) = embedder.fit_transform(&train, Parallelism::Sequential).unwrap();

    let model = LinearTrainer::new(LogisticLoss, LinearParams { lambda: 0.5, ..Default::default() })
        .train(&train_rows, train.labels())
        .unwrap();

    let test_rows = embedding.transform(&test.features()).unwrap();
    let probs = model.predict_proba(&test_rows).expect("logistic model yields probabilities");

    let accuracy = Accuracy::default().compute(&probs, test.labels());
    let auc = Auc.compute(&probs, test.labels());
    assert!(accuracy > 0.9, "accuracy {accuracy}");
    assert!(auc > 0.95, "auc {auc}");
}

#[test]
fn linear_svm_on_raw_features_separates_clusters() {
    let train = two_cluster_dataset(200, 2, 2);
    let test = two_cluster_dataset(80, 2, 3);

    let train_rows = SparseRowMatrix::from_dense(&train.features());
    let test_rows = SparseRowMatrix::from_dense(&test.features());

    let model = LinearTrainer::new(HingeLoss, LinearParams { lambda: 0.1, ..Default::default() })
        .train(&train_rows, train.labels())
        .unwrap();

    let margins = model.decision_function(&test_rows);
    let cm = ConfusionMatrix::from_scores(&margins, test.labels(), 0.0);
    assert!(cm.accuracy() > 0.9, "accuracy {}", cm.accuracy());

    // Margin model: probabilities unavailable, normalized scores in [0, 1].
    assert!(model.predict_proba(&test_rows).is_none());
    let scores = model.positive_scores(&test_rows);
    assert!(scores.iter().all(|&s| (0.0..=1.0).contains(&s)));
}

#[test]
fn whole_pipeline_is_deterministic_for_fixed_seeds() {
    let data = two_cluster_dataset(150, 3, 4);

    let run = || {
        let (train, test) = train_test_split(&data, 0.2, 0).unwrap();
        let embedder =
            LeafEmbedder::new(GBDTParams { n_trees: 10, subsample: 0.7, seed: 9, ..Default::default() });
        let (embedding, train_rows) =
            embedder.fit_transform(&train, Parallelism::Sequential).unwrap();
        let model =
            LinearTrainer::new(LogisticLoss, LinearParams::default())
                .train(&train_rows, train.labels())
                .unwrap();
        let test_rows = embedding.transform(&test.features()).unwrap();
        model.predict_proba(&test_rows).unwrap()
    };

    assert_eq!(run(), run());
}

#[test]
fn embedding_improves_over_raw_features_for_ring_data() {
    // A radially separable problem: raw linear features cannot cut it, leaf
    // embeddings can.
    let n = 400;
    let mut values = Vec::with_capacity(n * 2);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let angle = i as f32 * 0.737;
        let inner = i % 2 == 0;
        let radius = if inner { 1.0 } else { 3.0 };
        values.push(radius * angle.cos());
        values.push(radius * angle.sin());
        labels.push(if inner { 1.0 } else { 0.0 });
    }
    let samples = ndarray::Array2::from_shape_vec((n, 2), values).unwrap();
    let data = treelin::data::Dataset::from_samples(samples.view(), &labels).unwrap();
    let (train, test) = train_test_split(&data, 0.25, 0).unwrap();

    let raw_train = SparseRowMatrix::from_dense(&train.features());
    let raw_test = SparseRowMatrix::from_dense(&test.features());
    let raw_model = LinearTrainer::new(LogisticLoss, LinearParams::default())
        .train(&raw_train, train.labels())
        .unwrap();
    let raw_probs = raw_model.predict_proba(&raw_test).unwrap();
    let raw_acc = Accuracy::default().compute(&raw_probs, test.labels());

    let embedder = LeafEmbedder::new(GBDTParams { n_trees: 30, max_depth: 3, ..Default::default() });
    let (embedding, train_rows) = embedder.fit_transform(&train, Parallelism::Sequential).unwrap();
    let model = LinearTrainer::new(LogisticLoss, LinearParams { lambda: 0.5, ..Default::default() })
        .train(&train_rows, train.labels())
        .unwrap();
    let probs = model.predict_proba(&embedding.transform(&test.features()).unwrap()).unwrap();
    let embedded_acc = Accuracy::default().compute(&probs, test.labels());

    assert!(embedded_acc > 0.9, "embedded accuracy {embedded_acc}");
    assert!(embedded_acc > raw_acc + 0.1, "raw {raw_acc} vs embedded {embedded_acc}");
}

#[test]
fn csv_to_metrics_round_trip() {
    // A small categorical-plus-numeric table, through the full flow.
    let path = std::env::temp_dir().join("treelin_pipeline_income.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    for i in 0..120 {
        let rich = i % 2 == 0;
        let age = if rich { 45 + i % 10 } else { 25 + i % 10 };
        let job = if rich { "exec" } else { "clerk" };
        let hours = if rich { 50 } else { 35 };
        let income = if rich { ">50K" } else { "<=50K" };
        writeln!(file, "{age},{job},{hours},{income}").unwrap();
    }
    drop(file);

    let options = CsvOptions {
        has_header: false,
        column_names: Some(
            ["age", "job", "hours", "income"].iter().map(|s| s.to_string()).collect(),
        ),
        target_column: Some("income".to_string()),
        positive_label: ">50K".to_string(),
        ..Default::default()
    };
    let data = read_classification_csv(&path, &options).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(data.n_features(), 3);
    assert!((data.positive_rate() - 0.5).abs() < 0.01);

    let (train, test) = train_test_split(&data, 0.2, 0).unwrap();
    let embedder = LeafEmbedder::new(GBDTParams { n_trees: 10, max_depth: 2, ..Default::default() });
    let (embedding, train_rows) = embedder.fit_transform(&train, Parallelism::Sequential).unwrap();

    let candidates = [
        LinearParams { lambda: 0.1, ..Default::default() },
        LinearParams { lambda: 1.0, ..Default::default() },
    ];
    let report = grid_search_linear(
        &candidates,
        &LogisticLoss,
        &F1::default(),
        &train_rows,
        train.labels(),
        &KFold::new(4, 0),
        Parallelism::Sequential,
    )
    .unwrap();

    let model = LinearTrainer::new(LogisticLoss, report.best_params.clone())
        .train(&train_rows, train.labels())
        .unwrap();
    let probs = model.predict_proba(&embedding.transform(&test.features()).unwrap()).unwrap();

    let cm = ConfusionMatrix::from_scores(&probs, test.labels(), 0.5);
    assert!(cm.f1() > 0.9, "f1 {}", cm.f1());
}

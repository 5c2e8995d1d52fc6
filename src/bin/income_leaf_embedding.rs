//! Income prediction with gradient-boosted leaf embeddings and logistic
//! regression.
//!
//! Flow: load the adult income table, split 80/20, grid-search GBDT
//! hyperparameters by cross-validated F1, fit the leaf embedder with the
//! winner (recording the per-round train/test loss curve), then grid-search
//! and train an L2 logistic model on the embedded rows and report test
//! metrics.
//!
//! ```bash
//! cargo run --release --bin income_leaf_embedding -- adult.data.csv [loss_curve.csv]
//! ```

use std::error::Error;
use std::io::Write;

use treelin::data::{read_classification_csv, train_test_split, CsvOptions};
use treelin::embedding::LeafEmbedder;
use treelin::linear::{LinearParams, LinearTrainer};
use treelin::model_selection::{grid_search_gbdt, grid_search_linear, KFold};
use treelin::training::{
    Auc, ConfusionMatrix, F1, GBDTParams, LogisticLoss, MetricFn, TrainingHistory,
};
use treelin::utils::Parallelism;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let data_path = args
        .next()
        .ok_or("usage: income_leaf_embedding <adult.data.csv> [loss_curve.csv]")?;
    let curve_path = args.next();

    let data = read_classification_csv(&data_path, &adult_options())?;
    println!(
        "loaded {} samples, {} features, {:.1}% positive",
        data.n_samples(),
        data.n_features(),
        100.0 * data.positive_rate()
    );

    let (train, test) = train_test_split(&data, 0.2, 0)?;
    let parallelism = Parallelism::from_threads(0);

    // Hyperparameter search for the ensemble, scored by cross-validated F1.
    let candidates = gbdt_grid();
    println!("searching {} GBDT candidates (5-fold CV, f1)", candidates.len());
    let report = grid_search_gbdt(
        &candidates,
        &LogisticLoss,
        &F1::default(),
        &train,
        &KFold::new(5, 0),
        parallelism,
    )?;
    for (params, score) in &report.results {
        println!(
            "  n_trees={:<4} max_depth={} subsample={:.1}  f1={score:.4}",
            params.n_trees, params.max_depth, params.subsample
        );
    }
    let best = report.best_params.clone();
    println!(
        "best: n_trees={} max_depth={} subsample={:.1} (f1={:.4})",
        best.n_trees, best.max_depth, best.subsample, report.best_score
    );

    // Fit the embedding with the winning ensemble; the test split serves as
    // the evaluation set for the staged loss curve.
    let embedder = LeafEmbedder::new(best);
    let (embedding, history) = embedder.fit_with_history(&train, Some(&test), parallelism)?;
    println!(
        "embedding: {} trees, width {} ({} -> {} columns)",
        embedding.n_learners(),
        embedding.width(),
        train.n_features(),
        embedding.width()
    );

    if let Some(path) = curve_path {
        write_loss_curve(&path, &history)?;
        println!("loss curve written to {path}");
    }

    let train_rows = embedding.transform(&train.features())?;
    let test_rows = embedding.transform(&test.features())?;

    // Downstream logistic regression on the embedded rows.
    let linear_candidates: Vec<LinearParams> = [0.1f32, 1.0, 10.0]
        .iter()
        .map(|&lambda| LinearParams { lambda, ..Default::default() })
        .collect();
    let linear_report = grid_search_linear(
        &linear_candidates,
        &LogisticLoss,
        &F1::default(),
        &train_rows,
        train.labels(),
        &KFold::new(5, 0),
        parallelism,
    )?;
    println!(
        "best logistic lambda: {} (f1={:.4})",
        linear_report.best_params.lambda, linear_report.best_score
    );

    let model = LinearTrainer::new(LogisticLoss, linear_report.best_params.clone())
        .train(&train_rows, train.labels())?;

    let (scores, _) = model.predict_scores(&test_rows);
    report_metrics("leaf embedding + logistic", &scores, test.labels(), 0.5);

    Ok(())
}

fn adult_options() -> CsvOptions {
    let names = "age, workclass, fnlwgt, education, education-num, marital-status, occupation, \
                 relationship, race, sex, capital-gain, capital-loss, hours-per-week, \
                 native-country, income";
    CsvOptions {
        has_header: false,
        column_names: Some(names.split(", ").map(str::to_string).collect()),
        target_column: Some("income".to_string()),
        positive_label: ">50K".to_string(),
        ..Default::default()
    }
}

fn gbdt_grid() -> Vec<GBDTParams> {
    let mut grid = Vec::new();
    for &n_trees in &[50u32, 100] {
        for &max_depth in &[2u32, 3] {
            for &subsample in &[0.3f32, 1.0] {
                grid.push(GBDTParams { n_trees, max_depth, subsample, ..Default::default() });
            }
        }
    }
    grid
}

fn write_loss_curve(path: &str, history: &TrainingHistory) -> Result<(), Box<dyn Error>> {
    let mut file = std::fs::File::create(path)?;
    writeln!(file, "round,train_loss,test_loss")?;
    for (round, (train, test)) in
        history.train_loss.iter().zip(&history.eval_loss).enumerate()
    {
        writeln!(file, "{round},{train},{test}")?;
    }
    Ok(())
}

fn report_metrics(name: &str, scores: &[f32], targets: &[f32], threshold: f32) {
    let cm = ConfusionMatrix::from_scores(scores, targets, threshold);
    let auc = Auc.compute(scores, targets);

    println!("== {name} ==");
    println!(
        "confusion matrix: tp={} fp={} fn={} tn={}",
        cm.true_positives, cm.false_positives, cm.false_negatives, cm.true_negatives
    );
    println!(
        "accuracy={:.5e} precision={:.5e} recall={:.5e} f1={:.5e} auc={:.4}",
        cm.accuracy(),
        cm.precision(),
        cm.recall(),
        cm.f1(),
        auc
    );
}

use linfa::prelude::*;
use linfa_lars::{Lars, LarsCv, PathMeasure};

fn main() {
    // load Diabetes dataset
    let (train, valid) = linfa_datasets::diabetes().split_with_ratio(0.90);

    let model = Lars::params().fit(&train).unwrap();

    println!("steps:  {} ({:?})", model.n_steps(), model.stop_reason());
    for (k, state) in model.path().states().iter().enumerate() {
        println!(
            "state {:>2}: lambda {:>10.3}, l1 {:>10.3}, active {:?}",
            k,
            model.path().lambdas()[k],
            state.l1_norm(),
            state.indices().collect::<Vec<_>>()
        );
    }
    println!("hyperplane:  {}", model.hyperplane());
    println!("intercept:  {}", model.intercept());

    // choose a position along the path with 10-fold cross-validation
    let cv = LarsCv::params().fit(&train).unwrap();
    let position = cv.one_se_position();
    println!(
        "best position: {}, one standard error position: {}",
        cv.best_position(),
        position
    );

    // validate
    let y_est = model.predict_at(valid.records(), position, PathMeasure::L1Fraction);
    println!("predicted variance: {}", valid.r2(&y_est).unwrap());
}

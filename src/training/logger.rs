//! Verbosity-gated training progress output.

/// How much training progress to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// No output.
    #[default]
    Silent,
    /// One line per round.
    Info,
}

/// Prints per-round losses to stderr when verbosity allows.
///
/// Kept deliberately small: stdout belongs to the experiment reports, stderr
/// to training progress.
#[derive(Debug)]
pub struct TrainingLogger {
    verbosity: Verbosity,
}

impl TrainingLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    pub fn start_training(&self, objective: &str, n_rounds: usize) {
        if self.verbosity >= Verbosity::Info {
            eprintln!("[treelin] training {objective} for {n_rounds} rounds");
        }
    }

    pub fn log_round(&self, round: usize, train_loss: f64, eval_loss: Option<f64>) {
        if self.verbosity >= Verbosity::Info {
            match eval_loss {
                Some(eval) => {
                    eprintln!("[treelin] round {round:>4}  train {train_loss:.6}  eval {eval:.6}")
                }
                None => eprintln!("[treelin] round {round:>4}  train {train_loss:.6}"),
            }
        }
    }

    pub fn finish_training(&self, n_rounds: usize) {
        if self.verbosity >= Verbosity::Info {
            eprintln!("[treelin] finished after {n_rounds} rounds");
        }
    }
}

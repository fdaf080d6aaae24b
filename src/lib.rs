/*!
This library scores sequence-tagging models with an entity-level F1 measure. It takes padded
batches of class distributions, as produced by a tagger ending with a softmax, and works without
any deep-learning runtime.
# SCORING
For every example `i` and every position `j < lengths[i]`, the gold class `t` and the predicted
class `p` are the argmax of their distributions (ties go to the lowest index).
* If `t == p`, the true positives of `t` are incremented.
* Otherwise, the false positives of the **gold** class `t` and the false negatives of the
    **predicted** class `p` are incremented. This is the *gold-fp / predicted-fn* convention,
    which differs from the textbook definitions.

An aggregate class, stored at index `class_size`, pools the counts of every class but the
unnamed entity (the background tag, `class_size - 1` by default). Its f-score is the
micro-averaged f-score of the named entities, and it is what `f1_score` returns.

Positions at or beyond `lengths[i]` are padding and are never read.

# Terminology
* A class is one of the `class_size` tags of the model, identified by its index on the last
    axis of the arrays.
* The unnamed entity is the tag given to tokens outside of any entity (e.g. `O`).
* A named entity is any class other than the unnamed entity.
* A degenerate class is a class with a zero denominator for its precision, recall or f-score.
    What happens to it is described by the `DivByZeroStrat`.
*/

mod config;
mod confusion;
mod lengths;
mod metrics;
mod reporter;

// The public api starts here
pub use config::{ConfigError, ScorerConfig, ScorerConfigBuilder};

pub use confusion::ConfusionCounts;

pub use lengths::lengths_from_features;

pub use metrics::{
    confusion_counts, f1_report, f1_score, f1_score_conf, DivByZeroStrat, DivisionByZeroError,
    FloatExt, InvalidLengthError, InvalidShapeError, ParsingDivisionByZeroStrategyError,
    PrecisionRecallFScore, ScoringError,
};

pub use reporter::{ClassKind, ClassMetrics, DegenerateClass, Ratio, Reporter};

pub use ndarray_stats::errors::MinMaxError;

/// Computes the aggregate named-entity f-score of a batch with the default configuration for
/// `class_size` classes, and returns it together with the full `Reporter`.
///
/// * `predictions`: Predicted class distributions, of shape `[batch, sentence, class_size]`
/// * `targets`: One-hot gold distributions, of the same shape. Padding rows are all-zero.
/// * `lengths`: Number of real tokens of each example
/// * `class_size`: Number of classes
///
/// # Example
/// ```rust
/// use ndarray::array;
/// use tagf1::score_with_report;
///
/// let targets = array![[[1., 0., 0.], [0., 1., 0.]]];
/// let predictions = array![[[0.8, 0.1, 0.1], [0.2, 0.3, 0.5]]];
///
/// let (score, reporter) = score_with_report(&predictions, &targets, &[2], 3).unwrap();
/// assert!((score - 2.0 / 3.0).abs() < 1e-12);
///
/// let named_entity = reporter.named_entity().unwrap();
/// assert_eq!(named_entity.precision, 0.5);
/// assert_eq!(named_entity.recall, 1.0);
/// ```
pub fn score_with_report<A, S, L>(
    predictions: &ndarray::ArrayBase<S, ndarray::Ix3>,
    targets: &ndarray::ArrayBase<S, ndarray::Ix3>,
    lengths: &[L],
    class_size: usize,
) -> Result<(f64, Reporter), ScoringError>
where
    A: FloatExt,
    S: ndarray::Data<Elem = A>,
    L: num::PrimInt,
{
    let config = ScorerConfig::new(class_size)?;
    let reporter = f1_report(predictions, targets, lengths, &config)?;
    let score = reporter
        .named_entity()
        .map(|class| class.fscore)
        .unwrap_or(f64::NAN);
    Ok((score, reporter))
}

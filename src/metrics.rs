use crate::config::{ConfigError, ScorerConfig};
use crate::confusion::ConfusionCounts;
use crate::reporter::{DegenerateClass, Ratio, Reporter};
/**
This module computes the metrics (precision, recall, f-score) of a batch of predicted class
distributions against a batch of one-hot gold distributions. Both batches are padded to the
same sentence length; only the first `lengths[i]` positions of the example `i` are scored.
*/
use core::fmt;
use itertools::multizip;
use ndarray::parallel::prelude::*;
use ndarray::{prelude::*, Data, Zip};
use ndarray_stats::{errors::MinMaxError, QuantileExt};
use num::{Float, PrimInt};
use serde::{Deserialize, Serialize};
use std::{
    error::Error,
    fmt::{Debug, Display},
    str::FromStr,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
/// How do we handle a ratio whose denominator is zero? This happens when a class never appears
/// as gold or as predicted in a batch. In every case, the class and the ratio are recorded in
/// the `Reporter`.
pub enum DivByZeroStrat {
    /// The ratio is NaN, like a plain floating point division. This is the default.
    #[default]
    Propagate,
    /// The ratio is replaced by `0` and a warning is logged.
    ReplaceBy0,
    /// Returns an error. It will stop the computation.
    ReturnError,
}

impl Display for DivByZeroStrat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let str_content = match self {
            Self::Propagate => "propagate",
            Self::ReplaceBy0 => "replaceby0",
            Self::ReturnError => "returnerror",
        };
        write!(f, "{}", str_content)
    }
}

#[derive(Debug)]
pub struct ParsingDivisionByZeroStrategyError<S: Debug + Display>(S);

impl<S: Debug + Display> Display for ParsingDivisionByZeroStrategyError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Could not parse the {} into a a `DivisionByZeroStrategy`",
            self.0
        )
    }
}
impl<S: Debug + Display> Error for ParsingDivisionByZeroStrategyError<S> {}

impl FromStr for DivByZeroStrat {
    type Err = ParsingDivisionByZeroStrategyError<String>;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_ref() {
            "propagate" | "nan" => Ok(DivByZeroStrat::Propagate),
            "replaceby0" | "replacebyzero" | "zero" => Ok(DivByZeroStrat::ReplaceBy0),
            "returnerror" | "error" => Ok(DivByZeroStrat::ReturnError),
            _ => Err(ParsingDivisionByZeroStrategyError(String::from(s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Error returned by the `ReturnError` strategy. It holds the first ratio found with a zero
/// denominator.
pub struct DivisionByZeroError {
    pub class: usize,
    pub ratio: Ratio,
}

impl Display for DivisionByZeroError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Encountered division by zero when computing the {} of class {}",
            self.ratio, self.class
        )
    }
}

impl Error for DivisionByZeroError {}

/// Internal extension trait for Num's Float trait
pub trait FloatExt: Float + Send + Sync + Debug {}

impl<T: Float + Send + Sync + Debug> FloatExt for T {}

type Shape3 = (usize, usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Error type to represent arrays whose shapes disagree with each other or with the
/// configuration.
pub enum InvalidShapeError {
    /// `predictions` and `targets` do not have the same shape.
    Mismatch { predictions: Shape3, targets: Shape3 },
    /// The last axis is not `class_size` long.
    ClassAxis { class_size: usize, found: usize },
    /// There is not exactly one length per example.
    Lengths { batch_size: usize, lengths: usize },
}

impl Display for InvalidShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mismatch {
                predictions,
                targets,
            } => write!(
                f,
                "Inconsistent shapes. `predictions` has shape {:?}, `targets` has shape {:?}",
                predictions, targets
            ),
            Self::ClassAxis { class_size, found } => write!(
                f,
                "Expected {} classes on the last axis, found {}",
                class_size, found
            ),
            Self::Lengths {
                batch_size,
                lengths,
            } => write!(
                f,
                "Expected one length per example ({}), got {} lengths",
                batch_size, lengths
            ),
        }
    }
}
impl Error for InvalidShapeError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Error type to represent a sequence length outside of `[0, sentence_length]`.
pub enum InvalidLengthError {
    Negative {
        example: usize,
    },
    TooLong {
        example: usize,
        length: usize,
        sentence_length: usize,
    },
    /// The length does not fit into a `usize`.
    OutOfRange {
        example: usize,
        sentence_length: usize,
    },
}

impl Display for InvalidLengthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative { example } => {
                write!(f, "The length of example {} is negative", example)
            }
            Self::TooLong {
                example,
                length,
                sentence_length,
            } => write!(
                f,
                "The length of example {} ({}) exceeds the sentence length ({})",
                example, length, sentence_length
            ),
            Self::OutOfRange {
                example,
                sentence_length,
            } => write!(
                f,
                "The length of example {} exceeds the sentence length ({})",
                example, sentence_length
            ),
        }
    }
}
impl Error for InvalidLengthError {}

#[derive(Debug, Clone, PartialEq)]
/// Enum error encompassing every failure that could happen when scoring a batch. Validation
/// errors are raised before any counting happens; no partial result is ever returned.
pub enum ScoringError {
    InvalidShape(InvalidShapeError),
    InvalidLength(InvalidLengthError),
    DivisionByZero(DivisionByZeroError),
    /// A distribution of a scored position contains a NaN.
    UndefinedOrder(MinMaxError),
    /// The batch contains no example.
    EmptyInput,
    InvalidConfig(ConfigError),
}

impl Display for ScoringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidShape(shape_err) => Display::fmt(shape_err, f),
            Self::InvalidLength(length_err) => Display::fmt(length_err, f),
            Self::DivisionByZero(div_err) => Display::fmt(div_err, f),
            Self::UndefinedOrder(order_err) => {
                write!(f, "Could not take the argmax of a distribution: {}", order_err)
            }
            Self::EmptyInput => write!(f, "Received an empty batch"),
            Self::InvalidConfig(config_err) => Display::fmt(config_err, f),
        }
    }
}
impl Error for ScoringError {}

impl From<InvalidShapeError> for ScoringError {
    fn from(value: InvalidShapeError) -> Self {
        Self::InvalidShape(value)
    }
}

impl From<InvalidLengthError> for ScoringError {
    fn from(value: InvalidLengthError) -> Self {
        Self::InvalidLength(value)
    }
}

impl From<DivisionByZeroError> for ScoringError {
    fn from(value: DivisionByZeroError) -> Self {
        Self::DivisionByZero(value)
    }
}

impl From<MinMaxError> for ScoringError {
    fn from(value: MinMaxError) -> Self {
        Self::UndefinedOrder(value)
    }
}

impl From<ConfigError> for ScoringError {
    fn from(value: ConfigError) -> Self {
        Self::InvalidConfig(value)
    }
}

fn check_consistent_shape<A>(
    predictions: &ArrayView3<A>,
    targets: &ArrayView3<A>,
    lengths: usize,
    class_size: usize,
) -> Result<(), InvalidShapeError> {
    let (predictions_dim, targets_dim) = (predictions.dim(), targets.dim());
    if predictions_dim != targets_dim {
        return Err(InvalidShapeError::Mismatch {
            predictions: predictions_dim,
            targets: targets_dim,
        });
    }
    let (batch_size, _, found) = targets_dim;
    if found != class_size {
        return Err(InvalidShapeError::ClassAxis { class_size, found });
    }
    if lengths != batch_size {
        return Err(InvalidShapeError::Lengths {
            batch_size,
            lengths,
        });
    }
    Ok(())
}

fn check_lengths<L: PrimInt>(
    lengths: &[L],
    sentence_length: usize,
) -> Result<Vec<usize>, InvalidLengthError> {
    lengths
        .iter()
        .enumerate()
        .map(|(example, length)| {
            if *length < L::zero() {
                return Err(InvalidLengthError::Negative { example });
            }
            match length.to_usize() {
                Some(length) if length <= sentence_length => Ok(length),
                Some(length) => Err(InvalidLengthError::TooLong {
                    example,
                    length,
                    sentence_length,
                }),
                None => Err(InvalidLengthError::OutOfRange {
                    example,
                    sentence_length,
                }),
            }
        })
        .collect()
}

/// Counts the first `length` positions of a single example. The class of a distribution is its
/// argmax; ties go to the lowest index.
#[inline(always)]
fn count_example<A: FloatExt>(
    mut counts: ConfusionCounts,
    target: ArrayView2<A>,
    prediction: ArrayView2<A>,
    length: usize,
) -> Result<ConfusionCounts, MinMaxError> {
    for (gold, predicted) in target.outer_iter().zip(prediction.outer_iter()).take(length) {
        counts.record(gold.argmax()?, predicted.argmax()?);
    }
    Ok(counts)
}

/// Counts every example of a validated batch. In parallel, every rayon worker folds its
/// examples into its own counts and the partial counts are merged.
fn count_batch<A: FloatExt>(
    predictions: ArrayView3<A>,
    targets: ArrayView3<A>,
    lengths: &[usize],
    class_size: usize,
    parallel: bool,
) -> Result<ConfusionCounts, MinMaxError> {
    if parallel {
        targets
            .axis_iter(Axis(0))
            .into_par_iter()
            .zip(predictions.axis_iter(Axis(0)))
            .zip(lengths.par_iter())
            .try_fold(
                || ConfusionCounts::new(class_size),
                |counts, ((target, prediction), &length)| {
                    count_example(counts, target, prediction, length)
                },
            )
            .try_reduce(
                || ConfusionCounts::new(class_size),
                |left, right| Ok(left.merge(right)),
            )
    } else {
        multizip((
            targets.outer_iter(),
            predictions.outer_iter(),
            lengths.iter(),
        ))
        .try_fold(
            ConfusionCounts::new(class_size),
            |counts, (target, prediction, &length)| {
                count_example(counts, target, prediction, length)
            },
        )
    }
}

/// Divides `numerator` by `denominator` element-wise. Every zero denominator is pushed into
/// `degenerate` and handled according to `zero_division`.
fn prf_divide(
    numerator: &Array1<f64>,
    denominator: &Array1<f64>,
    ratio: Ratio,
    zero_division: DivByZeroStrat,
    degenerate: &mut Vec<DegenerateClass>,
) -> Result<Array1<f64>, DivisionByZeroError> {
    for (class, _) in denominator.indexed_iter().filter(|(_, d)| **d == 0.0) {
        if zero_division == DivByZeroStrat::ReturnError {
            return Err(DivisionByZeroError { class, ratio });
        }
        degenerate.push(DegenerateClass { class, ratio });
    }
    let result = Zip::from(numerator)
        .and(denominator)
        .map_collect(|&n, &d| match zero_division {
            DivByZeroStrat::ReplaceBy0 if d == 0.0 => 0.0,
            _ => n / d,
        });
    Ok(result)
}

/// Type alias for representing the output of the `precision_recall_fscore` function. The first
/// array contains the precision, the second the recall and the last one the f-score. The
/// aggregate class is the last element of each array.
pub type PrecisionRecallFScore = (Array1<f64>, Array1<f64>, Array1<f64>);

/// Computes the precision, recall and f-score of every class of `counts`, the aggregate
/// included. The ratios with a zero denominator are pushed into `degenerate`.
pub(crate) fn precision_recall_fscore(
    counts: &ConfusionCounts,
    zero_division: DivByZeroStrat,
    degenerate: &mut Vec<DegenerateClass>,
) -> Result<PrecisionRecallFScore, DivisionByZeroError> {
    let tp_sum = counts.true_positives().mapv(|x| x as f64);
    let predicted_sum = (&counts.true_positives() + &counts.false_positives()).mapv(|x| x as f64);
    let gold_sum = (&counts.true_positives() + &counts.false_negatives()).mapv(|x| x as f64);
    let precision = prf_divide(
        &tp_sum,
        &predicted_sum,
        Ratio::Precision,
        zero_division,
        degenerate,
    )?;
    let recall = prf_divide(&tp_sum, &gold_sum, Ratio::Recall, zero_division, degenerate)?;
    let numerator = 2.0 * &precision * &recall;
    let denominator = &precision + &recall;
    let fscore = prf_divide(
        &numerator,
        &denominator,
        Ratio::FScore,
        zero_division,
        degenerate,
    )?;
    Ok((precision, recall, fscore))
}

/// Counts the true positives, false positives and false negatives of every class, and of the
/// aggregate named-entity class. The inputs are validated before any counting happens.
///
/// * `predictions`: Predicted class distributions, of shape `[batch, sentence, class_size]`
/// * `targets`: One-hot gold distributions, of the same shape. Padding rows are all-zero.
/// * `lengths`: Number of real tokens of each example
/// * `config`: Parameters of the scorer
pub fn confusion_counts<A, S, L>(
    predictions: &ArrayBase<S, Ix3>,
    targets: &ArrayBase<S, Ix3>,
    lengths: &[L],
    config: &ScorerConfig,
) -> Result<ConfusionCounts, ScoringError>
where
    A: FloatExt,
    S: Data<Elem = A>,
    L: PrimInt,
{
    config.validate()?;
    let (predictions, targets) = (predictions.view(), targets.view());
    let class_size = config.class_size();
    check_consistent_shape(&predictions, &targets, lengths.len(), class_size)?;
    let (batch_size, sentence_length, _) = targets.dim();
    if batch_size == 0 {
        return Err(ScoringError::EmptyInput);
    }
    let lengths = check_lengths(lengths, sentence_length)?;
    let counts = count_batch(
        predictions,
        targets,
        &lengths,
        class_size,
        config.parallel(),
    )?;
    Ok(counts.with_named_entity_aggregate(config.unnamed_entity()))
}

/// Computes the precision, recall and f-score of every class and of the aggregate named-entity
/// class. The returned `Reporter` can be used to prettyprint the results.
///
/// * `predictions`: Predicted class distributions, of shape `[batch, sentence, class_size]`
/// * `targets`: One-hot gold distributions, of the same shape. Padding rows are all-zero.
/// * `lengths`: Number of real tokens of each example
/// * `config`: Parameters of the scorer
pub fn f1_report<A, S, L>(
    predictions: &ArrayBase<S, Ix3>,
    targets: &ArrayBase<S, Ix3>,
    lengths: &[L],
    config: &ScorerConfig,
) -> Result<Reporter, ScoringError>
where
    A: FloatExt,
    S: Data<Elem = A>,
    L: PrimInt,
{
    let counts = confusion_counts(predictions, targets, lengths, config)?;
    log::debug!(
        "tp: {}, fp: {}, fn: {}",
        counts.true_positives(),
        counts.false_positives(),
        counts.false_negatives()
    );
    let zero_division = config.zero_division();
    let mut degenerate = Vec::new();
    let (precision, recall, fscore) =
        precision_recall_fscore(&counts, zero_division, &mut degenerate)?;
    if zero_division == DivByZeroStrat::ReplaceBy0 {
        for class in degenerate.iter() {
            log::warn!("{}, replaced by 0", class);
        }
    }
    Ok(Reporter::new(
        &counts,
        precision,
        recall,
        fscore,
        degenerate,
        config,
    ))
}

/// Same as `f1_score`, with an explicit configuration.
pub fn f1_score_conf<A, S, L>(
    predictions: &ArrayBase<S, Ix3>,
    targets: &ArrayBase<S, Ix3>,
    lengths: &[L],
    config: &ScorerConfig,
) -> Result<f64, ScoringError>
where
    A: FloatExt,
    S: Data<Elem = A>,
    L: PrimInt,
{
    let reporter = f1_report(predictions, targets, lengths, config)?;
    let fscores = reporter.fscores();
    log::info!("fscore: {}", fscores);
    Ok(fscores[config.class_size()])
}

/// Main entrypoint of the scorer. Returns the f-score of the aggregate named-entity class,
/// which pools every class but the last one (the unnamed entity). The f-score of every class is
/// logged at the `info` level before returning. Zero denominators propagate as NaN.
///
/// * `predictions`: Predicted class distributions, of shape `[batch, sentence, class_size]`
/// * `targets`: One-hot gold distributions, of the same shape. Padding rows are all-zero.
/// * `lengths`: Number of real tokens of each example
/// * `class_size`: Number of classes
pub fn f1_score<A, S, L>(
    predictions: &ArrayBase<S, Ix3>,
    targets: &ArrayBase<S, Ix3>,
    lengths: &[L],
    class_size: usize,
) -> Result<f64, ScoringError>
where
    A: FloatExt,
    S: Data<Elem = A>,
    L: PrimInt,
{
    let config = ScorerConfig::new(class_size)?;
    f1_score_conf(predictions, targets, lengths, &config)
}

/**
This modules gives a few tools to prettyprint the output for all the classes and the aggregate
named-entity metrics.
*/
use crate::config::ScorerConfig;
use crate::confusion::ConfusionCounts;
use itertools::multizip;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The reporter holds the metrics of every class followed by the aggregate named-entity class.
/// It can be used to display the results as if they were collected into a dataframe and keeps
/// track of every ratio whose denominator was zero. The reporter is built by the `f1_report`
/// function.
///
/// # Example
///
/// ```rust
/// use ndarray::array;
/// use tagf1::{f1_report, ScorerConfigBuilder};
///
/// let targets = array![[[1., 0., 0.], [0., 0., 1.], [0., 0., 0.]]];
/// let predictions = array![[[0.7, 0.2, 0.1], [0.1, 0.1, 0.8], [0.3, 0.3, 0.4]]];
/// let config = ScorerConfigBuilder::new(3)
///     .class_names(vec!["PER", "LOC", "O"])
///     .build()
///     .unwrap();
///
/// let reporter = f1_report(&predictions, &targets, &[2], &config).unwrap();
/// let expected_report = "Class, Precision, Recall, Fscore, TP, FP, FN
/// PER, 1, 1, 1, 1, 0, 0
/// LOC, NaN, NaN, NaN, 0, 0, 0
/// O, 1, 1, 1, 1, 0, 0
/// Named_Entity, 1, 1, 1, 1, 0, 0\n";
///
/// assert_eq!(expected_report, reporter.to_string());
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Reporter {
    pub(crate) classes: Vec<ClassMetrics>,
    pub(crate) degenerate: Vec<DegenerateClass>,
}

impl Reporter {
    pub(crate) fn new(
        counts: &ConfusionCounts,
        precision: Array1<f64>,
        recall: Array1<f64>,
        fscore: Array1<f64>,
        degenerate: Vec<DegenerateClass>,
        config: &ScorerConfig,
    ) -> Self {
        let class_size = counts.class_size();
        let classes = multizip((precision, recall, fscore, counts.iter()))
            .enumerate()
            .map(
                |(class, (precision, recall, fscore, (tp, fp, fn_)))| ClassMetrics {
                    class,
                    name: config.class_name(class),
                    kind: ClassKind::of(class, class_size, config.unnamed_entity()),
                    precision,
                    recall,
                    fscore,
                    true_positives: tp,
                    false_positives: fp,
                    false_negatives: fn_,
                },
            )
            .collect();
        Self {
            classes,
            degenerate,
        }
    }

    /// Metrics of the real classes followed by the aggregate.
    pub fn classes(&self) -> &[ClassMetrics] {
        &self.classes
    }

    /// Metrics of a class by index. The aggregate lives at index `class_size`.
    pub fn get(&self, class: usize) -> Option<&ClassMetrics> {
        self.classes.get(class)
    }

    /// Metrics of the aggregate named-entity class.
    pub fn named_entity(&self) -> Option<&ClassMetrics> {
        self.classes.last()
    }

    /// Every ratio computed with a zero denominator.
    pub fn degenerate(&self) -> &[DegenerateClass] {
        &self.degenerate
    }

    pub fn precisions(&self) -> Array1<f64> {
        self.classes.iter().map(|c| c.precision).collect()
    }

    pub fn recalls(&self) -> Array1<f64> {
        self.classes.iter().map(|c| c.recall).collect()
    }

    /// The f-score of every class, the aggregate last.
    pub fn fscores(&self) -> Array1<f64> {
        self.classes.iter().map(|c| c.fscore).collect()
    }
}

impl From<Reporter> for Vec<ClassMetrics> {
    fn from(value: Reporter) -> Self {
        value.classes
    }
}

/// The Reporter struct acts as a dataframe when displayed.
impl Display for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Class, Precision, Recall, Fscore, TP, FP, FN")?;
        for v in self.classes.iter() {
            writeln!(f, "{}", v)?
        }
        Ok(())
    }
}

/// Role of a class in the report.
#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum ClassKind {
    /// A named entity class, pooled into the aggregate.
    Entity,
    /// The background class, left out of the aggregate.
    Unnamed,
    /// The synthetic class pooling every named entity.
    NamedEntity,
}

impl ClassKind {
    fn of(class: usize, class_size: usize, unnamed_entity: usize) -> Self {
        if class == class_size {
            Self::NamedEntity
        } else if class == unnamed_entity {
            Self::Unnamed
        } else {
            Self::Entity
        }
    }
}

/// Datastructure holding metrics about a given class.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ClassMetrics {
    /// Index of the class. The aggregate has index `class_size`.
    pub class: usize,
    /// Display name of the class, such as "PER", "LOC" or "Named_Entity".
    pub name: String,
    pub kind: ClassKind,
    pub precision: f64,
    pub recall: f64,
    pub fscore: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

/// The ClassMetrics struct acts as a line in a dataframe when displayed.
impl Display for ClassMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}, {}, {}",
            self.name,
            self.precision,
            self.recall,
            self.fscore,
            self.true_positives,
            self.false_positives,
            self.false_negatives
        )
    }
}

/// The ratios computed for each class.
#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum Ratio {
    Precision,
    Recall,
    FScore,
}

impl Display for Ratio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str_content = match self {
            Self::Precision => "precision",
            Self::Recall => "recall",
            Self::FScore => "fscore",
        };
        write!(f, "{}", str_content)
    }
}

/// A ratio of a class whose denominator was zero. Such a class never appeared as gold or as
/// predicted (or its precision and recall are both zero, for the fscore).
#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub struct DegenerateClass {
    pub class: usize,
    pub ratio: Ratio,
}

impl Display for DegenerateClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "The {} of class {} has a zero denominator",
            self.ratio, self.class
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScorerConfigBuilder;
    use ndarray::array;
    use rstest::rstest;

    fn reporter_with_three_classes() -> Reporter {
        let mut counts = ConfusionCounts::new(3);
        counts.record(0, 0);
        counts.record(1, 0);
        let counts = counts.with_named_entity_aggregate(2);
        let config = ScorerConfigBuilder::new(3)
            .class_names(vec!["PER", "LOC", "O"])
            .build()
            .unwrap();
        Reporter::new(
            &counts,
            array![1.0, 0.0, f64::NAN, 0.5],
            array![0.5, f64::NAN, f64::NAN, 0.5],
            array![0.6666666666666666, f64::NAN, f64::NAN, 0.5],
            vec![DegenerateClass {
                class: 1,
                ratio: Ratio::Recall,
            }],
            &config,
        )
    }

    #[rstest]
    #[case(0, ClassKind::Entity)]
    #[case(1, ClassKind::Entity)]
    #[case(2, ClassKind::Unnamed)]
    #[case(3, ClassKind::NamedEntity)]
    fn test_class_kind(#[case] class: usize, #[case] expected: ClassKind) {
        assert_eq!(ClassKind::of(class, 3, 2), expected);
    }

    #[test]
    fn test_reporter_rows() {
        let reporter = reporter_with_three_classes();
        assert_eq!(reporter.classes().len(), 4);
        let named_entity = reporter.named_entity().unwrap();
        assert_eq!(named_entity.name, "Named_Entity");
        assert_eq!(named_entity.kind, ClassKind::NamedEntity);
        assert_eq!(
            (
                named_entity.true_positives,
                named_entity.false_positives,
                named_entity.false_negatives
            ),
            (1, 1, 1)
        );
        assert_eq!(reporter.get(1).unwrap().false_positives, 1);
        assert_eq!(reporter.get(0).unwrap().false_negatives, 1);
        assert!(reporter.get(4).is_none());
    }

    #[test]
    fn test_reporter_display() {
        let reporter = reporter_with_three_classes();
        // NOTE: Do not change the indentation
        let expected = "Class, Precision, Recall, Fscore, TP, FP, FN
PER, 1, 0.5, 0.6666666666666666, 1, 0, 1
LOC, 0, NaN, NaN, 0, 1, 0
O, NaN, NaN, NaN, 0, 0, 0
Named_Entity, 0.5, 0.5, 0.5, 1, 1, 1\n";
        assert_eq!(reporter.to_string(), expected);
    }

    #[test]
    fn test_degenerate_display() {
        let reporter = reporter_with_three_classes();
        let messages: Vec<_> = reporter.degenerate().iter().map(|d| d.to_string()).collect();
        assert_eq!(
            messages,
            vec![String::from("The recall of class 1 has a zero denominator")]
        );
    }

    #[test]
    fn test_fscores_aggregate_last() {
        let reporter = reporter_with_three_classes();
        let fscores = reporter.fscores();
        assert_eq!(fscores.len(), 4);
        assert!(fscores[2].is_nan());
        assert_eq!(fscores[3], 0.5);
        assert_eq!(reporter.precisions()[1], 0.0);
        assert_eq!(reporter.recalls()[0], 0.5);
    }
}

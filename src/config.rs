/*
 * This modules contains the configuration of the scorer. The class count and the index of the
 * unnamed entity are carried by the `ScorerConfig` struct, which can be passed to the
 * `f1_score_conf`, `f1_report` and `confusion_counts` functions.
*/
use crate::metrics::DivByZeroStrat;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::Display;

/// Name given to the aggregate class in reports.
pub(crate) const NAMED_ENTITY_NAME: &str = "Named_Entity";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Config struct used to simplify the inputs of parameters to the main functions of `tagf1`.
/// The configuration is validated by the builder and by every scoring function.
pub struct ScorerConfig {
    /// Number of tag classes, i.e. the length of the last axis of the predictions and targets.
    class_size: usize,
    /// Index of the background class. It is left out of the aggregate named-entity class.
    /// Defaults to `class_size - 1`.
    unnamed_entity: usize,
    /// This parameter describes what to do when a denominator is zero when computing the
    /// precision, the recall or the fscore of a class.
    zero_division: DivByZeroStrat,
    /// Can we use multiple cores to count the examples? Each worker keeps its own counts, which
    /// are merged at the end.
    parallel: bool,
    /// Optional display names of the classes, used by the `Reporter`.
    class_names: Option<Vec<String>>,
}

impl ScorerConfig {
    /// Default configuration for `class_size` classes: the last class is the unnamed entity,
    /// zero denominators propagate as NaN and the counting is sequential.
    pub fn new(class_size: usize) -> Result<Self, ConfigError> {
        ScorerConfigBuilder::new(class_size).build()
    }

    pub fn class_size(&self) -> usize {
        self.class_size
    }

    pub fn unnamed_entity(&self) -> usize {
        self.unnamed_entity
    }

    pub fn zero_division(&self) -> DivByZeroStrat {
        self.zero_division
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub fn class_names(&self) -> Option<&[String]> {
        self.class_names.as_deref()
    }

    /// Display name of a class. The aggregate class, at index `class_size`, is always called
    /// `Named_Entity`.
    pub fn class_name(&self, class: usize) -> String {
        if class == self.class_size {
            return String::from(NAMED_ENTITY_NAME);
        }
        match self.class_names.as_ref().and_then(|names| names.get(class)) {
            Some(name) => name.clone(),
            None => class.to_string(),
        }
    }

    /// Checks the invariants of the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.class_size == 0 {
            return Err(ConfigError::NoClass);
        }
        if self.unnamed_entity >= self.class_size {
            return Err(ConfigError::UnnamedEntityOutOfRange {
                unnamed_entity: self.unnamed_entity,
                class_size: self.class_size,
            });
        }
        if let Some(names) = &self.class_names {
            if names.len() != self.class_size {
                return Err(ConfigError::ClassNamesMismatch {
                    class_size: self.class_size,
                    names: names.len(),
                });
            }
        }
        Ok(())
    }
}

impl Display for ScorerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let string = format!("Number of classes: {}\n Unnamed entity: {}\n Strategy when encountering a division by zero: {:?}\n Using parallel computations: {}\n Class names: {:?}", self.class_size, self.unnamed_entity, self.zero_division, self.parallel, self.class_names);
        write!(f, "{}", string)
    }
}

/// This builder can be used to build and customize a `ScorerConfig` stucture.
#[derive(Clone, Debug)]
pub struct ScorerConfigBuilder {
    class_size: usize,
    unnamed_entity: Option<usize>,
    zero_division: DivByZeroStrat,
    parallel: bool,
    class_names: Option<Vec<String>>,
}

impl ScorerConfigBuilder {
    pub fn new(class_size: usize) -> Self {
        Self {
            class_size,
            unnamed_entity: None,
            zero_division: DivByZeroStrat::default(),
            parallel: false,
            class_names: None,
        }
    }
    pub fn unnamed_entity(mut self, unnamed_entity: usize) -> Self {
        self.unnamed_entity = Some(unnamed_entity);
        self
    }
    pub fn division_by_zero(mut self, division_by_zero: DivByZeroStrat) -> Self {
        self.zero_division = division_by_zero;
        self
    }
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
    pub fn class_names<I, S>(mut self, class_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class_names = Some(class_names.into_iter().map(Into::into).collect());
        self
    }
    pub fn build(self) -> Result<ScorerConfig, ConfigError> {
        let config = ScorerConfig {
            class_size: self.class_size,
            unnamed_entity: self
                .unnamed_entity
                .unwrap_or_else(|| self.class_size.saturating_sub(1)),
            zero_division: self.zero_division,
            parallel: self.parallel,
            class_names: self.class_names,
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Error returned when a `ScorerConfig` breaks one of its invariants.
pub enum ConfigError {
    /// `class_size` is zero.
    NoClass,
    UnnamedEntityOutOfRange {
        unnamed_entity: usize,
        class_size: usize,
    },
    ClassNamesMismatch {
        class_size: usize,
        names: usize,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoClass => write!(f, "The number of classes must be positive"),
            Self::UnnamedEntityOutOfRange {
                unnamed_entity,
                class_size,
            } => write!(
                f,
                "The unnamed entity index ({}) must be smaller than the number of classes ({})",
                unnamed_entity, class_size
            ),
            Self::ClassNamesMismatch { class_size, names } => write!(
                f,
                "Expected {} class names, got {}",
                class_size, names
            ),
        }
    }
}
impl Error for ConfigError {}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DivByZeroStrat::Propagate)]
    #[case(DivByZeroStrat::ReplaceBy0)]
    #[case(DivByZeroStrat::ReturnError)]
    fn test_builder_setters_division_by_zero(#[case] strat: DivByZeroStrat) {
        let config = ScorerConfigBuilder::new(3)
            .division_by_zero(strat)
            .build()
            .unwrap();
        assert_eq!(config.zero_division(), strat)
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_builder_setters_parallel(#[case] parallel: bool) {
        let config = ScorerConfigBuilder::new(3).parallel(parallel).build().unwrap();
        assert_eq!(config.parallel(), parallel)
    }

    #[rstest]
    #[case(1, 0)]
    #[case(3, 2)]
    #[case(9, 8)]
    fn test_default_unnamed_entity_is_last_class(
        #[case] class_size: usize,
        #[case] expected: usize,
    ) {
        let config = ScorerConfig::new(class_size).unwrap();
        assert_eq!(config.unnamed_entity(), expected);
        assert_eq!(config.zero_division(), DivByZeroStrat::Propagate);
        assert!(!config.parallel());
    }

    #[test]
    fn test_builder_setters_unnamed_entity() {
        let config = ScorerConfigBuilder::new(4)
            .unnamed_entity(0)
            .build()
            .unwrap();
        assert_eq!(config.unnamed_entity(), 0)
    }

    #[rstest]
    #[case(ScorerConfigBuilder::new(0), ConfigError::NoClass)]
    #[case(
        ScorerConfigBuilder::new(3).unnamed_entity(3),
        ConfigError::UnnamedEntityOutOfRange { unnamed_entity: 3, class_size: 3 }
    )]
    #[case(
        ScorerConfigBuilder::new(3).class_names(vec!["PER", "O"]),
        ConfigError::ClassNamesMismatch { class_size: 3, names: 2 }
    )]
    fn test_builder_rejects_invalid_config(
        #[case] builder: ScorerConfigBuilder,
        #[case] expected: ConfigError,
    ) {
        assert_eq!(builder.build(), Err(expected))
    }

    #[test]
    fn test_class_names() {
        let named = ScorerConfigBuilder::new(2)
            .class_names(vec!["PER", "O"])
            .build()
            .unwrap();
        let unnamed = ScorerConfig::new(2).unwrap();
        assert_eq!(named.class_name(0), "PER");
        assert_eq!(named.class_name(2), "Named_Entity");
        assert_eq!(unnamed.class_name(1), "1");
        assert_eq!(unnamed.class_name(2), "Named_Entity");
    }
}

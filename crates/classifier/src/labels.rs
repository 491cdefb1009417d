//! Command label mapping

use crate::ClassifierError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Commands used when none are configured
pub const DEFAULT_COMMANDS: [&str; 6] = ["forward", "backward", "left", "right", "stop", "rest"];

/// Bijection between ordered command names and class indices 0..K-1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMap {
    commands: Vec<String>,
}

impl Default for LabelMap {
    fn default() -> Self {
        Self {
            commands: DEFAULT_COMMANDS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl LabelMap {
    /// Build from an ordered command list; empty or duplicate lists are rejected
    pub fn new<I, S>(commands: I) -> Result<Self, ClassifierError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let commands: Vec<String> = commands.into_iter().map(Into::into).collect();
        if commands.is_empty() {
            return Err(ClassifierError::EmptyCommands);
        }
        let mut seen = HashSet::new();
        for command in &commands {
            if !seen.insert(command.as_str()) {
                return Err(ClassifierError::DuplicateCommand(command.clone()));
            }
        }
        Ok(Self { commands })
    }

    /// Class index of a command
    pub fn index_of(&self, command: &str) -> Option<usize> {
        self.commands.iter().position(|c| c == command)
    }

    /// Command for a class index
    pub fn command(&self, index: usize) -> Option<&str> {
        self.commands.get(index).map(String::as_str)
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Always false for a constructed map
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands in class order
    pub fn commands(&self) -> &[String] {
        &self.commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_order() {
        let labels = LabelMap::default();
        assert_eq!(labels.len(), 6);
        assert_eq!(labels.index_of("forward"), Some(0));
        assert_eq!(labels.index_of("rest"), Some(5));
        assert_eq!(labels.command(3), Some("right"));
        assert_eq!(labels.command(6), None);
        assert_eq!(labels.index_of("jump"), None);
    }

    #[test]
    fn test_rejects_empty_and_duplicates() {
        assert_eq!(LabelMap::new(Vec::<String>::new()), Err(ClassifierError::EmptyCommands));
        assert_eq!(
            LabelMap::new(["left", "right", "left"]),
            Err(ClassifierError::DuplicateCommand("left".to_string()))
        );
    }

    proptest! {
        #[test]
        fn prop_bijection(names in proptest::collection::hash_set("[a-z]{1,8}", 1..12)) {
            let names: Vec<String> = names.into_iter().collect();
            let labels = LabelMap::new(names.clone()).unwrap();
            for (i, name) in names.iter().enumerate() {
                prop_assert_eq!(labels.index_of(name), Some(i));
                prop_assert_eq!(labels.command(i), Some(name.as_str()));
            }
        }
    }
}

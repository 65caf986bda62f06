//! Loading of newline-delimited input lists

use crate::error::SetupError;
use crate::pipeline::outcome::Category;
use std::fs;
use std::path::Path;
use tracing::info;

/// Items per input category; `None` when the file is absent
#[derive(Debug, Clone, Default)]
pub struct InputItems {
    pub passwords: Option<Vec<String>>,
    pub emails: Option<Vec<String>>,
    pub both: Option<Vec<String>>,
}

impl InputItems {
    /// Probe `dir` for each category file and load the ones present.
    ///
    /// Fails when none of them exists.
    pub fn load_dir(dir: &Path) -> Result<Self, SetupError> {
        let mut items = Self::default();

        for category in Category::ALL {
            let path = dir.join(category.file_name());
            if !path.is_file() {
                continue;
            }
            let loaded = load_items(&path)?;
            info!(file = %path.display(), count = loaded.len(), "input loaded");
            *items.slot_mut(category) = Some(loaded);
        }

        if items.present_categories() == 0 {
            return Err(SetupError::NoInputs {
                dir: dir.to_path_buf(),
            });
        }
        Ok(items)
    }

    pub fn get(&self, category: Category) -> &[String] {
        let slot = match category {
            Category::Passwords => &self.passwords,
            Category::Emails => &self.emails,
            Category::Both => &self.both,
        };
        slot.as_deref().unwrap_or_default()
    }

    fn slot_mut(&mut self, category: Category) -> &mut Option<Vec<String>> {
        match category {
            Category::Passwords => &mut self.passwords,
            Category::Emails => &mut self.emails,
            Category::Both => &mut self.both,
        }
    }

    /// Number of category files that were found, empty or not
    pub fn present_categories(&self) -> usize {
        [&self.passwords, &self.emails, &self.both]
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }

    /// Categories with at least one item
    pub fn active_categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|&category| !self.get(category).is_empty())
            .collect()
    }

    /// Total number of worker tasks the items will spawn
    pub fn total_checks(&self) -> usize {
        Category::ALL
            .into_iter()
            .map(|category| self.get(category).len() * category.checks().len())
            .sum()
    }
}

/// Read one item per line, dropping trailing `\r` and blank lines.
/// Duplicates are kept.
pub fn load_items(path: &Path) -> Result<Vec<String>, SetupError> {
    let content = fs::read_to_string(path).map_err(|source| SetupError::InputFile {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(content
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_items_keeps_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("passwords.txt");
        fs::write(&path, "hunter2\r\n\nhunter2\n  \npass word\n").unwrap();

        let items = load_items(&path).unwrap();
        assert_eq!(items, vec!["hunter2", "hunter2", "pass word"]);
    }

    #[test]
    fn test_load_dir_requires_some_input() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            InputItems::load_dir(dir.path()),
            Err(SetupError::NoInputs { .. })
        ));
    }

    #[test]
    fn test_load_dir_categories() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("passwords.txt"), "").unwrap();
        fs::write(dir.path().join("both.txt"), "a@b.c\nd@e.f\n").unwrap();

        let items = InputItems::load_dir(dir.path()).unwrap();
        assert_eq!(items.present_categories(), 2);
        assert_eq!(items.active_categories(), vec![Category::Both]);
        assert!(items.emails.is_none());
        assert_eq!(items.total_checks(), 4);
    }
}

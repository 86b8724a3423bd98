//! Presentation categories for ingested events.
//!
//! Categories are rendering hints only. They are recomputed every time an
//! event enters the cache and are never written back to the remote service.

use serde::{Deserialize, Serialize};

/// Title prefixes that mark an event as a background phase by default.
pub const DEFAULT_BACKGROUND_PHASES: &[&str] = &["Work", "Study", "Free", "Vacation"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Interactive,
    Background,
    Task,
}

/// Where an ingested item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    EventList,
    TaskList,
}

/// UI toggle that lets the user drag and edit phase events like any other
/// event. The classifier reads it but does not own it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackgroundMode {
    #[default]
    Locked,
    Editable,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    phases: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::new(DEFAULT_BACKGROUND_PHASES.iter().map(|p| p.to_string()))
    }
}

impl Classifier {
    pub fn new(phases: impl IntoIterator<Item = String>) -> Self {
        Classifier {
            phases: phases.into_iter().filter(|p| !p.is_empty()).collect(),
        }
    }

    pub fn phases(&self) -> &[String] {
        &self.phases
    }

    pub fn is_phase_title(&self, title: &str) -> bool {
        self.phases.iter().any(|phase| title.starts_with(phase.as_str()))
    }

    pub fn classify(
        &self,
        title: &str,
        explicit_background: bool,
        origin: Origin,
        mode: BackgroundMode,
    ) -> Category {
        if origin == Origin::TaskList {
            return Category::Task;
        }

        if explicit_background || (self.is_phase_title(title) && mode == BackgroundMode::Locked) {
            return Category::Background;
        }

        Category::Interactive
    }
}

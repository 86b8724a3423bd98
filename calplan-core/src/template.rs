//! Reusable event templates.
//!
//! Templates are kept in an ordered list that is persisted as a whole to a
//! single key-value slot after every mutation. Order matters: it is the
//! drawer order, and "prev"/"next" navigation reorders the list by moving the
//! selected template past its neighbor.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classify::Category;
use crate::error::{CalPlanError, CalPlanResult};
use crate::event::{CalendarEvent, EventTime};
use crate::kv::KeyValueStore;
use crate::palette::DEFAULT_COLOR_INDEX;

/// Slot holding the serialized template list.
pub const TEMPLATES_KEY: &str = "eventTemplates";

/// An unscheduled event shape: every event field except the remote id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTemplate {
    pub title: String,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default, alias = "colorId")]
    pub color_index: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl EventTemplate {
    pub fn new(title: impl Into<String>, start: EventTime, end: EventTime) -> Self {
        let all_day = matches!(start, EventTime::Date { .. });
        EventTemplate {
            title: title.into(),
            start,
            end,
            all_day,
            color_index: DEFAULT_COLOR_INDEX,
            description: None,
            location: None,
        }
    }

    pub fn from_event(event: &CalendarEvent) -> Self {
        EventTemplate {
            title: event.title.clone(),
            start: event.start.clone(),
            end: event.end.clone(),
            all_day: event.all_day,
            color_index: event.color_index,
            description: event.description.clone(),
            location: event.location.clone(),
        }
    }

    /// `end - start` in whole minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end.to_utc() - self.start.to_utc()).num_minutes()
    }

    /// A new, not yet created event with this template's shape starting at
    /// `start`. Durations of whole days produce all-day events.
    pub fn stamp_at(&self, start: DateTime<Utc>, time_zone: Option<&str>) -> CalendarEvent {
        let duration = Duration::minutes(self.duration_minutes());
        let begin = match time_zone {
            Some(tz) => EventTime::zoned(start, tz),
            None => EventTime::at(start),
        };
        let finish = begin.shifted(duration, false);

        let all_day = duration > Duration::zero() && duration.num_minutes() % (24 * 60) == 0;

        CalendarEvent {
            id: None,
            title: self.title.clone(),
            start: begin.normalized(all_day),
            end: finish.normalized(all_day),
            all_day,
            color_index: self.color_index,
            description: self.description.clone(),
            location: self.location.clone(),
            explicit_background: false,
            category: Category::Interactive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigateDirection {
    Prev,
    Next,
}

/// Ordered template list with a single optional selection, persisted through
/// a [`KeyValueStore`].
#[derive(Debug)]
pub struct TemplateStore<K: KeyValueStore> {
    store: K,
    templates: Vec<EventTemplate>,
    selected: Option<usize>,
}

impl<K: KeyValueStore> TemplateStore<K> {
    /// Load the persisted list once. Missing or unreadable data yields an
    /// empty list.
    pub fn load(store: K) -> Self {
        let templates = match store.get(TEMPLATES_KEY) {
            Ok(Some(contents)) => match serde_json::from_str::<Vec<EventTemplate>>(&contents) {
                Ok(templates) => templates,
                Err(e) => {
                    warn!(error = %e, "stored templates are corrupt, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "could not read stored templates, starting empty");
                Vec::new()
            }
        };

        debug!(count = templates.len(), "templates loaded");

        TemplateStore {
            store,
            templates,
            selected: None,
        }
    }

    pub fn templates(&self) -> &[EventTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&EventTemplate> {
        self.templates.get(index)
    }

    pub fn add(&mut self, template: EventTemplate) -> CalPlanResult<()> {
        let mut next = self.templates.clone();
        next.push(template);
        self.persist(next)
    }

    pub fn edit(&mut self, template: EventTemplate, index: usize) -> CalPlanResult<()> {
        self.check_index(index)?;
        let mut next = self.templates.clone();
        next[index] = template;
        self.persist(next)
    }

    /// Remove the template at `index`. The selection is left alone; see
    /// [`TemplateStore::delete_clearing_selection`].
    pub fn delete(&mut self, index: usize) -> CalPlanResult<()> {
        self.check_index(index)?;
        let mut next = self.templates.clone();
        next.remove(index);
        self.persist(next)
    }

    /// Delete and keep the selection pointing at the same template (or
    /// clear it when the selected template is the one deleted).
    pub fn delete_clearing_selection(&mut self, index: usize) -> CalPlanResult<()> {
        self.check_index(index)?;
        self.delete(index)?;
        self.selected = match self.selected {
            Some(s) if s == index => None,
            Some(s) if s > index => Some(s - 1),
            other => other,
        };
        Ok(())
    }

    pub fn swap(&mut self, i: usize, j: usize) -> CalPlanResult<()> {
        self.check_index(i)?;
        self.check_index(j)?;
        let mut next = self.templates.clone();
        next.swap(i, j);
        self.persist(next)
    }

    pub fn selected(&self) -> Option<(usize, &EventTemplate)> {
        let index = self.selected?;
        self.templates.get(index).map(|t| (index, t))
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn clear_selection_if_index(&mut self, index: usize) {
        if self.selected == Some(index) {
            self.selected = None;
        }
    }

    /// Click on the template at `index`: selects it, deselects it when it
    /// is already selected, or swaps it with the current selection and
    /// clears the selection.
    pub fn select(&mut self, index: usize) -> CalPlanResult<()> {
        self.check_index(index)?;
        match self.selected {
            Some(current) if current == index => self.selected = None,
            None => self.selected = Some(index),
            Some(current) => {
                self.swap(current, index)?;
                self.selected = None;
            }
        }
        Ok(())
    }

    /// Move the selected template one position and keep it selected.
    /// No-op without a selection or at either end of the list.
    pub fn select_navigate(&mut self, direction: NavigateDirection) -> CalPlanResult<()> {
        let Some(current) = self.selected else {
            return Ok(());
        };

        let neighbor = match direction {
            NavigateDirection::Prev if current == 0 => return Ok(()),
            NavigateDirection::Next if current + 1 >= self.templates.len() => return Ok(()),
            NavigateDirection::Prev => current - 1,
            NavigateDirection::Next => current + 1,
        };

        self.swap(current, neighbor)?;
        self.selected = Some(neighbor);
        Ok(())
    }

    /// Template duration in minutes.
    pub fn duration(template: &EventTemplate) -> i64 {
        template.duration_minutes()
    }

    fn check_index(&self, index: usize) -> CalPlanResult<()> {
        if index >= self.templates.len() {
            return Err(CalPlanError::IndexOutOfRange {
                index,
                len: self.templates.len(),
            });
        }
        Ok(())
    }

    fn persist(&mut self, next: Vec<EventTemplate>) -> CalPlanResult<()> {
        let contents = serde_json::to_string(&next)
            .map_err(|e| CalPlanError::Serialization(e.to_string()))?;
        self.store.set(TEMPLATES_KEY, &contents)?;
        self.templates = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use chrono::{NaiveDate, TimeZone};

    fn template(title: &str, minutes: i64) -> EventTemplate {
        let start = Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap();
        EventTemplate::new(
            title,
            EventTime::at(start),
            EventTime::at(start + Duration::minutes(minutes)),
        )
    }

    fn store_with(titles: &[&str]) -> TemplateStore<MemoryStore> {
        let mut store = TemplateStore::load(MemoryStore::new());
        for title in titles {
            store.add(template(title, 60)).unwrap();
        }
        store
    }

    fn titles<K: KeyValueStore>(store: &TemplateStore<K>) -> Vec<&str> {
        store.templates().iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn every_mutation_is_persisted() {
        let mut store = store_with(&["A", "B"]);
        store.edit(template("B2", 30), 1).unwrap();

        let reloaded = TemplateStore::load(store.store.clone());
        assert_eq!(titles(&reloaded), vec!["A", "B2"]);

        store.delete(0).unwrap();
        let reloaded = TemplateStore::load(store.store.clone());
        assert_eq!(titles(&reloaded), vec!["B2"]);
    }

    #[test]
    fn corrupt_slot_loads_empty() {
        let mut kv = MemoryStore::new();
        kv.set(TEMPLATES_KEY, "{not json").unwrap();
        let store = TemplateStore::load(kv);
        assert!(store.is_empty());
    }

    #[test]
    fn invalid_index_is_rejected() {
        let mut store = store_with(&["A"]);
        assert!(matches!(
            store.edit(template("X", 10), 1),
            Err(CalPlanError::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert!(matches!(
            store.delete(3),
            Err(CalPlanError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            store.swap(0, 1),
            Err(CalPlanError::IndexOutOfRange { .. })
        ));
        assert_eq!(titles(&store), vec!["A"]);
    }

    #[test]
    fn swap_is_its_own_inverse() {
        let mut store = store_with(&["A", "B", "C", "D"]);
        store.swap(0, 3).unwrap();
        assert_eq!(titles(&store), vec!["D", "B", "C", "A"]);
        store.swap(0, 3).unwrap();
        assert_eq!(titles(&store), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn navigate_next_moves_selected_template() {
        let mut store = store_with(&["A", "B", "C"]);
        store.select(1).unwrap();
        store.select_navigate(NavigateDirection::Next).unwrap();

        assert_eq!(titles(&store), vec!["A", "C", "B"]);
        let (index, selected) = store.selected().unwrap();
        assert_eq!(index, 2);
        assert_eq!(selected.title, "B");
    }

    #[test]
    fn navigate_clamps_at_boundaries() {
        let mut store = store_with(&["A", "B", "C"]);

        store.select(0).unwrap();
        store.select_navigate(NavigateDirection::Prev).unwrap();
        assert_eq!(titles(&store), vec!["A", "B", "C"]);
        assert_eq!(store.selected_index(), Some(0));

        store.clear_selection();
        store.select(2).unwrap();
        store.select_navigate(NavigateDirection::Next).unwrap();
        assert_eq!(titles(&store), vec!["A", "B", "C"]);
        assert_eq!(store.selected_index(), Some(2));
    }

    #[test]
    fn navigate_without_selection_is_noop() {
        let mut store = store_with(&["A", "B"]);
        store.select_navigate(NavigateDirection::Next).unwrap();
        assert_eq!(titles(&store), vec!["A", "B"]);
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn selecting_twice_deselects() {
        let mut store = store_with(&["A", "B"]);
        store.select(1).unwrap();
        store.select(1).unwrap();
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn selecting_another_index_swaps_and_clears() {
        let mut store = store_with(&["A", "B", "C"]);
        store.select(0).unwrap();
        store.select(2).unwrap();
        assert_eq!(titles(&store), vec!["C", "B", "A"]);
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn delete_clearing_selection_keeps_selection_consistent() {
        let mut store = store_with(&["A", "B", "C"]);

        store.select(1).unwrap();
        store.delete_clearing_selection(1).unwrap();
        assert_eq!(store.selected(), None);

        store.select(1).unwrap();
        store.delete_clearing_selection(0).unwrap();
        let (index, selected) = store.selected().unwrap();
        assert_eq!(index, 0);
        assert_eq!(selected.title, "C");
    }

    #[test]
    fn clear_selection_if_index_only_clears_matching() {
        let mut store = store_with(&["A", "B"]);
        store.select(1).unwrap();
        store.clear_selection_if_index(0);
        assert_eq!(store.selected_index(), Some(1));
        store.clear_selection_if_index(1);
        assert_eq!(store.selected_index(), None);
    }

    #[test]
    fn duration_is_in_minutes() {
        assert_eq!(TemplateStore::<MemoryStore>::duration(&template("A", 90)), 90);
    }

    #[test]
    fn stamp_keeps_duration_and_shape() {
        let mut t = template("Deep work", 90);
        t.color_index = 3;
        let at = Utc.with_ymd_and_hms(2025, 4, 1, 14, 0, 0).unwrap();
        let event = t.stamp_at(at, Some("Europe/Berlin"));

        assert_eq!(event.id, None);
        assert!(!event.all_day);
        assert_eq!(event.color_index, 3);
        assert_eq!(event.end.to_utc() - event.start.to_utc(), Duration::minutes(90));
        assert_eq!(event.start.time_zone(), Some("Europe/Berlin"));
    }

    #[test]
    fn stamp_of_whole_days_is_all_day() {
        let t = EventTemplate::new(
            "Vacation",
            EventTime::date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            EventTime::date(NaiveDate::from_ymd_opt(2025, 1, 3).unwrap()),
        );
        let at = Utc.with_ymd_and_hms(2025, 6, 10, 0, 0, 0).unwrap();
        let event = t.stamp_at(at, None);

        assert!(event.all_day);
        assert_eq!(event.start, EventTime::date(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()));
        assert_eq!(event.end, EventTime::date(NaiveDate::from_ymd_opt(2025, 6, 12).unwrap()));
    }
}

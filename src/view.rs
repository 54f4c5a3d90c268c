//! Pure filtering over the roster. Rendering belongs to the frontend; this
//! module only decides which rows it should show.

use crate::roster::{Roster, Student};

/// Grade at or above which a student counts as an honor student.
pub const HONOR_THRESHOLD: f64 = 85.0;

/// Rows past this index are marked hidden unless show-all is on. The cap is
/// purely cosmetic: capped rows are still returned.
pub const DISPLAY_CAP: usize = 6;

/// Transient, per-session filter state. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    pub search: String,
    /// `None` means all courses.
    pub course: Option<String>,
    pub honor_only: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: String,
    pub name: String,
    pub course: String,
    pub grade: f64,
    pub hidden: bool,
}

pub fn matches(student: &Student, filters: &FilterState) -> bool {
    if !filters.search.is_empty()
        && !student
            .name
            .to_lowercase()
            .contains(&filters.search.to_lowercase())
    {
        return false;
    }
    if let Some(course) = &filters.course {
        if student.course != *course {
            return false;
        }
    }
    if filters.honor_only && student.grade < HONOR_THRESHOLD {
        return false;
    }
    true
}

/// Pure function of (roster, filter state, show-all) to rows. Identical
/// inputs always yield an identical row set.
pub fn visible_rows(roster: &Roster, filters: &FilterState, showing_all: bool) -> Vec<Row> {
    roster
        .iter()
        .filter(|s| matches(s, filters))
        .enumerate()
        .map(|(i, s)| Row {
            id: s.id.clone(),
            name: s.name.clone(),
            course: s.course.clone(),
            grade: s.grade,
            hidden: i >= DISPLAY_CAP && !showing_all,
        })
        .collect()
}

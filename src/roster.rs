//! In-memory roster: an owned, ordered collection of students.
//!
//! Mutations go through the methods here; nothing hands out shared mutable
//! access to the underlying vector. Insertion order is display order prior
//! to filtering.

#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub course: String,
    pub grade: f64,
}

#[derive(Debug, Clone)]
pub struct Roster {
    root: String,
    students: Vec<Student>,
}

impl Roster {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            students: Vec::new(),
        }
    }

    /// Name of the XML root element this roster was parsed from.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Student> {
        self.students.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn push(&mut self, student: Student) {
        self.students.push(student);
    }

    /// Next free id: `S` + (max numeric suffix over all ids + 1), zero-padded
    /// to 3 digits. Ids without a trailing number contribute nothing to the
    /// max, so externally edited ids can collide.
    pub fn next_id(&self) -> String {
        let mut max = 0u64;
        for s in &self.students {
            if let Some(n) = trailing_number(&s.id) {
                max = max.max(n);
            }
        }
        format!("S{:03}", max + 1)
    }

    pub fn add(&mut self, name: &str, course: &str, grade: f64) -> Student {
        let student = Student {
            id: self.next_id(),
            name: name.to_string(),
            course: course.to_string(),
            grade,
        };
        self.students.push(student.clone());
        student
    }

    /// Overwrites the grade for `id`. Range checks live at the IPC entry
    /// points, not here.
    pub fn set_grade(&mut self, id: &str, grade: f64) -> bool {
        match self.students.iter_mut().find(|s| s.id == id) {
            Some(s) => {
                s.grade = grade;
                true
            }
            None => false,
        }
    }

    /// Removes the entry for `id`, keeping the relative order of the rest.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.students.iter().position(|s| s.id == id) {
            Some(i) => {
                self.students.remove(i);
                true
            }
            None => false,
        }
    }

    /// Distinct non-empty course names, sorted.
    pub fn courses(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .students
            .iter()
            .map(|s| s.course.clone())
            .filter(|c| !c.is_empty())
            .collect();
        out.sort();
        out.dedup();
        out
    }
}

fn trailing_number(id: &str) -> Option<u64> {
    let digits: Vec<char> = id
        .chars()
        .rev()
        .take_while(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.iter().rev().collect::<String>().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Roster {
        let mut r = Roster::new("students");
        for (id, name, course, grade) in [
            ("S001", "Alice", "Math101", 92.0),
            ("S002", "Brian", "Physics201", 78.0),
            ("S003", "Carla", "Math101", 85.0),
        ] {
            r.push(Student {
                id: id.to_string(),
                name: name.to_string(),
                course: course.to_string(),
                grade,
            });
        }
        r
    }

    #[test]
    fn next_id_is_max_suffix_plus_one() {
        let r = sample();
        assert_eq!(r.next_id(), "S004");
    }

    #[test]
    fn next_id_skips_gaps_rather_than_filling_them() {
        let mut r = sample();
        assert!(r.remove("S002"));
        // The gap at S002 stays a gap.
        assert_eq!(r.next_id(), "S004");
    }

    #[test]
    fn next_id_ignores_ids_without_numeric_suffix() {
        let mut r = Roster::new("students");
        r.push(Student {
            id: "TEMP".to_string(),
            name: "X".to_string(),
            course: "Y".to_string(),
            grade: 0.0,
        });
        assert_eq!(r.next_id(), "S001");
    }

    #[test]
    fn next_id_keeps_wider_suffixes() {
        let mut r = Roster::new("students");
        r.push(Student {
            id: "S1000".to_string(),
            name: "X".to_string(),
            course: "Y".to_string(),
            grade: 0.0,
        });
        assert_eq!(r.next_id(), "S1001");
    }

    #[test]
    fn add_appends_with_synthesized_id() {
        let mut r = sample();
        let s = r.add("Ada", "Math101", 92.0);
        assert_eq!(s.id, "S004");
        assert_eq!(r.len(), 4);
        assert_eq!(r.iter().last().map(|s| s.id.as_str()), Some("S004"));
    }

    #[test]
    fn remove_takes_exactly_one_and_preserves_order() {
        let mut r = sample();
        assert!(r.remove("S002"));
        assert!(!r.remove("S002"));
        let ids: Vec<&str> = r.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["S001", "S003"]);
    }

    #[test]
    fn set_grade_locates_by_id() {
        let mut r = sample();
        assert!(r.set_grade("S002", 81.0));
        assert_eq!(r.get("S002").map(|s| s.grade), Some(81.0));
        assert!(!r.set_grade("S999", 50.0));
    }

    #[test]
    fn courses_are_sorted_and_deduplicated() {
        let r = sample();
        assert_eq!(r.courses(), ["Math101", "Physics201"]);
    }
}

use crate::ipc::error::{err, ok};
use crate::ipc::handlers::persist::submit_save;
use crate::ipc::handlers::view::table_json;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

const GRADE_MIN: f64 = 0.0;
const GRADE_MAX: f64 = 100.0;

fn grade_in_range(grade: f64) -> bool {
    (GRADE_MIN..=GRADE_MAX).contains(&grade)
}

fn handle_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = req
        .params
        .get("name")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .unwrap_or("");
    let course = req
        .params
        .get("course")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .unwrap_or("");
    let Some(grade) = req.params.get("grade").and_then(|v| v.as_f64()) else {
        return err(&req.id, "bad_params", "grade must be a number", None);
    };

    // Validation happens before any mutation; a rejected add changes nothing.
    if name.is_empty() || course.is_empty() {
        return err(&req.id, "bad_params", "name and course must be non-empty", None);
    }
    if !grade_in_range(grade) {
        return err(
            &req.id,
            "bad_params",
            "grade must be between 0 and 100",
            Some(json!({ "grade": grade })),
        );
    }

    let Some(roster) = state.roster.as_mut() else {
        return err(&req.id, "no_roster", "load the roster first", None);
    };
    let student = roster.add(name, course, grade);

    let table = table_json(state);
    let save = submit_save(state);
    ok(
        &req.id,
        json!({
            "student": {
                "id": student.id,
                "name": student.name,
                "course": student.course,
                "grade": student.grade,
            },
            "table": table,
            "save": save,
        }),
    )
}

fn handle_update_grade(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = req
        .params
        .get("id")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let Some(id) = id else {
        return err(&req.id, "bad_params", "missing params.id", None);
    };
    let Some(grade) = req.params.get("grade").and_then(|v| v.as_f64()) else {
        return err(&req.id, "bad_params", "grade must be a number", None);
    };
    // The 0-100 bound is enforced here, at the entry point, only. The stored
    // collection is never re-validated.
    if !grade_in_range(grade) {
        return err(
            &req.id,
            "bad_params",
            "grade must be between 0 and 100",
            Some(json!({ "grade": grade })),
        );
    }

    let Some(roster) = state.roster.as_mut() else {
        return err(&req.id, "no_roster", "load the roster first", None);
    };
    if !roster.set_grade(&id, grade) {
        return err(
            &req.id,
            "not_found",
            "student not found",
            Some(json!({ "id": id })),
        );
    }
    let student = roster.get(&id).map(|s| {
        json!({
            "id": s.id,
            "name": s.name,
            "course": s.course,
            "grade": s.grade,
        })
    });

    let table = table_json(state);
    let save = submit_save(state);
    ok(
        &req.id,
        json!({
            "student": student,
            "table": table,
            "save": save,
        }),
    )
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = req
        .params
        .get("id")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let Some(id) = id else {
        return err(&req.id, "bad_params", "missing params.id", None);
    };

    let Some(roster) = state.roster.as_mut() else {
        return err(&req.id, "no_roster", "load the roster first", None);
    };
    // Confirmation is the frontend's concern; by the time the request gets
    // here the deletion is unconditional. There is no undo.
    if !roster.remove(&id) {
        return err(
            &req.id,
            "not_found",
            "student not found",
            Some(json!({ "id": id })),
        );
    }

    let table = table_json(state);
    let save = submit_save(state);
    ok(
        &req.id,
        json!({
            "deleted": id,
            "table": table,
            "save": save,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.add" => Some(handle_add(state, req)),
        "students.updateGrade" => Some(handle_update_grade(state, req)),
        "students.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}

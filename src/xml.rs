//! XML codec for the roster document.
//!
//! The wire shape is a root element containing `student` elements, each with
//! an `id` attribute and `name`/`course`/`grade` child text fields. Saves
//! always re-serialize the full document; there is no partial update.

use anyhow::{bail, Context};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Cursor;

use crate::roster::{Roster, Student};

const STUDENT_TAG: &str = "student";

#[derive(Clone, Copy)]
enum Field {
    Name,
    Course,
    Grade,
}

pub fn parse(text: &str) -> anyhow::Result<Roster> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut roster: Option<Roster> = None;
    let mut current: Option<Student> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event().context("malformed roster document")? {
            Event::Start(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if roster.is_none() {
                    roster = Some(Roster::new(tag));
                } else if current.is_none() {
                    if tag == STUDENT_TAG {
                        current = Some(student_from_attrs(&e)?);
                    }
                    // Unknown top-level elements are skipped.
                } else {
                    field = match tag.as_str() {
                        "name" => Some(Field::Name),
                        "course" => Some(Field::Course),
                        "grade" => Some(Field::Grade),
                        _ => None,
                    };
                }
            }
            Event::Empty(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if roster.is_none() {
                    roster = Some(Roster::new(tag));
                } else if current.is_none() && tag == STUDENT_TAG {
                    if let Some(r) = roster.as_mut() {
                        r.push(student_from_attrs(&e)?);
                    }
                }
            }
            Event::Text(t) => {
                if let (Some(s), Some(f)) = (current.as_mut(), field) {
                    let text = t.unescape().context("bad text content")?;
                    let text = text.trim();
                    match f {
                        Field::Name => s.name = text.to_string(),
                        Field::Course => s.course = text.to_string(),
                        Field::Grade => s.grade = text.parse().unwrap_or(0.0),
                    }
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == STUDENT_TAG.as_bytes() {
                    if let (Some(r), Some(s)) = (roster.as_mut(), current.take()) {
                        r.push(s);
                    }
                } else {
                    field = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match roster {
        Some(r) => Ok(r),
        None => bail!("roster document has no root element"),
    }
}

fn student_from_attrs(e: &BytesStart) -> anyhow::Result<Student> {
    let mut student = Student {
        id: String::new(),
        name: String::new(),
        course: String::new(),
        grade: 0.0,
    };
    for attr in e.attributes() {
        let attr = attr.context("bad student attribute")?;
        if attr.key.as_ref() == b"id" {
            student.id = attr
                .unescape_value()
                .context("bad student id")?
                .into_owned();
        }
    }
    Ok(student)
}

/// Serializes the whole roster back to document text. Saves transmit this
/// verbatim as the new stored document.
pub fn serialize(roster: &Roster) -> anyhow::Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new(roster.root())))?;
    for s in roster.iter() {
        let mut start = BytesStart::new(STUDENT_TAG);
        start.push_attribute(("id", s.id.as_str()));
        writer.write_event(Event::Start(start))?;
        write_text_field(&mut writer, "name", &s.name)?;
        write_text_field(&mut writer, "course", &s.course)?;
        write_text_field(&mut writer, "grade", &format_grade(s.grade))?;
        writer.write_event(Event::End(BytesEnd::new(STUDENT_TAG)))?;
    }
    writer.write_event(Event::End(BytesEnd::new(roster.root())))?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).context("serialized document is not utf-8")
}

fn write_text_field(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    tag: &str,
    text: &str,
) -> anyhow::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn format_grade(grade: f64) -> String {
    if grade.fract() == 0.0 {
        format!("{}", grade as i64)
    } else {
        grade.to_string()
    }
}

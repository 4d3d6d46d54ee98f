//! Contact row decoder: the pure transformation from a multi-row cursor
//! into one `Person` per contact_id boundary.
//!
//! Mime-type dispatch is a single match over a closed, fixed set — the
//! tagged-enum-of-8-variants pattern called for instead of handler-per-type
//! polymorphism, expressed here directly as a match over the mime type
//! string since the source hands us the type as data, not as a type tag.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{NameKind, Person, PersonAccumulator};
use crate::row::Row;
use crate::source::{columns, mime_types, ContactCursor};

/// Sink a decoded `Person` is pushed into. Implemented by the batcher;
/// kept as a trait so the decoder has no compile-time dependency on it.
#[async_trait]
pub trait PersonSink: Send {
    async fn push(&mut self, person: Person) -> Result<()>;
}

#[async_trait]
impl PersonSink for Vec<Person> {
    async fn push(&mut self, person: Person) -> Result<()> {
        // Vec's inherent push shadows the trait method, not recursion.
        self.push(person);
        Ok(())
    }
}

/// The source's label-resolution convention: type code `0` is "custom" and
/// defers to the row's own label column; other codes resolve to a fixed,
/// localized set.
const CUSTOM_TYPE_CODE: i64 = 0;

fn resolve_label(row: &Row) -> String {
    let type_code = row.int(columns::TYPE);
    let custom_label = row.text(columns::LABEL);
    match type_code {
        Some(CUSTOM_TYPE_CODE) | None => match custom_label {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => "Custom".to_string(),
        },
        Some(code) => localized_type_label(code),
    }
}

fn localized_type_label(code: i64) -> String {
    match code {
        1 => "Home".to_string(),
        2 => "Work".to_string(),
        _ => "Other".to_string(),
    }
}

fn build_external_uri(contact_id: &str, lookup_key: &str) -> String {
    format!("contact://lookup/{contact_id}/{lookup_key}")
}

fn dispatch_row(acc: &mut PersonAccumulator, row: &Row) {
    match row.mime_type() {
        mime_types::EMAIL => {
            if let Some(address) = row.text(columns::ADDRESS) {
                acc.push_email(resolve_label(row), address.to_string());
            }
        }
        mime_types::PHONE => {
            if let Some(number) = row.text(columns::ADDRESS) {
                acc.push_phone(resolve_label(row), number.to_string());
            }
        }
        mime_types::POSTAL => {
            if let Some(formatted) = row.text(columns::ADDRESS) {
                acc.push_address(resolve_label(row), formatted.to_string());
            }
        }
        mime_types::NICKNAME => {
            if let Some(name) = row.text(columns::NAME) {
                acc.push_additional_name(NameKind::Nickname, name.to_string());
            }
        }
        mime_types::STRUCTURED_NAME => {
            acc.set_structured_name(
                row.int_or(columns::RAW_CONTACT_ID, -1),
                row.int_or(columns::NAME_RAW_CONTACT_ID, -2),
                row.text(columns::GIVEN).map(str::to_string),
                row.text(columns::MIDDLE).map(str::to_string),
                row.text(columns::FAMILY).map(str::to_string),
            );
        }
        mime_types::ORGANIZATION => {
            acc.push_affiliation(
                row.text(columns::TITLE).unwrap_or(""),
                row.text(columns::DEPARTMENT).unwrap_or(""),
                row.text(columns::COMPANY).unwrap_or(""),
            );
        }
        mime_types::RELATION => {
            let value = match row.text(columns::NAME) {
                Some(name) => name.to_string(),
                None => resolve_label(row),
            };
            acc.push_relation(value);
        }
        mime_types::NOTE => {
            if let Some(note) = row.text(columns::NOTE) {
                acc.set_note(note.to_string());
            }
        }
        _ => {
            // unknown mime-type: skip silently
        }
    }
}

fn open_accumulator(row: &Row) -> PersonAccumulator {
    let contact_id = row.int_or(columns::CONTACT_ID, 0).to_string();
    let display_name = row.text_or_empty(columns::DISPLAY_NAME_PRIMARY);
    let mut acc = PersonAccumulator::new(contact_id.clone(), display_name, row.bool(columns::STARRED));

    if let Some(lookup_key) = row.text(columns::LOOKUP_KEY) {
        acc.set_external_uri(build_external_uri(&contact_id, lookup_key));
    }
    if let Some(thumb) = row.text(columns::PHOTO_THUMBNAIL_URI) {
        acc.set_image_uri(thumb.to_string());
    }
    if let Some(phonetic) = row.text(columns::PHONETIC_NAME) {
        acc.push_additional_name(NameKind::Phonetic, phonetic.to_string());
    }
    acc
}

/// Drain `cursor` into `sink`, emitting one `Person` per contact_id boundary.
/// Closes the cursor on every exit path. An error from the cursor aborts
/// decoding of the remaining rows but does not touch already-pushed Persons.
pub async fn decode_cursor(
    cursor: &mut dyn ContactCursor,
    sink: &mut dyn PersonSink,
) -> Result<()> {
    let mut current: Option<PersonAccumulator> = None;

    loop {
        let row = match cursor.next_row().await {
            Ok(Some(row)) => row,
            Ok(None) => break,
            Err(e) => {
                cursor.close().await;
                return Err(e);
            }
        };

        let contact_id = row.int_or(columns::CONTACT_ID, 0).to_string();
        let boundary = match &current {
            Some(acc) => acc.id() != contact_id,
            None => true,
        };
        if boundary {
            if let Some(prev) = current.take() {
                sink.push(prev.finish()).await?;
            }
            current = Some(open_accumulator(&row));
        }

        dispatch_row(current.as_mut().expect("just opened"), &row);
    }

    if let Some(prev) = current.take() {
        sink.push(prev.finish()).await?;
    }
    cursor.close().await;
    Ok(())
}

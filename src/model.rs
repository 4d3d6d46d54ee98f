//! The canonical `Person` record and the accumulator types used to build one
//! out of a contiguous run of source rows.

use indexmap::IndexMap;

/// Tag distinguishing the two kinds of entry `Person::additional_names` may
/// hold. Kept on the stored record rather than discarded after construction
/// (see Open Questions resolution in DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Nickname,
    Phonetic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameEntry {
    pub kind: NameKind,
    pub value: String,
}

/// A labeled group of contact-modal values (emails/phones/addresses/app ids)
/// within one [`Person`]. At most one `ContactPoint` per distinct label.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContactPoint {
    pub label: String,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub addresses: Vec<String>,
    pub app_ids: Vec<String>,
}

/// The canonical record written to the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: String,
    pub display_name: String,
    pub given_name: Option<String>,
    pub middle_name: Option<String>,
    pub family_name: Option<String>,
    pub additional_names: Vec<NameEntry>,
    pub external_uri: Option<String>,
    pub image_uri: Option<String>,
    pub is_important: bool,
    pub is_bot: bool,
    pub affiliations: Vec<String>,
    pub relations: Vec<String>,
    pub note: Option<String>,
    pub contact_points: Vec<ContactPoint>,
}

/// Accumulator for a single [`ContactPoint`] label while a contact's rows are
/// being folded. A pure value, unique per in-flight label.
#[derive(Debug, Default)]
pub(crate) struct ContactPointAccumulator {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub addresses: Vec<String>,
    pub app_ids: Vec<String>,
}

impl ContactPointAccumulator {
    fn into_contact_point(self, label: String) -> ContactPoint {
        ContactPoint {
            label,
            emails: self.emails,
            phones: self.phones,
            addresses: self.addresses,
            app_ids: self.app_ids,
        }
    }
}

/// Pure, per-contact builder consumed into a [`Person`] at a contact_id
/// boundary. Owns its `IndexMap<label, ContactPointAccumulator>`; never
/// shared, never touched after [`PersonAccumulator::finish`] is called.
#[derive(Debug)]
pub(crate) struct PersonAccumulator {
    id: String,
    display_name: String,
    given_name: Option<String>,
    middle_name: Option<String>,
    family_name: Option<String>,
    additional_names: Vec<NameEntry>,
    external_uri: Option<String>,
    image_uri: Option<String>,
    is_important: bool,
    affiliations: Vec<String>,
    relations: Vec<String>,
    note: Option<String>,
    contact_points: IndexMap<String, ContactPointAccumulator>,
}

impl PersonAccumulator {
    pub(crate) fn new(id: String, display_name: String, is_important: bool) -> Self {
        PersonAccumulator {
            id,
            display_name,
            given_name: None,
            middle_name: None,
            family_name: None,
            additional_names: Vec::new(),
            external_uri: None,
            image_uri: None,
            is_important,
            affiliations: Vec::new(),
            relations: Vec::new(),
            note: None,
            contact_points: IndexMap::new(),
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn set_external_uri(&mut self, uri: String) {
        self.external_uri = Some(uri);
    }

    pub(crate) fn set_image_uri(&mut self, uri: String) {
        self.image_uri = Some(uri);
    }

    pub(crate) fn push_additional_name(&mut self, kind: NameKind, value: String) {
        self.additional_names.push(NameEntry { kind, value });
    }

    pub(crate) fn set_structured_name(
        &mut self,
        raw_contact_id: i64,
        name_raw_contact_id: i64,
        given: Option<String>,
        middle: Option<String>,
        family: Option<String>,
    ) {
        if raw_contact_id == name_raw_contact_id {
            self.given_name = given;
            self.middle_name = middle;
            self.family_name = family;
        }
    }

    pub(crate) fn push_affiliation(&mut self, title: &str, department: &str, company: &str) {
        let parts: Vec<&str> = [title, department, company]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        if !parts.is_empty() {
            self.affiliations.push(parts.join(", "));
        }
    }

    pub(crate) fn push_relation(&mut self, value: String) {
        self.relations.push(value);
    }

    pub(crate) fn set_note(&mut self, note: String) {
        self.note = Some(note);
    }

    pub(crate) fn push_email(&mut self, label: String, address: String) {
        self.contact_point(label).emails.push(address);
    }

    pub(crate) fn push_phone(&mut self, label: String, number: String) {
        self.contact_point(label).phones.push(number);
    }

    pub(crate) fn push_address(&mut self, label: String, formatted: String) {
        self.contact_point(label).addresses.push(formatted);
    }

    fn contact_point(&mut self, label: String) -> &mut ContactPointAccumulator {
        self.contact_points.entry(label).or_default()
    }

    pub(crate) fn finish(self) -> Person {
        let contact_points = self
            .contact_points
            .into_iter()
            .map(|(label, acc)| acc.into_contact_point(label))
            .collect();

        Person {
            id: self.id,
            display_name: self.display_name,
            given_name: self.given_name,
            middle_name: self.middle_name,
            family_name: self.family_name,
            additional_names: self.additional_names,
            external_uri: self.external_uri,
            image_uri: self.image_uri,
            is_important: self.is_important,
            is_bot: false,
            affiliations: self.affiliations,
            relations: self.relations,
            note: self.note,
            contact_points,
        }
    }
}

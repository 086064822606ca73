pub mod root;
pub mod settings;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::reference::{EntityKind, HasIntegrationId, ReferenceMap, Registered};

/// Tags on an organization, person or deal. Setting a tag that is already
/// present keeps the single existing entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(Vec<String>);

impl Tags {
    pub fn set(&mut self, tag: &str) {
        let tag = tag.trim();
        if tag.is_empty() {
            return;
        }
        if !self.0.iter().any(|existing| existing == tag) {
            self.0.push(tag.to_string());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A value for a declared custom field, addressed by the field's
/// integration id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomValue {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomValues(Vec<CustomValue>);

impl CustomValues {
    /// Sets the field's value, replacing an earlier one for the same field.
    pub fn set(&mut self, field: &str, value: &str) {
        match self.0.iter_mut().find(|existing| existing.field == field) {
            Some(existing) => existing.value = value.to_string(),
            None => self.0.push(CustomValue {
                field: field.to_string(),
                value: value.to_string(),
            }),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CustomValue> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// How an organization relates to us commercially.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    #[default]
    NoRelation,
    WorkingOnIt,
    IsACustomer,
    BeenInTouch,
}

impl Relation {
    /// Parses the canonical variant name, as written in configuration.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "NoRelation" => Some(Relation::NoRelation),
            "WorkingOnIt" => Some(Relation::WorkingOnIt),
            "IsACustomer" => Some(Relation::IsACustomer),
            "BeenInTouch" => Some(Relation::BeenInTouch),
            _ => None,
        }
    }
}

/// What kind of interaction a note records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteClassification {
    #[default]
    Comment,
    SalesCall,
    TalkedTo,
    TriedToReach,
    ClientVisit,
    MailMessage,
}

impl NoteClassification {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Comment" => Some(NoteClassification::Comment),
            "SalesCall" => Some(NoteClassification::SalesCall),
            "TalkedTo" => Some(NoteClassification::TalkedTo),
            "TriedToReach" => Some(NoteClassification::TriedToReach),
            "ClientVisit" => Some(NoteClassification::ClientVisit),
            "MailMessage" => Some(NoteClassification::MailMessage),
            _ => None,
        }
    }
}

/// The single entity a note or document hangs off. Making the target an
/// enum keeps "attached to an organization or a deal, never both" out of
/// runtime checking entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attachment {
    Organization(String),
    Deal(String),
}

impl Attachment {
    pub fn kind(&self) -> EntityKind {
        match self {
            Attachment::Organization(_) => EntityKind::Organization,
            Attachment::Deal(_) => EntityKind::Deal,
        }
    }

    pub fn integration_id(&self) -> &str {
        match self {
            Attachment::Organization(id) | Attachment::Deal(id) => id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.street.is_none()
            && self.zip_code.is_none()
            && self.city.is_none()
            && self.country.is_none()
    }
}

/// A user of the source CRM, referenced as author and responsible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coworker {
    pub integration_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub direct_phone_number: Option<String>,
    pub mobile_phone_number: Option<String>,
}

impl Coworker {
    pub fn new(integration_id: impl Into<String>) -> Self {
        Self {
            integration_id: integration_id.into(),
            ..Self::default()
        }
    }

    pub fn full_name(&self) -> String {
        join_name(self.first_name.as_deref(), self.last_name.as_deref())
    }
}

impl HasIntegrationId for Coworker {
    fn integration_id(&self) -> &str {
        &self.integration_id
    }
}

/// A contact person. Persons live inside their employer organization and
/// are not addressable outside of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub integration_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub direct_phone_number: Option<String>,
    pub mobile_phone_number: Option<String>,
    pub position: Option<String>,
    pub tags: Tags,
    pub custom_values: CustomValues,
}

impl Person {
    pub fn new(integration_id: impl Into<String>) -> Self {
        Self {
            integration_id: integration_id.into(),
            ..Self::default()
        }
    }

    pub fn full_name(&self) -> String {
        join_name(self.first_name.as_deref(), self.last_name.as_deref())
    }
}

impl HasIntegrationId for Person {
    fn integration_id(&self) -> &str {
        &self.integration_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub integration_id: String,
    pub name: String,
    pub organization_number: Option<String>,
    pub email: Option<String>,
    pub web_site: Option<String>,
    pub central_phone_number: Option<String>,
    pub postal_address: Option<Address>,
    pub visit_address: Option<Address>,
    pub relation: Relation,
    pub responsible_coworker: Option<String>,
    pub tags: Tags,
    pub custom_values: CustomValues,
    pub employees: ReferenceMap<Person>,
}

impl Organization {
    pub fn new(integration_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            integration_id: integration_id.into(),
            name: name.into(),
            organization_number: None,
            email: None,
            web_site: None,
            central_phone_number: None,
            postal_address: None,
            visit_address: None,
            relation: Relation::default(),
            responsible_coworker: None,
            tags: Tags::default(),
            custom_values: CustomValues::default(),
            employees: ReferenceMap::new(),
        }
    }

    pub fn add_employee(&mut self, person: Person) -> Registered {
        self.employees.register(person)
    }

    pub fn find_employee(&self, integration_id: &str) -> Option<&Person> {
        self.employees.find(integration_id)
    }
}

impl HasIntegrationId for Organization {
    fn integration_id(&self) -> &str {
        &self.integration_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub integration_id: String,
    pub name: String,
    pub description: Option<String>,
    pub value: Option<i64>,
    pub probability: Option<u8>,
    pub status: Option<String>,
    pub order_date: Option<NaiveDate>,
    pub customer: Option<String>,
    pub responsible_coworker: Option<String>,
    pub tags: Tags,
    pub custom_values: CustomValues,
}

impl Deal {
    pub fn new(integration_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            integration_id: integration_id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

impl HasIntegrationId for Deal {
    fn integration_id(&self) -> &str {
        &self.integration_id
    }
}

/// A history entry on an organization or deal. Notes have no id of their
/// own in any known source, so they accumulate append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub attached_to: Attachment,
    pub text: String,
    pub classification: NoteClassification,
    pub date: Option<NaiveDateTime>,
    pub created_by: String,
    pub person: Option<String>,
}

/// A file reference carried over from the source system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub integration_id: String,
    pub attached_to: Attachment,
    pub path: String,
    pub name: Option<String>,
    pub created_by: String,
}

impl HasIntegrationId for Document {
    fn integration_id(&self) -> &str {
        &self.integration_id
    }
}

fn join_name(first: Option<&str>, last: Option<&str>) -> String {
    let mut name = String::new();
    if let Some(first) = first {
        name.push_str(first.trim());
    }
    if let Some(last) = last {
        if !name.is_empty() {
            name.push(' ');
        }
        name.push_str(last.trim());
    }
    name
}

use serde::{Deserialize, Serialize};

use crate::error::{ImportError, Result};

/// Value type of a custom field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomFieldType {
    #[default]
    String,
    Link,
}

/// A custom field declared for one entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldDefinition {
    pub integration_id: String,
    pub title: String,
    #[serde(default)]
    pub field_type: CustomFieldType,
}

/// Whether a deal status ends the deal, and how.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealAssessment {
    #[default]
    NoEndState,
    PositiveEndState,
    NegativeEndState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealStatus {
    pub label: String,
    #[serde(default)]
    pub assessment: DealAssessment,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct KindSettings {
    pub custom_fields: Vec<CustomFieldDefinition>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DealSettings {
    pub custom_fields: Vec<CustomFieldDefinition>,
    pub statuses: Vec<DealStatus>,
    pub default_status: Option<String>,
}

/// Model-wide declarations: custom fields per kind and the deal status
/// catalog. Declarations happen once, before any row is imported; the
/// importer seals the settings when it starts feeding rows, after which
/// further declarations are an error.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Settings {
    pub organization: KindSettings,
    pub person: KindSettings,
    pub deal: DealSettings,
    #[serde(skip)]
    sealed: bool,
}

impl Settings {
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn set_organization_field(&mut self, field: CustomFieldDefinition) -> Result<()> {
        self.ensure_unsealed()?;
        set_field(&mut self.organization.custom_fields, field);
        Ok(())
    }

    pub fn set_person_field(&mut self, field: CustomFieldDefinition) -> Result<()> {
        self.ensure_unsealed()?;
        set_field(&mut self.person.custom_fields, field);
        Ok(())
    }

    pub fn set_deal_field(&mut self, field: CustomFieldDefinition) -> Result<()> {
        self.ensure_unsealed()?;
        set_field(&mut self.deal.custom_fields, field);
        Ok(())
    }

    /// Declares a status, replacing an earlier declaration of the same label.
    pub fn add_deal_status(&mut self, status: DealStatus) -> Result<()> {
        self.ensure_unsealed()?;
        match self
            .deal
            .statuses
            .iter_mut()
            .find(|existing| labels_match(&existing.label, &status.label))
        {
            Some(existing) => *existing = status,
            None => self.deal.statuses.push(status),
        }
        Ok(())
    }

    /// Sets the status deals fall back to when their row carries none.
    /// The label must already be declared.
    pub fn set_default_deal_status(&mut self, label: &str) -> Result<()> {
        self.ensure_unsealed()?;
        let canonical = self.resolve_deal_status(label)?.label.clone();
        self.deal.default_status = Some(canonical);
        Ok(())
    }

    /// Looks a label up in the status catalog, ignoring case and padding.
    /// An undeclared label is a contract violation and fails the import.
    pub fn resolve_deal_status(&self, label: &str) -> Result<&DealStatus> {
        self.deal
            .statuses
            .iter()
            .find(|status| labels_match(&status.label, label))
            .ok_or_else(|| ImportError::UnknownDealStatus {
                label: label.trim().to_string(),
                declared: self.declared_status_labels(),
            })
    }

    pub fn default_deal_status(&self) -> Option<&str> {
        self.deal.default_status.as_deref()
    }

    pub fn organization_field(&self, integration_id: &str) -> Option<&CustomFieldDefinition> {
        find_field(&self.organization.custom_fields, integration_id)
    }

    pub fn person_field(&self, integration_id: &str) -> Option<&CustomFieldDefinition> {
        find_field(&self.person.custom_fields, integration_id)
    }

    pub fn deal_field(&self, integration_id: &str) -> Option<&CustomFieldDefinition> {
        find_field(&self.deal.custom_fields, integration_id)
    }

    fn ensure_unsealed(&self) -> Result<()> {
        if self.sealed {
            return Err(ImportError::SettingsSealed);
        }
        Ok(())
    }

    fn declared_status_labels(&self) -> String {
        if self.deal.statuses.is_empty() {
            return "none".to_string();
        }
        self.deal
            .statuses
            .iter()
            .map(|status| status.label.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn labels_match(declared: &str, candidate: &str) -> bool {
    declared.trim().eq_ignore_ascii_case(candidate.trim())
}

fn set_field(fields: &mut Vec<CustomFieldDefinition>, field: CustomFieldDefinition) {
    match fields
        .iter_mut()
        .find(|existing| existing.integration_id == field.integration_id)
    {
        Some(existing) => *existing = field,
        None => fields.push(field),
    }
}

fn find_field<'a>(
    fields: &'a [CustomFieldDefinition],
    integration_id: &str,
) -> Option<&'a CustomFieldDefinition> {
    fields
        .iter()
        .find(|field| field.integration_id == integration_id)
}

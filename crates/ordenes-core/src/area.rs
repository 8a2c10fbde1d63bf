use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{OrdenesError, Result};

/// A responsible area (department, team) that orders can be routed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: u64,
    pub name: String,
    pub responsible: String,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewArea {
    pub name: String,
    pub responsible: String,
    #[serde(default)]
    pub contact: Option<String>,
}

impl NewArea {
    pub fn validate(&self) -> Result<()> {
        let name = self.name.trim().chars().count();
        if name == 0 || name > 100 {
            return Err(OrdenesError::Validation(
                "area name must be between 1 and 100 characters".into(),
            ));
        }
        let responsible = self.responsible.trim().chars().count();
        if responsible == 0 || responsible > 150 {
            return Err(OrdenesError::Validation(
                "responsible must be between 1 and 150 characters".into(),
            ));
        }
        if let Some(contact) = &self.contact {
            if contact.chars().count() > 100 {
                return Err(OrdenesError::Validation(
                    "contact must be at most 100 characters".into(),
                ));
            }
        }
        Ok(())
    }
}

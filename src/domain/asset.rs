use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type AssetId = Uuid;
pub type AssetMovementId = Uuid;

/// A tracked patrimony item (vehicle, machine, equipment).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    /// Patrimony plate/code, unique within the registry
    pub code: String,
    /// Where the item currently sits (site, office, warehouse)
    pub location: Option<String>,
    pub acquired_on: Option<String>,
    pub value_cents: Option<Cents>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker ("oculto")
    pub hidden_at: Option<DateTime<Utc>>,
}

impl Asset {
    pub fn new(name: String, code: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            code,
            location: None,
            acquired_on: None,
            value_cents: None,
            note: None,
            created_at: Utc::now(),
            hidden_at: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_acquired_on(mut self, acquired_on: impl Into<String>) -> Self {
        self.acquired_on = Some(acquired_on.into());
        self
    }

    pub fn with_value_cents(mut self, value_cents: Cents) -> Self {
        self.value_cents = Some(value_cents);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden_at.is_some()
    }

    /// Record a relocation of this asset. The movement keeps the old location
    /// so history stays reconstructable even if the asset row is edited later.
    pub fn move_to(&self, new_location: impl Into<String>) -> AssetMovement {
        AssetMovement {
            id: Uuid::new_v4(),
            asset_id: self.id,
            from_location: self.location.clone(),
            to_location: new_location.into(),
            note: None,
            moved_at: Utc::now(),
        }
    }
}

/// One relocation in an asset's movement history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetMovement {
    pub id: AssetMovementId,
    pub asset_id: AssetId,
    pub from_location: Option<String>,
    pub to_location: String,
    pub note: Option<String>,
    pub moved_at: DateTime<Utc>,
}

impl AssetMovement {
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_keeps_previous_location() {
        let asset = Asset::new("Betoneira 400L".into(), "PAT-0042".into())
            .with_location("Almoxarifado");

        let movement = asset.move_to("Obra Sul");

        assert_eq!(movement.asset_id, asset.id);
        assert_eq!(movement.from_location.as_deref(), Some("Almoxarifado"));
        assert_eq!(movement.to_location, "Obra Sul");
    }

    #[test]
    fn test_move_from_unknown_location() {
        let asset = Asset::new("Notebook".into(), "PAT-0099".into());
        let movement = asset.move_to("Escritório").with_note("primeira alocação");

        assert_eq!(movement.from_location, None);
        assert_eq!(movement.note.as_deref(), Some("primeira alocação"));
    }
}

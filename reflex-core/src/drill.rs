use serde::{Deserialize, Serialize};

/// Advisory drill difficulty. The engine stores it but does not interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Display metadata for a drill: shown to the coach, never read by the engine
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DrillInfo {
    pub name: String,
    pub purpose: String,
    pub equipment: Vec<String>,
}

impl DrillInfo {
    pub fn new(name: impl Into<String>, purpose: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            purpose: purpose.into(),
            equipment: Vec::new(),
        }
    }

    pub fn with_equipment<I, T>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.equipment.extend(items.into_iter().map(Into::into));
        self
    }
}

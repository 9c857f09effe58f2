use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::AssumptionSet;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub values: AssumptionSet,
    pub created_at: DateTime<Utc>,
}

impl Scenario {
    pub fn new(name: &str, values: AssumptionSet) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: clean_name(name, "Scenario"),
            values,
            created_at: Utc::now(),
        }
    }
}

fn clean_name(name: &str, fallback: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Newest-first scenario list, written back to its file after every change.
#[derive(Debug, Default)]
pub struct ScenarioStore {
    path: Option<PathBuf>,
    scenarios: Vec<Scenario>,
}

impl ScenarioStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads `path`. A missing or unreadable file starts an empty list, the
    /// same way a fresh browser profile would.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let scenarios = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Vec<Scenario>>(&text) {
                Ok(list) => list,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt scenario file");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "scenario file unreadable");
                Vec::new()
            }
        };
        tracing::info!(path = %path.display(), count = scenarios.len(), "scenario store opened");
        Self {
            path: Some(path),
            scenarios,
        }
    }

    pub fn list(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn get(&self, id: &str) -> Result<&Scenario> {
        self.scenarios
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    pub fn save(&mut self, name: &str, values: AssumptionSet) -> Result<Scenario> {
        self.push_front(Scenario::new(name, values))
    }

    /// Saves `base` with a new address and rent, named after the address.
    pub fn quick_add(
        &mut self,
        base: &AssumptionSet,
        address: &str,
        target_rent: &str,
    ) -> Result<Scenario> {
        let mut values = base.clone();
        values.address = address.to_string();
        values.target_rent = target_rent.into();
        let name = clean_name(address, "Quick Scenario");
        self.push_front(Scenario::new(&name, values))
    }

    pub fn rename(&mut self, id: &str, name: &str) -> Result<Scenario> {
        let idx = self.position(id)?;
        let mut next = self.scenarios.clone();
        next[idx].name = clean_name(name, "Scenario");
        let renamed = next[idx].clone();
        self.commit(next)?;
        Ok(renamed)
    }

    pub fn delete(&mut self, id: &str) -> Result<Scenario> {
        let idx = self.position(id)?;
        let mut next = self.scenarios.clone();
        let removed = next.remove(idx);
        self.commit(next)?;
        Ok(removed)
    }

    pub fn duplicate(&mut self, id: &str) -> Result<Scenario> {
        let source = self.get(id)?;
        let copy = Scenario {
            id: Uuid::new_v4().to_string(),
            name: format!("{} (copy)", source.name),
            values: source.values.clone(),
            created_at: Utc::now(),
        };
        self.push_front(copy)
    }

    /// Replaces the whole list, as a JSON import does.
    pub fn replace_all(&mut self, scenarios: Vec<Scenario>) -> Result<()> {
        self.commit(scenarios)
    }

    /// Puts `scenarios` ahead of the existing ones, last element first, so a
    /// bulk import reads newest-first like individual saves.
    pub fn extend_front(&mut self, scenarios: Vec<Scenario>) -> Result<()> {
        let mut next: Vec<Scenario> = scenarios.into_iter().rev().collect();
        next.extend(self.scenarios.iter().cloned());
        self.commit(next)
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.scenarios)?)
    }

    pub fn import_json(&mut self, json: &str) -> Result<usize> {
        let list: Vec<Scenario> = serde_json::from_str(json)?;
        let count = list.len();
        self.replace_all(list)?;
        Ok(count)
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.scenarios
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn push_front(&mut self, scenario: Scenario) -> Result<Scenario> {
        let mut next = Vec::with_capacity(self.scenarios.len() + 1);
        next.push(scenario.clone());
        next.extend(self.scenarios.iter().cloned());
        self.commit(next)?;
        Ok(scenario)
    }

    /// Writes `next` and only then makes it the in-memory list, so a failed
    /// write leaves the store as it was.
    fn commit(&mut self, next: Vec<Scenario>) -> Result<()> {
        self.persist(&next)?;
        self.scenarios = next;
        Ok(())
    }

    fn persist(&self, scenarios: &[Scenario]) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(scenarios)?;
        fs::write(path, json).inspect_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "scenario store write failed");
        })?;
        tracing::debug!(path = %path.display(), count = scenarios.len(), "scenario store saved");
        Ok(())
    }
}

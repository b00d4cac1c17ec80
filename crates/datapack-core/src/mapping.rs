//! Column presets mapping raw export column positions onto data pack headers.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Positional column selection for a headerless raw export, paired with the
/// headers the selected columns receive in the data pack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnPreset {
    pub name: String,
    pub columns: Vec<usize>,
    pub headers: Vec<String>,
}

impl ColumnPreset {
    pub fn new(name: impl Into<String>, columns: Vec<usize>, headers: Vec<String>) -> Result<Self> {
        let preset = Self {
            name: name.into(),
            columns,
            headers,
        };
        preset.validate()?;
        Ok(preset)
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(PipelineError::Validation(format!(
                "preset '{}' selects no columns",
                self.name
            )));
        }
        if self.columns.len() != self.headers.len() {
            return Err(PipelineError::Validation(format!(
                "preset '{}' has {} column indices but {} headers",
                self.name,
                self.columns.len(),
                self.headers.len()
            )));
        }
        let mut seen = HashSet::new();
        for index in &self.columns {
            if !seen.insert(index) {
                return Err(PipelineError::Validation(format!(
                    "preset '{}' selects column {} more than once",
                    self.name, index
                )));
            }
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let preset: ColumnPreset = serde_json::from_str(&content)?;
        preset.validate()?;
        Ok(preset)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Built-in preset for the primary datalog export.
    pub fn datalog() -> Self {
        let columns = vec![
            0, 1, 3, 4, 5, 6, 39, 40, 41, 42, 78, 79, 82, 83, 8, 9, 10, 11, 12, 13, 46, 47, 48,
            49, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59, 106, 107, 108, 109, 110, 111, 112, 113,
            114,
        ];
        let headers = [
            "Date/Time",
            "Flow (g/s)",
            "Cat 1 Inlet Analogue ETAS 1 (-)",
            "Cat 1 Outlet Analogue ETAS 2 (-)",
            "Cat 2 Inlet Analogue ETAS 3 (-)",
            "Cat 2 Outlet Analogue ETAS 4 (-)",
            "NB Sensor Cat 1 Mid Brick (V)",
            "NB Sensor Cat 1 Outlet (V)",
            "NB Sensor Cat 2 Mid Brick (V)",
            "NB Sensor Cat 2 Outlet (V)",
            "Cat 1 Inlet Digital ETAS 1 (-)",
            "Cat 1 Outlet Digital ETAS 2 (-)",
            "Cat 2 Inlet Digital ETAS 3 (-)",
            "Cat 2 Outlet Digital ETAS 4 (-)",
            "Cat 1 Inlet Gas Temperature (°C)",
            "Cat 1 Bed 1 Centre (°C)",
            "Cat 1 Bed 2 Centre (°C)",
            "Cat 1 Bed 2 Circumference Door Side (°C)",
            "Cat 1 Midpoint Gas Temperature (°C)",
            "Cat 1 Bed 3 Centre (°C)",
            "Cat 1 Bed 4 Centre (°C)",
            "Cat 1 Bed 5 Centre (°C)",
            "Cat 1 Bed 5 Circumference Door Side (°C)",
            "Cat 1 Outlet Gas Temperature (°C)",
            "Cat 2 Inlet Gas Temperature (°C)",
            "Cat 2 Bed 1 Centre (°C)",
            "Cat 2 Bed 2 Centre (°C)",
            "Cat 2 Bed 2 Circumference Door Side (°C)",
            "Cat 2 Midpoint Gas Temperature (°C)",
            "Cat 2 Bed 3 Centre (°C)",
            "Cat 2 Bed 4 Centre (°C)",
            "Cat 2 Bed 5 Centre (°C)",
            "Cat 2 Bed 5 Circumference Door Side (°C)",
            "Cat 2 Outlet Gas Temperature (°C)",
            "Water Concentration (%)",
            "CH4 Concentration (ppm)",
            "CO Concentration (%)",
            "NO Concentration (ppm)",
            "C3H6 Concentration (ppm)",
            "CO2 Concentration(%)",
            "NH3 Concentration (ppm)",
            "N2O Concentration (ppm)",
            "NO2 Concentration (ppm)",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            name: "datalog".to_string(),
            columns,
            headers,
        }
    }

    /// Built-in preset for the MFC gas-injection export.
    pub fn mfc() -> Self {
        let columns = vec![0, 2, 3, 11, 8, 10, 4, 13, 14, 22, 24, 21, 15];
        let headers = [
            "Date/Time",
            "005 NG Injection (SLPM)",
            "005 Air Injection (SLPM)",
            "005 O2 Injection (SLPM)",
            "006 Air Injection (SLPM)",
            "006 NG Injection (SLPM)",
            "006 O2 Injection (SLPM)",
            "005 NG Injection Set Point (SLPM)",
            "005 Air Injection Set Point (SLPM)",
            "005 O2 Injection Set Point (SLPM)",
            "006 Air Injection Set Point (SLPM)",
            "006 NG Injection Set Point (SLPM)",
            "006 O2 Injection Set Point (SLPM)",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            name: "mfc".to_string(),
            columns,
            headers,
        }
    }
}

/// Inserts each addition header directly after its reference header,
/// preserving the order of `additions`. An addition already present in the
/// base list is moved rather than duplicated.
pub fn insert_headers_after(
    base_headers: &[String],
    additions: &[(String, String)],
) -> Result<Vec<String>> {
    let mut ordered: Vec<String> = base_headers.to_vec();
    for (new_header, reference) in additions {
        if !ordered.iter().any(|h| h == reference) {
            return Err(PipelineError::Validation(format!(
                "reference column '{reference}' not found while inserting '{new_header}'"
            )));
        }
        if let Some(existing) = ordered.iter().position(|h| h == new_header) {
            ordered.remove(existing);
        }
        let ref_index = ordered
            .iter()
            .position(|h| h == reference)
            .expect("reference header vanished during insertion");
        ordered.insert(ref_index + 1, new_header.clone());
    }
    Ok(ordered)
}

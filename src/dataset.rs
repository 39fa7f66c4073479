//! Tree inventory records and their CSV surface.
//!
//! The loader only checks that the expected headers exist. Values are assumed
//! clean; a malformed cell surfaces as [`Error::Csv`].

use crate::error::{Error, Result};
use crate::evaluate::Evaluation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

/// One row of the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Total height.
    pub haut_tot: f64,
    /// Trunk diameter.
    pub tronc_diam: f64,
    /// Longitude, when the table carries coordinates.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Latitude, when the table carries coordinates.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Cluster label, absent until an assignment is applied.
    #[serde(default)]
    pub cluster: Option<i32>,
}

impl Record {
    /// Record without coordinates.
    pub fn new(haut_tot: f64, tronc_diam: f64) -> Self {
        Self {
            haut_tot,
            tronc_diam,
            longitude: None,
            latitude: None,
            cluster: None,
        }
    }

    /// Attach coordinates.
    pub fn with_position(mut self, longitude: f64, latitude: f64) -> Self {
        self.longitude = Some(longitude);
        self.latitude = Some(latitude);
        self
    }

    /// Value of a numeric column, `None` if the record lacks it.
    pub fn value(&self, column: Column) -> Option<f64> {
        match column {
            Column::Height => Some(self.haut_tot),
            Column::TrunkDiameter => Some(self.tronc_diam),
            Column::Longitude => self.longitude,
            Column::Latitude => self.latitude,
        }
    }
}

/// Numeric columns usable as features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    /// `haut_tot`
    Height,
    /// `tronc_diam`
    TrunkDiameter,
    /// `longitude`
    Longitude,
    /// `latitude`
    Latitude,
}

impl Column {
    /// Header name in the inventory file.
    pub fn header(self) -> &'static str {
        match self {
            Column::Height => "haut_tot",
            Column::TrunkDiameter => "tronc_diam",
            Column::Longitude => "longitude",
            Column::Latitude => "latitude",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

impl FromStr for Column {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "haut_tot" | "height" => Ok(Column::Height),
            "tronc_diam" | "diameter" => Ok(Column::TrunkDiameter),
            "longitude" | "lon" => Ok(Column::Longitude),
            "latitude" | "lat" => Ok(Column::Latitude),
            other => Err(Error::MissingColumn(other.to_string())),
        }
    }
}

/// Headers every inventory file must carry.
pub const REQUIRED_HEADERS: [&str; 2] = ["haut_tot", "tronc_diam"];

/// Read records from any CSV source.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<Record>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers()?.clone();
    for required in REQUIRED_HEADERS {
        if !headers.iter().any(|h| h == required) {
            return Err(Error::MissingColumn(required.to_string()));
        }
    }

    let mut records = Vec::new();
    for row in rdr.deserialize::<Record>() {
        records.push(row?);
    }
    tracing::debug!(rows = records.len(), "loaded inventory");
    Ok(records)
}

/// Load an inventory file.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), "reading inventory");
    read_records(File::open(path)?)
}

/// Write records, including the `cluster` column.
pub fn write_records<W: Write>(writer: W, records: &[Record]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the evaluation table (`k,inertia,davies_bouldin,silhouette`).
pub fn write_curves<W: Write>(writer: W, evaluations: &[Evaluation]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for evaluation in evaluations {
        wtr.serialize(evaluation)?;
    }
    wtr.flush()?;
    Ok(())
}

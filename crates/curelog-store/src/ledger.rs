//! Record management over a [`TabularStore`]: create, add reading, delete.

use chrono::NaiveDate;
use curelog_core::records::dimensions_product;
use curelog_core::{BatchRecord, SoapKey, WeightReading};
use tracing::info;

use crate::StoreError;
use crate::sheet::{Sheet, TabularStore};

/// Form data for a new soap batch.
#[derive(Debug, Clone, Default)]
pub struct NewSoap {
    pub name: String,
    pub batch_number: String,
    pub soap_type: String,
    pub height_mm: Option<f64>,
    pub width_mm: Option<f64>,
    pub thickness_mm: Option<f64>,
    pub notes: String,
    pub initial_weight_g: f64,
    pub initial_date: Option<NaiveDate>,
}

/// Both sheets read once, as typed records.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub batches: Vec<BatchRecord>,
    pub readings: Vec<WeightReading>,
}

/// Rows removed by [`SoapLedger::delete_soap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removed {
    pub batches: usize,
    pub readings: usize,
}

/// The soap record book: batch records plus their weight readings.
pub struct SoapLedger<S> {
    store: S,
}

impl<S: TabularStore> SoapLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Read both sheets.
    pub fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let batches = BatchRecord::from_batches(&self.store.read_all(Sheet::Batches)?);
        let readings = WeightReading::from_batches(&self.store.read_all(Sheet::Readings)?);
        info!(
            batches = batches.len(),
            readings = readings.len(),
            "loaded snapshot"
        );
        Ok(Snapshot { batches, readings })
    }

    pub fn batch_records(&self) -> Result<Vec<BatchRecord>, StoreError> {
        Ok(BatchRecord::from_batches(
            &self.store.read_all(Sheet::Batches)?,
        ))
    }

    pub fn find_batch(&self, key: &SoapKey) -> Result<Option<BatchRecord>, StoreError> {
        Ok(self
            .batch_records()?
            .into_iter()
            .find(|b| &b.key == key))
    }

    /// Readings of one soap in recorded order, including unreadable rows.
    pub fn readings_for(&self, key: &SoapKey) -> Result<Vec<WeightReading>, StoreError> {
        Ok(
            WeightReading::from_batches(&self.store.read_all(Sheet::Readings)?)
                .into_iter()
                .filter(|r| &r.key == key)
                .collect(),
        )
    }

    /// Record a new soap batch and its first reading.
    pub fn create_soap(&mut self, soap: NewSoap) -> Result<BatchRecord, StoreError> {
        let key = SoapKey::new(&soap.name, &soap.batch_number);
        if key.soap_name.is_empty() {
            return Err(StoreError::Invalid("soap name is required".into()));
        }
        if !(soap.initial_weight_g.is_finite() && soap.initial_weight_g > 0.0) {
            return Err(StoreError::Invalid(
                "initial weight must be greater than zero".into(),
            ));
        }
        let Some(initial_date) = soap.initial_date else {
            return Err(StoreError::Invalid("initial date is required".into()));
        };
        for dim in [soap.height_mm, soap.width_mm, soap.thickness_mm]
            .into_iter()
            .flatten()
        {
            if !(dim.is_finite() && dim >= 0.0) {
                return Err(StoreError::Invalid(format!("invalid dimension {dim}")));
            }
        }
        if self.find_batch(&key)?.is_some() {
            return Err(StoreError::DuplicateSoap(key));
        }

        let record = BatchRecord {
            key: key.clone(),
            soap_type: soap.soap_type.trim().to_string(),
            height_mm: soap.height_mm,
            width_mm: soap.width_mm,
            thickness_mm: soap.thickness_mm,
            surface_area: dimensions_product(soap.height_mm, soap.width_mm, soap.thickness_mm),
            notes: soap.notes.trim().to_string(),
            initial_weight_g: Some(soap.initial_weight_g),
            initial_date: Some(initial_date),
        };
        let first = WeightReading::new(key.clone(), initial_date, soap.initial_weight_g);

        self.store.append_row(Sheet::Batches, &record.to_row())?;
        self.store.append_row(Sheet::Readings, &first.to_row())?;
        info!(soap = %key, weight = soap.initial_weight_g, "created soap");
        Ok(record)
    }

    /// Append a weight reading for an existing soap.
    pub fn add_reading(
        &mut self,
        key: &SoapKey,
        date: NaiveDate,
        weight_g: f64,
    ) -> Result<WeightReading, StoreError> {
        if !(weight_g.is_finite() && weight_g >= 0.0) {
            return Err(StoreError::Invalid(format!("invalid weight {weight_g}")));
        }
        if self.find_batch(key)?.is_none() {
            return Err(StoreError::UnknownSoap(key.clone()));
        }
        let reading = WeightReading::new(key.clone(), date, weight_g);
        self.store.append_row(Sheet::Readings, &reading.to_row())?;
        info!(soap = %key, weight = weight_g, %date, "added reading");
        Ok(reading)
    }

    /// Remove a soap and all of its readings from both sheets.
    pub fn delete_soap(&mut self, key: &SoapKey) -> Result<Removed, StoreError> {
        let batch_rows = self.store.read_rows(Sheet::Batches)?;
        let reading_rows = self.store.read_rows(Sheet::Readings)?;

        let (gone_batches, kept_batches): (Vec<_>, Vec<_>) =
            batch_rows.into_iter().partition(|r| key.matches_row(r));
        let (gone_readings, kept_readings): (Vec<_>, Vec<_>) =
            reading_rows.into_iter().partition(|r| key.matches_row(r));

        if gone_batches.is_empty() && gone_readings.is_empty() {
            return Err(StoreError::UnknownSoap(key.clone()));
        }

        // Readings go first: if the batch rewrite then fails, the soap is
        // still listed and can be deleted again.
        self.store.overwrite_all(Sheet::Readings, &kept_readings)?;
        self.store.overwrite_all(Sheet::Batches, &kept_batches)?;

        let removed = Removed {
            batches: gone_batches.len(),
            readings: gone_readings.len(),
        };
        info!(
            soap = %key,
            batches = removed.batches,
            readings = removed.readings,
            "deleted soap"
        );
        Ok(removed)
    }
}

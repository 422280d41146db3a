use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn is_plausible(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Evidence bundle required to complete a delivery. Immutable once attached
/// to an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofOfDelivery {
    pub photo_refs: Vec<String>,
    pub coordinates: GeoPoint,
    pub signature_ref: Option<String>,
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    pub captured_at: DateTime<Utc>,
}

impl ProofOfDelivery {
    pub fn builder() -> ProofOfDeliveryBuilder {
        ProofOfDeliveryBuilder::default()
    }

    /// Input validation shared by the capture endpoint and the builder.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.photo_refs.is_empty() {
            return Err(AppError::Validation(
                "at least one photo reference is required".to_string(),
            ));
        }
        if self.photo_refs.iter().any(|r| r.trim().is_empty()) {
            return Err(AppError::Validation(
                "photo references cannot be blank".to_string(),
            ));
        }
        if !self.coordinates.is_plausible() {
            return Err(AppError::Validation(format!(
                "gps coordinates out of range: lat={}, lng={}",
                self.coordinates.lat, self.coordinates.lng
            )));
        }
        Ok(())
    }
}

/// Evidence is assembled at the call site and validated as a whole, so the
/// rules can evolve without touching the transition contract.
#[derive(Debug, Default)]
pub struct ProofOfDeliveryBuilder {
    photo_refs: Vec<String>,
    coordinates: Option<GeoPoint>,
    signature_ref: Option<String>,
    notes: Option<String>,
}

impl ProofOfDeliveryBuilder {
    pub fn photo(mut self, reference: impl Into<String>) -> Self {
        self.photo_refs.push(reference.into());
        self
    }

    pub fn photos<I, S>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.photo_refs.extend(references.into_iter().map(Into::into));
        self
    }

    pub fn coordinates(mut self, point: GeoPoint) -> Self {
        self.coordinates = Some(point);
        self
    }

    pub fn signature(mut self, reference: impl Into<String>) -> Self {
        self.signature_ref = Some(reference.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn build(self) -> Result<ProofOfDelivery, AppError> {
        let coordinates = self.coordinates.ok_or_else(|| {
            AppError::Validation("gps coordinates are required".to_string())
        })?;

        let proof = ProofOfDelivery {
            photo_refs: self.photo_refs,
            coordinates,
            signature_ref: self.signature_ref,
            notes: self.notes,
            captured_at: Utc::now(),
        };
        proof.validate()?;
        Ok(proof)
    }
}

#[cfg(test)]
mod tests {
    use super::{GeoPoint, ProofOfDelivery};
    use crate::error::AppError;

    #[test]
    fn builder_requires_at_least_one_photo() {
        let result = ProofOfDelivery::builder()
            .coordinates(GeoPoint { lat: 30.04, lng: 31.23 })
            .build();

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn builder_requires_coordinates() {
        let result = ProofOfDelivery::builder().photo("s3://pod/1.jpg").build();
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn out_of_range_latitude_is_rejected() {
        let result = ProofOfDelivery::builder()
            .photo("s3://pod/1.jpg")
            .coordinates(GeoPoint { lat: 91.0, lng: 0.0 })
            .build();

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn out_of_range_longitude_is_rejected() {
        let result = ProofOfDelivery::builder()
            .photo("s3://pod/1.jpg")
            .coordinates(GeoPoint { lat: 0.0, lng: -181.0 })
            .build();

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn complete_evidence_builds() {
        let proof = ProofOfDelivery::builder()
            .photo("s3://pod/1.jpg")
            .photo("s3://pod/2.jpg")
            .coordinates(GeoPoint { lat: 30.04, lng: 31.23 })
            .signature("s3://pod/sig.png")
            .notes("left with doorman")
            .build()
            .unwrap();

        assert_eq!(proof.photo_refs.len(), 2);
        assert!(proof.signature_ref.is_some());
    }
}

//! QC barcode payloads.
//!
//! The management service accepts QC lot barcodes in one of two shapes
//! depending on the instrument type: a flat list of barcodes, or a list of
//! lots tagged with their control level.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::types::InstrumentType;

/// Body of a QC barcode save call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QcBarcodeRequest {
    pub instrument_type: InstrumentType,
    #[serde(flatten)]
    pub barcodes: QcBarcodes,
}

/// The per-type barcode shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QcBarcodes {
    Flat { barcodes: Vec<String> },
    Lots { lots: Vec<QcLot> },
}

/// A QC lot with its 1-based control level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QcLot {
    pub barcode: String,
    pub level: u32,
}

impl QcBarcodeRequest {
    /// Build the request in the shape the given instrument type expects.
    ///
    /// Levels follow the order the barcodes are given in.
    pub fn for_type(
        instrument_type: InstrumentType,
        barcodes: &[String],
    ) -> Result<Self, ModelError> {
        let barcodes = match instrument_type {
            InstrumentType::ChemistryAnalyzer | InstrumentType::CoagulationAnalyzer => {
                QcBarcodes::Flat {
                    barcodes: barcodes.to_vec(),
                }
            }
            InstrumentType::HematologyAnalyzer | InstrumentType::UrineAnalyzer => {
                QcBarcodes::Lots {
                    lots: (1..)
                        .zip(barcodes)
                        .map(|(level, barcode)| QcLot {
                            barcode: barcode.clone(),
                            level,
                        })
                        .collect(),
                }
            }
            InstrumentType::SedimentAnalyzer | InstrumentType::ReferenceLabInterface => {
                return Err(ModelError::QcUnsupported(instrument_type));
            }
        };

        Ok(Self {
            instrument_type,
            barcodes,
        })
    }
}

//! Bundle ids: reversible `zipcode|hotel_id` identifiers.
//!
//! Bundle ids carry no integrity protection. Anyone can forge one for any
//! zipcode/hotel pair, so they must only ever select public data.

use std::fmt;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::{CodecError, CodecResult, HotelId, Zipcode};

const DELIMITER: char = '|';

/// URL-safe alphabet, padded on encode, padding optional on decode.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A decoded bundle id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BundleId {
    /// Zipcode the ad was requested for.
    pub zipcode: Zipcode,
    /// Hotel shown in the ad.
    pub hotel_id: HotelId,
}

impl BundleId {
    /// Create a bundle id for a zipcode/hotel pair.
    pub fn new(zipcode: Zipcode, hotel_id: HotelId) -> Self {
        Self { zipcode, hotel_id }
    }

    /// Encode as URL-safe base64 of `zipcode|hotel_id`.
    pub fn encode(&self) -> String {
        let joined = format!("{}{}{}", self.zipcode, DELIMITER, self.hotel_id);
        URL_SAFE_LENIENT.encode(joined.as_bytes())
    }

    /// Decode and validate an encoded bundle id.
    ///
    /// The payload must split into at least two fields, the first a
    /// five-digit zipcode and the second an integer hotel id. Extra fields
    /// are ignored.
    pub fn decode(encoded: &str) -> CodecResult<Self> {
        let bytes = URL_SAFE_LENIENT
            .decode(encoded.trim().as_bytes())
            .map_err(|e| CodecError::InvalidDataBundleId(format!("not base64: {}", e)))?;
        let payload = String::from_utf8(bytes)
            .map_err(|_| CodecError::InvalidDataBundleId("payload is not UTF-8".to_string()))?;

        let mut fields = payload.split(DELIMITER);
        let (Some(zip_field), Some(hotel_field)) = (fields.next(), fields.next()) else {
            return Err(CodecError::InvalidDataBundleId(
                "the provided id doesn't contain enough fields".to_string(),
            ));
        };

        let zipcode = Zipcode::new(zip_field).map_err(|_| {
            CodecError::InvalidDataBundleId("the zipcode extracted from id is not valid".to_string())
        })?;
        let hotel_id = hotel_field.parse::<HotelId>().map_err(|_| {
            CodecError::InvalidDataBundleId("the hotel id extracted from id is not valid".to_string())
        })?;

        Ok(Self { zipcode, hotel_id })
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

use crate::biometrics::BiometricSummary;
use crate::Error;
use chrono::{DateTime, SecondsFormat, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

const CERTIFICATE_PREFIX: &str = "CERT-";
const CERTIFICATE_RANDOM_LEN: usize = 7;
const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Human-checkable reference of the form `CERT-<millis>-<7 uppercase alphanumerics>`.
///
/// Uniqueness is best effort (time + random), collisions must be caught where
/// attestations are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CertificateId(String);

impl CertificateId {
    pub fn generate(now: DateTime<Utc>) -> Self {
        Self::generate_with(&mut rand::thread_rng(), now)
    }

    pub fn generate_with<R: Rng>(rng: &mut R, now: DateTime<Utc>) -> Self {
        let random: String = (0..CERTIFICATE_RANDOM_LEN)
            .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_uppercase())
            .collect();
        CertificateId(format!(
            "{}{}-{}",
            CERTIFICATE_PREFIX,
            now.timestamp_millis(),
            random
        ))
    }

    pub fn parse(value: &str) -> Result<Self, Error> {
        let invalid = || Error::Other(format!("`{}` is not a valid certificate id", value));
        let rest = value.strip_prefix(CERTIFICATE_PREFIX).ok_or_else(invalid)?;
        let (time_part, random_part) = rest.rsplit_once('-').ok_or_else(invalid)?;
        let is_upper_alnum = |c: char| c.is_ascii_digit() || c.is_ascii_uppercase();
        if time_part.is_empty()
            || !time_part.chars().all(|c| is_upper_alnum(c) || c == '-')
            || random_part.len() != CERTIFICATE_RANDOM_LEN
            || !random_part.chars().all(is_upper_alnum)
        {
            return Err(invalid());
        }
        Ok(CertificateId(value.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CertificateId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CertificateId> for String {
    fn from(id: CertificateId) -> Self {
        id.0
    }
}

/// Where the signature was made, as far as the host can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub source_address: String,
    pub device_descriptor: String,
}

impl SessionContext {
    pub fn new(source_address: impl Into<String>, device_descriptor: impl Into<String>) -> Self {
        SessionContext {
            source_address: source_address.into(),
            device_descriptor: device_descriptor.into(),
        }
    }

    /// Synthesized private-range address and a descriptor of this build.
    /// Only for non-production use; a real deployment captures the client address.
    pub fn placeholder() -> Self {
        let source_address = format!("192.168.1.{}", rand::thread_rng().gen_range(0..255));
        log::warn!(
            "Using placeholder session context `{}`. Capture the real client address in production.",
            source_address
        );
        SessionContext {
            source_address,
            device_descriptor: default_device_descriptor(),
        }
    }
}

fn default_device_descriptor() -> String {
    format!(
        "{}/{} ({})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    )
}

/// Speed to the nearest integer, pressure to 2 decimals. Duration is already whole ms.
pub fn round_biometrics(summary: BiometricSummary) -> BiometricSummary {
    BiometricSummary {
        speed: summary.speed.round(),
        pressure: (summary.pressure * 100.0).round() / 100.0,
        duration: summary.duration,
        method: summary.method,
    }
}

/// The signed record handed to the host. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureAttestation {
    /// Missing in records written by the wizard before this field existed.
    #[serde(default)]
    signer_name: String,
    /// PNG data URL of the surface at confirmation time.
    #[serde(alias = "signatureData")]
    image_payload: String,
    /// Hex SHA-256 of the PNG bytes. Empty when the record predates hashing.
    #[serde(default)]
    image_digest: String,
    /// ISO-8601, UTC, millisecond precision.
    timestamp: String,
    #[serde(alias = "ipAddress")]
    source_address: String,
    #[serde(alias = "deviceInfo")]
    device_descriptor: String,
    certificate_id: CertificateId,
    #[serde(alias = "biometricData")]
    biometrics: BiometricSummary,
}

impl SignatureAttestation {
    pub(crate) fn assemble(
        signer_name: &str,
        png_data: &[u8],
        now: DateTime<Utc>,
        context: &SessionContext,
        biometrics: BiometricSummary,
        certificate_id: CertificateId,
    ) -> Self {
        SignatureAttestation {
            signer_name: signer_name.to_owned(),
            image_payload: format!("{}{}", PNG_DATA_URL_PREFIX, base64::encode(png_data)),
            image_digest: hex_sha256(png_data),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            source_address: context.source_address.clone(),
            device_descriptor: context.device_descriptor.clone(),
            certificate_id,
            biometrics: round_biometrics(biometrics),
        }
    }

    pub fn signer_name(&self) -> &str {
        &self.signer_name
    }

    pub fn image_payload(&self) -> &str {
        &self.image_payload
    }

    pub fn image_digest(&self) -> &str {
        &self.image_digest
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn source_address(&self) -> &str {
        &self.source_address
    }

    pub fn device_descriptor(&self) -> &str {
        &self.device_descriptor
    }

    pub fn certificate_id(&self) -> &CertificateId {
        &self.certificate_id
    }

    pub fn biometrics(&self) -> &BiometricSummary {
        &self.biometrics
    }

    /// Decode the image payload back to PNG bytes.
    pub fn image_png(&self) -> Result<Vec<u8>, Error> {
        let encoded = self
            .image_payload
            .strip_prefix(PNG_DATA_URL_PREFIX)
            .ok_or_else(|| Error::Other("Image payload is not a PNG data URL.".to_owned()))?;
        Ok(base64::decode(encoded)?)
    }

    /// Recompute the digest of the embedded image and compare it to the recorded one.
    pub fn verify_image_digest(&self) -> Result<bool, Error> {
        Ok(hex_sha256(&self.image_png()?) == self.image_digest)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }
}

fn hex_sha256(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

//! Storage backend and module identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage backend type
///
/// Closed set of backends the platform can route objects to. Carried as a
/// short string in persisted file records and integration rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Disk,
    S3,
    R2,
    Gcs,
    Database,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Disk => "disk",
            ProviderType::S3 => "s3",
            ProviderType::R2 => "r2",
            ProviderType::Gcs => "gcs",
            ProviderType::Database => "database",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = UnknownProviderType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disk" => Ok(ProviderType::Disk),
            "s3" => Ok(ProviderType::S3),
            "r2" => Ok(ProviderType::R2),
            "gcs" => Ok(ProviderType::Gcs),
            "database" => Ok(ProviderType::Database),
            other => Err(UnknownProviderType(other.to_string())),
        }
    }
}

/// Error returned when parsing an unrecognized provider type string.
#[derive(Debug, thiserror::Error)]
#[error("unknown storage provider type: {0}")]
pub struct UnknownProviderType(pub String);

/// Compliance module an upload belongs to.
///
/// Modules bias provider resolution: the rule chain routes trust-center
/// content to R2 and compliance evidence to S3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgModule {
    TrustCenter,
    Compliance,
}

impl OrgModule {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgModule::TrustCenter => "trust_center",
            OrgModule::Compliance => "compliance",
        }
    }
}

impl fmt::Display for OrgModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrgModule {
    type Err = UnknownModule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trust_center" => Ok(OrgModule::TrustCenter),
            "compliance" => Ok(OrgModule::Compliance),
            other => Err(UnknownModule(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown org module: {0}")]
pub struct UnknownModule(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_round_trip() {
        for p in [
            ProviderType::Disk,
            ProviderType::S3,
            ProviderType::R2,
            ProviderType::Gcs,
            ProviderType::Database,
        ] {
            assert_eq!(p.as_str().parse::<ProviderType>().unwrap(), p);
        }
    }

    #[test]
    fn test_provider_type_rejects_unknown() {
        assert!("nfs".parse::<ProviderType>().is_err());
    }

    #[test]
    fn test_module_round_trip() {
        assert_eq!(
            "trust_center".parse::<OrgModule>().unwrap(),
            OrgModule::TrustCenter
        );
        assert_eq!(OrgModule::Compliance.to_string(), "compliance");
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::EfattureError;

/// How an invoice file is signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningMethod {
    /// PKCS#7 envelope (`.xml.p7m`).
    #[serde(rename = "CAdES-BES")]
    CadesBes,
    /// Enveloped XML signature (`.xml`).
    #[serde(rename = "XAdES-BES")]
    XadesBes,
}

impl SigningMethod {
    /// Name sent to the web service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CadesBes => "CAdES-BES",
            Self::XadesBes => "XAdES-BES",
        }
    }

    /// File extension, without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::CadesBes => "xml.p7m",
            Self::XadesBes => "xml",
        }
    }

    /// Method implied by a file name's extension (case-insensitive).
    pub fn from_file_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        if name.ends_with(".xml.p7m") {
            Some(Self::CadesBes)
        } else if name.ends_with(".xml") {
            Some(Self::XadesBes)
        } else {
            None
        }
    }
}

impl fmt::Display for SigningMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SigningMethod {
    type Err = EfattureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CADES-BES" => Ok(Self::CadesBes),
            "XADES-BES" => Ok(Self::XadesBes),
            _ => Err(EfattureError::InvalidArgument(format!(
                "signing method must be 'CAdES-BES' or 'XAdES-BES', got '{s}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_from_file_name() {
        assert_eq!(
            SigningMethod::from_file_name("IT01234567890_00001.xml.p7m"),
            Some(SigningMethod::CadesBes)
        );
        assert_eq!(
            SigningMethod::from_file_name(" IT01234567890_00001.XML "),
            Some(SigningMethod::XadesBes)
        );
        assert_eq!(SigningMethod::from_file_name("invoice.pdf"), None);
    }

    #[test]
    fn wire_names() {
        assert_eq!("cades-bes".parse::<SigningMethod>().unwrap(), SigningMethod::CadesBes);
        assert!("PAdES".parse::<SigningMethod>().is_err());
        assert_eq!(
            serde_json::to_string(&SigningMethod::XadesBes).unwrap(),
            "\"XAdES-BES\""
        );
        assert_eq!(SigningMethod::CadesBes.extension(), "xml.p7m");
    }
}

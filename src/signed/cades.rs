use std::io::Write;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::core::EfattureError;

/// Opens a CAdES-BES (PKCS#7, DER) envelope and returns the signed content.
pub trait CadesExtractor: Send + Sync {
    fn extract(&self, signed: &[u8]) -> Result<Vec<u8>, EfattureError>;
}

/// Runs `openssl smime -verify -noverify -inform DER`, feeding the envelope on
/// stdin and reading the content from stdout. The signer certificate is not
/// checked.
#[derive(Debug, Clone)]
pub struct OpensslExtractor {
    program: String,
}

impl Default for OpensslExtractor {
    fn default() -> Self {
        Self {
            program: "openssl".to_string(),
        }
    }
}

impl OpensslExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another `openssl` binary.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl CadesExtractor for OpensslExtractor {
    fn extract(&self, signed: &[u8]) -> Result<Vec<u8>, EfattureError> {
        let mut child = Command::new(&self.program)
            .args(["smime", "-verify", "-noverify", "-inform", "DER"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Write from a separate thread so a full stdout pipe cannot block us.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| EfattureError::Signature("openssl stdin unavailable".into()))?;
        let input = signed.to_vec();
        let writer = std::thread::spawn(move || stdin.write_all(&input));

        let output = child.wait_with_output()?;
        let written = writer
            .join()
            .map_err(|_| EfattureError::Signature("openssl stdin writer panicked".into()))?;

        debug!(status = %output.status, bytes = output.stdout.len(), "openssl smime finished");
        if output.stdout.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EfattureError::Signature(format!(
                "invalid CAdES-BES file: {}",
                stderr.lines().next().unwrap_or("no content extracted")
            )));
        }
        written?;
        Ok(output.stdout)
    }
}

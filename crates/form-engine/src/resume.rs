use autofill_core_types::{NodeId, ResumeFile};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::debug;

use crate::errors::EngineError;
use crate::ports::{DomEvent, DomPort, FilePayload, Highlight};

/// Outcome of one file-input attachment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttachOutcome {
    Attached { name: String, bytes: usize },
    /// No cached resume; the control was flagged instead.
    Flagged,
}

/// Decodes a data URL (`data:<mime>;base64,<payload>`) or bare base64.
pub fn decode_resume(resume: &ResumeFile) -> Result<FilePayload, EngineError> {
    let encoded = resume.encoded_data.trim();
    let (mime_from_url, payload) = match encoded.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| EngineError::ResumeDecode("data url without payload".into()))?;
            let mime = header.split(';').next().filter(|m| !m.is_empty());
            (mime.map(str::to_string), payload)
        }
        None => (None, encoded),
    };
    let bytes = STANDARD.decode(payload)?;
    let mime_type = if resume.mime_type.trim().is_empty() {
        mime_from_url.unwrap_or_else(|| "application/octet-stream".to_string())
    } else {
        resume.mime_type.clone()
    };
    Ok(FilePayload {
        name: resume.name.clone(),
        mime_type,
        bytes,
    })
}

/// Places the cached resume into a file input, or flags the input when
/// nothing is cached.
pub async fn attach_resume(
    dom: &dyn DomPort,
    node: NodeId,
    resume: Option<&ResumeFile>,
) -> Result<AttachOutcome, EngineError> {
    let Some(resume) = resume else {
        dom.highlight(node, Highlight::MissingResume, None).await?;
        return Ok(AttachOutcome::Flagged);
    };
    let payload = decode_resume(resume)?;
    let name = payload.name.clone();
    let bytes = payload.bytes.len();
    debug!(%node, file = %name, bytes, "attaching resume");
    dom.set_files(node, vec![payload]).await?;
    dom.dispatch(node, DomEvent::Change).await?;
    dom.dispatch(node, DomEvent::Input).await?;
    Ok(AttachOutcome::Attached { name, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resume(encoded: &str, mime: &str) -> ResumeFile {
        ResumeFile {
            name: "cv.pdf".into(),
            mime_type: mime.into(),
            size: 5,
            encoded_data: encoded.into(),
            uploaded_at: None,
        }
    }

    #[test]
    fn decodes_data_url() {
        let payload = decode_resume(&resume("data:application/pdf;base64,JVBERi0=", "")).unwrap();
        assert_eq!(payload.bytes, b"%PDF-");
        assert_eq!(payload.mime_type, "application/pdf");
    }

    #[test]
    fn decodes_bare_base64_and_keeps_stored_mime() {
        let payload = decode_resume(&resume("aGVsbG8=", "text/plain")).unwrap();
        assert_eq!(payload.bytes, b"hello");
        assert_eq!(payload.mime_type, "text/plain");
    }

    #[test]
    fn corrupt_payload_is_a_decode_error() {
        let err = decode_resume(&resume("data:application/pdf;base64,***", "")).unwrap_err();
        assert!(matches!(err, EngineError::ResumeDecode(_)));
    }
}

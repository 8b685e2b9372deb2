use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use thiserror::Error;
use urban_brush_core::{GridShape, GridSnapshot};

const TRANSFER_DOMAIN: &str = "urban";
const TRANSFER_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const TRANSFER_HEADER: &str = "urban:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Encodes a snapshot into a single-line string suitable for clipboard transfer.
///
/// The dimensions are written as `<columns>x<rows>` ahead of the payload so a
/// reader can reject a mismatched grid without decoding it.
pub(crate) fn encode(snapshot: &GridSnapshot) -> Result<String, SnapshotTransferError> {
    let shape = snapshot.shape();
    let json = serde_json::to_vec(snapshot).map_err(SnapshotTransferError::InvalidPayload)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!(
        "{TRANSFER_HEADER}:{}x{}:{encoded}",
        shape.columns(),
        shape.rows()
    ))
}

/// Decodes a snapshot from its transfer string.
pub(crate) fn decode(value: &str) -> Result<GridSnapshot, SnapshotTransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SnapshotTransferError::EmptyPayload);
    }

    let mut parts = trimmed.split(FIELD_DELIMITER);
    let domain = parts.next().ok_or(SnapshotTransferError::MissingPrefix)?;
    let version = parts.next().ok_or(SnapshotTransferError::MissingVersion)?;
    let dimensions = parts
        .next()
        .ok_or(SnapshotTransferError::MissingDimensions)?;
    let payload = parts.next().ok_or(SnapshotTransferError::MissingPayload)?;

    if domain != TRANSFER_DOMAIN {
        return Err(SnapshotTransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != TRANSFER_VERSION {
        return Err(SnapshotTransferError::UnsupportedVersion(version.to_owned()));
    }

    let declared = parse_dimensions(dimensions)?;
    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(SnapshotTransferError::InvalidEncoding)?;
    let snapshot: GridSnapshot =
        serde_json::from_slice(&bytes).map_err(SnapshotTransferError::InvalidPayload)?;

    let found = snapshot.shape();
    if found != declared {
        return Err(SnapshotTransferError::DimensionMismatch { declared, found });
    }
    Ok(snapshot)
}

/// Errors that can occur while encoding or decoding transfer strings.
#[derive(Debug, Error)]
pub(crate) enum SnapshotTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("transfer string was empty")]
    EmptyPayload,
    /// The prefix segment was missing.
    #[error("transfer string is missing the prefix")]
    MissingPrefix,
    /// The version segment was missing.
    #[error("transfer string is missing the version")]
    MissingVersion,
    /// The grid dimensions were missing.
    #[error("transfer string is missing the grid dimensions")]
    MissingDimensions,
    /// The payload segment was missing.
    #[error("transfer string is missing the payload")]
    MissingPayload,
    /// The prefix named another format.
    #[error("transfer prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The version is not understood by this build.
    #[error("transfer version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode snapshot payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be converted to or from JSON.
    #[error("could not parse snapshot payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
    /// The payload describes a grid other than the one in the header.
    #[error("header declares a {declared} grid but the payload holds {found}")]
    DimensionMismatch {
        /// Shape written in the header.
        declared: GridShape,
        /// Shape of the decoded snapshot.
        found: GridShape,
    },
}

fn parse_dimensions(dimensions: &str) -> Result<GridShape, SnapshotTransferError> {
    let invalid = || SnapshotTransferError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;

    if columns == 0 || rows == 0 {
        return Err(invalid());
    }

    Ok(GridShape::new(rows, columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use urban_brush_core::ConnectionState;

    fn snapshot(rows: usize, columns: usize) -> GridSnapshot {
        GridSnapshot {
            lots: vec![vec![17; columns]; rows],
            secs: vec![vec![[ConnectionState::Active; 4]; columns + 1]; rows + 1],
        }
    }

    #[test]
    fn round_trip_keeps_every_slot() {
        let mut original = snapshot(2, 3);
        original.lots[1][2] = 255;
        original.secs[1][1] = [
            ConnectionState::Blocked,
            ConnectionState::Focused,
            ConnectionState::Active,
            ConnectionState::Blocked,
        ];

        let encoded = encode(&original).expect("snapshot encodes");
        assert!(encoded.starts_with(&format!("{TRANSFER_HEADER}:3x2:")));
        assert!(!encoded.contains('\n'));

        let decoded = decode(&encoded).expect("snapshot decodes");
        assert_eq!(decoded, original);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let original = snapshot(1, 1);
        let encoded = encode(&original).expect("snapshot encodes");
        let decoded = decode(&format!("  {encoded}\n")).expect("snapshot decodes");
        assert_eq!(decoded, original);
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert!(matches!(decode("   "), Err(SnapshotTransferError::EmptyPayload)));
        assert!(matches!(
            decode("maze:v1:2x2:abc"),
            Err(SnapshotTransferError::InvalidPrefix(prefix)) if prefix == "maze"
        ));
        assert!(matches!(
            decode("urban:v2:2x2:abc"),
            Err(SnapshotTransferError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            decode("urban:v1:0x2:abc"),
            Err(SnapshotTransferError::InvalidDimensions(_))
        ));
        assert!(matches!(
            decode("urban:v1:2x2"),
            Err(SnapshotTransferError::MissingPayload)
        ));
        assert!(matches!(
            decode("urban:v1:2x2:***"),
            Err(SnapshotTransferError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn header_must_match_the_payload() {
        let encoded = encode(&snapshot(2, 3)).expect("snapshot encodes");
        let tampered = encoded.replacen(":3x2:", ":2x3:", 1);

        assert!(matches!(
            decode(&tampered),
            Err(SnapshotTransferError::DimensionMismatch { .. })
        ));
    }
}

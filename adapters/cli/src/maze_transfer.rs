use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use maze_chase_core::Maze;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SNAPSHOT_DOMAIN: &str = "maze";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "maze:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Generated level captured together with the seed that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct MazeSnapshot {
    /// Seed of the generation attempt that produced the maze.
    pub seed: u32,
    /// Level the maze was generated for.
    pub level: u32,
    /// Layout, ghost house and warp rows.
    pub maze: Maze,
}

impl MazeSnapshot {
    /// Encodes the snapshot into a single-line string suitable for clipboard transfer.
    pub(crate) fn encode(&self) -> Result<String, TransferError> {
        let json = serde_json::to_vec(self).map_err(TransferError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        let grid = &self.maze.grid;
        Ok(format!(
            "{SNAPSHOT_HEADER}:{}x{}:{encoded}",
            grid.columns(),
            grid.rows()
        ))
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, TransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(TransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(TransferError::MissingPrefix)?;
        let version = parts.next().ok_or(TransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(TransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(TransferError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(TransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(TransferError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(TransferError::InvalidEncoding)?;
        let snapshot: Self =
            serde_json::from_slice(&bytes).map_err(TransferError::InvalidPayload)?;

        let grid = &snapshot.maze.grid;
        if grid.columns() != columns || grid.rows() != rows {
            return Err(TransferError::DimensionMismatch {
                declared: (columns, rows),
                actual: (grid.columns(), grid.rows()),
            });
        }
        Ok(snapshot)
    }
}

/// Errors that can occur while encoding or decoding maze share strings.
#[derive(Debug, Error)]
pub(crate) enum TransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("share string was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the encoded snapshot.
    #[error("share string is missing the prefix")]
    MissingPrefix,
    /// The encoded snapshot did not contain a version segment.
    #[error("share string is missing the version")]
    MissingVersion,
    /// The encoded snapshot did not include grid dimensions.
    #[error("share string is missing the grid dimensions")]
    MissingDimensions,
    /// The encoded snapshot did not include the payload segment.
    #[error("share string is missing the payload")]
    MissingPayload,
    /// The encoded snapshot used an unexpected prefix segment.
    #[error("share prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded snapshot used an unsupported version identifier.
    #[error("share version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the encoded snapshot.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The header dimensions disagree with the decoded grid.
    #[error("header declares {declared:?} but the maze is {actual:?}")]
    DimensionMismatch {
        /// Columns and rows named in the header.
        declared: (u32, u32),
        /// Columns and rows of the decoded grid.
        actual: (u32, u32),
    },
    /// The base64 payload could not be decoded.
    #[error("could not decode maze payload")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    #[error("could not parse maze payload")]
    InvalidPayload(#[source] serde_json::Error),
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), TransferError> {
    let invalid = || TransferError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;

    if columns == 0 || rows == 0 {
        return Err(invalid());
    }

    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use maze_chase_core::{GhostHouse, Grid};

    use super::*;

    fn sample() -> MazeSnapshot {
        let grid = Grid::from_ascii(
            "##########\n\
             #........#\n\
             #.######.#\n\
             ..#....#..\n\
             #.#....#.#\n\
             #.######.#\n\
             #........#\n\
             #.##..##.#\n\
             ##########",
        );
        MazeSnapshot {
            seed: 1_042,
            level: 1,
            maze: Maze {
                grid,
                ghost_house: GhostHouse::new(2, 2, 7, 5),
                warp_rows: vec![3],
            },
        }
    }

    #[test]
    fn share_string_carries_header_and_round_trips() {
        let snapshot = sample();
        let encoded = snapshot.encode().expect("snapshot encodes");
        assert!(encoded.starts_with(&format!("{SNAPSHOT_HEADER}:10x9:")));

        let decoded = MazeSnapshot::decode(&format!("  {encoded}\n")).expect("snapshot decodes");
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn rejects_foreign_headers() {
        assert!(matches!(
            MazeSnapshot::decode("   "),
            Err(TransferError::EmptyPayload)
        ));
        assert!(matches!(
            MazeSnapshot::decode("tower:v1:10x9:e30"),
            Err(TransferError::InvalidPrefix(prefix)) if prefix == "tower"
        ));
        assert!(matches!(
            MazeSnapshot::decode("maze:v2:10x9:e30"),
            Err(TransferError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            MazeSnapshot::decode("maze:v1:0x9:e30"),
            Err(TransferError::InvalidDimensions(_))
        ));
        assert!(matches!(
            MazeSnapshot::decode("maze:v1:10x9"),
            Err(TransferError::MissingPayload)
        ));
    }

    #[test]
    fn rejects_payloads_that_disagree_with_the_header() {
        let encoded = sample().encode().expect("snapshot encodes");
        let tampered = encoded.replacen("10x9", "12x9", 1);
        assert!(matches!(
            MazeSnapshot::decode(&tampered),
            Err(TransferError::DimensionMismatch {
                declared: (12, 9),
                actual: (10, 9),
            })
        ));
        assert!(matches!(
            MazeSnapshot::decode("maze:v1:10x9:!!!"),
            Err(TransferError::InvalidEncoding(_))
        ));
    }
}

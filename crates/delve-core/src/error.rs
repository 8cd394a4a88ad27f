//! Error types for configuration and level generation.

use thiserror::Error;

use crate::geometry::Coord;

/// Invalid configuration detected before any generation runs.
///
/// These are never clamped: a bad value fails construction.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A pool guarantee must ask for at least one copy.
    #[error("pool guarantee minimum must be positive, got {0}")]
    InvalidGuarantee(i64),

    /// A guarantee's minimum exceeds its own maximum.
    #[error("pool guarantee minimum {min} exceeds maximum {max}")]
    GuaranteeAboveCap { min: u32, max: u32 },

    /// Guaranteed copies cannot fit in one refill batch.
    #[error("pool guarantees need {needed} slots but capacity is {capacity}")]
    GuaranteesExceedCapacity { needed: u32, capacity: u32 },

    /// A pool was configured with no capacity or no entries.
    #[error("weighted pool is empty: {0}")]
    EmptyPool(&'static str),

    /// A discrete distribution has no outcome with positive weight.
    #[error("distribution `{0}` has no outcome with positive weight")]
    EmptyDistribution(&'static str),

    /// Sectors must hold between 3 and 5 selected squares.
    #[error("room_squares outcome {0} is outside 3..=5")]
    RoomSquaresOutOfRange(u32),

    /// The map cannot be split into the requested sector grid.
    #[error("invalid sector grid: {0}")]
    SectorGrid(String),

    /// A numeric option is outside its legal range.
    #[error("option `{name}` out of range: {value}")]
    OutOfRange { name: &'static str, value: String },

    /// Reading a configuration file failed.
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration document failed to parse.
    #[error("could not parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Fatal failure while generating a level or placing a prefab.
#[derive(Error, Debug)]
pub enum GenError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Cell selection ran out of legal (non-diagonal) candidates.
    #[error("no legal sector cell left after selecting {selected} of {wanted}")]
    NoLegalCell { selected: usize, wanted: usize },

    /// A mandatory feature could not be placed on any candidate tile.
    #[error("no legal tile for mandatory feature `{0}`")]
    NoPlacement(String),

    /// An internal structural invariant was broken.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// A canvas write fell outside the canvas bounds.
    #[error("canvas write out of bounds at {0}")]
    OutOfBounds(Coord),
}

pub type Result<T, E = GenError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts_transparently() {
        let err: GenError = ConfigError::RoomSquaresOutOfRange(7).into();
        assert!(matches!(err, GenError::Config(ConfigError::RoomSquaresOutOfRange(7))));
        assert_eq!(err.to_string(), "room_squares outcome 7 is outside 3..=5");
    }

    #[test]
    fn test_error_messages_carry_fields() {
        let err = ConfigError::GuaranteeAboveCap { min: 4, max: 2 };
        assert_eq!(err.to_string(), "pool guarantee minimum 4 exceeds maximum 2");
        let err = GenError::NoLegalCell { selected: 2, wanted: 5 };
        assert_eq!(err.to_string(), "no legal sector cell left after selecting 2 of 5");
    }

    #[test]
    fn test_parse_error_converts() {
        let parse = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: ConfigError = parse.into();
        assert!(err.to_string().starts_with("could not parse config: "));
    }
}

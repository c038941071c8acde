use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::errors::MpdError;

/// Tags MPD accepts after `find … sort`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortField {
    Artist,
    ArtistSort,
    AlbumArtist,
    AlbumArtistSort,
    Album,
    AlbumSort,
    Title,
    Track,
    Disc,
    Date,
    Genre,
    Composer,
    #[strum(serialize = "last-modified")]
    LastModified,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum SortDirection {
    #[default]
    #[strum(serialize = "asc")]
    Ascending,
    #[strum(serialize = "desc")]
    Descending,
}

/// Compact form is `field` or `field:asc|desc`, e.g. `albumartist:desc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SortDescriptor {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortDescriptor {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn ascending(field: SortField) -> Self {
        Self::new(field, SortDirection::Ascending)
    }

    pub fn descending(field: SortField) -> Self {
        Self::new(field, SortDirection::Descending)
    }

    /// Value of the `sort` argument, MPD sorts descending with a `-` prefix.
    pub fn to_mpd_arg(&self) -> String {
        match self.direction {
            SortDirection::Ascending => self.field.to_string(),
            SortDirection::Descending => format!("-{}", self.field),
        }
    }
}

impl Display for SortDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.field, self.direction)
    }
}

impl FromStr for SortDescriptor {
    type Err = MpdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = s.trim().split_once(':').unwrap_or((s.trim(), "asc"));
        let field = field
            .parse()
            .map_err(|_| MpdError::Malformed(format!("Unknown sort field '{field}'")))?;
        let direction = direction
            .parse()
            .map_err(|_| MpdError::Malformed(format!("Unknown sort direction '{direction}'")))?;

        Ok(Self { field, direction })
    }
}

impl TryFrom<String> for SortDescriptor {
    type Error = MpdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortDescriptor> for String {
    fn from(value: SortDescriptor) -> Self {
        value.to_string()
    }
}

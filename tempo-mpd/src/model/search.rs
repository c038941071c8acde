use std::{fmt::Display, str::FromStr};

use derive_more::{AsRef, Deref, IntoIterator};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{errors::MpdError, filter::Tag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SearchField {
    Any,
    Title,
    Artist,
    AlbumArtist,
    Album,
    Genre,
    Composer,
    Performer,
    File,
}

impl From<SearchField> for Tag {
    fn from(value: SearchField) -> Self {
        match value {
            SearchField::Any => Tag::Any,
            SearchField::Title => Tag::Title,
            SearchField::Artist => Tag::Artist,
            SearchField::AlbumArtist => Tag::AlbumArtist,
            SearchField::Album => Tag::Album,
            SearchField::Genre => Tag::Genre,
            SearchField::Composer => Tag::Composer,
            SearchField::Performer => Tag::Performer,
            SearchField::File => Tag::File,
        }
    }
}

/// Ordered, duplicate free set of fields. Compact form is comma separated,
/// e.g. `artist,album,title`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, AsRef, IntoIterator, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[into_iterator(owned, ref)]
pub struct SearchFields(Vec<SearchField>);

impl SearchFields {
    pub fn new(fields: impl IntoIterator<Item = SearchField>) -> Self {
        Self(fields.into_iter().unique().collect())
    }
}

impl From<&[SearchField]> for SearchFields {
    fn from(value: &[SearchField]) -> Self {
        Self::new(value.iter().copied())
    }
}

impl Display for SearchFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().join(","))
    }
}

impl FromStr for SearchFields {
    type Err = MpdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<SearchField> = s
            .split(',')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(|field| {
                field
                    .parse()
                    .map_err(|_| MpdError::Malformed(format!("Unknown search field '{field}'")))
            })
            .try_collect()?;

        Ok(Self::new(fields))
    }
}

impl TryFrom<String> for SearchFields {
    type Error = MpdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SearchFields> for String {
    fn from(value: SearchFields) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_prints_compact_form() {
        let fields: SearchFields = "artist, Album,title".parse().unwrap();

        assert_eq!(*fields, vec![SearchField::Artist, SearchField::Album, SearchField::Title]);
        assert_eq!(fields.to_string(), "artist,album,title");
    }

    #[test]
    fn drops_duplicates_keeping_order() {
        let fields = SearchFields::new([SearchField::Title, SearchField::Artist, SearchField::Title]);

        assert_eq!(fields.to_string(), "title,artist");
    }

    #[test]
    fn empty_string_is_empty_set() {
        assert!("".parse::<SearchFields>().unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_field() {
        assert!("artist,bpm".parse::<SearchFields>().is_err());
    }

    #[test]
    fn maps_to_filter_tags() {
        assert_eq!(Tag::from(SearchField::AlbumArtist).to_string(), "albumartist");
    }
}

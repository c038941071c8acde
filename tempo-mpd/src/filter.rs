use std::borrow::Cow;

use itertools::Itertools;
use strum::Display;

use crate::codec::{escape, escape_unwrapped};

#[derive(Debug, PartialEq, Eq, Clone, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Tag {
    Any,
    Artist,
    AlbumArtist,
    Album,
    Title,
    File,
    Genre,
    Composer,
    Performer,
    Custom(String),
}

impl Tag {
    pub(crate) fn as_str(&self) -> &str {
        match self {
            Tag::Any => "any",
            Tag::Artist => "artist",
            Tag::AlbumArtist => "albumartist",
            Tag::Album => "album",
            Tag::Title => "title",
            Tag::File => "file",
            Tag::Genre => "genre",
            Tag::Composer => "composer",
            Tag::Performer => "performer",
            Tag::Custom(v) => v,
        }
    }
}

impl From<String> for Tag {
    fn from(value: String) -> Self {
        Self::Custom(value)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display)]
pub enum Comparator {
    #[default]
    #[strum(serialize = "==")]
    Equals,
    #[strum(serialize = "!=")]
    NotEquals,
    #[strum(serialize = "contains")]
    Contains,
    #[strum(serialize = "starts_with")]
    StartsWith,
    #[strum(serialize = "=~")]
    Regex,
    #[strum(serialize = "!~")]
    NotRegex,
}

/// Builds a single filter clause `(key comparator 'value')`.
///
/// The value is escaped for the inner single quotes first, then the whole
/// clause is escaped once more for backslashes and double quotes because it
/// ends up inside a double quoted command argument. With `quote` set the
/// clause is returned already wrapped in those double quotes.
pub fn filter(key: &str, value: &str, comparator: Comparator, quote: bool) -> String {
    let clause = format!("({key} {comparator} {})", escape(value, Some('\'')));
    if quote { escape(&clause, Some('"')) } else { escape_unwrapped(&clause, Some('"')) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter<'value> {
    pub tag: Tag,
    pub value: Cow<'value, str>,
    pub comparator: Comparator,
}

impl<'value> Filter<'value> {
    pub fn new<T: Into<Tag>, V: Into<Cow<'value, str>>>(tag: T, value: V) -> Self {
        Self { tag: tag.into(), value: value.into(), comparator: Comparator::Equals }
    }

    pub fn new_with_comparator<T: Into<Tag>, V: Into<Cow<'value, str>>>(
        tag: T,
        value: V,
        comparator: Comparator,
    ) -> Self {
        Self { tag: tag.into(), value: value.into(), comparator }
    }

    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    /// Clause already escaped for embedding inside a double quoted argument,
    /// without the surrounding quotes.
    pub fn to_clause(&self) -> String {
        filter(self.tag.as_str(), &self.value, self.comparator, false)
    }
}

pub(crate) trait FilterExt {
    /// Complete double quoted filter argument, clauses joined with `AND`.
    fn to_query_arg(&self) -> String;
}

impl FilterExt for &[Filter<'_>] {
    fn to_query_arg(&self) -> String {
        match *self {
            [] => String::from("\"(file != '')\""),
            [single] => format!("\"{}\"", single.to_clause()),
            filters => {
                format!("\"({})\"", filters.iter().map(Filter::to_clause).join(" AND "))
            }
        }
    }
}

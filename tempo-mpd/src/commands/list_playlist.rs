use std::collections::HashSet;

use derive_more::{AsRef, Into, IntoIterator};

use crate::{
    errors::MpdResult,
    from_mpd::{FromMpd, LineHandled},
};

/// Files of a stored playlist in playlist order, as listed by `listplaylist`.
#[derive(Debug, Default, IntoIterator, AsRef, Into)]
pub struct FileList(pub Vec<String>);

impl FromMpd for FileList {
    fn next_internal(&mut self, key: &str, value: String) -> MpdResult<LineHandled> {
        match key {
            "file" => {
                self.0.push(value);
                Ok(LineHandled::Yes)
            }
            _ => Ok(LineHandled::No { value }),
        }
    }
}

impl FileList {
    /// Positions holding any of `files`, highest first so they can be deleted
    /// one after another without shifting the remaining ones.
    pub fn positions_of<'a>(&self, files: impl IntoIterator<Item = &'a str>) -> Vec<u32> {
        let wanted: HashSet<&str> = files.into_iter().collect();
        let mut positions: Vec<u32> = self
            .0
            .iter()
            .enumerate()
            .filter(|(_, file)| wanted.contains(file.as_str()))
            .filter_map(|(idx, _)| u32::try_from(idx).ok())
            .collect();
        positions.sort_unstable_by(|a, b| b.cmp(a));
        positions
    }
}

use std::collections::HashMap;

use derive_more::{AsRef, Into, IntoIterator};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize, IntoIterator, AsRef, Into)]
pub struct Outputs(pub Vec<Output>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Output {
    pub id: u32,
    pub name: String,
    pub plugin: String,
    pub enabled: bool,
    /// `attribute: key=value` lines, keyed by the part before `=`
    pub attributes: HashMap<String, String>,
}

impl Output {
    /// Builds an output from the ordered key/value pairs of one `outputid`
    /// block. Returns `None` unless id, name and plugin are all present.
    pub fn from_record(pairs: &[(String, String)]) -> Option<Self> {
        let mut id = None;
        let mut name = None;
        let mut plugin = None;
        let mut enabled = false;
        let mut attributes = HashMap::new();

        for (key, value) in pairs {
            match key.as_str() {
                "outputid" => id = value.parse().ok(),
                "outputname" => name = Some(value.clone()),
                "plugin" => plugin = Some(value.clone()),
                "outputenabled" => enabled = value == "1",
                "attribute" => {
                    let (attr, attr_value) = value.split_once('=').unwrap_or((value.as_str(), ""));
                    attributes.insert(attr.to_owned(), attr_value.to_owned());
                }
                _ => log::warn!(key = key.as_str(), value = value.as_str(); "Encountered unknown output key"),
            }
        }

        Some(Self { id: id?, name: name?, plugin: plugin?, enabled, attributes })
    }
}

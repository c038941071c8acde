use crate::{
    errors::MpdResult,
    parser::{is_terminator, parse_line},
};

/// Incrementally folds `key: value` lines into a typed response.
pub(crate) trait FromMpd
where
    Self: std::marker::Sized,
{
    fn next_internal(&mut self, key: &str, value: String) -> MpdResult<LineHandled>;

    fn finish(self) -> MpdResult<Self> {
        Ok(self)
    }

    fn next(&mut self, line: &str) -> MpdResult<()> {
        let (key, value) = parse_line(line)?;
        match self.next_internal(&key, value)? {
            LineHandled::Yes => {}
            LineHandled::No { value } => {
                log::warn!(key = key.as_str(), value = value.as_str(); "Encountered unknown key/value pair");
            }
        }
        Ok(())
    }
}

pub(crate) enum LineHandled {
    Yes,
    No { value: String },
}

/// Folds every non-terminator line of a response into `V`.
pub(crate) fn parse_response<V: FromMpd + Default, S: AsRef<str>>(lines: &[S]) -> MpdResult<V> {
    let mut result = V::default();
    for line in lines.iter().map(AsRef::as_ref).filter(|line| !is_terminator(line)) {
        result.next(line)?;
    }
    result.finish()
}

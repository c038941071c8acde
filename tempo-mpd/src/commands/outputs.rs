use crate::{
    errors::MpdResult,
    model::{Output, Outputs},
    parser::{chunk_lines, parse_pairs},
};

/// Parses an `outputs` response. Blocks lacking id, name or plugin are
/// skipped.
pub(crate) fn parse_outputs<S: AsRef<str>>(lines: &[S]) -> MpdResult<Outputs> {
    let mut outputs = Vec::new();
    for chunk in chunk_lines(lines, "outputid:") {
        let pairs = parse_pairs(chunk)?;
        if pairs.is_empty() {
            continue;
        }
        match Output::from_record(&pairs) {
            Some(output) => outputs.push(output),
            None => log::warn!(pairs:?; "Skipping incomplete output"),
        }
    }
    Ok(Outputs(outputs))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_outputs() {
        let lines = [
            "outputid: 0",
            "outputname: ALSA",
            "plugin: alsa",
            "outputenabled: 1",
            "attribute: dop=0",
            "outputid: 1",
            "outputname: FIFO",
            "plugin: fifo",
            "outputenabled: 0",
            "OK",
        ];

        let outputs = parse_outputs(&lines).unwrap().0;

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].name, "ALSA");
        assert!(outputs[0].enabled);
        assert_eq!(outputs[1].id, 1);
        assert!(!outputs[1].enabled);
    }

    #[test]
    fn skips_incomplete_blocks() {
        let outputs = parse_outputs(&["outputid: 0", "outputname: nameless plugin", "OK"]).unwrap();

        assert!(outputs.0.is_empty());
    }
}

//! YAML front matter splitting
//!
//! Material files start with an optional `---` delimited YAML block holding the
//! node's metadata, followed by the markdown body.

use serde::de::DeserializeOwned;

use super::error::MaterialError;

const DELIMITER: &str = "---";

/// Split `text` into its raw front matter block (if any) and the body
pub fn split_raw(text: &str) -> Result<(Option<&str>, &str), MaterialError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let Some(first_line_end) = text.find('\n') else {
        return Ok((None, text));
    };
    if text[..first_line_end].trim_end() != DELIMITER {
        return Ok((None, text));
    }

    let rest = &text[first_line_end + 1..];
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((Some(yaml), body));
        }
        offset += line.len();
    }

    Err(MaterialError::UnterminatedFrontMatter)
}

/// Split `text` and deserialise its front matter into `T`.
///
/// An empty front matter block deserialises from an empty mapping, so all-default
/// types still parse.
pub fn split<T: DeserializeOwned>(text: &str) -> Result<(Option<T>, &str), serde_yaml::Error> {
    let (raw, body) = match split_raw(text) {
        Ok(parts) => parts,
        // Treat an unclosed block as plain markdown
        Err(_) => (None, text),
    };

    let Some(raw) = raw else {
        return Ok((None, body));
    };

    let value = if raw.trim().is_empty() {
        serde_yaml::from_str("{}")?
    } else {
        serde_yaml::from_str(raw)?
    };
    Ok((Some(value), body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Meta {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        tags: Vec<String>,
    }

    #[test]
    fn splits_front_matter_and_body() {
        let text = "---\nname: Intro\ntags: [cpp]\n---\n# Hello\n";
        let (meta, body) = split::<Meta>(text).unwrap();
        assert_eq!(
            meta,
            Some(Meta { name: Some("Intro".into()), tags: vec!["cpp".into()] })
        );
        assert_eq!(body, "# Hello\n");
    }

    #[test]
    fn no_front_matter_returns_whole_text() {
        let text = "# Just markdown\n";
        let (meta, body) = split::<Meta>(text).unwrap();
        assert!(meta.is_none());
        assert_eq!(body, text);
    }

    #[test]
    fn empty_block_uses_defaults() {
        let (meta, body) = split::<Meta>("---\n---\nbody").unwrap();
        assert_eq!(meta, Some(Meta::default()));
        assert_eq!(body, "body");
    }

    #[test]
    fn unterminated_block_is_reported_raw() {
        assert!(matches!(
            split_raw("---\nname: x\n"),
            Err(MaterialError::UnterminatedFrontMatter)
        ));
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(split::<Meta>("---\ntags: [unclosed\n---\n").is_err());
    }

    #[test]
    fn horizontal_rule_later_in_body_is_not_front_matter() {
        let text = "intro\n---\nmore";
        let (meta, body) = split::<Meta>(text).unwrap();
        assert!(meta.is_none());
        assert_eq!(body, text);
    }
}

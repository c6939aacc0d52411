use anyhow::anyhow;
use serde::de::DeserializeOwned;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> anyhow::Result<T> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(anyhow!("at JSON path {path} → {}", err.into_inner()))
        }
    }
}

/// Newline-delimited variant: one document per non-blank line.
pub fn from_ndjson_with_path<T: DeserializeOwned>(src: &str) -> anyhow::Result<Vec<T>> {
    src.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(ix, line)| {
            from_str_with_path(line).map_err(|error| anyhow!("line {}: {error}", ix + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::EditEvent;

    #[test]
    fn error_names_the_failing_member() {
        let err = from_str_with_path::<Vec<EditEvent>>(
            r#"[{"op":"add_field"},{"op":"set_type","path":[0],"type":"map"}]"#,
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("[1]"), "{msg}");
    }

    #[test]
    fn ndjson_skips_blank_lines_and_counts_from_one() {
        let events = from_ndjson_with_path::<EditEvent>(
            "{\"op\":\"add_field\"}\n\n{\"op\":\"remove_field\",\"path\":[0]}\n",
        )
        .unwrap();
        assert_eq!(events.len(), 2);

        let err = from_ndjson_with_path::<EditEvent>("{\"op\":\"add_field\"}\n{\"op\":1}\n")
            .unwrap_err();
        assert!(err.to_string().starts_with("line 2:"));
    }
}

//! `#(schedule) cron="<expr>" action=<name> connection=<name>`

pub const SCHEDULE_ANNOTATION_PREFIX: &str = "#(schedule)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleAnnotation {
    pub cron: String,
    pub action: String,
    pub connection: String,
}

/// `None` when the annotation is not a schedule; `Some(Err)` when it is one but is malformed.
pub fn parse_schedule_annotation(annotation: &str) -> Option<Result<ScheduleAnnotation, String>> {
    let body = annotation.trim().strip_prefix(SCHEDULE_ANNOTATION_PREFIX)?;
    Some(parse_body(body))
}

fn parse_body(body: &str) -> Result<ScheduleAnnotation, String> {
    let mut cron = None;
    let mut action = None;
    let mut connection = None;

    for (key, value) in properties(body)? {
        match key {
            "cron" => cron = Some(value),
            "action" => action = Some(value),
            "connection" => connection = Some(value),
            other => return Err(format!("unknown schedule property '{other}'")),
        }
    }

    let require = |value: Option<String>, key: &str| {
        value
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| format!("schedule is missing '{key}'"))
    };

    Ok(ScheduleAnnotation {
        cron: require(cron, "cron")?,
        action: require(action, "action")?,
        connection: require(connection, "connection")?,
    })
}

/// Splits `key=value` pairs; values may be double-quoted to contain spaces.
fn properties(body: &str) -> Result<Vec<(&str, String)>, String> {
    let mut pairs = Vec::new();
    let mut rest = body.trim_start();

    while !rest.is_empty() {
        let (key, after_key) = rest
            .split_once('=')
            .ok_or_else(|| format!("expected key=value near '{rest}'"))?;
        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            return Err(format!("expected key=value near '{rest}'"));
        }

        let (value, remainder) = if let Some(quoted) = after_key.strip_prefix('"') {
            let end = quoted
                .find('"')
                .ok_or_else(|| format!("unterminated quote in '{key}'"))?;
            (quoted[..end].to_string(), &quoted[end + 1..])
        } else {
            let end = after_key.find(char::is_whitespace).unwrap_or(after_key.len());
            (after_key[..end].to_string(), &after_key[end..])
        };

        pairs.push((key, value));
        rest = remainder.trim_start();
    }

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_cron_and_bare_names() {
        let parsed = parse_schedule_annotation(
            r#"#(schedule) cron="0 * * * *" action=refresh connection=warehouse"#,
        )
        .expect("schedule annotation")
        .expect("valid");

        assert_eq!(
            parsed,
            ScheduleAnnotation {
                cron: "0 * * * *".to_string(),
                action: "refresh".to_string(),
                connection: "warehouse".to_string(),
            }
        );
    }

    #[test]
    fn ignores_other_annotations() {
        assert!(parse_schedule_annotation("# bar_chart").is_none());
        assert!(parse_schedule_annotation("#(docs) hello").is_none());
    }

    #[test]
    fn reports_missing_properties() {
        let err = parse_schedule_annotation(r#"#(schedule) cron="* * * * *" action=x"#)
            .expect("schedule annotation")
            .expect_err("no connection");
        assert!(err.contains("connection"));
    }

    #[test]
    fn reports_unterminated_quotes() {
        let err = parse_schedule_annotation(r#"#(schedule) cron="* * * * * action=x"#)
            .expect("schedule annotation")
            .expect_err("bad quote");
        assert!(err.contains("unterminated"));
    }
}

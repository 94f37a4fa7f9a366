use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use chrono_humanize::HumanTime;
use tera::{Result, Value};

pub(crate) fn human_prefix(value: &Value, _: &HashMap<String, Value>) -> Result<Value> {
    let input = value.as_u64().ok_or("Value needs to be u64")?;

    Ok(Value::String(match input {
        i @ 0..=999 => format!("{}", i),
        i @ 1_000..=999_999 => {
            let str = i.to_string();
            format!("{}K", &str[..str.len() - 3])
        }
        _ => "1M+".to_owned(),
    }))
}

pub(crate) fn human_time(value: &Value, _: &HashMap<String, Value>) -> Result<Value> {
    let input = value.as_i64().ok_or("Value needs to be i64")?;

    let date_time = Utc.timestamp_opt(input, 0).single().ok_or("Value needs to be a unix timestamp")?;
    let human_time = HumanTime::from(date_time);

    Ok(Value::String(format!("{}", human_time)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{Duration, Utc};
    use tera::Value;

    use super::{human_prefix, human_time};

    #[test]
    fn small_counts_stay_plain() {
        let result = human_prefix(&Value::from(17_u64), &HashMap::new()).unwrap();
        assert_eq!(result, Value::String("17".to_owned()));
    }

    #[test]
    fn thousands_get_a_prefix() {
        let result = human_prefix(&Value::from(1_234_u64), &HashMap::new()).unwrap();
        assert_eq!(result, Value::String("1K".to_owned()));
    }

    #[test]
    fn recent_timestamps_become_relative_phrases() {
        let an_hour_ago = (Utc::now() - Duration::hours(1)).timestamp();

        let result = human_time(&Value::from(an_hour_ago), &HashMap::new()).unwrap();
        let text = result.as_str().unwrap();

        assert!(text.contains("hour"), "unexpected phrase: {}", text);
    }

    #[test]
    fn non_numbers_are_rejected() {
        assert!(human_time(&Value::String("soon".to_owned()), &HashMap::new()).is_err());
    }
}

// The list of survey forms, used to know how many forms each voter should answer.

use crate::rollup::*;

#[derive(PartialEq, Debug, Clone, Deserialize)]
#[serde(untagged)]
enum SurveyFile {
    Wrapped { surveys: Vec<JSValue> },
    Bare(Vec<JSValue>),
}

fn is_active(survey: &JSValue) -> bool {
    survey.get("isActive") == Some(&JSValue::Bool(true))
        || survey.get("status").and_then(|s| s.as_str()) == Some("active")
}

pub fn count_active_forms(contents: &str) -> Result<u32, serde_json::Error> {
    let sf: SurveyFile = serde_json::from_str(contents)?;
    let surveys = match sf {
        SurveyFile::Wrapped { surveys } => surveys,
        SurveyFile::Bare(surveys) => surveys,
    };
    let active = surveys.iter().filter(|s| is_active(s)).count() as u32;
    debug!(
        "count_active_forms: {} active forms out of {}",
        active,
        surveys.len()
    );
    Ok(active)
}

pub fn read_active_forms(path: &str) -> BoothResult<u32> {
    info!("Attempting to read survey file {:?}", path);
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {
        path: path.to_string(),
    })?;
    count_active_forms(contents.as_str()).context(ParsingJsonSnafu {})
}

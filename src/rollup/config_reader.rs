use crate::rollup::*;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "boothName")]
    pub booth_name: String,
    #[serde(rename = "assemblyName")]
    pub assembly_name: Option<String>,
    #[serde(rename = "date")]
    pub date: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "listMembers")]
    pub list_members: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub booth: String,
    pub assembly: Option<String>,
    pub date: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "boothId")]
    pub booth_id: Option<String>,
    #[serde(rename = "worksheetName")]
    pub worksheet_name: Option<String>,
    /// The row holding the field names (1-based). Rows above it are skipped.
    #[serde(rename = "firstRowIndex")]
    pub _first_row_index: Option<JSValue>,
}

impl FileSource {
    pub fn new(provider: &str, file_path: &str) -> FileSource {
        FileSource {
            provider: provider.to_string(),
            file_path: file_path.to_string(),
            booth_id: None,
            worksheet_name: None,
            _first_row_index: None,
        }
    }

    /// The 0-based index of the header row.
    pub fn header_row_index(&self) -> BoothResult<usize> {
        if self._first_row_index.is_none() {
            return Ok(0);
        }
        let x = read_js_int(&self._first_row_index)?;
        if x == 0 {
            whatever!("firstRowIndex starts at 1, got 0");
        }
        Ok(x - 1)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveySource {
    #[serde(rename = "filePath")]
    pub file_path: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoothRules {
    #[serde(rename = "activeSurveyForms")]
    pub active_survey_forms: Option<u32>,
    #[serde(rename = "useReportedTotal")]
    pub use_reported_total: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BoothConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "rosterSources")]
    pub roster_sources: Vec<FileSource>,
    #[serde(rename = "surveySource")]
    pub survey_source: Option<SurveySource>,
    #[serde(default)]
    pub rules: BoothRules,
}

pub fn read_config(path: &str) -> BoothResult<BoothConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {
        path: path.to_string(),
    })?;
    let config: BoothConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: String) -> BoothResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let mut js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    normalize_summary(&mut js);
    Ok(js)
}

/// Household order is not significant when comparing summaries: order by id.
pub fn normalize_summary(js: &mut JSValue) {
    if let Some(hs) = js.get_mut("households").and_then(|x| x.as_array_mut()) {
        hs.sort_by_key(|h| h["id"].as_str().unwrap_or_default().to_string());
    }
}

fn read_js_int(x: &Option<JSValue>) -> BoothResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {}),
        Some(JSValue::String(s)) => s
            .trim()
            .parse::<usize>()
            .ok()
            .context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}

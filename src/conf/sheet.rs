use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SheetConfig {
    #[serde(default = "SheetConfig::default_spreadsheet_id")]
    pub spreadsheet_id: String,
    #[serde(default = "SheetConfig::default_worksheet")]
    pub worksheet: String,
    /// A1 range of the rows to process, without the worksheet prefix.
    #[serde(default = "SheetConfig::default_range")]
    pub range: String,
    /// First column of the `[success, timestamp, error]` status cells.
    #[serde(default = "SheetConfig::default_status_column")]
    pub status_column: String,
    /// Cell value meaning "no clustering column in this slot".
    #[serde(default = "SheetConfig::default_none_marker")]
    pub none_marker: String,
    #[serde(default = "SheetConfig::default_base_url")]
    pub base_url: String,
}

impl SheetConfig {
    fn default_spreadsheet_id() -> String {
        String::from("1ROdcDV71who85wabn5fIV6K8ZjdinbhBOqyWzI25GjI")
    }

    fn default_worksheet() -> String {
        String::from("Sheet1")
    }

    fn default_range() -> String {
        String::from("B29:H29")
    }

    fn default_status_column() -> String {
        String::from("H")
    }

    fn default_none_marker() -> String {
        String::from("NONE")
    }

    fn default_base_url() -> String {
        String::from("https://sheets.googleapis.com")
    }
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: Self::default_spreadsheet_id(),
            worksheet: Self::default_worksheet(),
            range: Self::default_range(),
            status_column: Self::default_status_column(),
            none_marker: Self::default_none_marker(),
            base_url: Self::default_base_url(),
        }
    }
}

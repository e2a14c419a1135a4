//! REST client for the Google Sheets v4 API.

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use derive_builder::Builder;
use governor::Quota;
use governor::RateLimiter;
use governor::clock::QuantaClock;
use governor::state::InMemoryState;
use governor::state::direct::NotKeyed;
use log::debug;
use log::info;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::json;
use wreq::Client;
use wreq::header::AUTHORIZATION;
use wreq::header::CONTENT_TYPE;
use wreq::header::HeaderMap;
use wreq::header::HeaderValue;
use wreq::header::USER_AGENT;

use crate::sheets::Grid;
use crate::sheets::SheetsApi;
use crate::sheets::SpreadsheetHandle;
use crate::sheets::ValueRange;
use crate::sheets::WorksheetHandle;
use crate::sheets::auth::TokenProvider;
use crate::sheets::error::SheetsError;

pub const DEFAULT_SHEETS_API_URL: &str = "https://sheets.googleapis.com";

#[derive(Builder, Clone, Debug)]
#[builder(pattern = "immutable")]
pub struct SheetsClientConfig {
    #[builder(default = "DEFAULT_SHEETS_API_URL.to_string()", setter(into))]
    pub base_url: String,
    /// Per-user quota of the Sheets API.
    #[builder(default = "60")]
    pub requests_per_minute: u32,
    #[builder(default = "100")]
    pub new_worksheet_rows: u32,
    #[builder(default = "26")]
    pub new_worksheet_columns: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpreadsheetResponse {
    spreadsheet_id: String,
    #[serde(default)]
    properties: SpreadsheetProperties,
    #[serde(default)]
    sheets: Vec<SheetResponse>,
}

#[derive(Deserialize, Default)]
struct SpreadsheetProperties {
    #[serde(default)]
    title: String,
}

#[derive(Deserialize)]
struct SheetResponse {
    properties: SheetProperties,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
    #[serde(default)]
    index: u32,
}

impl From<SheetProperties> for WorksheetHandle {
    fn from(properties: SheetProperties) -> Self {
        Self {
            id: properties.sheet_id,
            title: properties.title,
            index: properties.index,
        }
    }
}

#[derive(Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<Value>,
}

#[derive(Deserialize)]
struct AddSheetReply {
    #[serde(rename = "addSheet")]
    add_sheet: SheetResponse,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchGetResponse {
    #[serde(default)]
    value_ranges: Vec<ValueRangeResponse>,
}

#[derive(Deserialize)]
struct ValueRangeResponse {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub struct GoogleSheetsClient {
    client: Client,
    limiter: RateLimiter<NotKeyed, InMemoryState, QuantaClock>,
    tokens: Arc<dyn TokenProvider>,
    config: SheetsClientConfig,
}

impl GoogleSheetsClient {
    pub fn new(
        config: SheetsClientConfig,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, SheetsError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("rhoboto/", env!("CARGO_PKG_VERSION"))),
        );
        let client = Client::builder().default_headers(headers).build()?;

        let per_minute = NonZeroU32::new(config.requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let limiter = RateLimiter::direct(Quota::per_minute(per_minute));

        Ok(Self {
            client,
            limiter,
            tokens,
            config,
        })
    }

    fn spreadsheet_url(&self, spreadsheet_id: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{spreadsheet_id}",
            self.config.base_url.trim_end_matches('/')
        )
    }

    async fn send(&self, request: wreq::RequestBuilder) -> Result<wreq::Response, SheetsError> {
        if self.limiter.check().is_err() {
            info!("Google Sheets API is ratelimited. Waiting...");
            self.limiter.until_ready().await;
        }

        let token = self.tokens.access_token().await?;
        let req = request
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .build()?;
        debug!("Making request to: {}", req.url());
        Ok(self.client.execute(req).await?)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: wreq::RequestBuilder,
    ) -> Result<T, SheetsError> {
        let response = self.send(request).await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        if !(200..300).contains(&status) {
            return Err(SheetsError::from_status(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl SheetsApi for GoogleSheetsClient {
    async fn fetch_spreadsheet(
        &self,
        spreadsheet_id: &str,
    ) -> Result<SpreadsheetHandle, SheetsError> {
        let request = self.client.get(self.spreadsheet_url(spreadsheet_id)).query(&[(
            "fields",
            "spreadsheetId,properties.title,sheets.properties(sheetId,title,index)",
        )]);

        let resp: SpreadsheetResponse = self.send_json(request).await?;
        Ok(SpreadsheetHandle {
            id: resp.spreadsheet_id,
            title: resp.properties.title,
            worksheets: resp
                .sheets
                .into_iter()
                .map(|sheet| sheet.properties.into())
                .collect(),
        })
    }

    async fn add_worksheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
    ) -> Result<WorksheetHandle, SheetsError> {
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": {
                            "rowCount": self.config.new_worksheet_rows,
                            "columnCount": self.config.new_worksheet_columns,
                        }
                    }
                }
            }]
        });
        let request = self
            .client
            .post(format!("{}:batchUpdate", self.spreadsheet_url(spreadsheet_id)))
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string());

        let resp: BatchUpdateResponse = self.send_json(request).await?;
        let reply = resp
            .replies
            .into_iter()
            .next()
            .ok_or_else(|| SheetsError::ParseFailed {
                message: "addSheet returned no reply".to_string(),
            })?;
        let reply: AddSheetReply = serde_json::from_value(reply)?;
        Ok(reply.add_sheet.properties.into())
    }

    async fn batch_get_values(
        &self,
        spreadsheet_id: &str,
        ranges: &[String],
    ) -> Result<Vec<Grid>, SheetsError> {
        let mut query: Vec<(&str, &str)> = ranges
            .iter()
            .map(|range| ("ranges", range.as_str()))
            .collect();
        query.push(("majorDimension", "ROWS"));

        let request = self
            .client
            .get(format!(
                "{}/values:batchGet",
                self.spreadsheet_url(spreadsheet_id)
            ))
            .query(&query);

        let resp: BatchGetResponse = self.send_json(request).await?;
        if resp.value_ranges.len() != ranges.len() {
            return Err(SheetsError::ParseFailed {
                message: format!(
                    "Requested {} ranges but received {}",
                    ranges.len(),
                    resp.value_ranges.len()
                ),
            });
        }

        Ok(resp
            .value_ranges
            .into_iter()
            .map(|range| {
                range
                    .values
                    .into_iter()
                    .map(|row| row.into_iter().map(cell_to_string).collect())
                    .collect()
            })
            .collect())
    }

    async fn batch_update_values(
        &self,
        spreadsheet_id: &str,
        data: &[ValueRange],
    ) -> Result<(), SheetsError> {
        let body = json!({
            "valueInputOption": "USER_ENTERED",
            "data": data
                .iter()
                .map(|range| json!({
                    "range": range.range,
                    "majorDimension": "ROWS",
                    "values": range.values,
                }))
                .collect::<Vec<_>>(),
        });
        let request = self
            .client
            .post(format!(
                "{}/values:batchUpdate",
                self.spreadsheet_url(spreadsheet_id)
            ))
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string());

        let _: Value = self.send_json(request).await?;
        Ok(())
    }

    fn service_account_email(&self) -> Option<String> {
        self.tokens.principal()
    }
}

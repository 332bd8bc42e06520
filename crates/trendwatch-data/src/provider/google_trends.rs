//! Google Trends 일 단위 관심도 클라이언트.
//!
//! 조회 순서:
//! 1. `GET /?geo=..` 로 세션 쿠키(`NID`) 획득
//! 2. `GET /trends/api/explore` 로 `TIMESERIES` 위젯의 token/request 획득
//! 3. `GET /trends/api/widgetdata/multiline` 로 일별 시계열 조회
//!
//! 응답 본문 앞에는 `)]}'` 형태의 JSON 하이재킹 방지 접두사가 붙어 있습니다.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use trendwatch_core::{
    DateInterval, PipelineError, PipelineResult, ProxyEndpoint, WideTrendRow, WideTrendTable,
};

use super::proxy::HttpSettings;
use super::TrendSource;

const SOURCE_NAME: &str = "google_trends";
const TIMESERIES_WIDGET: &str = "TIMESERIES";

/// Google Trends 요청 파라미터.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleTrendsConfig {
    /// 서비스 주소 (테스트에서 목 서버로 교체)
    pub base_url: String,
    /// 인터페이스 언어 (예: "it-IT")
    pub hl: String,
    /// UTC 기준 분 단위 시간대 오프셋
    pub tz: i32,
    /// 지역 코드 (예: "IT")
    pub geo: String,
}

impl Default for GoogleTrendsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://trends.google.com".to_string(),
            hl: "it-IT".to_string(),
            tz: 120,
            geo: "IT".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    #[serde(default)]
    widgets: Vec<ExploreWidget>,
}

#[derive(Debug, Deserialize)]
struct ExploreWidget {
    id: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct MultilineResponse {
    default: MultilineData,
}

#[derive(Debug, Deserialize)]
struct MultilineData {
    #[serde(rename = "timelineData", default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    /// 버킷 시작 시각 (유닉스 초, 문자열)
    time: String,
    value: Vec<i32>,
    #[serde(rename = "isPartial", default)]
    is_partial: bool,
}

/// Google Trends 소스.
#[derive(Debug, Clone, Default)]
pub struct GoogleTrendsClient {
    config: GoogleTrendsConfig,
    settings: HttpSettings,
}

impl GoogleTrendsClient {
    pub fn new(config: GoogleTrendsConfig, settings: HttpSettings) -> Self {
        Self { config, settings }
    }

    pub fn config(&self) -> &GoogleTrendsConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_text(
        &self,
        client: &reqwest::Client,
        path: &str,
        query: &[(&str, String)],
    ) -> PipelineResult<String> {
        let response = client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| PipelineError::extraction(SOURCE_NAME, format!("{path} 요청 실패: {e}")))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(PipelineError::extraction(
                SOURCE_NAME,
                format!("{path} 요청 제한 (429)"),
            ));
        }
        if !status.is_success() {
            return Err(PipelineError::extraction(
                SOURCE_NAME,
                format!("{path} 응답 상태 {status}"),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| PipelineError::extraction(SOURCE_NAME, format!("{path} 본문 읽기 실패: {e}")))
    }

    fn explore_request(&self, keywords: &[String], interval: &DateInterval) -> serde_json::Value {
        let timeframe = interval.timeframe();
        let items: Vec<serde_json::Value> = keywords
            .iter()
            .map(|keyword| json!({ "keyword": keyword, "time": timeframe, "geo": self.config.geo }))
            .collect();
        json!({ "comparisonItem": items, "category": 0, "property": "" })
    }
}

/// 응답 앞의 하이재킹 방지 접두사를 제거하고 첫 `{`부터 반환.
pub(crate) fn strip_json_prefix(body: &str) -> PipelineResult<&str> {
    body.find('{')
        .map(|idx| &body[idx..])
        .ok_or_else(|| PipelineError::extraction(SOURCE_NAME, "JSON 본문이 없습니다"))
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &str, what: &str) -> PipelineResult<T> {
    serde_json::from_str(strip_json_prefix(body)?)
        .map_err(|e| PipelineError::extraction(SOURCE_NAME, format!("{what} 응답 파싱 실패: {e}")))
}

/// multiline 응답을 wide 테이블로 변환.
pub(crate) fn parse_timeline(keywords: &[String], body: &str) -> PipelineResult<WideTrendTable> {
    let parsed: MultilineResponse = parse_json(body, "multiline")?;

    let rows = parsed
        .default
        .timeline_data
        .into_iter()
        .map(|point| {
            let secs: i64 = point.time.parse().map_err(|_| {
                PipelineError::extraction(SOURCE_NAME, format!("잘못된 time 값: {}", point.time))
            })?;
            let date = Utc
                .timestamp_opt(secs, 0)
                .single()
                .ok_or_else(|| PipelineError::extraction(SOURCE_NAME, format!("범위 밖 time 값: {secs}")))?
                .date_naive();
            Ok(WideTrendRow {
                date,
                values: point.value,
                is_partial: point.is_partial,
            })
        })
        .collect::<PipelineResult<Vec<_>>>()?;

    // 응답 자체가 어긋난 경우이므로 다음 프록시로 재시도할 수 있게 추출 실패로 분류
    WideTrendTable::new(keywords.to_vec(), rows)
        .map_err(|e| PipelineError::extraction(SOURCE_NAME, e))
}

#[async_trait]
impl TrendSource for GoogleTrendsClient {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch_interval(
        &self,
        keywords: &[String],
        interval: &DateInterval,
        proxy: &ProxyEndpoint,
    ) -> PipelineResult<WideTrendTable> {
        if keywords.is_empty() {
            return Ok(WideTrendTable::empty(Vec::new()));
        }

        let client = self
            .settings
            .client_for(proxy)
            .map_err(|e| PipelineError::extraction(SOURCE_NAME, e))?;
        let tz = self.config.tz.to_string();

        // 1. 세션 쿠키
        self.get_text(&client, "/", &[("geo", self.config.geo.clone())])
            .await?;

        // 2. explore → TIMESERIES 위젯
        let explore_body = self
            .get_text(
                &client,
                "/trends/api/explore",
                &[
                    ("hl", self.config.hl.clone()),
                    ("tz", tz.clone()),
                    ("req", self.explore_request(keywords, interval).to_string()),
                ],
            )
            .await?;
        let explore: ExploreResponse = parse_json(&explore_body, "explore")?;
        let widget = explore
            .widgets
            .into_iter()
            .find(|w| w.id == TIMESERIES_WIDGET)
            .ok_or_else(|| PipelineError::extraction(SOURCE_NAME, "TIMESERIES 위젯이 없습니다"))?;
        let (token, request) = match (widget.token, widget.request) {
            (Some(token), Some(request)) => (token, request),
            _ => {
                return Err(PipelineError::extraction(
                    SOURCE_NAME,
                    "TIMESERIES 위젯에 token/request가 없습니다",
                ))
            }
        };

        // 3. 일별 시계열
        let timeline_body = self
            .get_text(
                &client,
                "/trends/api/widgetdata/multiline",
                &[
                    ("req", request.to_string()),
                    ("token", token),
                    ("tz", tz),
                    ("hl", self.config.hl.clone()),
                ],
            )
            .await?;

        let table = parse_timeline(keywords, &timeline_body)?;
        debug!(
            interval = %interval,
            proxy = %proxy,
            rows = table.row_count(),
            "트렌드 구간 조회 완료"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mockito::Matcher;

    const EXPLORE_BODY: &str = r#")]}'
{"widgets":[{"id":"GEO_MAP","token":"x"},{"id":"TIMESERIES","token":"tok-123","request":{"time":"2025-09-01 2025-09-02"}}]}"#;

    const TIMELINE_BODY: &str = r#")]}',
{"default":{"timelineData":[
  {"time":"1756684800","formattedTime":"1 set 2025","value":[10,0],"hasData":[true,false]},
  {"time":"1756771200","formattedTime":"2 set 2025","value":[12,3],"hasData":[true,true],"isPartial":true}
]}}"#;

    fn keywords() -> Vec<String> {
        vec!["cetilar".to_string(), "ultramag".to_string()]
    }

    fn interval() -> DateInterval {
        DateInterval::new(
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 2).unwrap(),
        )
        .unwrap()
    }

    fn client_for(server: &mockito::ServerGuard) -> GoogleTrendsClient {
        GoogleTrendsClient::new(
            GoogleTrendsConfig {
                base_url: server.url(),
                ..Default::default()
            },
            HttpSettings::default(),
        )
    }

    #[test]
    fn test_strip_json_prefix() {
        assert_eq!(strip_json_prefix(")]}',\n{\"a\":1}").unwrap(), "{\"a\":1}");
        assert!(strip_json_prefix(")]}'").is_err());
    }

    #[test]
    fn test_parse_timeline_missing_partial_is_false() {
        let table = parse_timeline(&keywords(), TIMELINE_BODY).unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[0].date, NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
        assert!(!table.rows()[0].is_partial);
        assert!(table.rows()[1].is_partial);
        assert_eq!(table.rows()[1].values, vec![12, 3]);
    }

    #[test]
    fn test_parse_timeline_wrong_width_is_recoverable() {
        let err = parse_timeline(&["only_one".to_string()], TIMELINE_BODY).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_fetch_interval_full_protocol() {
        let mut server = mockito::Server::new_async().await;

        let cookie = server
            .mock("GET", "/")
            .match_query(Matcher::UrlEncoded("geo".into(), "IT".into()))
            .with_status(200)
            .with_header("set-cookie", "NID=511=abc; Path=/")
            .create_async()
            .await;
        let explore = server
            .mock("GET", "/trends/api/explore")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("hl".into(), "it-IT".into()),
                Matcher::UrlEncoded("tz".into(), "120".into()),
                Matcher::Regex("2025-09-01".into()),
            ]))
            .with_status(200)
            .with_body(EXPLORE_BODY)
            .create_async()
            .await;
        let multiline = server
            .mock("GET", "/trends/api/widgetdata/multiline")
            .match_query(Matcher::UrlEncoded("token".into(), "tok-123".into()))
            .with_status(200)
            .with_body(TIMELINE_BODY)
            .create_async()
            .await;

        let table = client_for(&server)
            .fetch_interval(&keywords(), &interval(), &ProxyEndpoint::Direct)
            .await
            .unwrap();

        cookie.assert_async().await;
        explore.assert_async().await;
        multiline.assert_async().await;
        assert_eq!(table.keywords(), keywords().as_slice());
        assert_eq!(table.row_count(), 2);
    }

    #[tokio::test]
    async fn test_fetch_interval_throttled() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let err = client_for(&server)
            .fetch_interval(&keywords(), &interval(), &ProxyEndpoint::Direct)
            .await
            .unwrap_err();

        assert!(err.is_recoverable());
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn test_fetch_interval_without_timeseries_widget() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .match_query(Matcher::Any)
            .with_status(200)
            .create_async()
            .await;
        server
            .mock("GET", "/trends/api/explore")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(")]}'\n{\"widgets\":[]}")
            .create_async()
            .await;

        let err = client_for(&server)
            .fetch_interval(&keywords(), &interval(), &ProxyEndpoint::Direct)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::ExtractionFailure { .. }));
    }
}

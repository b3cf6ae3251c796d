use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crond_core::config::BeatConfig;

use crate::{
    error::SinkError,
    log_sink::LogSink,
    sink::Sink,
    types::{Event, Metric},
};

/// Sink that POSTs JSON to the monitoring gateway. A payload kind with no
/// URL configured goes to the log instead.
pub struct HttpSink {
    client: reqwest::Client,
    event_url: Option<String>,
    metrics_url: Option<String>,
    bk_biz_id: i64,
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    bk_biz_id: i64,
    data: [&'a T; 1],
}

impl HttpSink {
    pub fn new(config: &BeatConfig, bk_biz_id: i64) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            event_url: config.event_url.clone(),
            metrics_url: config.metrics_url.clone(),
            bk_biz_id,
        })
    }

    async fn post<T: Serialize + Sync>(&self, url: &str, item: &T) -> Result<(), SinkError> {
        let body = Envelope {
            bk_biz_id: self.bk_biz_id,
            data: [item],
        };
        let resp = self.client.post(url).json(&body).send().await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, url, "monitoring sink rejected payload");
            return Err(SinkError::Rejected {
                status,
                message: text,
            });
        }
        debug!(url, "payload delivered");
        Ok(())
    }
}

#[async_trait]
impl Sink for HttpSink {
    fn name(&self) -> &str {
        "http"
    }

    async fn send_event(&self, event: &Event) -> Result<(), SinkError> {
        match self.event_url.as_deref() {
            Some(url) => self.post(url, event).await,
            None => LogSink.send_event(event).await,
        }
    }

    async fn send_metric(&self, metric: &Metric) -> Result<(), SinkError> {
        match self.metrics_url.as_deref() {
            Some(url) => self.post(url, metric).await,
            None => LogSink.send_metric(metric).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_sink;

    #[test]
    fn no_urls_builds_log_sink() {
        let sink = build_sink(&BeatConfig::default(), 0).unwrap();
        assert_eq!(sink.name(), "log");
    }

    #[test]
    fn any_url_builds_http_sink() {
        let config = BeatConfig {
            event_url: Some("http://127.0.0.1:1/event".into()),
            ..BeatConfig::default()
        };
        let sink = build_sink(&config, 7).unwrap();
        assert_eq!(sink.name(), "http");
    }

    #[tokio::test]
    async fn unconfigured_kind_falls_back_to_log() {
        let config = BeatConfig {
            event_url: Some("http://127.0.0.1:1/event".into()),
            ..BeatConfig::default()
        };
        let sink = HttpSink::new(&config, 7).unwrap();
        sink.send_metric(&Metric::new("crond_heart_beat", 1)).await.unwrap();

        let config = BeatConfig {
            metrics_url: Some("http://127.0.0.1:1/metrics".into()),
            ..BeatConfig::default()
        };
        let sink = HttpSink::new(&config, 7).unwrap();
        sink.send_event(&Event::new("crond_job_failed", "boom")).await.unwrap();
    }

    #[test]
    fn envelope_wraps_single_item() {
        let e = Event::new("crond_job_failed", "boom");
        let body = Envelope {
            bk_biz_id: 3,
            data: [&e],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["bk_biz_id"], 3);
        assert_eq!(json["data"][0]["name"], "crond_job_failed");
    }
}

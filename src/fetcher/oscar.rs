//! Registration page fetcher
//!
//! Reads the public "detailed class information" page of the registrar.
//! The page carries the course title in the first `th.ddlabel` header and
//! a table captioned "Registration Availability" whose `td.dddefault`
//! cells hold, in order: seats, taken, vacant, waitlist seats, waitlist
//! taken, waitlist vacant.

use anyhow::Context;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use super::{SnapshotFetcher, UNKNOWN_COURSE_NAME};
use crate::config::RegistrationConfig;
use crate::course::{SeatCounts, Snapshot};
use crate::error::{Result, WatchError};
use crate::types::{CourseRef, Crn};

const AVAILABILITY_CAPTION: &str = "Registration Availability";

/// Fetcher backed by the registrar's class detail page
#[derive(Debug, Clone)]
pub struct RegistrationPageFetcher {
    base_url: Url,
    http_client: reqwest::Client,
}

impl RegistrationPageFetcher {
    /// Create a fetcher from the registration config section
    pub fn new(config: &RegistrationConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid registration base URL: {}", config.base_url))?;
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { base_url, http_client })
    }

    /// Detail page URL for a course
    pub fn page_url(&self, course: &CourseRef) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("term_in", course.term().as_str())
            .append_pair("crn_in", course.crn().as_str());
        url
    }

    async fn load_page(&self, course: &CourseRef) -> Result<String> {
        let unavailable = |e: reqwest::Error| WatchError::SourceUnavailable {
            crn: course.crn().clone(),
            reason: e.to_string(),
        };

        self.http_client
            .get(self.page_url(course))
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(unavailable)?
            .text()
            .await
            .map_err(unavailable)
    }
}

#[async_trait]
impl SnapshotFetcher for RegistrationPageFetcher {
    async fn fetch(&self, course: &CourseRef) -> Result<Snapshot> {
        let html = self.load_page(course).await?;
        let name = parse_course_name(&html).unwrap_or_else(|| UNKNOWN_COURSE_NAME.to_string());

        match parse_availability(&html, course.crn()) {
            Ok(snapshot) => {
                info!(
                    "{}: taken: {}, vacant: {}, waitlist: {}",
                    name, snapshot.taken, snapshot.vacant, snapshot.waitlist.vacant
                );
                Ok(snapshot)
            }
            Err(e) => {
                warn!("Registration information not usable for course {}: {}", name, e);
                Ok(Snapshot::sentinel())
            }
        }
    }

    async fn fetch_name(&self, course: &CourseRef) -> Result<String> {
        let html = self.load_page(course).await?;
        let name = parse_course_name(&html).unwrap_or_else(|| UNKNOWN_COURSE_NAME.to_string());
        info!("Refreshed data for course: {}", name);
        Ok(name)
    }
}

/// Extract the course title from a detail page
pub fn parse_course_name(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("th.ddlabel").ok()?;

    document
        .select(&selector)
        .next()
        .map(|th| th.text().collect::<String>().trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Extract the seat and waitlist counts from a detail page
pub fn parse_availability(html: &str, crn: &Crn) -> Result<Snapshot> {
    let malformed = |reason: &str| WatchError::MalformedSnapshot {
        crn: crn.clone(),
        reason: reason.to_string(),
    };

    let document = Html::parse_document(html);
    let (Ok(caption_sel), Ok(cell_sel)) =
        (Selector::parse("caption"), Selector::parse("td.dddefault"))
    else {
        return Err(malformed("invalid selector"));
    };

    let table = document
        .select(&caption_sel)
        .find(|caption| caption.text().collect::<String>().trim() == AVAILABILITY_CAPTION)
        .and_then(|caption| {
            caption
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "table")
        })
        .ok_or_else(|| malformed("availability table not found"))?;

    let cells = table
        .select(&cell_sel)
        .map(|td| {
            let text = td.text().collect::<String>();
            text.trim()
                .parse::<u32>()
                .map_err(|_| malformed(&format!("non-numeric cell '{}'", text.trim())))
        })
        .collect::<Result<Vec<u32>>>()?;

    if cells.len() < 6 {
        return Err(malformed(&format!("expected 6 cells, found {}", cells.len())));
    }

    Ok(Snapshot {
        seats: cells[0],
        taken: cells[1],
        vacant: cells[2],
        waitlist: SeatCounts {
            seats: cells[3],
            taken: cells[4],
            vacant: cells[5],
        },
    })
}

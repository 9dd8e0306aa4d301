//! Roster provider: scrapes the listing page (or takes the configured local bank)
//! once per process and memoizes the result.
//!
//! Page shape expected: the first `table.wikitable`; for each row after the header,
//! cell 0 holds the portrait `<img>` and cell 1 links the name.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::USER_AGENT;
use scraper::{ElementRef, Html, Selector};
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

use crate::domain::{Candidate, Roster, RosterSource};
use crate::error::RosterError;

pub struct RosterProvider {
  client: reqwest::Client,
  url: String,
  local: Vec<Candidate>,
  cache: OnceCell<Arc<Roster>>,
}

impl RosterProvider {
  pub fn new(url: impl Into<String>, local: Vec<Candidate>) -> Result<Self, RosterError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()?;
    Ok(Self { client, url: url.into(), local, cache: OnceCell::new() })
  }

  /// The memoized roster. The first successful load is kept for the process lifetime;
  /// failures are not cached.
  pub async fn roster(&self) -> Result<Arc<Roster>, RosterError> {
    self.cache.get_or_try_init(|| self.load()).await.cloned()
  }

  #[instrument(level = "info", skip(self), fields(url = %self.url, local = self.local.len()))]
  async fn load(&self) -> Result<Arc<Roster>, RosterError> {
    if !self.local.is_empty() {
      let roster = Roster::new(self.local.clone(), RosterSource::LocalBank);
      info!(target: "portrait_quiz", candidates = roster.len(), "Using local roster bank");
      return Ok(Arc::new(roster));
    }

    let start = std::time::Instant::now();
    let res = self.client
      .get(&self.url)
      .header(USER_AGENT, "portrait-quiz/0.1")
      .send()
      .await?;
    if !res.status().is_success() {
      return Err(RosterError::HttpStatus(res.status()));
    }
    let html = res.text().await?;
    let candidates = parse_roster_html(&html)?;
    let roster = Roster::new(candidates, RosterSource::Scraped);
    if roster.is_empty() {
      return Err(RosterError::Empty);
    }
    info!(target: "portrait_quiz", candidates = roster.len(), elapsed = ?start.elapsed(), html_len = html.len(), "Roster scraped");
    Ok(Arc::new(roster))
  }
}

fn selector(css: &str) -> Result<Selector, RosterError> {
  Selector::parse(css).map_err(|e| RosterError::Selector(e.to_string()))
}

/// Extract candidates from the listing page. Rows without both a linked name and a
/// portrait are skipped; duplicates are left for `Roster::new` to drop.
pub fn parse_roster_html(html: &str) -> Result<Vec<Candidate>, RosterError> {
  let doc = Html::parse_document(html);
  let table_sel = selector("table.wikitable")?;
  let row_sel = selector("tr")?;
  let cell_sel = selector("td")?;
  let link_sel = selector("a")?;
  let img_sel = selector("img")?;

  let table = doc.select(&table_sel).next().ok_or(RosterError::NoTable)?;

  let mut out = Vec::new();
  for (idx, row) in table.select(&row_sel).enumerate().skip(1) {
    let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
    if cells.len() < 2 {
      continue;
    }
    let name = cells[1]
      .select(&link_sel)
      .next()
      .map(|a| a.text().collect::<String>().trim().to_string())
      .filter(|n| !n.is_empty());
    let portrait = cells[0]
      .select(&img_sel)
      .next()
      .and_then(|img| img.value().attr("src"))
      .map(absolute_src);

    match (name, portrait) {
      (Some(name), Some(portrait)) => out.push(Candidate { name, portrait }),
      _ => warn!(target: "portrait_quiz", row = idx, "Skipping roster row without name or portrait"),
    }
  }

  if out.is_empty() {
    return Err(RosterError::Empty);
  }
  Ok(out)
}

/// Listing pages use protocol-relative image sources.
fn absolute_src(src: &str) -> String {
  if src.starts_with("http://") || src.starts_with("https://") {
    src.to_string()
  } else {
    format!("https:{}", src)
  }
}

//! Scrape orchestration
//!
//! A [`Scraper`] composes the fetcher, extractor, cache, rate limiter, retry
//! policy and robots policy into the three walks a job can run:
//!
//! - [`scrape_pages`](Scraper::scrape_pages): an explicit URL list
//! - [`paginate`](Scraper::paginate): follow "next page" links from a start URL
//! - [`list_detail`](Scraper::list_detail): collect detail links from a listing
//!   page, then scrape each detail page
//!
//! Every request is awaited before the next is issued, so records come back in
//! strict request order. A page that cannot be fetched is logged, counted and
//! skipped; the walk carries on.

use crate::cache::PageCache;
use crate::config::{Config, JobConfig};
use crate::crawler::{Document, FetchedPage, Fetcher, RateLimiter, RetryPolicy};
use crate::extract::{extract, CssSelector, FieldValue, Record, SelectorConfig};
use crate::output::HarvestStats;
use crate::robots::RobotsPolicy;
use crate::state::PageOutcome;
use crate::url::normalize_url;
use crate::{ConfigError, HarvestError};
use std::collections::HashSet;
use std::time::Duration;

/// Fixed delay between pages when none is configured
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(1);

/// The fields extracted from one page
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedPage {
    /// 1-based position within a pagination walk
    pub page: Option<usize>,
    /// The URL that was requested
    pub url: String,
    /// One entry per configured field
    pub fields: Record,
}

impl ScrapedPage {
    /// Flattens the page into one output record
    ///
    /// `page` (when present) and `url` come first, followed by the fields in
    /// configuration order.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        if let Some(page) = self.page {
            record.insert("page", FieldValue::Number(page as i64));
        }
        record.insert("url", self.url.as_str());
        for (name, value) in self.fields.iter() {
            record.insert(name, value.clone());
        }
        record
    }
}

/// Sequential scrape orchestrator
pub struct Scraper {
    fetcher: Fetcher,
    fields: SelectorConfig,
    limiter: Option<RateLimiter>,
    retry: Option<RetryPolicy>,
    robots: Option<RobotsPolicy>,
    cache: Option<PageCache<FetchedPage>>,
    page_delay: Duration,
    stats: HarvestStats,
}

impl Scraper {
    /// Creates a scraper with no limiter, retry, robots checks or cache
    pub fn new(fetcher: Fetcher, fields: SelectorConfig) -> Self {
        Self {
            fetcher,
            fields,
            limiter: None,
            retry: None,
            robots: None,
            cache: None,
            page_delay: DEFAULT_PAGE_DELAY,
            stats: HarvestStats::new(),
        }
    }

    /// Builds a scraper from a loaded job configuration
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let fetcher = Fetcher::new(&config.fetcher)?;
        let fields = config.selector_config().map_err(ConfigError::Validation)?;

        let mut scraper = Self::new(fetcher, fields).with_page_delay(config.politeness.page_delay());

        if let Some(rate) = config.politeness.calls_per_second {
            scraper = scraper.with_rate_limiter(RateLimiter::new(rate));
        }
        if let Some(retry) = &config.retry {
            scraper = scraper.with_retry(retry.to_policy());
        }
        if config.politeness.respect_robots {
            scraper = scraper.with_robots(RobotsPolicy::new(
                config.robots_agent(),
                config.politeness.robots_precedence,
            ));
        }
        if let Some(cache) = &config.cache {
            scraper = scraper.with_cache(PageCache::new(cache.capacity, cache.max_age()));
        }

        Ok(scraper)
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn with_robots(mut self, robots: RobotsPolicy) -> Self {
        self.robots = Some(robots);
        self
    }

    pub fn with_cache(mut self, cache: PageCache<FetchedPage>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn fields(&self) -> &SelectorConfig {
        &self.fields
    }

    pub fn stats(&self) -> &HarvestStats {
        &self.stats
    }

    pub fn into_stats(self) -> HarvestStats {
        self.stats
    }

    pub fn cache(&self) -> Option<&PageCache<FetchedPage>> {
        self.cache.as_ref()
    }

    /// Runs the walk described by `job`
    pub async fn run(&mut self, job: &JobConfig) -> Result<Vec<ScrapedPage>, HarvestError> {
        tracing::info!("Starting {} job", job.mode_name());

        let pages = match job {
            JobConfig::Pages { urls } => self.scrape_pages(urls).await,
            JobConfig::Paginate {
                start_url,
                next_selector,
                max_pages,
            } => {
                let next = CssSelector::parse(next_selector)?;
                self.paginate(start_url, &next, *max_pages).await
            }
            JobConfig::ListDetail {
                list_url,
                item_selector,
                link_selector,
                max_items,
            } => {
                let item = CssSelector::parse(item_selector)?;
                let link = CssSelector::parse(link_selector)?;
                self.list_detail(list_url, &item, &link, *max_items).await
            }
        };

        tracing::info!(
            "Job finished: {} page(s) scraped out of {} attempted",
            pages.len(),
            self.stats.total_pages()
        );
        Ok(pages)
    }

    /// Scrapes a single page
    ///
    /// Order of operations: robots.txt check, cache lookup, then a fetch
    /// through the rate limiter and retry policy, then extraction.
    ///
    /// # Returns
    ///
    /// * `Some(ScrapedPage)` - The page's fields
    /// * `None` - The page was denied by robots.txt or could not be fetched
    pub async fn scrape_page(&mut self, url: &str) -> Option<ScrapedPage> {
        let page = self.load(url).await?;
        let document = page.into_document();
        Some(self.extract_page(url, None, &document))
    }

    /// Scrapes each URL in order, pausing between requests (not after the last)
    ///
    /// Pages that fail are omitted from the result.
    pub async fn scrape_pages<S: AsRef<str>>(&mut self, urls: &[S]) -> Vec<ScrapedPage> {
        let mut results = Vec::new();

        for (i, url) in urls.iter().enumerate() {
            let url = url.as_ref();
            tracing::info!("Scraping {}/{}: {}", i + 1, urls.len(), url);

            if let Some(page) = self.scrape_page(url).await {
                results.push(page);
            }

            if i + 1 < urls.len() {
                self.pause(urls[i + 1].as_ref()).await;
            }
        }

        results
    }

    /// Follows "next page" links starting at `start_url`
    ///
    /// Stops when a page has no next link, when a page cannot be fetched, when
    /// a next link points back to a page already visited, or after
    /// `max_pages` pages.
    pub async fn paginate(
        &mut self,
        start_url: &str,
        next_selector: &CssSelector,
        max_pages: usize,
    ) -> Vec<ScrapedPage> {
        let mut results = Vec::new();
        let mut visited = HashSet::new();
        let mut current = start_url.to_string();

        for index in 1..=max_pages {
            visited.insert(visit_key(&current));
            tracing::info!("Scraping page {}: {}", index, current);

            let Some(page) = self.load(&current).await else {
                tracing::warn!("Stopping pagination at page {}: {} unavailable", index, current);
                break;
            };

            let next = {
                let document = page.into_document();
                results.push(self.extract_page(&current, Some(index), &document));
                find_next_link(&document, next_selector)
            };

            let Some(next) = next else {
                tracing::info!("No next page link found after page {}", index);
                break;
            };

            if visited.contains(&visit_key(&next)) {
                tracing::warn!("Next page link loops back to {}; stopping", next);
                break;
            }

            if index < max_pages {
                self.pause(&next).await;
            }
            current = next;
        }

        results
    }

    /// Scrapes the detail pages linked from a listing page
    ///
    /// Up to `max_items` elements matching `item_selector` are taken from the
    /// listing; the first `link_selector` match inside each supplies the
    /// detail URL. Duplicate links are scraped once.
    pub async fn list_detail(
        &mut self,
        list_url: &str,
        item_selector: &CssSelector,
        link_selector: &CssSelector,
        max_items: usize,
    ) -> Vec<ScrapedPage> {
        tracing::info!("Scraping listing page: {}", list_url);

        let Some(page) = self.load(list_url).await else {
            tracing::warn!("Listing page {} unavailable; nothing to scrape", list_url);
            return Vec::new();
        };

        let links = {
            let document = page.into_document();
            collect_detail_links(&document, item_selector, link_selector, max_items)
        };

        tracing::info!("Found {} detail link(s)", links.len());
        if let Some(first) = links.first() {
            self.pause(first).await;
        }

        self.scrape_pages(&links).await
    }

    fn extract_page(&self, url: &str, index: Option<usize>, document: &Document) -> ScrapedPage {
        let fields = extract(document, &self.fields);
        tracing::debug!("Extracted {} field(s) from {}", fields.len(), url);
        ScrapedPage {
            page: index,
            url: url.to_string(),
            fields,
        }
    }

    /// Produces the page body for `url`, counting the outcome
    async fn load(&mut self, url: &str) -> Option<FetchedPage> {
        if let Some(robots) = self.robots.as_mut() {
            if !robots.can_fetch(&self.fetcher, url).await {
                tracing::warn!("Skipping {}: disallowed by robots.txt", url);
                self.stats.record(PageOutcome::RobotsDenied);
                return None;
            }
        }

        if let Some(page) = self.cache.as_ref().and_then(|c| c.get_fresh(url)) {
            tracing::debug!("Cache hit for {}", url);
            self.stats.record(PageOutcome::Cached);
            return Some(page.clone());
        }

        match self.fetch_with_policies(url).await {
            Ok(page) => {
                self.stats.record(PageOutcome::Scraped);
                if let Some(cache) = self.cache.as_mut() {
                    cache.set(url, page.clone());
                }
                Some(page)
            }
            Err(e) => {
                tracing::warn!("Skipping {}: {}", url, e);
                self.stats.record(PageOutcome::from_error(&e));
                None
            }
        }
    }

    async fn fetch_with_policies(&mut self, url: &str) -> Result<FetchedPage, HarvestError> {
        let fetcher = &self.fetcher;
        let retry = self.retry.as_ref();

        let attempt = move || async move {
            match retry {
                Some(policy) => {
                    policy
                        .run_while(|| fetcher.fetch_page(url), HarvestError::is_transient)
                        .await
                }
                None => fetcher.fetch_page(url).await,
            }
        };

        match self.limiter.as_mut() {
            Some(limiter) => limiter.run(attempt).await,
            None => attempt().await,
        }
    }

    /// Sleeps before requesting `next_url`
    ///
    /// Waits the larger of the fixed page delay and the site's robots.txt
    /// crawl delay.
    async fn pause(&mut self, next_url: &str) {
        let mut delay = self.page_delay;

        if let Some(robots) = self.robots.as_mut() {
            if let Some(crawl_delay) = robots.crawl_delay(&self.fetcher, next_url).await {
                delay = delay.max(crawl_delay);
            }
        }

        if !delay.is_zero() {
            tracing::trace!("Waiting {:?} before {}", delay, next_url);
            tokio::time::sleep(delay).await;
        }
    }
}

/// Resolves the first `next_selector` match's `href` against the document URL
pub fn find_next_link(document: &Document, next_selector: &CssSelector) -> Option<String> {
    let anchor = document.select_first(next_selector.selector())?;
    let href = anchor.value().attr("href")?;
    document.resolve_link(href)
}

/// Key under which a page counts as visited during pagination
///
/// Normalized, so links differing only by fragment or host case match.
fn visit_key(url: &str) -> String {
    normalize_url(url)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| url.to_string())
}

/// Collects up to `max_items` detail URLs from a listing document
pub fn collect_detail_links(
    document: &Document,
    item_selector: &CssSelector,
    link_selector: &CssSelector,
    max_items: usize,
) -> Vec<String> {
    let mut seen = HashSet::new();

    document
        .select(item_selector.selector())
        .take(max_items)
        .filter_map(|item| {
            let link = item.select(link_selector.selector()).next()?;
            document.resolve_link(link.value().attr("href")?)
        })
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

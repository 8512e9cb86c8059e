//! Chromium-backed catalog sessions

use crate::catalog::{Genre, ItemId, ItemRecord, SessionCookie, Thumbnail};
use crate::config::BrowserConfig;
use crate::extract::ListView;
use crate::reader::{html, CatalogSession, CatalogUrls, ReaderError, SessionLauncher};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use url::Url;

/// Launches one Chromium instance per session
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    urls: CatalogUrls,
    cookies: Vec<SessionCookie>,
    headless: bool,
    window: (u32, u32),
    poll_interval: Duration,
    result_timeout: Duration,
}

impl ChromeLauncher {
    pub fn new(config: &BrowserConfig, cookies: Vec<SessionCookie>) -> Result<Self, ReaderError> {
        Ok(Self {
            urls: CatalogUrls::new(&config.base_url)?,
            cookies,
            headless: config.headless,
            window: (config.window_width, config.window_height),
            poll_interval: Duration::from_millis(config.load_poll_interval_ms),
            result_timeout: Duration::from_millis(config.thumbnail_timeout_ms),
        })
    }

    fn cookie_params(&self) -> Result<Vec<CookieParam>, ReaderError> {
        self.cookies
            .iter()
            .map(|cookie| {
                let mut builder = CookieParam::builder()
                    .name(cookie.name.clone())
                    .value(cookie.value.clone());
                builder = match &cookie.domain {
                    Some(domain) => builder.domain(domain.clone()),
                    None => builder.url(self.urls.base().to_string()),
                };
                if let Some(path) = &cookie.path {
                    builder = builder.path(path.clone());
                }
                builder.build().map_err(ReaderError::Launch)
            })
            .collect()
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    async fn launch(&self) -> Result<ChromeSession, ReaderError> {
        tracing::info!(
            "Launching {}browser...",
            if self.headless { "headless " } else { "" }
        );

        let mut builder = ChromeConfig::builder().window_size(self.window.0, self.window.1);
        if !self.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(ReaderError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ReaderError::Launch(e.to_string()))?;

        // The handler drives the DevTools connection and must be polled
        // for the browser's whole lifetime
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("Browser handler stopped: {}", e);
                    break;
                }
            }
        });

        let mut session = ChromeSession {
            browser,
            page: None,
            handler: Some(handler),
            urls: self.urls.clone(),
            poll_interval: self.poll_interval,
            result_timeout: self.result_timeout,
        };

        if let Err(e) = session.prepare(self.cookie_params()?).await {
            let _ = session.close().await;
            return Err(e);
        }
        Ok(session)
    }
}

/// A browser with a single tab on the catalog
pub struct ChromeSession {
    browser: Browser,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
    urls: CatalogUrls,
    poll_interval: Duration,
    /// How long rendered results such as search hits are waited for
    result_timeout: Duration,
}

impl ChromeSession {
    async fn prepare(&mut self, cookies: Vec<CookieParam>) -> Result<(), ReaderError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| ReaderError::Launch(e.to_string()))?;

        if !cookies.is_empty() {
            tracing::debug!("Installing {} session cookies", cookies.len());
            page.set_cookies(cookies)
                .await
                .map_err(|e| ReaderError::Launch(e.to_string()))?;
        }

        self.page = Some(page);
        Ok(())
    }

    fn page(&self) -> Result<&Page, ReaderError> {
        self.page
            .as_ref()
            .ok_or_else(|| ReaderError::Evaluation("session is closed".to_string()))
    }

    async fn goto(&self, url: Url) -> Result<(), ReaderError> {
        tracing::trace!("Navigating to {}", url);
        self.page()?
            .goto(url.as_str())
            .await
            .map_err(|e| ReaderError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn html(&self) -> Result<String, ReaderError> {
        self.page()?
            .content()
            .await
            .map_err(|e| ReaderError::Evaluation(e.to_string()))
    }
}

#[async_trait]
impl ListView for ChromeSession {
    async fn rendered_ids(&mut self) -> Result<Vec<ItemId>, ReaderError> {
        let html = self.html().await?;
        Ok(html::extract_item_ids(&html))
    }

    async fn content_extent(&mut self) -> Result<u64, ReaderError> {
        let height: f64 = self
            .page()?
            .evaluate("document.body.scrollHeight")
            .await
            .map_err(|e| ReaderError::Evaluation(e.to_string()))?
            .into_value()
            .map_err(|e| ReaderError::Evaluation(e.to_string()))?;
        Ok(height.max(0.0) as u64)
    }

    async fn trigger_load_more(&mut self) -> Result<(), ReaderError> {
        self.page()?
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
            .map_err(|e| ReaderError::Evaluation(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl CatalogSession for ChromeSession {
    async fn open_genre(&mut self, genre: &Genre) -> Result<(), ReaderError> {
        let url = self.urls.genre(&genre.id)?;
        self.goto(url).await
    }

    async fn scrape_genre_menu(
        &mut self,
        landing_id: &str,
        suffix: &str,
    ) -> Result<Vec<Genre>, ReaderError> {
        let url = self.urls.genre_landing(landing_id)?;
        self.goto(url).await?;

        self.page()?
            .find_element(html::GENRE_MENU)
            .await
            .map_err(|e| ReaderError::Evaluation(e.to_string()))?
            .click()
            .await
            .map_err(|e| ReaderError::Evaluation(e.to_string()))?;

        // The menu entries render once the toggle has been clicked
        let deadline = Instant::now() + self.result_timeout;
        loop {
            let genres = html::parse_genres(&self.html().await?, suffix);
            if !genres.is_empty() || Instant::now() >= deadline {
                return Ok(genres);
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn scrape_title(&mut self, id: ItemId) -> Result<ItemRecord, ReaderError> {
        tracing::debug!("Scraping data from title {}...", id);
        let url = self.urls.title(id)?;
        self.goto(url).await?;
        let html = self.html().await?;
        Ok(html::parse_title(&html, id))
    }

    async fn scrape_thumbnail(&mut self, name: &str) -> Result<Option<Thumbnail>, ReaderError> {
        tracing::debug!("Scraping thumbnail from {}...", name);
        let url = self.urls.search(name)?;
        self.goto(url).await?;

        // Search results render after the navigation completes
        let deadline = Instant::now() + self.result_timeout;
        loop {
            let html = self.html().await?;
            if let Some(thumbnail) = html::parse_thumbnail(&html) {
                return Ok(Some(thumbnail));
            }
            if Instant::now() >= deadline {
                tracing::debug!("No search result for {}", name);
                return Ok(None);
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn close(&mut self) -> Result<(), ReaderError> {
        let Some(handler) = self.handler.take() else {
            return Ok(());
        };

        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                tracing::trace!("Failed to close page: {}", e);
            }
        }

        let result = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| ReaderError::Evaluation(e.to_string()));
        if let Err(e) = self.browser.wait().await {
            tracing::trace!("Browser process did not exit cleanly: {}", e);
        }
        handler.abort();
        result
    }
}

impl std::fmt::Debug for ChromeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromeSession")
            .field("base", &self.urls.base().as_str())
            .field("open", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_config() -> BrowserConfig {
        toml::from_str(r#"base-url = "https://www.example.com/""#).unwrap()
    }

    #[test]
    fn test_cookie_without_domain_is_bound_to_base_url() {
        let cookies = vec![
            SessionCookie {
                name: "NetflixId".to_string(),
                value: "abc".to_string(),
                domain: None,
                path: None,
            },
            SessionCookie {
                name: "SecureNetflixId".to_string(),
                value: "def".to_string(),
                domain: Some(".example.com".to_string()),
                path: Some("/".to_string()),
            },
        ];
        let launcher = ChromeLauncher::new(&create_config(), cookies).unwrap();

        let params = launcher.cookie_params().unwrap();

        assert_eq!(params.len(), 2);
        assert_eq!(params[0].url.as_deref(), Some("https://www.example.com/"));
        assert_eq!(params[0].domain, None);
        assert_eq!(params[1].domain.as_deref(), Some(".example.com"));
        assert_eq!(params[1].path.as_deref(), Some("/"));
    }

    #[test]
    fn test_launcher_rejects_invalid_base_url() {
        let mut config = create_config();
        config.base_url = "not a url".to_string();

        assert!(matches!(
            ChromeLauncher::new(&config, Vec::new()),
            Err(ReaderError::Url(_))
        ));
    }
}

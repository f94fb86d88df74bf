use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::debug;

use crate::config::ScraperConfig;
use crate::traits::{RenderedPage, Renderer};

/// Headless Chrome session used as the rendering tier.
///
/// One browser and one tab are kept for the whole run. Dropping the browser
/// terminates the Chrome process.
pub struct ChromeRenderer {
    session: Option<(Browser, Arc<Tab>)>,
    page_load_timeout: Duration,
}

impl ChromeRenderer {
    pub fn launch(config: &ScraperConfig) -> Result<Self> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .idle_browser_timeout(config.page_load_timeout * 4)
            .args(vec![
                OsStr::new("--disable-blink-features=AutomationControlled"),
                OsStr::new("--no-first-run"),
                OsStr::new("--disable-extensions"),
                OsStr::new("--window-size=1920,1080"),
            ])
            .build()
            .map_err(|e| anyhow!("invalid browser launch options: {e}"))?;

        let browser = Browser::new(options)?;
        let tab = browser.new_tab()?;
        tab.set_user_agent(&config.user_agent, None, None)?;
        tab.set_default_timeout(config.page_load_timeout);

        Ok(Self {
            session: Some((browser, tab)),
            page_load_timeout: config.page_load_timeout,
        })
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn render(&self, url: &str) -> Result<RenderedPage> {
        let (_, tab) = self
            .session
            .as_ref()
            .ok_or_else(|| anyhow!("browser session already closed"))?;
        let tab = Arc::clone(tab);
        let url = url.to_string();
        let timeout = self.page_load_timeout;

        tokio::task::spawn_blocking(move || -> Result<RenderedPage> {
            let navigated = tab.navigate_to(&url).and_then(|t| t.wait_until_navigated());

            match navigated {
                Ok(_) => Ok(RenderedPage {
                    html: tab.get_content()?,
                    timed_out: false,
                }),
                Err(e) => {
                    // Whatever loaded before the timeout may still hold the listings
                    debug!("Navigation to {url} did not finish within {timeout:?}: {e}");
                    let html = tab.get_content()?;
                    if html.trim().is_empty() {
                        return Err(e);
                    }
                    Ok(RenderedPage {
                        html,
                        timed_out: true,
                    })
                }
            }
        })
        .await?
    }

    fn close(&mut self) {
        if let Some((browser, tab)) = self.session.take() {
            let _ = tab.close(false);
            drop(browser);
        }
    }

    fn is_open(&self) -> bool {
        self.session.is_some()
    }
}

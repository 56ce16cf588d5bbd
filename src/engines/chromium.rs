// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::BrowserPoolSettings;
use crate::engines::traits::{
    PageSession, PoolError, ResourceManager, SessionError, SessionHost, SessionOptions,
};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams, RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 容器内运行 Chromium 所需的启动参数
const LAUNCH_ARGS: &[&str] = &[
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-accelerated-2d-canvas",
    "--no-first-run",
    "--no-zygote",
    "--disable-gpu",
];

/// 一个浏览器进程（或远程连接）及其事件处理任务
pub struct ChromiumBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
}

/// Chromium 资源管理器
///
/// 配置了 `remote_url` 时连接远程浏览器，否则在本地启动无头进程
pub struct ChromiumManager {
    headless: bool,
    remote_url: Option<String>,
    executable: Option<String>,
    request_timeout: Duration,
}

impl ChromiumManager {
    pub fn new(settings: &BrowserPoolSettings, request_timeout: Duration) -> Self {
        Self {
            headless: settings.headless,
            remote_url: settings.remote_url.clone(),
            executable: settings.executable.clone(),
            request_timeout,
        }
    }

    fn launch_config(&self) -> Result<BrowserConfig, PoolError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(self.request_timeout)
            .args(LAUNCH_ARGS.iter().copied());

        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(PoolError::CreateFailed)
    }
}

#[async_trait]
impl ResourceManager for ChromiumManager {
    type Resource = ChromiumBrowser;

    async fn create(&self) -> Result<ChromiumBrowser, PoolError> {
        let (browser, mut handler) = if let Some(url) = &self.remote_url {
            info!("Connecting to remote Chrome instance at: {}", url);
            Browser::connect(url.as_str())
                .await
                .map_err(|e| PoolError::CreateFailed(format!("connect {}: {}", url, e)))?
        } else {
            Browser::launch(self.launch_config()?)
                .await
                .map_err(|e| PoolError::CreateFailed(e.to_string()))?
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        debug!("Browser instance created");
        Ok(ChromiumBrowser { browser, handler })
    }

    async fn is_valid(&self, resource: &ChromiumBrowser) -> bool {
        if resource.handler.is_finished() {
            return false;
        }
        resource.browser.version().await.is_ok()
    }

    async fn destroy(&self, mut resource: ChromiumBrowser) {
        if let Err(e) = resource.browser.close().await {
            warn!("Failed to close browser: {}", e);
        }
        if let Err(e) = resource.browser.wait().await {
            debug!("Browser process wait failed: {}", e);
        }
        resource.handler.abort();
    }
}

#[async_trait]
impl SessionHost for ChromiumBrowser {
    async fn open_page(
        &self,
        options: &SessionOptions,
    ) -> Result<Box<dyn PageSession>, SessionError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Protocol(e.to_string()))?;

        page.set_user_agent(options.user_agent.as_str())
            .await
            .map_err(|e| SessionError::Protocol(e.to_string()))?;

        let interceptor = if options.block_resources {
            Some(block_heavy_resources(&page).await?)
        } else {
            None
        };

        Ok(Box::new(ChromiumPage {
            page,
            interceptor,
            timeout: options.navigation_timeout,
            settle: options.settle,
        }))
    }
}

/// 拦截图片、样式、字体与媒体请求，其余请求放行
async fn block_heavy_resources(page: &Page) -> Result<JoinHandle<()>, SessionError> {
    let mut paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .map_err(|e| SessionError::Protocol(e.to_string()))?;

    page.execute(
        EnableParams::builder()
            .pattern(RequestPattern::builder().url_pattern("*").build())
            .build(),
    )
    .await
    .map_err(|e| SessionError::Protocol(e.to_string()))?;

    let page = page.clone();
    Ok(tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let blocked = matches!(
                event.resource_type,
                ResourceType::Image | ResourceType::Stylesheet | ResourceType::Font | ResourceType::Media
            );
            let outcome = if blocked {
                page.execute(FailRequestParams::new(
                    event.request_id.clone(),
                    ErrorReason::BlockedByClient,
                ))
                .await
                .map(|_| ())
            } else {
                page.execute(ContinueRequestParams::new(event.request_id.clone()))
                    .await
                    .map(|_| ())
            };
            if outcome.is_err() {
                // 页面已关闭
                break;
            }
        }
    }))
}

struct ChromiumPage {
    page: Page,
    interceptor: Option<JoinHandle<()>>,
    timeout: Duration,
    settle: Duration,
}

#[async_trait]
impl PageSession for ChromiumPage {
    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        match tokio::time::timeout(self.timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(SessionError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(SessionError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }),
        }
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }

    async fn settle(&self) {
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
    }

    async fn html(&self) -> Result<String, SessionError> {
        match tokio::time::timeout(self.timeout, self.page.content()).await {
            Ok(result) => result.map_err(|e| SessionError::Protocol(e.to_string())),
            Err(_) => Err(SessionError::Timeout {
                url: self.page.url().await.ok().flatten().unwrap_or_default(),
                timeout: self.timeout,
            }),
        }
    }

    async fn close(&self) -> Result<(), SessionError> {
        if let Some(handle) = &self.interceptor {
            handle.abort();
        }
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| SessionError::Protocol(e.to_string()))
    }
}

// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 资源池错误类型
#[derive(Error, Debug, Clone)]
pub enum PoolError {
    /// 在超时时间内没有拿到资源
    #[error("Acquire timed out after {0:?}")]
    Timeout(Duration),
    /// 资源池已关闭
    #[error("Pool is closed")]
    Closed,
    /// 创建资源失败，池中仍有其他存活资源
    #[error("Resource creation failed: {0}")]
    CreateFailed(String),
    /// 池中没有任何存活资源，多次重试后仍无法创建新资源
    #[error("No resource can be created: {0}")]
    Unavailable(String),
}

/// 页面会话错误类型
#[derive(Error, Debug)]
pub enum SessionError {
    /// 资源池错误
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),
    /// 导航失败
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },
    /// 操作超时
    #[error("Operation on {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    /// 浏览器协议错误
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl SessionError {
    /// 判断错误是否会让后续所有工作都无法进行
    ///
    /// # 返回值
    ///
    /// 资源池无法创建任何资源或已关闭时返回true，其余错误只影响单个URL
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::Pool(PoolError::Unavailable(_)) | SessionError::Pool(PoolError::Closed)
        )
    }
}

/// 池化资源管理器
///
/// 负责资源的创建、存活探测与销毁，资源池只负责数量与借还
#[async_trait]
pub trait ResourceManager: Send + Sync + 'static {
    /// 被池化的资源类型
    type Resource: Send + Sync + 'static;

    /// 创建一个新资源
    async fn create(&self) -> Result<Self::Resource, PoolError>;

    /// 低成本的存活探测
    async fn is_valid(&self, resource: &Self::Resource) -> bool;

    /// 销毁资源，错误只记录日志
    async fn destroy(&self, resource: Self::Resource);
}

/// 打开页面时应用的固定配置
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// 导航与单次操作的超时
    pub navigation_timeout: Duration,
    /// 浏览器标识
    pub user_agent: String,
    /// 是否拦截图片、样式、字体与媒体请求
    pub block_resources: bool,
    /// 页面加载后等待动态内容渲染的时间
    pub settle: Duration,
}

/// 单个页面会话
///
/// 解析器只通过该接口与页面交互
#[async_trait]
pub trait PageSession: Send + Sync {
    /// 导航到指定URL，超时或失败时返回错误
    async fn navigate(&self, url: &str) -> Result<(), SessionError>;

    /// 等待选择器出现，超时返回false而不是错误
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> bool;

    /// 等待动态内容渲染
    async fn settle(&self);

    /// 获取当前页面的完整HTML
    async fn html(&self) -> Result<String, SessionError>;

    /// 关闭页面
    async fn close(&self) -> Result<(), SessionError>;
}

/// 可以打开页面会话的资源
#[async_trait]
pub trait SessionHost: Send + Sync {
    /// 按配置打开一个新页面
    async fn open_page(&self, options: &SessionOptions)
        -> Result<Box<dyn PageSession>, SessionError>;
}

// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::engines::traits::SessionError;

/// 仓库层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("未找到数据")]
    NotFound,

    #[error("数据已存在")]
    AlreadyExists,

    #[error("无效参数: {0}")]
    InvalidParameter(String),
}

impl From<DbErr> for RepositoryError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => RepositoryError::AlreadyExists,
            _ => match err {
                DbErr::RecordNotFound(_) => RepositoryError::NotFound,
                other => RepositoryError::DatabaseError(other.to_string()),
            },
        }
    }
}

/// 单次爬取运行中的错误类型
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("未注册的新闻源: {0}")]
    UnknownSource(String),

    #[error("会话错误: {0}")]
    Session(#[from] SessionError),

    #[error("仓库错误: {0}")]
    Repository(#[from] RepositoryError),

    #[error("致命错误，本轮爬取中止: {0}")]
    Fatal(String),
}

impl CrawlError {
    /// 是否为需要中止整轮爬取的致命错误
    ///
    /// 只有资源池在没有任何存活资源的情况下仍无法创建新资源时才视为致命
    pub fn is_fatal(&self) -> bool {
        match self {
            CrawlError::Fatal(_) => true,
            CrawlError::Session(e) => e.is_fatal(),
            _ => false,
        }
    }
}

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("仓库错误: {0}")]
    RepositoryError(#[from] RepositoryError),

    #[error("爬取错误: {0}")]
    CrawlError(#[from] CrawlError),

    #[error("服务错误: {0}")]
    ServiceError(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}

// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

use crate::m20260301_000001_create_catalog::{Categories, Sources};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NewsArticles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NewsArticles::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(NewsArticles::Title).text().not_null())
                    .col(ColumnDef::new(NewsArticles::Content).text().not_null())
                    // URL 是全局唯一键，并发写入时由数据库兜底去重
                    .col(
                        ColumnDef::new(NewsArticles::Url)
                            .string_len(2048)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(NewsArticles::SourceId).integer().not_null())
                    .col(
                        ColumnDef::new(NewsArticles::CategoryId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(NewsArticles::Reporter).string())
                    .col(ColumnDef::new(NewsArticles::ImageUrl).text())
                    .col(ColumnDef::new(NewsArticles::AiSummary).text())
                    .col(
                        ColumnDef::new(NewsArticles::PublishedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NewsArticles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_news_articles_source")
                            .from(NewsArticles::Table, NewsArticles::SourceId)
                            .to(Sources::Table, Sources::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_news_articles_category")
                            .from(NewsArticles::Table, NewsArticles::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_news_articles_published_at")
                    .table(NewsArticles::Table)
                    .col(NewsArticles::PublishedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ArticleStats::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ArticleStats::ArticleId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ArticleStats::ViewCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ArticleStats::LikeCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ArticleStats::BookmarkCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_article_stats_article")
                            .from(ArticleStats::Table, ArticleStats::ArticleId)
                            .to(NewsArticles::Table, NewsArticles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BiasAnalyses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BiasAnalyses::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BiasAnalyses::ArticleId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(BiasAnalyses::BiasScore).double())
                    .col(ColumnDef::new(BiasAnalyses::PoliticalLeaning).string())
                    .col(ColumnDef::new(BiasAnalyses::Confidence).double())
                    .col(ColumnDef::new(BiasAnalyses::AnalysisData).json())
                    .col(
                        ColumnDef::new(BiasAnalyses::AnalyzedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bias_analyses_article")
                            .from(BiasAnalyses::Table, BiasAnalyses::ArticleId)
                            .to(NewsArticles::Table, NewsArticles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BiasAnalyses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ArticleStats::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(NewsArticles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum NewsArticles {
    Table,
    Id,
    Title,
    Content,
    Url,
    SourceId,
    CategoryId,
    Reporter,
    ImageUrl,
    AiSummary,
    PublishedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ArticleStats {
    Table,
    ArticleId,
    ViewCount,
    LikeCount,
    BookmarkCount,
}

#[derive(DeriveIden)]
enum BiasAnalyses {
    Table,
    Id,
    ArticleId,
    BiasScore,
    PoliticalLeaning,
    Confidence,
    AnalysisData,
    AnalyzedAt,
}

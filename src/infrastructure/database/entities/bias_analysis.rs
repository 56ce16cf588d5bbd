// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bias_analyses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub article_id: Uuid,
    pub bias_score: Option<f64>,
    pub political_leaning: Option<String>,
    pub confidence: Option<f64>,
    pub analysis_data: Option<Json>,
    pub analyzed_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::news_article::Entity",
        from = "Column::ArticleId",
        to = "super::news_article::Column::Id"
    )]
    NewsArticle,
}

impl Related<super::news_article::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NewsArticle.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

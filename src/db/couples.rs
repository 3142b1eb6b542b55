//! Couple and user profile rows.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::Db;
use crate::error::{Error, Result};
use crate::model::*;

impl Db {
    pub async fn get_couple(&self, id: CoupleId) -> Result<Couple> {
        let row: Option<CoupleRow> = sqlx::query_as(
            "SELECT id, invite_code, first_met_date, created_at FROM couples WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(self.pool())
        .await?;

        row.map(Couple::from)
            .ok_or_else(|| Error::NotFound(format!("couple {id}")))
    }

    pub async fn update_first_met_date(&self, id: CoupleId, date: NaiveDate) -> Result<Couple> {
        let row: Option<CoupleRow> = sqlx::query_as(
            "UPDATE couples SET first_met_date = $1 WHERE id = $2
             RETURNING id, invite_code, first_met_date, created_at",
        )
        .bind(date)
        .bind(id.0)
        .fetch_optional(self.pool())
        .await?;

        row.map(Couple::from)
            .ok_or_else(|| Error::NotFound(format!("couple {id}")))
    }

    pub async fn get_user(&self, id: UserId) -> Result<UserProfile> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, nickname, profile_image_url, couple_id FROM users WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(self.pool())
        .await?;

        row.map(UserProfile::from)
            .ok_or_else(|| Error::NotFound(format!("user {id}")))
    }

    /// The other user of the couple. `None` until the partner has joined.
    pub async fn get_partner(&self, session: &Session) -> Result<Option<UserProfile>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, nickname, profile_image_url, couple_id FROM users
             WHERE couple_id = $1 AND id <> $2
             LIMIT 1",
        )
        .bind(session.couple_id.0)
        .bind(session.user_id.0)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(UserProfile::from))
    }
}

#[derive(sqlx::FromRow)]
struct CoupleRow {
    id: Uuid,
    invite_code: String,
    first_met_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl From<CoupleRow> for Couple {
    fn from(row: CoupleRow) -> Self {
        Self {
            id: CoupleId(row.id),
            invite_code: row.invite_code,
            first_met_date: row.first_met_date,
            created_at: Some(row.created_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    nickname: Option<String>,
    profile_image_url: Option<String>,
    couple_id: Option<Uuid>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId(row.id),
            nickname: row.nickname,
            profile_image_url: row.profile_image_url,
            couple_id: row.couple_id.map(CoupleId),
        }
    }
}

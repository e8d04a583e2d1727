//! Activity log entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Borrow,
    Return,
    Add,
    Register,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Borrow => "borrow",
            ActivityType::Return => "return",
            ActivityType::Add => "add",
            ActivityType::Register => "register",
        }
    }
}

impl std::str::FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "borrow" => Ok(ActivityType::Borrow),
            "return" => Ok(ActivityType::Return),
            "add" => Ok(ActivityType::Add),
            "register" => Ok(ActivityType::Register),
            _ => Err(format!("Invalid activity type: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for ActivityType {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for ActivityType {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: &str = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for ActivityType {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Actor shown next to an activity entry
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActivityUser {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
}

/// Activity entry as listed on the dashboard
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub action: String,
    pub item: String,
    pub created_at: DateTime<Utc>,
    pub user: Option<ActivityUser>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ActivityRow {
    pub id: Uuid,
    pub kind: ActivityType,
    pub action: String,
    pub item: String,
    pub created_at: DateTime<Utc>,
    pub user_id: Option<Uuid>,
    pub user_name: Option<String>,
    pub user_image: Option<String>,
}

impl From<ActivityRow> for Activity {
    fn from(row: ActivityRow) -> Self {
        let user = match (row.user_id, row.user_name) {
            (Some(id), Some(name)) => Some(ActivityUser {
                id,
                name,
                image: row.user_image,
            }),
            _ => None,
        };
        Self {
            id: row.id,
            kind: row.kind,
            action: row.action,
            item: row.item,
            created_at: row.created_at,
            user,
        }
    }
}

/// Activity about to be appended to the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub kind: ActivityType,
    pub action: String,
    pub item: String,
    pub user_id: Option<Uuid>,
}

impl NewActivity {
    pub fn added(title: &str, actor: Uuid) -> Self {
        Self {
            kind: ActivityType::Add,
            action: "Added".to_string(),
            item: title.to_string(),
            user_id: Some(actor),
        }
    }

    pub fn borrowed(title: &str, borrower: Uuid) -> Self {
        Self {
            kind: ActivityType::Borrow,
            action: "Borrowed".to_string(),
            item: title.to_string(),
            user_id: Some(borrower),
        }
    }

    pub fn returned(title: &str, borrower: Option<Uuid>) -> Self {
        Self {
            kind: ActivityType::Return,
            action: "Returned".to_string(),
            item: title.to_string(),
            user_id: borrower,
        }
    }

    pub fn registered(name: &str, user_id: Uuid) -> Self {
        Self {
            kind: ActivityType::Register,
            action: "Registered".to_string(),
            item: name.to_string(),
            user_id: Some(user_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_json_uses_type_key() {
        let row = ActivityRow {
            id: Uuid::new_v4(),
            kind: ActivityType::Borrow,
            action: "Borrowed".into(),
            item: "Dune".into(),
            created_at: Utc::now(),
            user_id: None,
            user_name: None,
            user_image: None,
        };
        let json = serde_json::to_value(Activity::from(row)).unwrap();
        assert_eq!(json["type"], "borrow");
        assert_eq!(json["item"], "Dune");
        assert!(json["user"].is_null());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_returned_keeps_previous_borrower() {
        let borrower = Uuid::new_v4();
        let entry = NewActivity::returned("Dune", Some(borrower));
        assert_eq!(entry.kind, ActivityType::Return);
        assert_eq!(entry.user_id, Some(borrower));
    }
}

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Moderation state of an incident report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Pending,
    Validated,
    Rejected,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Pending => "pending",
            IncidentStatus::Validated => "validated",
            IncidentStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = String;

    // Accepts both the wire values and the Spanish labels the console
    // has historically shown.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "pendiente" => Ok(IncidentStatus::Pending),
            "validated" | "aceptado" => Ok(IncidentStatus::Validated),
            "rejected" | "rechazado" => Ok(IncidentStatus::Rejected),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// One incident report as returned by `/admin/reports/incidents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: i64,
    pub user_id: Option<i64>,
    pub created: String,
    pub url: Option<String>,
    pub photo_path: Option<String>,
    pub status: String,
    pub published: bool,
    pub description: Option<String>,
}

impl Incident {
    /// The backend has emitted both wire values and display labels in the
    /// `status` column; normalize the way the console always has, falling
    /// back to pending.
    pub fn normalized_status(&self) -> IncidentStatus {
        self.status.parse().unwrap_or(IncidentStatus::Pending)
    }

    /// Parse the `created` column, which arrives either as RFC 3339 or as
    /// a bare SQL datetime.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(&self.created, "%Y-%m-%d %H:%M:%S")
                    .ok()
                    .map(|naive| Utc.from_utc_datetime(&naive))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Pending,
    Suspended,
    Banned,
}

/// Administrator account as returned by `/admin/users/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub email: String,
    #[serde(deserialize_with = "bool_or_int")]
    pub is_admin: bool,
    pub user_status: AccountStatus,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Labels/data pair backing one dashboard chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
}

/// The four summary datasets rendered on the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub area: Dataset,
    pub bar: Dataset,
    pub pie_status: Dataset,
    pub pie_published: Dataset,
}

// The users endpoint has served is_admin both as a boolean and as 0/1.
fn bool_or_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrInt {
        Bool(bool),
        Int(i64),
    }

    Ok(match BoolOrInt::deserialize(deserializer)? {
        BoolOrInt::Bool(b) => b,
        BoolOrInt::Int(i) => i != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!("pending".parse::<IncidentStatus>().unwrap(), IncidentStatus::Pending);
        assert_eq!("Aceptado".parse::<IncidentStatus>().unwrap(), IncidentStatus::Validated);
        assert_eq!(" rechazado ".parse::<IncidentStatus>().unwrap(), IncidentStatus::Rejected);
        assert!("published".parse::<IncidentStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&IncidentStatus::Validated).unwrap();
        assert_eq!(json, "\"validated\"");
    }

    #[test]
    fn test_account_is_admin_shapes() {
        let from_int: Account = serde_json::from_str(
            r#"{"id":1,"email":"a@b.com","is_admin":1,"user_status":"active"}"#,
        )
        .unwrap();
        assert!(from_int.is_admin);
        assert!(from_int.name.is_none());

        let from_bool: Account = serde_json::from_str(
            r#"{"id":2,"email":"c@d.com","is_admin":false,"user_status":"pending","name":"C"}"#,
        )
        .unwrap();
        assert!(!from_bool.is_admin);
        assert_eq!(from_bool.name.as_deref(), Some("C"));
    }

    #[test]
    fn test_incident_created_at() {
        let mut incident = Incident {
            id: 1,
            user_id: None,
            created: "2024-05-01T12:00:00Z".to_string(),
            url: None,
            photo_path: None,
            status: "pending".to_string(),
            published: false,
            description: None,
        };
        assert!(incident.created_at().is_some());

        incident.created = "2024-05-01 12:00:00".to_string();
        assert!(incident.created_at().is_some());

        incident.created = "last tuesday".to_string();
        assert!(incident.created_at().is_none());
    }
}

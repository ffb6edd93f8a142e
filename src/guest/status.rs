use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 访客生命周期状态，只在读取时计算，不落库
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuestStatus {
    Active,
    Inactive,
    Expired,
}

impl GuestStatus {
    /// 过期判断优先于启用标记：已停用且已过期的账号返回 `Expired`
    pub fn derive(expires_at: DateTime<Utc>, is_active: bool, now: DateTime<Utc>) -> Self {
        if now >= expires_at {
            GuestStatus::Expired
        } else if !is_active {
            GuestStatus::Inactive
        } else {
            GuestStatus::Active
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GuestStatus::Active => "active",
            GuestStatus::Inactive => "inactive",
            GuestStatus::Expired => "expired",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn expiry_takes_precedence() {
        let now = Utc::now();
        let past = now - Duration::hours(1);
        let future = now + Duration::hours(1);

        assert_eq!(GuestStatus::derive(past, true, now), GuestStatus::Expired);
        assert_eq!(GuestStatus::derive(past, false, now), GuestStatus::Expired);
        assert_eq!(GuestStatus::derive(future, false, now), GuestStatus::Inactive);
        assert_eq!(GuestStatus::derive(future, true, now), GuestStatus::Active);
    }

    #[test]
    fn boundary_instant_counts_as_expired() {
        let now = Utc::now();
        assert_eq!(GuestStatus::derive(now, true, now), GuestStatus::Expired);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&GuestStatus::Inactive).unwrap(), "\"inactive\"");
        assert_eq!(GuestStatus::Expired.as_str(), "expired");
    }
}

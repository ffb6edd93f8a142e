use chrono::{DateTime, Days, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::GuestError;

/// 请求中的原始过期时长，各字段未经校验
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpirationInput {
    #[serde(default)]
    pub months: Option<Value>,
    #[serde(default)]
    pub days: Option<Value>,
    #[serde(default)]
    pub hours: Option<Value>,
    #[serde(default)]
    pub minutes: Option<Value>,
    #[serde(default)]
    pub seconds: Option<Value>,
}

/// 校验后的过期时长
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExpirationDuration {
    pub months: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl ExpirationDuration {
    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.days == 0 && self.hours == 0 && self.minutes == 0 && self.seconds == 0
    }
}

/// 校验过期时长，创建和更新共用
pub fn validate_duration(input: &ExpirationInput) -> Result<ExpirationDuration, GuestError> {
    let duration = ExpirationDuration {
        months: parse_unit("months", input.months.as_ref())?,
        days: parse_unit("days", input.days.as_ref())?,
        hours: parse_unit("hours", input.hours.as_ref())?,
        minutes: parse_unit("minutes", input.minutes.as_ref())?,
        seconds: parse_unit("seconds", input.seconds.as_ref())?,
    };

    if duration.is_zero() {
        return Err(GuestError::validation(
            "expiration",
            "过期时间至少需要一个非零值",
        ));
    }

    Ok(duration)
}

fn parse_unit(unit: &str, value: Option<&Value>) -> Result<u32, GuestError> {
    let invalid = || GuestError::validation(unit, format!("过期时间无效：{} 必须是非负整数", unit));

    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_u64() {
                return u32::try_from(v).map_err(|_| invalid());
            }
            // 负整数或浮点数
            n.as_f64().and_then(whole_number).ok_or_else(invalid)
        }
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(0);
            }
            s.parse::<f64>().ok().and_then(whole_number).ok_or_else(invalid)
        }
        Some(_) => Err(invalid()),
    }
}

fn whole_number(v: f64) -> Option<u32> {
    if !v.is_finite() || v.fract() != 0.0 || v < 0.0 || v > f64::from(u32::MAX) {
        return None;
    }
    Some(v as u32)
}

/// 按 月 -> 日 -> 时 -> 分 -> 秒 的顺序依次叠加到 `base` 上
///
/// 每一步都基于上一步的结果做日历运算，月份溢出时按目标月的最后一天截断
/// （2024-01-31 加一个月为 2024-02-29），不会把多出的天数顺延到下个月
/// 得到 2024-03-02。这是有意的取舍，见 DESIGN.md。结果超出可表示范围时返回 `None`。
pub fn apply_duration(base: DateTime<Utc>, d: &ExpirationDuration) -> Option<DateTime<Utc>> {
    let mut at = base;

    if d.months > 0 {
        at = at.checked_add_months(Months::new(d.months))?;
    }
    if d.days > 0 {
        at = at.checked_add_days(Days::new(u64::from(d.days)))?;
    }
    if d.hours > 0 {
        at = at.checked_add_signed(Duration::try_hours(i64::from(d.hours))?)?;
    }
    if d.minutes > 0 {
        at = at.checked_add_signed(Duration::try_minutes(i64::from(d.minutes))?)?;
    }
    if d.seconds > 0 {
        at = at.checked_add_signed(Duration::try_seconds(i64::from(d.seconds))?)?;
    }

    Some(at)
}

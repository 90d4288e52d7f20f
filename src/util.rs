use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, Utc};

/// 日程页面所在时区（UTC+9）
pub const SOURCE_UTC_OFFSET_SECS: i32 = 9 * 60 * 60;

/// 不含年份的日期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    pub fn new(month: u32, day: u32) -> Self {
        Self { month, day }
    }

    pub fn of<D: Datelike>(date: &D) -> Self {
        Self::new(date.month(), date.day())
    }
}

impl std::fmt::Display for MonthDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{:02}", self.month, self.day)
    }
}

pub fn source_offset() -> FixedOffset {
    FixedOffset::east_opt(SOURCE_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// 运行时刻加 24 小时后，在页面时区中的月日
pub fn tomorrow_from(now: DateTime<Utc>, offset: FixedOffset) -> MonthDay {
    let tomorrow = (now + Duration::hours(24)).with_timezone(&offset);
    MonthDay::of(&tomorrow)
}

// 解析严格的 "MM/DD"，闰年规则下不存在的日期视为失败
pub fn parse_month_day(text: &str) -> Option<MonthDay> {
    let bytes = text.as_bytes();
    if bytes.len() != 5 || bytes[2] != b'/' {
        return None;
    }
    let two_digits = |hi: u8, lo: u8| -> Option<u32> {
        if hi.is_ascii_digit() && lo.is_ascii_digit() {
            Some(u32::from(hi - b'0') * 10 + u32::from(lo - b'0'))
        } else {
            None
        }
    };
    let month = two_digits(bytes[0], bytes[1])?;
    let day = two_digits(bytes[3], bytes[4])?;

    NaiveDate::from_ymd_opt(2000, month, day).map(|d| MonthDay::of(&d))
}

//! MS-DOS timestamp conversion.
//!
//! ZIP records store modification times as packed DOS date/time pairs with
//! two-second resolution. Conversion is done in UTC with plain civil-calendar
//! arithmetic so results do not depend on the host time zone.

fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let mp = if month > 2 { month - 3 } else { month + 9 } as i64;
    let doy = (153 * mp + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146097 + doe - 719468
}

fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = z - era * 146097;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    (if month <= 2 { y + 1 } else { y }, month, day)
}

/// Convert a DOS time/date pair to a Unix timestamp (UTC).
pub fn dos_to_unix(dos_time: u16, dos_date: u16) -> i64 {
    let day = (dos_date & 0x1F) as u32;
    let month = ((dos_date >> 5) & 0x0F) as u32;
    let year = ((dos_date >> 9) & 0x7F) as i64 + 1980;
    let hour = ((dos_time >> 11) & 0x1F) as i64;
    let minute = ((dos_time >> 5) & 0x3F) as i64;
    let second = ((dos_time & 0x1F) as i64) * 2;

    days_from_civil(year, month, day) * 86400 + hour * 3600 + minute * 60 + second
}

/// Convert a Unix timestamp (UTC) to a DOS time/date pair.
///
/// Seconds round down to the DOS two-second resolution; years clamp to the
/// representable 1980..=2107 range.
pub fn unix_to_dos(timestamp: i64) -> (u16, u16) {
    let days = timestamp.div_euclid(86400);
    let secs = timestamp.rem_euclid(86400);
    let (year, month, day) = civil_from_days(days);
    let year = year.clamp(1980, 2107);

    let dos_date = (day as u16 & 0x1F)
        | ((month as u16 & 0x0F) << 5)
        | (((year - 1980) as u16 & 0x7F) << 9);
    let dos_time = (((secs / 2) % 30) as u16)
        | ((((secs / 60) % 60) as u16 & 0x3F) << 5)
        | (((secs / 3600) as u16 & 0x1F) << 11);
    (dos_time, dos_date)
}

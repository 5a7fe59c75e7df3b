use chrono::NaiveDate;
use gtfs_structures::{Exception, Gtfs, Trip};

use crate::network::Timestamp;

pub const fn const_unwrap<T: Copy>(x: Option<T>) -> T {
    if let Some(x) = x { x } else { panic!("Failed to const unwrap.") }
}

// Exceptions in calendar_dates take precedence over the weekly calendar.
pub fn does_trip_run(gtfs: &Gtfs, trip: &Trip, date: NaiveDate) -> bool {
    let service_id = trip.service_id.as_str();
    let exception = gtfs
        .calendar_dates
        .get(service_id)
        .and_then(|calendar_dates| calendar_dates.iter().find(|calendar_date| calendar_date.date == date));
    if let Some(calendar_date) = exception {
        return matches!(calendar_date.exception_type, Exception::Added);
    }

    match gtfs.calendar.get(service_id) {
        Some(calendar) => calendar.valid_weekday(date) && calendar.start_date <= date && date <= calendar.end_date,
        None => {
            if !gtfs.calendar_dates.contains_key(service_id) {
                log::warn!("Trip {} does not have a valid service_id {}.", trip.id, service_id);
            }
            false
        }
    }
}

fn parse_time_impl(h: &str, m: &str, s: &str) -> Result<Timestamp, std::num::ParseIntError> {
    let hours: u32 = h.parse()?;
    let minutes: u32 = m.parse()?;
    let seconds: u32 = s.parse()?;
    Ok(hours * 3600 + minutes * 60 + seconds)
}

// Hours may go past 24 for trips running after midnight.
pub fn parse_time(s: &str) -> Result<Timestamp, gtfs_structures::Error> {
    let invalid = || gtfs_structures::Error::InvalidTime(s.to_owned());
    let parts: Vec<&str> = s.split(':').collect();
    let [hour, min, sec] = parts.as_slice() else {
        return Err(invalid());
    };
    if hour.is_empty() || min.len() != 2 || sec.len() != 2 {
        return Err(invalid());
    }
    parse_time_impl(hour, min, sec).map_err(|_| invalid())
}

pub fn get_time_str(time: Timestamp) -> String {
    let hours = time / 3600;
    let minutes = (time % 3600) / 60;
    let seconds = time % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use ledger::models::{PRODUCTS, REGIONS, SalesRecord, format_timestamp, round2};
use rand::{Rng, seq::SliceRandom};

use crate::models::{MAX_BASE_AMOUNT, MAX_QUANTITY, MIN_BASE_AMOUNT};

pub fn generate_record<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> SalesRecord {
    let base_amount = rng.gen_range(MIN_BASE_AMOUNT..MAX_BASE_AMOUNT);

    SalesRecord {
        timestamp: format_timestamp(now),
        region: *REGIONS.choose(rng).unwrap_or(&REGIONS[0]),
        product: *PRODUCTS.choose(rng).unwrap_or(&PRODUCTS[0]),
        sales_amount: round2(base_amount + time_component(now)),
        quantity_sold: rng.gen_range(1..=MAX_QUANTITY),
        inventory: None,
    }
}

/// Hour and minute written as `"{hour}.{minute}"` and read back as a number,
/// so 13:45 gives 13.45 and 09:05 gives 9.5.
pub fn time_component(now: DateTime<Utc>) -> f64 {
    format!("{}.{}", now.hour(), now.minute())
        .parse()
        .unwrap_or(0.0)
}

/// `count` instants evenly spread over the UTC day `date`, starting at midnight.
pub fn spread_over_day(date: NaiveDate, count: u32) -> Vec<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    let step = 86_400 / i64::from(count.max(1));

    (0..i64::from(count))
        .map(|index| midnight + Duration::seconds(index * step))
        .collect()
}

//! Visit aggregation.
//!
//! One pass over the `visit:` prefix: cumulative today/week/month counters,
//! a per-page frequency table, and the ten busiest referrers. The whole
//! prefix fits in memory at this traffic level, so there is no streaming
//! fold here, just a scan and a sort.
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;

use crate::records::SiteVisit;

pub const TOP_REFERRER_LIMIT: usize = 10;

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitSummary {
    pub total_visits: u64,
    pub visits_today: u64,
    pub visits_this_week: u64,
    pub visits_this_month: u64,
    pub pages: BTreeMap<String, u64>,
    pub top_referrers: Vec<ReferrerCount>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ReferrerCount {
    pub referrer: String,
    pub count: u64,
}

/// `now` is injected so the window arithmetic is deterministic under test.
/// Records whose timestamp does not parse still count toward the total and
/// the frequency tables, just not toward any time window.
pub fn summarize(visits: &[SiteVisit], now: DateTime<Utc>) -> VisitSummary {
    let day_start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let week_start = now - Duration::days(7);
    let month_start = now - Duration::days(30);

    let mut summary = VisitSummary::default();
    let mut referrers: HashMap<String, u64> = HashMap::new();

    for visit in visits {
        summary.total_visits += 1;

        *summary.pages.entry(visit.page.clone()).or_insert(0) += 1;

        let referrer = if visit.referrer.is_empty() {
            "direct"
        } else {
            visit.referrer.as_str()
        };
        *referrers.entry(referrer.to_string()).or_insert(0) += 1;

        let Ok(timestamp) = DateTime::parse_from_rfc3339(&visit.timestamp) else {
            continue;
        };
        let timestamp = timestamp.with_timezone(&Utc);

        if timestamp >= day_start {
            summary.visits_today += 1;
        }
        if timestamp >= week_start {
            summary.visits_this_week += 1;
        }
        if timestamp >= month_start {
            summary.visits_this_month += 1;
        }
    }

    let mut ranked: Vec<ReferrerCount> = referrers
        .into_iter()
        .map(|(referrer, count)| ReferrerCount { referrer, count })
        .collect();

    // Descending by count, name as the stable tie-break.
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.referrer.cmp(&b.referrer)));
    ranked.truncate(TOP_REFERRER_LIMIT);

    summary.top_referrers = ranked;
    summary
}

//! Dashboard overview: headline summary, user growth series and revenue per plan.

#![forbid(unsafe_code)]

use serde::Serialize;
use serde_json::{json, Value};

use crate::normalize::{self, Accessor, Key, Pointer};
use crate::RawRecord;

pub const UNKNOWN_PLAN: &str = "Unknown";

// summary arrives wrapped as `{ summary: { data: {...} } }` or flat
const TOTAL_USERS: &[Accessor] = &[Pointer("/summary/data/totalUsers"), Pointer("/summary/totalUsers"), Key("totalUsers")];
const POSTS_TODAY: &[Accessor] = &[Pointer("/summary/data/postsToday"), Pointer("/summary/postsToday"), Key("postsToday")];
const TOTAL_REVENUE: &[Accessor] =
    &[Pointer("/summary/data/totalRevenue"), Pointer("/summary/totalRevenue"), Key("totalRevenue")];
const NEW_SIGNUPS: &[Accessor] = &[Pointer("/summary/data/newSignups"), Pointer("/summary/newSignups"), Key("newSignups")];
const GROWTH: &[Accessor] = &[Key("userGrowth"), Key("userGrowthApiData")];
const REVENUE: &[Accessor] = &[Key("subscriptionRevenue"), Key("subscriptionRevenueApiData")];

const POINT_DATE: &[Accessor] = &[Key("date")];
const POINT_USERS: &[Accessor] = &[Key("users"), Key("count")];
const PLAN_NAME: &[Accessor] = &[Key("plan"), Key("planName"), Key("name")];
const PLAN_REVENUE: &[Accessor] = &[Key("revenue"), Key("amount")];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_users: u64,
    pub posts_today: u64,
    pub total_revenue: f64,
    pub new_signups: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthPoint {
    pub date: String,
    pub users: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanRevenue {
    pub plan: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub summary: DashboardSummary,
    /// In arrival order; points without a date are dropped.
    pub user_growth: Vec<GrowthPoint>,
    pub revenue_by_plan: Vec<PlanRevenue>,
}

impl Dashboard {
    pub fn normalize(raw: &RawRecord) -> Self {
        let summary = DashboardSummary {
            total_users: normalize::count(raw, TOTAL_USERS),
            posts_today: normalize::count(raw, POSTS_TODAY),
            total_revenue: normalize::number(raw, TOTAL_REVENUE).unwrap_or(0.0),
            new_signups: normalize::count(raw, NEW_SIGNUPS),
        };
        let user_growth = normalize::list(raw, GROWTH)
            .iter()
            .filter_map(|p| Some(GrowthPoint { date: normalize::text(p, POINT_DATE)?, users: normalize::count(p, POINT_USERS) }))
            .collect();
        let revenue_by_plan = normalize::list(raw, REVENUE)
            .iter()
            .filter(|p| p.is_object())
            .map(|p| PlanRevenue {
                plan: normalize::text_or(p, PLAN_NAME, UNKNOWN_PLAN),
                revenue: normalize::number(p, PLAN_REVENUE).unwrap_or(0.0),
            })
            .collect();
        Dashboard { summary, user_growth, revenue_by_plan }
    }

    pub fn to_raw(&self) -> RawRecord {
        let s = &self.summary;
        json!({
            "summary": { "data": {
                "totalUsers": s.total_users,
                "postsToday": s.posts_today,
                "totalRevenue": s.total_revenue,
                "newSignups": s.new_signups,
            }},
            "userGrowth": self.user_growth.iter().map(|p| json!({"date": p.date, "users": p.users})).collect::<Vec<Value>>(),
            "subscriptionRevenue": self.revenue_by_plan.iter().map(|p| json!({"plan": p.plan, "revenue": p.revenue})).collect::<Vec<Value>>(),
        })
    }

    /// Users gained between the first and last point of the growth series.
    pub fn growth(&self) -> i64 {
        match (self.user_growth.first(), self.user_growth.last()) {
            (Some(a), Some(b)) => b.users as i64 - a.users as i64,
            _ => 0,
        }
    }

    pub fn plan_revenue_total(&self) -> f64 { self.revenue_by_plan.iter().map(|p| p.revenue).sum() }

    pub fn top_plan(&self) -> Option<&PlanRevenue> {
        self.revenue_by_plan.iter().max_by(|a, b| a.revenue.total_cmp(&b.revenue))
    }
}

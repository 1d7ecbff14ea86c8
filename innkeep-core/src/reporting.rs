//! Read-only aggregation over booking and payment snapshots. All grouping
//! is done in one pass over data fetched up front, so every figure in a
//! report comes from the same snapshot.

use chrono::{Datelike, Months, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Booking, BookingStatus, Room};
use crate::repository::{BookingRepository, RoomRepository, UserRepository};
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Serialize)]
pub struct RoomTypeRevenue {
    pub room_type: String,
    pub revenue_cents: i64,
    pub booking_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue_cents: i64,
    pub booking_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyRevenue {
    /// Calendar month key, `YYYY-MM`.
    pub month: String,
    pub revenue_cents: i64,
    pub booking_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_revenue_cents: i64,
    pub total_bookings: i64,
    pub by_room_type: Vec<RoomTypeRevenue>,
    pub daily: Vec<DailyRevenue>,
    pub monthly: Vec<MonthlyRevenue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: BookingStatus,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingTrend {
    /// Month label, e.g. `Jan 2024`.
    pub period: String,
    pub booking_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PopularRoom {
    pub room_id: Uuid,
    pub room_name: String,
    pub room_type: String,
    pub booking_count: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_bookings: i64,
    pub status_counts: Vec<StatusCount>,
    /// Trailing 12 calendar months ending today, independent of the
    /// report window.
    pub trends: Vec<BookingTrend>,
    pub popular_rooms: Vec<PopularRoom>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentBooking {
    pub id: Uuid,
    pub guest_name: String,
    pub room_name: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub total_cents: i64,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_bookings: i64,
    pub total_users: i64,
    pub total_rooms: i64,
    pub total_revenue_cents: i64,
    pub monthly_revenue_cents: i64,
    pub recent_bookings: Vec<RecentBooking>,
}

fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

fn month_label(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    // day 1 always exists for a valid year/month
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// Revenue aggregation over CheckedOut bookings. Pure so the internal
/// consistency (total == sum of every grouping) is easy to test.
pub fn aggregate_revenue(
    start: NaiveDate,
    end: NaiveDate,
    bookings: &[Booking],
    rooms: &HashMap<Uuid, Room>,
) -> RevenueReport {
    let mut total_revenue = 0i64;
    let mut by_type: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    let mut by_day: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    let mut by_month: BTreeMap<String, (i64, i64)> = BTreeMap::new();

    for booking in bookings {
        total_revenue += booking.total_cents;

        let room_type = rooms
            .get(&booking.room_id)
            .map(|r| r.room_type.clone())
            .unwrap_or_else(|| "unknown".to_string());

        let type_slot = by_type.entry(room_type).or_insert((0, 0));
        type_slot.0 += booking.total_cents;
        type_slot.1 += 1;

        let day_slot = by_day.entry(booking.check_out).or_insert((0, 0));
        day_slot.0 += booking.total_cents;
        day_slot.1 += 1;

        let month_slot = by_month.entry(month_key(booking.check_out)).or_insert((0, 0));
        month_slot.0 += booking.total_cents;
        month_slot.1 += 1;
    }

    RevenueReport {
        start,
        end,
        total_revenue_cents: total_revenue,
        total_bookings: bookings.len() as i64,
        by_room_type: by_type
            .into_iter()
            .map(|(room_type, (revenue_cents, booking_count))| RoomTypeRevenue {
                room_type,
                revenue_cents,
                booking_count,
            })
            .collect(),
        daily: by_day
            .into_iter()
            .map(|(date, (revenue_cents, booking_count))| DailyRevenue {
                date,
                revenue_cents,
                booking_count,
            })
            .collect(),
        monthly: by_month
            .into_iter()
            .map(|(month, (revenue_cents, booking_count))| MonthlyRevenue {
                month,
                revenue_cents,
                booking_count,
            })
            .collect(),
    }
}

const STATUS_ORDER: [BookingStatus; 5] = [
    BookingStatus::Pending,
    BookingStatus::Confirmed,
    BookingStatus::CheckedIn,
    BookingStatus::CheckedOut,
    BookingStatus::Cancelled,
];

/// Booking-volume aggregation. `window` holds the bookings created inside
/// the report window; `trailing` holds the last 12 months of creations for
/// the trend, fetched independently of the window.
pub fn aggregate_bookings(
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
    window: &[Booking],
    trailing: &[Booking],
    rooms: &HashMap<Uuid, Room>,
) -> BookingReport {
    let total = window.len() as i64;

    let status_counts = STATUS_ORDER
        .iter()
        .map(|status| {
            let count = window.iter().filter(|b| b.status == *status).count() as i64;
            let percentage = if total > 0 {
                count as f64 * 100.0 / total as f64
            } else {
                0.0
            };
            StatusCount {
                status: *status,
                count,
                percentage,
            }
        })
        .collect();

    let mut trends = Vec::with_capacity(12);
    for back in (0..12).rev() {
        let month = first_of_month(today)
            .checked_sub_months(Months::new(back))
            .unwrap_or(today);
        let count = trailing
            .iter()
            .filter(|b| {
                let created = b.created_at.date_naive();
                created.year() == month.year() && created.month() == month.month()
            })
            .count() as i64;
        trends.push(BookingTrend {
            period: month_label(month),
            booking_count: count,
        });
    }

    // First appearance wins tie order, so accumulate in encounter order and
    // sort on count alone (stable).
    let mut order: Vec<PopularRoom> = Vec::new();
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    for booking in window {
        let idx = match index.get(&booking.room_id) {
            Some(i) => *i,
            None => {
                let (name, room_type) = rooms
                    .get(&booking.room_id)
                    .map(|r| (r.name.clone(), r.room_type.clone()))
                    .unwrap_or_else(|| ("unknown".to_string(), "unknown".to_string()));
                index.insert(booking.room_id, order.len());
                order.push(PopularRoom {
                    room_id: booking.room_id,
                    room_name: name,
                    room_type,
                    booking_count: 0,
                    revenue_cents: 0,
                });
                order.len() - 1
            }
        };
        order[idx].booking_count += 1;
        order[idx].revenue_cents += booking.total_cents;
    }
    order.sort_by(|a, b| b.booking_count.cmp(&a.booking_count));
    order.truncate(10);

    BookingReport {
        start,
        end,
        total_bookings: total,
        status_counts,
        trends,
        popular_rooms: order,
    }
}

/// Fetches snapshots and runs the pure aggregations above.
pub struct ReportingService {
    bookings: Arc<dyn BookingRepository>,
    rooms: Arc<dyn RoomRepository>,
    users: Arc<dyn UserRepository>,
}

impl ReportingService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        rooms: Arc<dyn RoomRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            bookings,
            rooms,
            users,
        }
    }

    async fn room_map(&self) -> CoreResult<HashMap<Uuid, Room>> {
        Ok(self
            .rooms
            .list_all()
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect())
    }

    pub async fn revenue_report(&self, start: NaiveDate, end: NaiveDate) -> CoreResult<RevenueReport> {
        if end < start {
            return Err(CoreError::validation("report end predates start"));
        }
        let bookings = self.bookings.list_checked_out_between(start, end).await?;
        let rooms = self.room_map().await?;
        Ok(aggregate_revenue(start, end, &bookings, &rooms))
    }

    pub async fn booking_report(&self, start: NaiveDate, end: NaiveDate) -> CoreResult<BookingReport> {
        if end < start {
            return Err(CoreError::validation("report end predates start"));
        }
        let today = Utc::now().date_naive();
        let window = self.bookings.list_created_between(start, end).await?;
        let trailing_start = first_of_month(today)
            .checked_sub_months(Months::new(11))
            .unwrap_or(today);
        let trailing = self
            .bookings
            .list_created_between(trailing_start, today)
            .await?;
        let rooms = self.room_map().await?;
        Ok(aggregate_bookings(start, end, today, &window, &trailing, &rooms))
    }

    pub async fn dashboard_stats(&self) -> CoreResult<DashboardStats> {
        let today = Utc::now().date_naive();
        let month_start = first_of_month(today);
        let month_end = month_start
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or(today);

        let total_bookings = self.bookings.count_bookings().await?;
        let total_users = self.users.count_users().await?;
        let total_rooms = self.rooms.count_rooms().await?;

        let checked_out = self.bookings.list_by_status(BookingStatus::CheckedOut).await?;
        let total_revenue_cents: i64 = checked_out.iter().map(|b| b.total_cents).sum();
        let monthly_revenue_cents: i64 = checked_out
            .iter()
            .filter(|b| b.check_out >= month_start && b.check_out <= month_end)
            .map(|b| b.total_cents)
            .sum();

        let rooms = self.room_map().await?;
        let mut recent_bookings = Vec::new();
        for booking in self.bookings.list_recent(5).await? {
            let guest_name = match self.users.get_user(booking.user_id).await? {
                Some(user) => user.display_name(),
                None => "unknown".to_string(),
            };
            let room_name = rooms
                .get(&booking.room_id)
                .map(|r| r.name.clone())
                .unwrap_or_else(|| "unknown".to_string());
            recent_bookings.push(RecentBooking {
                id: booking.id,
                guest_name,
                room_name,
                check_in: booking.check_in,
                check_out: booking.check_out,
                total_cents: booking.total_cents,
                status: booking.status,
            });
        }

        Ok(DashboardStats {
            total_bookings,
            total_users,
            total_rooms,
            total_revenue_cents,
            monthly_revenue_cents,
            recent_bookings,
        })
    }
}
